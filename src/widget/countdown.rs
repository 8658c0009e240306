use super::clock::Clock;
use super::task::{spawn_periodic, CancelHandle};
use chrono::{DateTime, FixedOffset, Utc};
use std::fmt;
use std::future;
use std::sync::Arc;
use std::time::Duration;

const TICK: Duration = Duration::from_secs(1);

const MILLIS_PER_SECOND: u64 = 1000;
const MILLIS_PER_MINUTE: u64 = 60 * MILLIS_PER_SECOND;
const MILLIS_PER_HOUR: u64 = 60 * MILLIS_PER_MINUTE;
const MILLIS_PER_DAY: u64 = 24 * MILLIS_PER_HOUR;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CountdownValue {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl CountdownValue {
    pub const ZERO: CountdownValue = CountdownValue { days: 0, hours: 0, minutes: 0, seconds: 0 };

    /// Time left until `target`, or `None` once it has been reached
    pub fn until(target: DateTime<FixedOffset>, now: DateTime<Utc>) -> Option<Self> {
        let remaining = target.signed_duration_since(now).num_milliseconds();
        if remaining <= 0 {
            return None;
        }

        let remaining = remaining as u64;
        Some(CountdownValue {
            days: remaining / MILLIS_PER_DAY,
            hours: remaining % MILLIS_PER_DAY / MILLIS_PER_HOUR,
            minutes: remaining % MILLIS_PER_HOUR / MILLIS_PER_MINUTE,
            seconds: remaining % MILLIS_PER_MINUTE / MILLIS_PER_SECOND,
        })
    }
}

impl fmt::Display for CountdownValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d {:02}:{:02}:{:02}", self.days, self.hours, self.minutes, self.seconds)
    }
}

/// Calls `on_tick` with the time left right away and then once per second.
/// When the target has been reached it reports `CountdownValue::ZERO` a single time and ends.
pub fn start<F>(target: DateTime<FixedOffset>, clock: Arc<dyn Clock>, mut on_tick: F) -> CancelHandle
where
    F: FnMut(CountdownValue) + Send + 'static,
{
    spawn_periodic(TICK, move || {
        let keep_going = match CountdownValue::until(target, clock.now()) {
            Some(left) => {
                on_tick(left);
                true
            }
            None => {
                log::info!("Countdown to {} finished", target);
                on_tick(CountdownValue::ZERO);
                false
            }
        };
        future::ready(keep_going)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::clock::testing::RuntimeClock;
    use chrono::{TimeDelta, TimeZone};
    use tokio::sync::mpsc;

    fn origin() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
    }

    fn target_in(millis: i64) -> DateTime<FixedOffset> {
        (origin() + TimeDelta::milliseconds(millis)).fixed_offset()
    }

    #[test]
    fn buckets_are_floored() {
        let left = CountdownValue::until(target_in(90_061_999), origin()).unwrap();
        assert_eq!(left, CountdownValue { days: 1, hours: 1, minutes: 1, seconds: 1 });
        assert_eq!(left.to_string(), "1d 01:01:01");
    }

    #[test]
    fn reached_target_has_nothing_left() {
        assert_eq!(CountdownValue::until(target_in(0), origin()), None);
        assert_eq!(CountdownValue::until(target_in(-5_000), origin()), None);
    }

    #[tokio::test(start_paused = true)]
    async fn first_tick_is_immediate() {
        let (sender, mut ticks) = mpsc::unbounded_channel();
        let clock = Arc::new(RuntimeClock::starting_at(origin()));
        let _handle = start(target_in(90_061_000), clock, move |left| { let _ = sender.send(left); });

        let first = ticks.recv().await.unwrap();
        assert_eq!(first, CountdownValue { days: 1, hours: 1, minutes: 1, seconds: 1 });

        let second = ticks.recv().await.unwrap();
        assert_eq!(second, CountdownValue { days: 1, hours: 1, minutes: 1, seconds: 0 });
    }

    #[tokio::test(start_paused = true)]
    async fn past_target_reports_zero_once() {
        let (sender, mut ticks) = mpsc::unbounded_channel();
        let clock = Arc::new(RuntimeClock::starting_at(origin()));
        let handle = start(target_in(-60_000), clock, move |left| { let _ = sender.send(left); });

        handle.finished().await;
        assert_eq!(ticks.recv().await, Some(CountdownValue::ZERO));
        assert_eq!(ticks.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn counts_down_to_zero_and_stops() {
        let (sender, mut ticks) = mpsc::unbounded_channel();
        let clock = Arc::new(RuntimeClock::starting_at(origin()));
        let handle = start(target_in(2_500), clock, move |left| { let _ = sender.send(left); });

        handle.finished().await;
        let mut seconds = Vec::new();
        while let Some(left) = ticks.recv().await {
            seconds.push(left.seconds);
        }
        assert_eq!(seconds, vec![2, 1, 0, 0]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_ticker_is_silent() {
        let (sender, mut ticks) = mpsc::unbounded_channel();
        let clock = Arc::new(RuntimeClock::starting_at(origin()));
        let handle = start(target_in(3_600_000), clock, move |left| { let _ = sender.send(left); });

        assert!(ticks.recv().await.is_some());
        handle.cancel();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(ticks.recv().await, None);
    }
}
