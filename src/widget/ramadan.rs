use super::clock::Clock;
use super::session::{self, SessionStore, HIJRI_YEAR_KEY, RAMADAN_DATE_KEY};
use crate::sources::common::{ApiError, Coordinates};
use async_trait::async_trait;
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use futures::future::try_join_all;
use std::sync::Arc;
use thiserror::Error;

pub const RAMADAN: u32 = 9;
/// All dates are pinned to midnight in this offset (UTC+7, Western Indonesia Time)
pub const PINNED_OFFSET_SECONDS: i32 = 7 * 60 * 60;
const FALLBACK_MONTH: u32 = 3;
const FALLBACK_DAY: u32 = 1;

/// One day of a Gregorian month with its Hijri counterpart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HijriCalendarEntry {
    pub hijri_month: u32,
    pub hijri_day: String,
    pub hijri_year: String,
    /// DD-MM-YYYY
    pub gregorian_date: String,
}
impl HijriCalendarEntry {
    pub fn is_ramadan_start(&self) -> bool {
        // the day is a string on the wire, "1" and "01" both occur
        self.hijri_month == RAMADAN && self.hijri_day.trim().parse::<u32>() == Ok(1)
    }
}

/// Converts the days of one Gregorian month into the Hijri calendar
#[async_trait]
pub trait HijriCalendar: Send + Sync {
    async fn month_calendar(&self, month: u32, year: i32, point: Coordinates)
        -> Result<Vec<HijriCalendarEntry>, ApiError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRamadanDate {
    pub date: DateTime<FixedOffset>,
    /// only known when the date came from the calendar, not from the fallback
    pub hijri_year: Option<String>,
}

#[derive(Debug, Error)]
enum DateResolutionError {
    #[error("Calendar lookup failed: {0}")]
    Api(#[from] ApiError),

    #[error("Invalid Gregorian date {date:?}: {reason}")]
    InvalidDate {
        date: String,
        reason: String,
    },

    #[error("No day of {0} starts Ramadan")]
    NotFound(i32),
}

pub fn pinned_offset() -> FixedOffset {
    FixedOffset::east_opt(PINNED_OFFSET_SECONDS).unwrap_or_else(|| Utc.fix())
}

fn midnight_in_pinned_offset(day: NaiveDate) -> Option<DateTime<FixedOffset>> {
    pinned_offset().from_local_datetime(&day.and_time(NaiveTime::MIN)).single()
}

/// Parses a DD-MM-YYYY date into midnight of that day in the pinned offset
fn pinned_midnight(gregorian_date: &str) -> Result<DateTime<FixedOffset>, DateResolutionError> {
    let invalid = |reason: String| DateResolutionError::InvalidDate { date: gregorian_date.to_string(), reason };

    let day = NaiveDate::parse_from_str(gregorian_date.trim(), "%d-%m-%Y")
        .map_err(|e| invalid(e.to_string()))?;
    midnight_in_pinned_offset(day)
        .ok_or_else(|| invalid("no unique local midnight".to_string()))
}

/// March 1st of the given year; used whenever the calendar cannot tell
pub fn fallback_date(year: i32) -> ResolvedRamadanDate {
    let day = NaiveDate::from_ymd_opt(year, FALLBACK_MONTH, FALLBACK_DAY).unwrap_or_default();
    let date = midnight_in_pinned_offset(day)
        .unwrap_or_else(|| day.and_time(NaiveTime::MIN).and_utc().fixed_offset());

    ResolvedRamadanDate { date, hijri_year: None }
}

/// Finds the first day of Ramadan in the Gregorian year after the current one.
///
/// The twelve months are requested at once but inspected in calendar order. A date that was
/// found is kept in the session; the fallback is not, so a later call may still succeed.
pub struct RamadanDateResolver {
    calendar: Arc<dyn HijriCalendar>,
    session: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
}

impl RamadanDateResolver {
    pub fn new(calendar: Arc<dyn HijriCalendar>, session: Arc<dyn SessionStore>, clock: Arc<dyn Clock>) -> Self {
        RamadanDateResolver { calendar, session, clock }
    }

    pub async fn resolve(&self, point: Coordinates) -> ResolvedRamadanDate {
        if let Some(remembered) = self.remembered() {
            log::debug!("Using session Ramadan date {}", remembered.date);
            return remembered;
        }

        let next_year = self.clock.now().with_timezone(&pinned_offset()).year() + 1;
        match self.scan_year(next_year, point).await {
            Ok(resolved) => {
                log::info!("Ramadan {} AH starts on {}",
                           resolved.hijri_year.as_deref().unwrap_or("?"), resolved.date);
                self.remember(&resolved);
                resolved
            }
            Err(e) => {
                log::warn!("Failed to resolve the Ramadan date, assuming March 1st: {}", e);
                fallback_date(next_year)
            }
        }
    }

    async fn scan_year(&self, year: i32, point: Coordinates) -> Result<ResolvedRamadanDate, DateResolutionError> {
        let lookups = (1..=12).map(|month| self.calendar.month_calendar(month, year, point));
        let months = try_join_all(lookups).await?;

        let start = months.iter()
            .flatten()
            .find(|entry| entry.is_ramadan_start())
            .ok_or(DateResolutionError::NotFound(year))?;

        Ok(ResolvedRamadanDate {
            date: pinned_midnight(&start.gregorian_date)?,
            hijri_year: Some(start.hijri_year.clone()),
        })
    }

    fn remembered(&self) -> Option<ResolvedRamadanDate> {
        let store = self.session.as_ref();
        let date = session::load::<String>(store, RAMADAN_DATE_KEY)?;
        let hijri_year = session::load::<String>(store, HIJRI_YEAR_KEY)?;

        match DateTime::parse_from_rfc3339(&date) {
            Ok(date) => Some(ResolvedRamadanDate { date, hijri_year: Some(hijri_year) }),
            Err(e) => {
                log::warn!("Ignoring malformed session Ramadan date {:?}: {}", date, e);
                None
            }
        }
    }

    fn remember(&self, resolved: &ResolvedRamadanDate) {
        let store = self.session.as_ref();
        session::save(store, RAMADAN_DATE_KEY, &resolved.date.to_rfc3339());
        if let Some(hijri_year) = &resolved.hijri_year {
            session::save(store, HIJRI_YEAR_KEY, hijri_year);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::clock::testing::FixedClock;
    use crate::widget::session::MemorySession;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeCalendar {
        months: HashMap<u32, Vec<HijriCalendarEntry>>,
        failing: HashSet<u32>,
        requests: Mutex<Vec<(u32, i32)>>,
    }
    impl FakeCalendar {
        fn with_month(mut self, month: u32, entries: Vec<HijriCalendarEntry>) -> Self {
            self.months.insert(month, entries);
            self
        }

        fn failing(mut self, month: u32) -> Self {
            self.failing.insert(month);
            self
        }

        fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl HijriCalendar for FakeCalendar {
        async fn month_calendar(&self, month: u32, year: i32, _point: Coordinates)
            -> Result<Vec<HijriCalendarEntry>, ApiError>
        {
            self.requests.lock().unwrap().push((month, year));
            if self.failing.contains(&month) {
                return Err(ApiError::BadRequest { reason: "service unavailable".to_string() });
            }
            Ok(self.months.get(&month).cloned().unwrap_or_else(|| vec![
                day(8, "15", "1448", &format!("15-{:02}-2027", month)),
            ]))
        }
    }

    fn day(hijri_month: u32, hijri_day: &str, hijri_year: &str, gregorian_date: &str) -> HijriCalendarEntry {
        HijriCalendarEntry {
            hijri_month,
            hijri_day: hijri_day.to_string(),
            hijri_year: hijri_year.to_string(),
            gregorian_date: gregorian_date.to_string(),
        }
    }

    const MECCA: Coordinates = Coordinates { latitude: 21.4225, longitude: 39.8262 };

    fn resolver(calendar: Arc<FakeCalendar>, session: Arc<MemorySession>) -> RamadanDateResolver {
        let today = Utc.with_ymd_and_hms(2026, 10, 16, 9, 30, 0).unwrap();
        RamadanDateResolver::new(calendar, session, Arc::new(FixedClock(today)))
    }

    fn pinned(rfc3339: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap()
    }

    #[tokio::test]
    async fn finds_the_single_ramadan_start() {
        let calendar = Arc::new(FakeCalendar::default().with_month(2, vec![
            day(8, "30", "1448", "07-02-2027"),
            day(9, "1", "1448", "08-02-2027"),
            day(9, "2", "1448", "09-02-2027"),
        ]));
        let resolved = resolver(calendar.clone(), Arc::new(MemorySession::new())).resolve(MECCA).await;

        assert_eq!(resolved.date, pinned("2027-02-08T00:00:00+07:00"));
        assert_eq!(resolved.hijri_year.as_deref(), Some("1448"));

        let mut requested = calendar.requests.lock().unwrap().clone();
        requested.sort();
        assert_eq!(requested, (1..=12).map(|month| (month, 2027)).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn earliest_month_and_first_entry_win() {
        let calendar = Arc::new(FakeCalendar::default()
            .with_month(2, vec![
                day(9, "1", "1448", "08-02-2027"),
                day(9, "1", "1448", "09-02-2027"),
            ])
            .with_month(12, vec![day(9, "1", "1449", "28-12-2027")]));
        let resolved = resolver(calendar, Arc::new(MemorySession::new())).resolve(MECCA).await;

        assert_eq!(resolved.date, pinned("2027-02-08T00:00:00+07:00"));
    }

    #[tokio::test]
    async fn zero_padded_day_counts() {
        let calendar = Arc::new(FakeCalendar::default().with_month(2, vec![day(9, "01", "1448", "08-02-2027")]));
        let resolved = resolver(calendar, Arc::new(MemorySession::new())).resolve(MECCA).await;

        assert_eq!(resolved.hijri_year.as_deref(), Some("1448"));
    }

    #[tokio::test]
    async fn no_ramadan_start_falls_back_to_march_first() {
        let calendar = Arc::new(FakeCalendar::default());
        let session = Arc::new(MemorySession::new());
        let resolved = resolver(calendar.clone(), session.clone()).resolve(MECCA).await;

        assert_eq!(resolved, ResolvedRamadanDate {
            date: pinned("2027-03-01T00:00:00+07:00"),
            hijri_year: None,
        });
        assert_eq!(session.get(RAMADAN_DATE_KEY), None);
    }

    #[tokio::test]
    async fn fallback_is_retried_within_the_session() {
        let calendar = Arc::new(FakeCalendar::default());
        let resolver = resolver(calendar.clone(), Arc::new(MemorySession::new()));

        let first = resolver.resolve(MECCA).await;
        let second = resolver.resolve(MECCA).await;
        assert_eq!(first, second);
        assert_eq!(calendar.request_count(), 24);
    }

    #[tokio::test]
    async fn any_failing_month_falls_back() {
        let calendar = Arc::new(FakeCalendar::default()
            .with_month(2, vec![day(9, "1", "1448", "08-02-2027")])
            .failing(11));
        let resolved = resolver(calendar, Arc::new(MemorySession::new())).resolve(MECCA).await;

        assert_eq!(resolved.date, pinned("2027-03-01T00:00:00+07:00"));
        assert_eq!(resolved.hijri_year, None);
    }

    #[tokio::test]
    async fn unparsable_gregorian_date_falls_back() {
        let calendar = Arc::new(FakeCalendar::default().with_month(2, vec![day(9, "1", "1448", "2027-02-08")]));
        let resolved = resolver(calendar, Arc::new(MemorySession::new())).resolve(MECCA).await;

        assert_eq!(resolved.date, pinned("2027-03-01T00:00:00+07:00"));
    }

    #[tokio::test]
    async fn resolved_date_is_served_from_the_session() {
        let calendar = Arc::new(FakeCalendar::default().with_month(2, vec![day(9, "1", "1448", "08-02-2027")]));
        let session = Arc::new(MemorySession::new());
        let resolver = resolver(calendar.clone(), session.clone());

        let first = resolver.resolve(MECCA).await;
        let second = resolver.resolve(MECCA).await;

        assert_eq!(first, second);
        assert_eq!(first.date.offset(), second.date.offset());
        assert_eq!(calendar.request_count(), 12);
        assert_eq!(session.get(RAMADAN_DATE_KEY).as_deref(), Some(r#""2027-02-08T00:00:00+07:00""#));
    }

    #[tokio::test]
    async fn next_year_is_counted_in_the_pinned_offset() {
        let calendar = Arc::new(FakeCalendar::default());
        // still 2026 in UTC, already 2027 at UTC+7
        let new_years_eve = Utc.with_ymd_and_hms(2026, 12, 31, 18, 0, 0).unwrap();
        let resolver = RamadanDateResolver::new(calendar.clone(), Arc::new(MemorySession::new()),
                                                Arc::new(FixedClock(new_years_eve)));

        let resolved = resolver.resolve(MECCA).await;
        assert_eq!(resolved.date, pinned("2028-03-01T00:00:00+07:00"));
        assert!(calendar.requests.lock().unwrap().iter().all(|&(_, year)| year == 2028));
    }

    #[test]
    fn pinned_midnight_is_seven_hours_ahead_of_utc() {
        let date = pinned_midnight("18-02-2026").unwrap();
        assert_eq!(date.with_timezone(&Utc), Utc.with_ymd_and_hms(2026, 2, 17, 17, 0, 0).unwrap());
    }
}
