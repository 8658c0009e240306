use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Owner of a background task. Cancelling (or dropping) the handle stops the task at its next
/// await point; nothing the task produces afterwards reaches its consumer.
#[derive(Debug)]
pub struct CancelHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl CancelHandle {
    /// Spawns `work` on the runtime, giving it the token it has to observe.
    pub fn spawn<F, Fut>(work: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let task = tokio::spawn(work(token.clone()));
        CancelHandle { token, task: Some(task) }
    }

    #[cfg(test)]
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// True once the task has returned, either by itself or after cancellation.
    #[cfg(test)]
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Waits for the task to return without cancelling it.
    #[cfg(test)]
    pub async fn finished(mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                log::warn!("Background task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for CancelHandle {
    fn drop(&mut self) {
        if self.task.is_some() {
            self.token.cancel();
        }
    }
}

/// Runs `cycle` right away and then once per `period` until cancelled or until `cycle`
/// returns `false`. A cycle still running when the token fires is dropped mid-flight.
pub fn spawn_periodic<F, Fut>(period: Duration, mut cycle: F) -> CancelHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = bool> + Send + 'static,
{
    CancelHandle::spawn(move |token| async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let keep_going = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                keep_going = cycle() => keep_going,
            };
            if !keep_going {
                break;
            }
        }
    })
}
