//! Cancellable periodic task runner.
//!
//! The first tick fires one full period after spawn. A tick that arrives
//! while the action is still running is skipped. Stopping waits for an
//! in-flight action to finish and never starts another. Periods are clamped
//! to between one millisecond and one year.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error};

const MIN_PERIOD: Duration = Duration::from_millis(1);
const MAX_PERIOD: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Handle to a running periodic task.
pub struct SchedulerHandle {
    name: &'static str,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signal the task and wait for it to exit.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            error!(task = self.name, error = %e, "Periodic task panicked");
        }
    }
}

/// Run `action` every `period` until the returned handle is stopped.
///
/// Action errors are logged and do not stop the schedule.
pub fn spawn_periodic<F, Fut, E>(name: &'static str, period: Duration, mut action: F) -> SchedulerHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: Display + Send + 'static,
{
    let period = period.clamp(MIN_PERIOD, MAX_PERIOD);
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        debug!(task = name, ?period, "Periodic task started");

        loop {
            tokio::select! {
                biased;
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if let Err(e) = action().await {
                        error!(task = name, error = %e, "Periodic task failed");
                    }
                }
            }
        }
        debug!(task = name, "Periodic task stopped");
    });

    SchedulerHandle {
        name,
        shutdown_tx,
        task,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting(counter: &Arc<AtomicUsize>) -> impl FnMut() -> std::future::Ready<Result<(), String>> {
        let counter = counter.clone();
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Ok(()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_after_one_period() {
        let runs = Arc::new(AtomicUsize::new(0));
        let handle = spawn_periodic("test", Duration::from_secs(5), counting(&runs));

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_prevents_further_runs() {
        let runs = Arc::new(AtomicUsize::new(0));
        let handle = spawn_periodic("test", Duration::from_secs(1), counting(&runs));

        tokio::time::sleep(Duration::from_millis(2500)).await;
        handle.stop().await;
        let seen = runs.load(Ordering::SeqCst);
        assert_eq!(seen, 2);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(runs.load(Ordering::SeqCst), seen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_errors_do_not_stop_schedule() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let handle = spawn_periodic("test", Duration::from_secs(1), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Err::<(), _>("boom"))
        });

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_period_is_clamped() {
        let runs = Arc::new(AtomicUsize::new(0));
        let handle = spawn_periodic("test", Duration::MAX, counting(&runs));

        tokio::time::sleep(MAX_PERIOD - Duration::from_secs(1)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_waits_for_inflight_action() {
        let finished = Arc::new(AtomicUsize::new(0));
        let counter = finished.clone();
        let handle = spawn_periodic("test", Duration::from_secs(1), move || {
            let counter = counter.clone();
            async move {
                tokio::time::sleep(Duration::from_secs(3)).await;
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<(), String>(())
            }
        });

        // First action starts at t=1s and is mid-flight at t=2s.
        tokio::time::sleep(Duration::from_secs(2)).await;
        handle.stop().await;
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }
}
