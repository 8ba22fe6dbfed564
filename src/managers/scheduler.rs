use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Recurring timer running `tick` on a fixed phase, plus on demand.
///
/// The first tick runs immediately. The task is aborted when the scheduler is
/// dropped.
pub struct Scheduler {
    refresh: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl Scheduler {
    pub fn start<F, Fut>(name: String, interval: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let refresh = Arc::new(Notify::new());
        let notified = refresh.clone();

        let handle = tokio::spawn(async move {
            debug!(scheduler = %name, interval_secs = interval.as_secs(), "Scheduler started");
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = notified.notified() => {
                        debug!(scheduler = %name, "Out-of-cycle refresh");
                    }
                }
                tick().await;
            }
        });

        Self { refresh, handle }
    }

    /// Runs an extra tick as soon as possible without moving the timer phase.
    pub fn refresh(&self) {
        self.refresh.notify_one();
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
