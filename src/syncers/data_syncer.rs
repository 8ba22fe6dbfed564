use super::coin_syncer::{CoinSyncer, SyncOutcome};
use crate::core::MarketDataProvider;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Fetches the remote status stamps and feeds them to the [`CoinSyncer`] in
/// a background task.
pub struct DataSyncer {
    provider: Arc<dyn MarketDataProvider>,
    coin_syncer: Arc<CoinSyncer>,
    task: Mutex<Option<JoinHandle<SyncOutcome>>>,
}

impl DataSyncer {
    pub fn new(provider: Arc<dyn MarketDataProvider>, coin_syncer: Arc<CoinSyncer>) -> Self {
        Self {
            provider,
            coin_syncer,
            task: Mutex::new(None),
        }
    }

    pub async fn sync_now(&self) -> SyncOutcome {
        Self::run(self.provider.clone(), self.coin_syncer.clone()).await
    }

    /// Starts a sync unless one spawned earlier is still running.
    pub fn sync(&self) {
        let mut task = self.task.lock().unwrap_or_else(|e| e.into_inner());
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            debug!("Data sync already running");
            return;
        }

        let provider = self.provider.clone();
        let coin_syncer = self.coin_syncer.clone();
        *task = Some(tokio::spawn(Self::run(provider, coin_syncer)));
    }

    /// Waits for the background sync started by [`DataSyncer::sync`], if any.
    pub async fn wait(&self) -> Option<SyncOutcome> {
        let handle = self.task.lock().unwrap_or_else(|e| e.into_inner()).take()?;
        handle.await.ok()
    }

    pub fn stop(&self) {
        if let Some(handle) = self.task.lock().unwrap_or_else(|e| e.into_inner()).take() {
            handle.abort();
        }
    }

    async fn run(
        provider: Arc<dyn MarketDataProvider>,
        coin_syncer: Arc<CoinSyncer>,
    ) -> SyncOutcome {
        match provider.fetch_status().await {
            Ok(stamps) => coin_syncer.sync(stamps).await,
            Err(e) => {
                warn!(error = %e, "Failed to fetch status");
                SyncOutcome::Failed
            }
        }
    }
}
