use crate::core::{
    GlobalMarketInfo, GlobalMarketPoint, MarketDataProvider, Result, Storage, TimePeriod,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::debug;

/// Seconds a stored global market series stays fresh.
pub const EXPIRATION_INTERVAL: i64 = 600;

fn unix_now() -> i64 {
    Utc::now().timestamp()
}

pub struct GlobalMarketInfoManager {
    provider: Arc<dyn MarketDataProvider>,
    storage: Arc<dyn Storage>,
    now: fn() -> i64,
}

impl GlobalMarketInfoManager {
    pub fn new(provider: Arc<dyn MarketDataProvider>, storage: Arc<dyn Storage>) -> Self {
        Self::with_clock(provider, storage, unix_now)
    }

    /// Like [`GlobalMarketInfoManager::new`] but reads unix seconds from `now`.
    pub fn with_clock(
        provider: Arc<dyn MarketDataProvider>,
        storage: Arc<dyn Storage>,
        now: fn() -> i64,
    ) -> Self {
        Self {
            provider,
            storage,
            now,
        }
    }

    /// Returns the stored series while it is fresh, otherwise refetches and
    /// overwrites it.
    pub async fn global_market_points(
        &self,
        currency_code: &str,
        time_period: TimePeriod,
    ) -> Result<Vec<GlobalMarketPoint>> {
        let now = (self.now)();

        if let Some(info) = self.storage.global_market_info(currency_code, time_period)? {
            if now - info.timestamp <= EXPIRATION_INTERVAL {
                debug!(currency = %currency_code, period = %time_period, "Global market cache HIT");
                return Ok(info.points);
            }
            debug!(currency = %currency_code, period = %time_period, "Global market cache expired");
        }

        let points = self
            .provider
            .fetch_global_market_points(currency_code, time_period)
            .await?;

        self.storage.save_global_market_info(&GlobalMarketInfo {
            currency_code: currency_code.to_string(),
            time_period,
            points: points.clone(),
            timestamp: now,
        })?;

        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStorage;
    use crate::test_utils::{MockProvider, market_point};
    use std::sync::atomic::Ordering;

    const NOW: i64 = 1_800_000_000;

    fn fixed_now() -> i64 {
        NOW
    }

    fn setup() -> (Arc<MockProvider>, Arc<MemoryStorage>, GlobalMarketInfoManager) {
        let provider = Arc::new(MockProvider::new());
        let storage = Arc::new(MemoryStorage::new());
        let manager =
            GlobalMarketInfoManager::with_clock(provider.clone(), storage.clone(), fixed_now);
        (provider, storage, manager)
    }

    fn seed(storage: &MemoryStorage, age: i64) {
        storage
            .save_global_market_info(&GlobalMarketInfo {
                currency_code: "USD".to_string(),
                time_period: TimePeriod::Day1,
                points: vec![market_point(1)],
                timestamp: NOW - age,
            })
            .unwrap();
    }

    #[tokio::test]
    async fn test_second_call_within_window_uses_cache() {
        let (provider, _storage, manager) = setup();

        let first = manager
            .global_market_points("USD", TimePeriod::Day1)
            .await
            .unwrap();
        let second = manager
            .global_market_points("USD", TimePeriod::Day1)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(provider.global_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fresh_entry_is_reused() {
        let (provider, storage, manager) = setup();
        seed(&storage, EXPIRATION_INTERVAL - 1);

        let points = manager
            .global_market_points("USD", TimePeriod::Day1)
            .await
            .unwrap();

        assert_eq!(points, vec![market_point(1)]);
        assert_eq!(provider.global_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_entry_exactly_at_expiration_is_reused() {
        let (provider, storage, manager) = setup();
        seed(&storage, EXPIRATION_INTERVAL);

        let points = manager
            .global_market_points("USD", TimePeriod::Day1)
            .await
            .unwrap();

        assert_eq!(points, vec![market_point(1)]);
        assert_eq!(provider.global_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_entry_past_expiration_is_refetched_and_overwritten() {
        let (provider, storage, manager) = setup();
        seed(&storage, EXPIRATION_INTERVAL + 1);

        let points = manager
            .global_market_points("USD", TimePeriod::Day1)
            .await
            .unwrap();

        assert_eq!(points, vec![market_point(1_700_000_000)]);
        assert_eq!(provider.global_calls.load(Ordering::SeqCst), 1);

        let stored = storage
            .global_market_info("USD", TimePeriod::Day1)
            .unwrap()
            .unwrap();
        assert_eq!(stored.timestamp, NOW);
        assert_eq!(stored.points, points);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let (provider, _storage, manager) = setup();

        manager
            .global_market_points("USD", TimePeriod::Day1)
            .await
            .unwrap();
        manager
            .global_market_points("USD", TimePeriod::Week1)
            .await
            .unwrap();
        manager
            .global_market_points("EUR", TimePeriod::Day1)
            .await
            .unwrap();

        assert_eq!(provider.global_calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_default_clock_is_wall_time() {
        let before = Utc::now().timestamp();
        let now = unix_now();
        assert!(now >= before && now - before < 5);
    }
}
