use crate::core::storage::{global_market_key, historical_price_key};
use crate::core::{
    Blockchain, Coin, CoinHistoricalPrice, GlobalMarketInfo, Result, Storage, TimePeriod,
    TokenEntity,
};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

#[derive(Default)]
struct Catalog {
    coins: Vec<Coin>,
    blockchains: Vec<Blockchain>,
    tokens: Vec<TokenEntity>,
}

#[derive(Default)]
struct Tables {
    catalog: Arc<Catalog>,
    sync_state: HashMap<String, String>,
    historical_prices: HashMap<String, CoinHistoricalPrice>,
    global_market_info: HashMap<String, GlobalMarketInfo>,
}

/// In-memory storage. The catalog is swapped as a single `Arc` so readers
/// never observe a partially replaced catalog.
#[derive(Default)]
pub struct MemoryStorage {
    inner: RwLock<Tables>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Storage for MemoryStorage {
    fn replace_catalog(
        &self,
        coins: &[Coin],
        blockchains: &[Blockchain],
        tokens: &[TokenEntity],
    ) -> Result<()> {
        let catalog = Arc::new(Catalog {
            coins: coins.to_vec(),
            blockchains: blockchains.to_vec(),
            tokens: tokens.to_vec(),
        });
        self.write().catalog = catalog;
        debug!(
            coins = coins.len(),
            blockchains = blockchains.len(),
            tokens = tokens.len(),
            "Catalog REPLACE"
        );
        Ok(())
    }

    fn all_coins(&self) -> Result<Vec<Coin>> {
        Ok(self.read().catalog.coins.clone())
    }

    fn all_blockchains(&self) -> Result<Vec<Blockchain>> {
        Ok(self.read().catalog.blockchains.clone())
    }

    fn all_tokens(&self) -> Result<Vec<TokenEntity>> {
        Ok(self.read().catalog.tokens.clone())
    }

    fn sync_state(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read().sync_state.get(key).cloned())
    }

    fn save_sync_state(&self, key: &str, value: &str) -> Result<()> {
        self.write()
            .sync_state
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn historical_price(
        &self,
        coin_uid: &str,
        currency_code: &str,
        timestamp: i64,
    ) -> Result<Option<CoinHistoricalPrice>> {
        let key = historical_price_key(coin_uid, currency_code, timestamp);
        Ok(self.read().historical_prices.get(&key).cloned())
    }

    fn save_historical_price(&self, price: &CoinHistoricalPrice) -> Result<()> {
        let key = historical_price_key(&price.coin_uid, &price.currency_code, price.timestamp);
        debug!("Cache PUT for key: {}", key);
        self.write().historical_prices.insert(key, price.clone());
        Ok(())
    }

    fn global_market_info(
        &self,
        currency_code: &str,
        time_period: TimePeriod,
    ) -> Result<Option<GlobalMarketInfo>> {
        let key = global_market_key(currency_code, time_period);
        Ok(self.read().global_market_info.get(&key).cloned())
    }

    fn save_global_market_info(&self, info: &GlobalMarketInfo) -> Result<()> {
        let key = global_market_key(&info.currency_code, info.time_period);
        debug!("Cache PUT for key: {}", key);
        self.write().global_market_info.insert(key, info.clone());
        Ok(())
    }
}
