//! Persistence abstraction consumed by the syncers and managers

use super::error::Result;
use super::market::{CoinHistoricalPrice, GlobalMarketInfo, TimePeriod};
use super::models::{Blockchain, Coin, TokenEntity};

/// Durable storage for the catalog, sync bookkeeping and derived caches.
///
/// Implementations must make `replace_catalog` atomic: readers observe either
/// the previous catalog or the new one, never a mix.
pub trait Storage: Send + Sync {
    fn replace_catalog(
        &self,
        coins: &[Coin],
        blockchains: &[Blockchain],
        tokens: &[TokenEntity],
    ) -> Result<()>;

    fn all_coins(&self) -> Result<Vec<Coin>>;

    fn all_blockchains(&self) -> Result<Vec<Blockchain>>;

    fn all_tokens(&self) -> Result<Vec<TokenEntity>>;

    fn sync_state(&self, key: &str) -> Result<Option<String>>;

    fn save_sync_state(&self, key: &str, value: &str) -> Result<()>;

    fn historical_price(
        &self,
        coin_uid: &str,
        currency_code: &str,
        timestamp: i64,
    ) -> Result<Option<CoinHistoricalPrice>>;

    fn save_historical_price(&self, price: &CoinHistoricalPrice) -> Result<()>;

    fn global_market_info(
        &self,
        currency_code: &str,
        time_period: TimePeriod,
    ) -> Result<Option<GlobalMarketInfo>>;

    fn save_global_market_info(&self, info: &GlobalMarketInfo) -> Result<()>;
}

pub(crate) fn historical_price_key(coin_uid: &str, currency_code: &str, timestamp: i64) -> String {
    format!("{coin_uid}|{currency_code}|{timestamp}")
}

pub(crate) fn global_market_key(currency_code: &str, time_period: TimePeriod) -> String {
    format!("{currency_code}|{time_period}")
}
