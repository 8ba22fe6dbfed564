//! Remote data source abstraction and the raw records it returns

use super::error::Result;
use super::market::{CatalogStamps, CoinPrice, GlobalMarketPoint, TimePeriod};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize)]
pub struct CoinResponse {
    pub uid: String,
    pub name: String,
    pub code: String,
    pub market_cap_rank: Option<u32>,
    pub coingecko_id: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockchainResponse {
    pub uid: String,
    pub name: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub coin_uid: String,
    pub blockchain_uid: String,
    #[serde(rename = "type")]
    pub token_type: String,
    pub decimals: Option<u8>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoricalPriceResponse {
    pub timestamp: i64,
    pub price: Decimal,
}

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn fetch_status(&self) -> Result<CatalogStamps>;

    async fn fetch_coins(&self) -> Result<Vec<CoinResponse>>;

    async fn fetch_blockchains(&self) -> Result<Vec<BlockchainResponse>>;

    async fn fetch_tokens(&self) -> Result<Vec<TokenResponse>>;

    async fn fetch_historical_price(
        &self,
        coin_uid: &str,
        currency_code: &str,
        timestamp: i64,
    ) -> Result<HistoricalPriceResponse>;

    async fn fetch_global_market_points(
        &self,
        currency_code: &str,
        time_period: TimePeriod,
    ) -> Result<Vec<GlobalMarketPoint>>;

    /// Latest prices keyed by coin uid. Coins unknown upstream are absent.
    async fn fetch_coin_prices(
        &self,
        coin_uids: &[String],
        currency_code: &str,
    ) -> Result<HashMap<String, CoinPrice>>;
}
