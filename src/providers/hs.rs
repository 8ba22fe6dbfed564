use crate::core::config::ProviderConfig;
use crate::core::provider::{
    BlockchainResponse, CoinResponse, HistoricalPriceResponse, TokenResponse,
};
use crate::core::{
    CatalogStamps, CoinPrice, GlobalMarketPoint, MarketDataProvider, MarketError, Result,
    TimePeriod,
};
use async_trait::async_trait;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use tracing::{debug, instrument};

const USER_AGENT: &str = concat!("marketkit/", env!("CARGO_PKG_VERSION"));

/// Client for the market data JSON API.
pub struct HsProvider {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    coins: i64,
    blockchains: i64,
    tokens: i64,
}

#[derive(Debug, Deserialize)]
struct GlobalMarketPointResponse {
    date: i64,
    market_cap: Decimal,
    #[serde(alias = "total_volume")]
    volume: Decimal,
    defi_market_cap: Option<Decimal>,
    tvl: Option<Decimal>,
    btc_dominance: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct CoinPriceResponse {
    uid: String,
    price: Option<Decimal>,
    price_change_24h: Option<Decimal>,
    last_updated: Option<i64>,
}

impl HsProvider {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        Self::new(&config.base_url, config.api_key.clone())
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!(url = %url, "Requesting market data");

        // Sent once; a failed request is not retried here.
        let mut request = self.client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.header("apikey", key);
        }
        let response = request.send().await?;

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => return Err(MarketError::RateLimitExceeded),
            StatusCode::NOT_FOUND => return Err(MarketError::no_data(endpoint)),
            status if !status.is_success() => {
                return Err(MarketError::transport(format!(
                    "HTTP {status} for {endpoint}"
                )));
            }
            _ => {}
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            MarketError::InvalidResponse(format!("{endpoint}: {e}. Response: '{text}'"))
        })
    }
}

#[async_trait]
impl MarketDataProvider for HsProvider {
    #[instrument(name = "StatusFetch", skip(self))]
    async fn fetch_status(&self) -> Result<CatalogStamps> {
        let status: StatusResponse = self.get("/status/updates").await?;
        Ok(CatalogStamps::new(
            status.coins,
            status.blockchains,
            status.tokens,
        ))
    }

    #[instrument(name = "CoinsFetch", skip(self))]
    async fn fetch_coins(&self) -> Result<Vec<CoinResponse>> {
        self.get("/coins/list").await
    }

    #[instrument(name = "BlockchainsFetch", skip(self))]
    async fn fetch_blockchains(&self) -> Result<Vec<BlockchainResponse>> {
        self.get("/blockchains/list").await
    }

    #[instrument(name = "TokensFetch", skip(self))]
    async fn fetch_tokens(&self) -> Result<Vec<TokenResponse>> {
        self.get("/tokens/list").await
    }

    #[instrument(name = "HistoricalPriceFetch", skip(self))]
    async fn fetch_historical_price(
        &self,
        coin_uid: &str,
        currency_code: &str,
        timestamp: i64,
    ) -> Result<HistoricalPriceResponse> {
        self.get(&format!(
            "/coins/{coin_uid}/price_history?currency={}&timestamp={timestamp}",
            currency_code.to_lowercase()
        ))
        .await
    }

    #[instrument(name = "GlobalMarketFetch", skip(self))]
    async fn fetch_global_market_points(
        &self,
        currency_code: &str,
        time_period: TimePeriod,
    ) -> Result<Vec<GlobalMarketPoint>> {
        let points: Vec<GlobalMarketPointResponse> = self
            .get(&format!(
                "/global-markets?currency={}&interval={time_period}",
                currency_code.to_lowercase()
            ))
            .await?;

        Ok(points
            .into_iter()
            .map(|p| GlobalMarketPoint {
                timestamp: p.date,
                market_cap: p.market_cap,
                volume_24h: p.volume,
                defi_market_cap: p.defi_market_cap,
                tvl: p.tvl,
                btc_dominance: p.btc_dominance,
            })
            .collect())
    }

    #[instrument(name = "CoinPricesFetch", skip(self), fields(count = coin_uids.len()))]
    async fn fetch_coin_prices(
        &self,
        coin_uids: &[String],
        currency_code: &str,
    ) -> Result<HashMap<String, CoinPrice>> {
        if coin_uids.is_empty() {
            return Ok(HashMap::new());
        }

        let responses: Vec<CoinPriceResponse> = self
            .get(&format!(
                "/coins?uids={}&currency={}&fields=price,price_change_24h,last_updated",
                coin_uids.join(","),
                currency_code.to_lowercase()
            ))
            .await?;

        // Entries without a price or update time are skipped.
        Ok(responses
            .into_iter()
            .filter_map(|r| {
                let (value, timestamp) = (r.price?, r.last_updated?);
                Some((
                    r.uid.clone(),
                    CoinPrice {
                        coin_uid: r.uid,
                        currency_code: currency_code.to_string(),
                        value,
                        diff_24h: r.price_change_24h,
                        timestamp,
                    },
                ))
            })
            .collect())
    }
}
