//! Shared fixtures and a scriptable in-memory provider for unit tests

use crate::core::provider::{
    BlockchainResponse, CoinResponse, HistoricalPriceResponse, TokenResponse,
};
use crate::core::{
    Blockchain, CatalogStamps, Coin, CoinHistoricalPrice, CoinPrice, GlobalMarketInfo,
    GlobalMarketPoint, MarketDataProvider, MarketError, Result, Storage, TimePeriod, TokenEntity,
};
use crate::store::memory::MemoryStorage;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

pub(crate) fn coin_response(uid: &str, code: &str) -> CoinResponse {
    CoinResponse {
        uid: uid.to_string(),
        name: uid.to_string(),
        code: code.to_string(),
        market_cap_rank: None,
        coingecko_id: Some(uid.to_string()),
        image: None,
    }
}

pub(crate) fn blockchain_response(uid: &str) -> BlockchainResponse {
    BlockchainResponse {
        uid: uid.to_string(),
        name: uid.to_string(),
        url: None,
    }
}

pub(crate) fn token_response(
    coin_uid: &str,
    blockchain_uid: &str,
    token_type: &str,
    address: Option<&str>,
) -> TokenResponse {
    TokenResponse {
        coin_uid: coin_uid.to_string(),
        blockchain_uid: blockchain_uid.to_string(),
        token_type: token_type.to_string(),
        decimals: Some(8),
        address: address.map(str::to_string),
    }
}

pub(crate) fn market_point(timestamp: i64) -> GlobalMarketPoint {
    GlobalMarketPoint {
        timestamp,
        market_cap: Decimal::new(2_000_000_000, 0),
        volume_24h: Decimal::new(80_000_000, 0),
        defi_market_cap: None,
        tvl: None,
        btc_dominance: Some(Decimal::new(5210, 2)),
    }
}

/// Provider returning canned data and recording every call it receives.
pub(crate) struct MockProvider {
    pub stamps: Mutex<CatalogStamps>,
    pub coins: Mutex<Vec<CoinResponse>>,
    pub blockchains: Mutex<Vec<BlockchainResponse>>,
    pub tokens: Mutex<Vec<TokenResponse>>,
    pub historical: Mutex<Option<HistoricalPriceResponse>>,
    pub global_points: Mutex<Vec<GlobalMarketPoint>>,
    pub prices: Mutex<HashMap<String, Decimal>>,
    pub fail_tokens: AtomicBool,
    pub fail_prices: AtomicBool,
    pub catalog_delay: Mutex<Option<Duration>>,
    pub coins_calls: AtomicUsize,
    pub blockchains_calls: AtomicUsize,
    pub tokens_calls: AtomicUsize,
    pub historical_calls: AtomicUsize,
    pub global_calls: AtomicUsize,
    pub price_requests: Mutex<Vec<Vec<String>>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            stamps: Mutex::new(CatalogStamps::default()),
            coins: Mutex::new(vec![
                coin_response("bitcoin", "btc"),
                coin_response("litecoin", "ltc"),
                coin_response("bitcoin-cash", "bch"),
                coin_response("tether", "usdt"),
            ]),
            blockchains: Mutex::new(vec![
                blockchain_response("bitcoin"),
                blockchain_response("litecoin"),
                blockchain_response("bitcoin-cash"),
                blockchain_response("ethereum"),
            ]),
            tokens: Mutex::new(vec![
                token_response("bitcoin", "bitcoin", "native", None),
                token_response("litecoin", "litecoin", "native", None),
                token_response("bitcoin-cash", "bitcoin-cash", "native", None),
                token_response("tether", "ethereum", "eip20", Some("0xdac17f958d2ee523")),
            ]),
            historical: Mutex::new(None),
            global_points: Mutex::new(vec![market_point(1_700_000_000)]),
            prices: Mutex::new(HashMap::new()),
            fail_tokens: AtomicBool::new(false),
            fail_prices: AtomicBool::new(false),
            catalog_delay: Mutex::new(None),
            coins_calls: AtomicUsize::new(0),
            blockchains_calls: AtomicUsize::new(0),
            tokens_calls: AtomicUsize::new(0),
            historical_calls: AtomicUsize::new(0),
            global_calls: AtomicUsize::new(0),
            price_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn set_price(&self, coin_uid: &str, value: Decimal) {
        self.prices
            .lock()
            .unwrap()
            .insert(coin_uid.to_string(), value);
    }

    pub fn catalog_calls(&self) -> usize {
        self.coins_calls.load(Ordering::SeqCst)
            + self.blockchains_calls.load(Ordering::SeqCst)
            + self.tokens_calls.load(Ordering::SeqCst)
    }

    pub fn price_requests(&self) -> Vec<Vec<String>> {
        self.price_requests.lock().unwrap().clone()
    }

    async fn catalog_pause(&self) {
        let delay = *self.catalog_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl MarketDataProvider for MockProvider {
    async fn fetch_status(&self) -> Result<CatalogStamps> {
        Ok(*self.stamps.lock().unwrap())
    }

    async fn fetch_coins(&self) -> Result<Vec<CoinResponse>> {
        self.coins_calls.fetch_add(1, Ordering::SeqCst);
        self.catalog_pause().await;
        Ok(self.coins.lock().unwrap().clone())
    }

    async fn fetch_blockchains(&self) -> Result<Vec<BlockchainResponse>> {
        self.blockchains_calls.fetch_add(1, Ordering::SeqCst);
        self.catalog_pause().await;
        Ok(self.blockchains.lock().unwrap().clone())
    }

    async fn fetch_tokens(&self) -> Result<Vec<TokenResponse>> {
        self.tokens_calls.fetch_add(1, Ordering::SeqCst);
        self.catalog_pause().await;
        if self.fail_tokens.load(Ordering::SeqCst) {
            return Err(MarketError::transport("connection reset"));
        }
        Ok(self.tokens.lock().unwrap().clone())
    }

    async fn fetch_historical_price(
        &self,
        coin_uid: &str,
        _currency_code: &str,
        _timestamp: i64,
    ) -> Result<HistoricalPriceResponse> {
        self.historical_calls.fetch_add(1, Ordering::SeqCst);
        self.historical
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| MarketError::no_data(coin_uid))
    }

    async fn fetch_global_market_points(
        &self,
        _currency_code: &str,
        _time_period: TimePeriod,
    ) -> Result<Vec<GlobalMarketPoint>> {
        self.global_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.global_points.lock().unwrap().clone())
    }

    async fn fetch_coin_prices(
        &self,
        coin_uids: &[String],
        currency_code: &str,
    ) -> Result<HashMap<String, CoinPrice>> {
        let mut requested = coin_uids.to_vec();
        requested.sort();
        self.price_requests.lock().unwrap().push(requested);

        if self.fail_prices.load(Ordering::SeqCst) {
            return Err(MarketError::RateLimitExceeded);
        }

        let prices = self.prices.lock().unwrap();
        Ok(coin_uids
            .iter()
            .filter_map(|uid| {
                prices.get(uid).map(|value| {
                    (
                        uid.clone(),
                        CoinPrice {
                            coin_uid: uid.clone(),
                            currency_code: currency_code.to_string(),
                            value: *value,
                            diff_24h: None,
                            timestamp: 1_700_000_000,
                        },
                    )
                })
            })
            .collect())
    }
}

/// Memory store whose writes can be switched to fail.
pub(crate) struct FailingStorage {
    inner: MemoryStorage,
    pub fail_replace: AtomicBool,
    pub fail_sync_state: AtomicBool,
}

impl FailingStorage {
    pub fn new() -> Self {
        Self {
            inner: MemoryStorage::new(),
            fail_replace: AtomicBool::new(false),
            fail_sync_state: AtomicBool::new(false),
        }
    }
}

impl Storage for FailingStorage {
    fn replace_catalog(
        &self,
        coins: &[Coin],
        blockchains: &[Blockchain],
        tokens: &[TokenEntity],
    ) -> Result<()> {
        if self.fail_replace.load(Ordering::SeqCst) {
            return Err(MarketError::storage("disk full"));
        }
        self.inner.replace_catalog(coins, blockchains, tokens)
    }

    fn all_coins(&self) -> Result<Vec<Coin>> {
        self.inner.all_coins()
    }

    fn all_blockchains(&self) -> Result<Vec<Blockchain>> {
        self.inner.all_blockchains()
    }

    fn all_tokens(&self) -> Result<Vec<TokenEntity>> {
        self.inner.all_tokens()
    }

    fn sync_state(&self, key: &str) -> Result<Option<String>> {
        self.inner.sync_state(key)
    }

    fn save_sync_state(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_sync_state.load(Ordering::SeqCst) {
            return Err(MarketError::storage("disk full"));
        }
        self.inner.save_sync_state(key, value)
    }

    fn historical_price(
        &self,
        coin_uid: &str,
        currency_code: &str,
        timestamp: i64,
    ) -> Result<Option<CoinHistoricalPrice>> {
        self.inner.historical_price(coin_uid, currency_code, timestamp)
    }

    fn save_historical_price(&self, price: &CoinHistoricalPrice) -> Result<()> {
        self.inner.save_historical_price(price)
    }

    fn global_market_info(
        &self,
        currency_code: &str,
        time_period: TimePeriod,
    ) -> Result<Option<GlobalMarketInfo>> {
        self.inner.global_market_info(currency_code, time_period)
    }

    fn save_global_market_info(&self, info: &GlobalMarketInfo) -> Result<()> {
        self.inner.save_global_market_info(info)
    }
}
