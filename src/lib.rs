pub mod cli;
pub mod core;
pub mod managers;
pub mod providers;
pub mod store;
pub mod syncers;

#[cfg(test)]
pub(crate) mod test_utils;

use crate::core::config::AppConfig;
use crate::core::{
    Blockchain, Coin, CoinPrice, FullCoin, GlobalMarketPoint, MarketDataProvider, Result, Storage,
    SyncInfo, TimePeriod, Token, TokenQuery,
};
use crate::managers::{
    CoinHistoricalPriceManager, CoinManager, CoinPriceManager, CoinPriceSyncManager,
    GlobalMarketInfoManager, PriceSubscription,
};
use crate::providers::HsProvider;
use crate::syncers::{CoinSyncer, DataSyncer, SyncOutcome};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};

/// Entry point tying the provider, the local store, the syncers and the
/// managers together.
pub struct MarketKit {
    coin_manager: CoinManager,
    coin_syncer: Arc<CoinSyncer>,
    data_syncer: DataSyncer,
    global_market_manager: GlobalMarketInfoManager,
    historical_price_manager: CoinHistoricalPriceManager,
    price_manager: Arc<CoinPriceManager>,
    price_sync_manager: CoinPriceSyncManager,
}

impl MarketKit {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let provider = Arc::new(HsProvider::from_config(&config.provider)?);
        let storage = store::open_storage(config);
        Ok(Self::with_components(
            provider,
            storage,
            config.price_refresh_interval(),
        ))
    }

    pub fn with_components(
        provider: Arc<dyn MarketDataProvider>,
        storage: Arc<dyn Storage>,
        price_refresh_interval: Duration,
    ) -> Self {
        let coin_syncer = Arc::new(CoinSyncer::new(provider.clone(), storage.clone()));
        let price_manager = Arc::new(CoinPriceManager::new());

        Self {
            coin_manager: CoinManager::new(storage.clone()),
            data_syncer: DataSyncer::new(provider.clone(), coin_syncer.clone()),
            coin_syncer,
            global_market_manager: GlobalMarketInfoManager::new(provider.clone(), storage.clone()),
            historical_price_manager: CoinHistoricalPriceManager::new(provider.clone(), storage),
            price_sync_manager: CoinPriceSyncManager::new(
                provider,
                price_manager.clone(),
                price_refresh_interval,
            ),
            price_manager,
        }
    }

    // Catalog

    /// Starts a catalog sync in the background.
    pub fn sync(&self) {
        self.data_syncer.sync();
    }

    pub async fn sync_now(&self) -> SyncOutcome {
        let outcome = self.data_syncer.sync_now().await;
        info!(?outcome, "Catalog sync finished");
        outcome
    }

    /// Waits for the sync started by [`MarketKit::sync`].
    pub async fn wait_for_sync(&self) -> Option<SyncOutcome> {
        self.data_syncer.wait().await
    }

    pub fn sync_info(&self) -> Result<SyncInfo> {
        self.coin_syncer.sync_info()
    }

    /// Receives a unit value each time a new catalog snapshot is stored.
    pub fn full_coins_updated(&self) -> UnboundedReceiver<()> {
        self.coin_syncer.full_coins_updated()
    }

    pub fn all_coins(&self) -> Result<Vec<Coin>> {
        self.coin_manager.all_coins()
    }

    pub fn full_coin(&self, uid: &str) -> Result<Option<FullCoin>> {
        self.coin_manager.full_coin(uid)
    }

    pub fn full_coins(&self, filter: &str, limit: usize) -> Result<Vec<FullCoin>> {
        self.coin_manager.full_coins(filter, limit)
    }

    pub fn token(&self, query: &TokenQuery) -> Result<Option<Token>> {
        self.coin_manager.token(query)
    }

    pub fn all_blockchains(&self) -> Result<Vec<Blockchain>> {
        self.coin_manager.all_blockchains()
    }

    pub fn blockchain(&self, uid: &str) -> Result<Option<Blockchain>> {
        self.coin_manager.blockchain(uid)
    }

    // Market data

    pub async fn global_market_points(
        &self,
        currency_code: &str,
        time_period: TimePeriod,
    ) -> Result<Vec<GlobalMarketPoint>> {
        self.global_market_manager
            .global_market_points(currency_code, time_period)
            .await
    }

    pub async fn coin_historical_price_single(
        &self,
        coin_uid: &str,
        currency_code: &str,
        timestamp: i64,
    ) -> Result<Decimal> {
        self.historical_price_manager
            .coin_historical_price_single(coin_uid, currency_code, timestamp)
            .await
    }

    pub fn coin_historical_price(
        &self,
        coin_uid: &str,
        currency_code: &str,
        timestamp: i64,
    ) -> Result<Option<Decimal>> {
        self.historical_price_manager
            .coin_historical_price(coin_uid, currency_code, timestamp)
    }

    // Spot prices

    pub fn coin_price(&self, coin_uid: &str, currency_code: &str) -> Option<CoinPrice> {
        self.price_manager.coin_price(coin_uid, currency_code)
    }

    pub fn coin_price_map(
        &self,
        coin_uids: &[String],
        currency_code: &str,
    ) -> HashMap<String, CoinPrice> {
        self.price_manager.coin_price_map(coin_uids, currency_code)
    }

    pub fn coin_price_subscription(
        &self,
        tag: &str,
        coin_uid: &str,
        currency_code: &str,
    ) -> PriceSubscription<CoinPrice> {
        self.price_sync_manager
            .coin_price_subscription(tag, coin_uid, currency_code)
    }

    pub fn coin_price_map_subscription(
        &self,
        tag: &str,
        coin_uids: &[String],
        currency_code: &str,
    ) -> PriceSubscription<HashMap<String, CoinPrice>> {
        self.price_sync_manager
            .coin_price_map_subscription(tag, coin_uids, currency_code)
    }

    pub fn refresh_coin_prices(&self, currency_code: &str) {
        self.price_sync_manager.refresh(currency_code);
    }

    /// Stops background catalog sync and all price polling.
    pub fn stop(&self) {
        self.data_syncer.stop();
        self.price_sync_manager.stop();
        debug!("MarketKit stopped");
    }
}

/// Commands that need a configured [`MarketKit`].
pub enum AppCommand {
    Sync,
    SyncInfo,
    Coins { filter: String, limit: usize },
    GlobalMarket { period: TimePeriod },
    HistoricalPrice { coin_uid: String, timestamp: i64 },
    Prices { coin_uids: Vec<String>, updates: usize },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let kit = MarketKit::new(&config)?;
    let currency = config.currency.as_str();

    let result = match command {
        AppCommand::Sync => cli::catalog::sync(&kit).await,
        AppCommand::SyncInfo => cli::catalog::sync_info(&kit),
        AppCommand::Coins { filter, limit } => cli::catalog::coins(&kit, &filter, limit),
        AppCommand::GlobalMarket { period } => {
            cli::market::global_market(&kit, currency, period).await
        }
        AppCommand::HistoricalPrice {
            coin_uid,
            timestamp,
        } => cli::market::historical_price(&kit, &coin_uid, currency, timestamp).await,
        AppCommand::Prices { coin_uids, updates } => {
            cli::prices::run(&kit, &coin_uids, currency, updates).await
        }
    };

    kit.stop();
    result
}
