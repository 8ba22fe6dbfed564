use crate::core::CoinPrice;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

type PriceMap = HashMap<(String, String), CoinPrice>;

/// Latest known spot prices, held in memory for the life of the process.
#[derive(Default)]
pub struct CoinPriceManager {
    prices: Arc<RwLock<PriceMap>>,
}

impl CoinPriceManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn coin_price(&self, coin_uid: &str, currency_code: &str) -> Option<CoinPrice> {
        let prices = self.prices.read().unwrap_or_else(|e| e.into_inner());
        prices
            .get(&(coin_uid.to_string(), currency_code.to_string()))
            .cloned()
    }

    pub fn coin_price_map(
        &self,
        coin_uids: &[String],
        currency_code: &str,
    ) -> HashMap<String, CoinPrice> {
        let prices = self.prices.read().unwrap_or_else(|e| e.into_inner());
        coin_uids
            .iter()
            .filter_map(|uid| {
                prices
                    .get(&(uid.clone(), currency_code.to_string()))
                    .map(|price| (uid.clone(), price.clone()))
            })
            .collect()
    }

    pub fn handle_updated(&self, updated: &HashMap<String, CoinPrice>) {
        let mut prices = self.prices.write().unwrap_or_else(|e| e.into_inner());
        for price in updated.values() {
            prices.insert(
                (price.coin_uid.clone(), price.currency_code.clone()),
                price.clone(),
            );
        }
        debug!(count = updated.len(), "Spot prices updated");
    }
}
