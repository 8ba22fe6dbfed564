use crate::core::{CoinHistoricalPrice, MarketDataProvider, MarketError, Result, Storage};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, warn};

/// Maximum distance, in seconds, between the requested timestamp and the
/// one the provider answers with.
pub const MAX_TIMESTAMP_DRIFT: i64 = 24 * 60 * 60;

pub struct CoinHistoricalPriceManager {
    provider: Arc<dyn MarketDataProvider>,
    storage: Arc<dyn Storage>,
}

impl CoinHistoricalPriceManager {
    pub fn new(provider: Arc<dyn MarketDataProvider>, storage: Arc<dyn Storage>) -> Self {
        Self { provider, storage }
    }

    /// Stored price for the exact key, or a fetched one if the provider's
    /// timestamp is close enough to `timestamp`. Stored prices never expire.
    pub async fn coin_historical_price_single(
        &self,
        coin_uid: &str,
        currency_code: &str,
        timestamp: i64,
    ) -> Result<Decimal> {
        if let Some(stored) = self
            .storage
            .historical_price(coin_uid, currency_code, timestamp)?
        {
            debug!(coin = %coin_uid, timestamp, "Historical price cache HIT");
            return Ok(stored.value);
        }

        let response = self
            .provider
            .fetch_historical_price(coin_uid, currency_code, timestamp)
            .await?;

        if (timestamp - response.timestamp).abs() >= MAX_TIMESTAMP_DRIFT {
            warn!(
                coin = %coin_uid,
                requested = timestamp,
                returned = response.timestamp,
                "Discarding inaccurate historical price"
            );
            return Err(MarketError::InaccurateTimestamp {
                requested: timestamp,
                returned: response.timestamp,
            });
        }

        self.storage.save_historical_price(&CoinHistoricalPrice {
            coin_uid: coin_uid.to_string(),
            currency_code: currency_code.to_string(),
            value: response.price,
            timestamp,
        })?;

        Ok(response.price)
    }

    /// Stored price only; never touches the network.
    pub fn coin_historical_price(
        &self,
        coin_uid: &str,
        currency_code: &str,
        timestamp: i64,
    ) -> Result<Option<Decimal>> {
        Ok(self
            .storage
            .historical_price(coin_uid, currency_code, timestamp)?
            .map(|price| price.value))
    }
}
