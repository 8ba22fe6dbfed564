//! Market data types: prices, global market series and sync stamps

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum TimePeriod {
    Day1,
    Week1,
    Week2,
    Month1,
    Month3,
    Month6,
    Year1,
    Year2,
}

impl TimePeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimePeriod::Day1 => "1d",
            TimePeriod::Week1 => "1w",
            TimePeriod::Week2 => "2w",
            TimePeriod::Month1 => "1m",
            TimePeriod::Month3 => "3m",
            TimePeriod::Month6 => "6m",
            TimePeriod::Year1 => "1y",
            TimePeriod::Year2 => "2y",
        }
    }
}

impl Display for TimePeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TimePeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1d" => Ok(TimePeriod::Day1),
            "1w" => Ok(TimePeriod::Week1),
            "2w" => Ok(TimePeriod::Week2),
            "1m" => Ok(TimePeriod::Month1),
            "3m" => Ok(TimePeriod::Month3),
            "6m" => Ok(TimePeriod::Month6),
            "1y" => Ok(TimePeriod::Year1),
            "2y" => Ok(TimePeriod::Year2),
            _ => Err(format!("Invalid time period: {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalMarketPoint {
    pub timestamp: i64,
    pub market_cap: Decimal,
    pub volume_24h: Decimal,
    pub defi_market_cap: Option<Decimal>,
    pub tvl: Option<Decimal>,
    pub btc_dominance: Option<Decimal>,
}

/// Persisted global market series; `timestamp` is when it was fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalMarketInfo {
    pub currency_code: String,
    pub time_period: TimePeriod,
    pub points: Vec<GlobalMarketPoint>,
    pub timestamp: i64,
}

/// Persisted historical price. `timestamp` is the requested timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinHistoricalPrice {
    pub coin_uid: String,
    pub currency_code: String,
    pub value: Decimal,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinPrice {
    pub coin_uid: String,
    pub currency_code: String,
    pub value: Decimal,
    pub diff_24h: Option<Decimal>,
    pub timestamp: i64,
}

/// Version stamps announced by the remote side for each catalog entity set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CatalogStamps {
    pub coins: i64,
    pub blockchains: i64,
    pub tokens: i64,
}

impl CatalogStamps {
    pub fn new(coins: i64, blockchains: i64, tokens: i64) -> Self {
        Self {
            coins,
            blockchains,
            tokens,
        }
    }
}

/// Stamps currently persisted; `None` until the first successful sync.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SyncInfo {
    pub coins_timestamp: Option<String>,
    pub blockchains_timestamp: Option<String>,
    pub tokens_timestamp: Option<String>,
}
