pub mod coin;
pub mod coin_price;
pub mod global_market;
pub mod historical_price;
pub mod price_sync;
pub mod scheduler;

pub use coin::CoinManager;
pub use coin_price::CoinPriceManager;
pub use global_market::GlobalMarketInfoManager;
pub use historical_price::CoinHistoricalPriceManager;
pub use price_sync::{CoinPriceSyncManager, PriceSubscription};
