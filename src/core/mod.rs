//! Core abstractions and domain types

pub mod config;
pub mod error;
pub mod log;
pub mod market;
pub mod models;
pub mod notify;
pub mod provider;
pub mod storage;

// Re-export main types for cleaner imports
pub use error::{MarketError, Result};
pub use market::{
    CatalogStamps, CoinHistoricalPrice, CoinPrice, GlobalMarketInfo, GlobalMarketPoint, SyncInfo,
    TimePeriod,
};
pub use models::{
    AddressType, Blockchain, BlockchainType, Coin, Derivation, FullCoin, Token, TokenEntity,
    TokenQuery, TokenType,
};
pub use provider::MarketDataProvider;
pub use storage::Storage;
