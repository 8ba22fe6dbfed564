//! Error types shared by the sync engine, managers, providers and stores

use thiserror::Error;

/// Errors surfaced by market data operations
#[derive(Debug, Error)]
pub enum MarketError {
    /// Network request failed or timed out
    #[error("Transport error: {0}")]
    Transport(String),

    /// Provider rejected the request because of rate limiting
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Provider has no data for the requested entity
    #[error("No data: {0}")]
    NoData(String),

    /// Provider answered with a payload that could not be decoded
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Historical price was anchored too far from the requested moment
    #[error("Returned timestamp {returned} is too far from requested timestamp {requested}")]
    InaccurateTimestamp { requested: i64, returned: i64 },

    /// Persistence failure
    #[error("Storage error: {0}")]
    Storage(String),
}

impl MarketError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn no_data(msg: impl Into<String>) -> Self {
        Self::NoData(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}

impl From<reqwest::Error> for MarketError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<fjall::Error> for MarketError {
    fn from(err: fjall::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for MarketError {
    fn from(err: serde_json::Error) -> Self {
        Self::Storage(format!("serialization: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, MarketError>;
