//! Core error types for coinfeed.
//!
//! Provider failures arrive as [`MarketDataError`] and are wrapped as-is;
//! filesystem and JSON failures from the snapshot store convert through
//! `From` so `?` works throughout the crate.

use thiserror::Error;

use coinfeed_market_data::MarketDataError;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the core crate.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Market data operation failed: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Scheduler error: {0}")]
    Scheduler(String),

    #[error("Invalid configuration value: {0}")]
    InvalidConfigValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_data_error_converts() {
        let err: Error = MarketDataError::RateLimited {
            provider: "COINGECKO".to_string(),
        }
        .into();
        assert!(matches!(err, Error::MarketData(_)));
        assert_eq!(
            err.to_string(),
            "Market data operation failed: Rate limited: COINGECKO"
        );
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().starts_with("I/O error"));
    }
}
