//! Coinfeed Market Data Crate
//!
//! This crate fetches and normalizes third-party crypto market data.
//!
//! # Overview
//!
//! The market data crate supports:
//! - Fetching the top assets by trading volume from CoinGecko
//! - Minimum-spacing rate limiting of outbound calls
//! - Transport retries with exponential backoff for transient failures
//! - Lenient normalization with per-item skip diagnostics
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +------------------+
//! |   RateLimiter    | --> |    Provider      |  (CoinGecko)
//! +------------------+     +------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          |  RetryPolicy     |  (429 / 5xx / transport)
//!                          +------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          |   Normalizer     |  (raw JSON -> records)
//!                          +------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          |   AssetRecord    |
//!                          +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`AssetRecord`] - Normalized market data for one asset
//! - [`NormalizedBatch`] - Records kept plus items skipped, with reasons
//! - [`MarketDataProvider`] - Trait implemented by every data source
//! - [`MarketDataError`] - Error taxonomy with retry classification

pub mod errors;
pub mod models;
pub mod normalize;
pub mod provider;
pub mod throttle;

pub use errors::{MarketDataError, RetryClass};
pub use models::AssetRecord;
pub use normalize::{
    normalize_item, normalize_item_with_symbol, normalize_markets, NormalizedBatch, SkipReason,
    SkippedItem,
};

// Re-export provider types
pub use provider::coingecko::{CoinGeckoConfig, CoinGeckoProvider};
pub use provider::MarketDataProvider;

// Re-export pacing types
pub use throttle::{RateLimiter, RetryPolicy};
