//! Market data provider abstractions and implementations.
//!
//! This module contains:
//! - The `MarketDataProvider` trait that all providers implement
//! - The CoinGecko provider used for the top-by-volume feed
//!
//! Providers own their own pacing: rate limiting and transport retries live
//! inside the provider, so callers only ever see a final success or failure.

mod traits;

pub mod coingecko;

// Re-exports
pub use traits::MarketDataProvider;
