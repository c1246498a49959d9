//! Market data provider trait definitions.
//!
//! This module defines the core `MarketDataProvider` trait that all
//! market data providers must implement.

use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::AssetRecord;

/// Trait for market data providers.
///
/// Implement this trait to add support for a new market data source, or to
/// stand in for one in tests.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use coinfeed_market_data::{AssetRecord, MarketDataError, MarketDataProvider};
///
/// struct FixedProvider;
///
/// #[async_trait]
/// impl MarketDataProvider for FixedProvider {
///     fn id(&self) -> &'static str {
///         "FIXED"
///     }
///
///     async fn fetch_top(&self, _limit: usize, _currency: &str) -> Result<Vec<AssetRecord>, MarketDataError> {
///         Ok(vec![AssetRecord::new("bitcoin", "BTC")])
///     }
/// }
/// ```
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Unique identifier for this provider.
    ///
    /// Should be a constant string like "COINGECKO".
    /// Used for logging and error attribution.
    fn id(&self) -> &'static str;

    /// Fetch the top `limit` assets by trading volume, quoted in `currency`.
    ///
    /// # Returns
    ///
    /// Normalized records in the provider's own ordering (descending volume).
    /// Malformed items are left out rather than reported as errors; only a
    /// transport failure, an exhausted retry budget, or an undecodable
    /// payload produces a `MarketDataError`.
    async fn fetch_top(
        &self,
        limit: usize,
        currency: &str,
    ) -> Result<Vec<AssetRecord>, MarketDataError>;
}
