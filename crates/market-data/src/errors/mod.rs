//! Error types and retry classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The main error enum for all market data operations
//! - [`RetryClass`]: Classification for determining retry behavior

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

use crate::throttle::is_retryable_status;

/// Errors that can occur during market data operations.
///
/// Each variant is classified into a [`RetryClass`] via the [`retry_class`](Self::retry_class)
/// method, which determines whether the transport layer may try again.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The provider rate limited the request (HTTP 429).
    /// Retried with backoff; surfaced once the retry budget is spent.
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
    },

    /// The provider answered with a non-success HTTP status.
    #[error("HTTP error from {provider}: status {status}")]
    Http {
        /// The provider that returned the status
        provider: String,
        /// The HTTP status code
        status: u16,
    },

    /// The request to the provider timed out.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// The response body could not be decoded into the expected structure.
    /// A payload that is not a JSON array lands here too.
    #[error("Failed to decode response from {provider}: {message}")]
    Decode {
        /// The provider that returned the body
        provider: String,
        /// What went wrong while decoding
        message: String,
    },

    /// The provider was constructed with unusable settings.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A network error occurred while communicating with a provider.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl MarketDataError {
    /// Returns the retry classification for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use coinfeed_market_data::errors::{MarketDataError, RetryClass};
    ///
    /// let error = MarketDataError::RateLimited { provider: "COINGECKO".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    ///
    /// let error = MarketDataError::Http { provider: "COINGECKO".to_string(), status: 404 };
    /// assert_eq!(error.retry_class(), RetryClass::Never);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::RateLimited { .. } | Self::Timeout { .. } => RetryClass::WithBackoff,

            Self::Http { status, .. } if is_retryable_status(*status) => RetryClass::WithBackoff,

            // A request that could not even be built will fail the same way again
            Self::Network(e) if e.is_builder() => RetryClass::Never,
            Self::Network(_) => RetryClass::WithBackoff,

            Self::Http { .. } | Self::Decode { .. } | Self::InvalidConfig(_) => RetryClass::Never,
        }
    }

    /// Returns true when the upstream signalled rate limiting.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}
