//! CoinGecko provider implementation.
//!
//! Fetches the top assets by trading volume from the public CoinGecko API.
//! No API key is required for this endpoint.
//!
//! # API Endpoints
//!
//! - Markets: `{base_url}/coins/markets?vs_currency=usd&order=volume_desc&per_page={limit}&page=1&sparkline=false&price_change_percentage=24h,7d`
//!
//! # Response Format
//!
//! A JSON array with one object per asset. Numeric fields are usually JSON
//! numbers but may be null or, occasionally, strings.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, info, warn};
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::errors::{MarketDataError, RetryClass};
use crate::models::AssetRecord;
use crate::normalize::{normalize_markets, NormalizedBatch};
use crate::provider::MarketDataProvider;
use crate::throttle::{min_interval_for, parse_retry_after, RateLimiter, RetryPolicy};

pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";
const PROVIDER_ID: &str = "COINGECKO";
const MARKETS_ENDPOINT: &str = "coins/markets";

/// Default HTTP request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Free tier allows roughly 50 calls per minute.
const DEFAULT_REQUESTS_PER_MINUTE: u32 = 50;

/// Connection settings for [`CoinGeckoProvider`].
#[derive(Clone, Debug)]
pub struct CoinGeckoConfig {
    /// API root, e.g. `https://api.coingecko.com/api/v3`. A trailing `/` is fine.
    pub base_url: String,
    /// Per-attempt HTTP timeout.
    pub request_timeout: Duration,
    /// Outbound request budget; requests are spaced `60 / n` seconds apart.
    pub requests_per_minute: u32,
    /// Transport retry behavior.
    pub retry: RetryPolicy,
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: REQUEST_TIMEOUT,
            requests_per_minute: DEFAULT_REQUESTS_PER_MINUTE,
            retry: RetryPolicy::default(),
        }
    }
}

/// A failed single attempt, with the server's `Retry-After` hint if any.
struct FailedAttempt {
    error: MarketDataError,
    retry_after: Option<Duration>,
}

impl From<MarketDataError> for FailedAttempt {
    fn from(error: MarketDataError) -> Self {
        Self {
            error,
            retry_after: None,
        }
    }
}

/// CoinGecko provider for the top-by-volume market feed.
///
/// # Example
///
/// ```ignore
/// let provider = CoinGeckoProvider::new(CoinGeckoConfig::default())?;
/// let records = provider.fetch_top(50, "usd").await?;
/// ```
pub struct CoinGeckoProvider {
    client: Client,
    markets_url: String,
    limiter: RateLimiter,
    retry: RetryPolicy,
}

impl CoinGeckoProvider {
    /// Create a new CoinGecko provider.
    ///
    /// Fails with [`MarketDataError::InvalidConfig`] for a zero request budget.
    pub fn new(config: CoinGeckoConfig) -> Result<Self, MarketDataError> {
        let min_interval = min_interval_for(config.requests_per_minute).ok_or_else(|| {
            MarketDataError::InvalidConfig("requests_per_minute must be greater than 0".into())
        })?;

        let client = Client::builder().timeout(config.request_timeout).build()?;

        Ok(Self {
            client,
            markets_url: markets_url(&config.base_url),
            limiter: RateLimiter::new(min_interval),
            retry: config.retry,
        })
    }

    /// Full URL of the markets endpoint.
    pub fn markets_url(&self) -> &str {
        &self.markets_url
    }

    /// Fetch and normalize one page of markets, keeping the skip diagnostics.
    pub async fn fetch_batch(
        &self,
        limit: usize,
        currency: &str,
    ) -> Result<NormalizedBatch, MarketDataError> {
        let per_page = limit.to_string();
        let params = [
            ("vs_currency", currency),
            ("order", "volume_desc"),
            ("per_page", per_page.as_str()),
            ("page", "1"),
            ("sparkline", "false"),
            ("price_change_percentage", "24h,7d"),
        ];

        self.limiter.acquire().await;

        info!("Fetching top {} coins from {}", limit, self.markets_url);
        let body = self
            .get_with_retry(&params)
            .await
            .inspect_err(log_fetch_failure)?;

        let payload: Value = serde_json::from_slice(&body)
            .map_err(|e| MarketDataError::Decode {
                provider: PROVIDER_ID.to_string(),
                message: e.to_string(),
            })
            .inspect_err(log_fetch_failure)?;

        let batch = normalize_markets(PROVIDER_ID, &payload).inspect_err(log_fetch_failure)?;

        if batch.skip_count() > 0 {
            info!(
                "Skipped {} malformed item(s) from {}",
                batch.skip_count(),
                PROVIDER_ID
            );
            debug!("Normalization for {}: {}", PROVIDER_ID, batch.summary());
        }

        Ok(batch)
    }

    /// Send the markets request, retrying transient failures per the policy.
    async fn get_with_retry(&self, params: &[(&str, &str)]) -> Result<Vec<u8>, MarketDataError> {
        let mut retries = 0u32;

        loop {
            let failure = match self.send_once(params).await {
                Ok(body) => return Ok(body),
                Err(failure) => failure,
            };

            if failure.error.retry_class() != RetryClass::WithBackoff
                || retries >= self.retry.max_retries
            {
                return Err(failure.error);
            }

            retries += 1;
            let delay = self.retry.delay_for(retries, failure.retry_after);

            if failure.error.is_rate_limited() {
                warn!(
                    "Rate limit exceeded (429) on {}; retry {}/{} in {:?}",
                    PROVIDER_ID, retries, self.retry.max_retries, delay
                );
            } else {
                warn!(
                    "Request to {} failed ({}); retry {}/{} in {:?}",
                    PROVIDER_ID, failure.error, retries, self.retry.max_retries, delay
                );
            }

            if delay > Duration::ZERO {
                tokio::time::sleep(delay).await;
            }
        }
    }

    /// A single HTTP attempt.
    async fn send_once(&self, params: &[(&str, &str)]) -> Result<Vec<u8>, FailedAttempt> {
        let response = self
            .client
            .get(&self.markets_url)
            .query(params)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_retry_after);

            let error = if status == StatusCode::TOO_MANY_REQUESTS {
                MarketDataError::RateLimited {
                    provider: PROVIDER_ID.to_string(),
                }
            } else {
                MarketDataError::Http {
                    provider: PROVIDER_ID.to_string(),
                    status: status.as_u16(),
                }
            };
            return Err(FailedAttempt { error, retry_after });
        }

        let body = response.bytes().await.map_err(transport_error)?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl MarketDataProvider for CoinGeckoProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch_top(
        &self,
        limit: usize,
        currency: &str,
    ) -> Result<Vec<AssetRecord>, MarketDataError> {
        Ok(self.fetch_batch(limit, currency).await?.into_records())
    }
}

fn markets_url(base_url: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), MARKETS_ENDPOINT)
}

fn transport_error(e: reqwest::Error) -> FailedAttempt {
    if e.is_timeout() {
        MarketDataError::Timeout {
            provider: PROVIDER_ID.to_string(),
        }
        .into()
    } else {
        MarketDataError::Network(e).into()
    }
}

fn log_fetch_failure(error: &MarketDataError) {
    match error {
        MarketDataError::RateLimited { .. } => {
            warn!("Rate limit exceeded (429).");
            error!("HTTP error occurred: {}", error);
        }
        MarketDataError::Http { .. } => error!("HTTP error occurred: {}", error),
        MarketDataError::Decode { .. } => error!("Failed to parse JSON response: {}", error),
        _ => error!("Request failed: {}", error),
    }
}
