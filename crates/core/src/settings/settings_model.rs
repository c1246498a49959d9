//! Runtime settings for the market data feed.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use coinfeed_market_data::provider::coingecko::DEFAULT_BASE_URL;
use coinfeed_market_data::{CoinGeckoConfig, RetryPolicy};

use crate::errors::{Error, Result};
use crate::sync::SchedulerConfig;

pub const DEFAULT_STORAGE_PATH: &str = "./data/crypto_assets.json";

/// All tunables of the feed, with defaults for every field.
///
/// Field names double as keys of the JSON config file, so a partial file
/// only overrides what it names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedSettings {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    /// Outbound request budget per minute.
    pub rate_limit_requests: u32,
    /// Lifetime of memoized query results.
    pub cache_ttl_minutes: u64,
    pub scheduler_interval_minutes: u64,
    /// Number of assets requested per refresh.
    pub batch_size: usize,
    /// Quote currency, e.g. `usd`.
    pub currency: String,
    /// Location of the JSON snapshot.
    pub storage_path: PathBuf,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 10,
            rate_limit_requests: 50,
            cache_ttl_minutes: 5,
            scheduler_interval_minutes: 5,
            batch_size: 50,
            currency: "usd".to_string(),
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
        }
    }
}

impl FeedSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_minutes.saturating_mul(60))
    }

    pub fn scheduler_interval(&self) -> Duration {
        Duration::from_secs(self.scheduler_interval_minutes.saturating_mul(60))
    }

    /// Rejects settings the feed cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(Error::InvalidConfigValue(
                "api_base_url must not be empty".into(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::InvalidConfigValue(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }
        if self.rate_limit_requests == 0 {
            return Err(Error::InvalidConfigValue(
                "rate_limit_requests must be greater than 0".into(),
            ));
        }
        if self.scheduler_interval_minutes == 0 {
            return Err(Error::InvalidConfigValue(
                "scheduler_interval_minutes must be greater than 0".into(),
            ));
        }
        if self.batch_size == 0 {
            return Err(Error::InvalidConfigValue(
                "batch_size must be greater than 0".into(),
            ));
        }
        if self.currency.trim().is_empty() {
            return Err(Error::InvalidConfigValue(
                "currency must not be empty".into(),
            ));
        }
        Ok(())
    }

    pub fn provider_config(&self) -> CoinGeckoConfig {
        CoinGeckoConfig {
            base_url: self.api_base_url.clone(),
            request_timeout: self.request_timeout(),
            requests_per_minute: self.rate_limit_requests,
            retry: RetryPolicy::default(),
        }
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            interval: self.scheduler_interval(),
            batch_size: self.batch_size,
            currency: self.currency.trim().to_lowercase(),
        }
    }
}
