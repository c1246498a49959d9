use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde_json::{Map, Value};
use tracing::{info, warn};

use coinfeed_core::FeedSettings;

pub const ENV_PREFIX: &str = "COINFEED_";
pub const CONFIG_FILE_VAR: &str = "COINFEED_CONFIG";

pub struct Config {
    pub settings: FeedSettings,
    /// JSON file the settings were merged from, if one was given.
    pub config_file: Option<PathBuf>,
}

impl Config {
    /// Resolve settings: defaults, then the JSON config file, then the environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let config_file = lookup(CONFIG_FILE_VAR)
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);

        let mut settings = match &config_file {
            Some(path) => settings_with_file(path),
            None => FeedSettings::default(),
        };
        apply_env_overrides(&mut settings, &lookup);

        Self {
            settings,
            config_file,
        }
    }
}

fn settings_with_file(path: &Path) -> FeedSettings {
    let overrides = match read_config_file(path) {
        Some(overrides) => overrides,
        None => return FeedSettings::default(),
    };

    let mut merged = match serde_json::to_value(FeedSettings::default()) {
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to serialize default settings: {}", e);
            return FeedSettings::default();
        }
    };
    deep_merge(&mut merged, overrides);

    match serde_json::from_value(merged) {
        Ok(settings) => {
            info!("Loaded configuration from {}", path.display());
            settings
        }
        Err(e) => {
            warn!(
                "Ignoring config file {}: invalid value ({})",
                path.display(),
                e
            );
            FeedSettings::default()
        }
    }
}

fn read_config_file(path: &Path) -> Option<Map<String, Value>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Could not read config file {}: {}", path.display(), e);
            return None;
        }
    };

    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => {
            warn!(
                "Ignoring config file {}: expected a JSON object",
                path.display()
            );
            None
        }
        Err(e) => {
            warn!("Ignoring config file {}: invalid JSON ({})", path.display(), e);
            None
        }
    }
}

/// Recursively merge `overrides` into `base`. Nested objects merge key by
/// key; any other value replaces what was there.
pub fn deep_merge(base: &mut Value, overrides: Map<String, Value>) {
    let Value::Object(base_map) = base else {
        *base = Value::Object(overrides);
        return;
    };

    for (key, value) in overrides {
        match (base_map.get_mut(&key), value) {
            (Some(existing), Value::Object(nested)) if existing.is_object() => {
                deep_merge(existing, nested)
            }
            (_, value) => {
                base_map.insert(key, value);
            }
        }
    }
}

fn apply_env_overrides<F>(settings: &mut FeedSettings, lookup: &F)
where
    F: Fn(&str) -> Option<String>,
{
    override_from_env(lookup, "API_BASE_URL", &mut settings.api_base_url);
    override_from_env(lookup, "REQUEST_TIMEOUT_SECS", &mut settings.request_timeout_secs);
    override_from_env(lookup, "RATE_LIMIT_REQUESTS", &mut settings.rate_limit_requests);
    override_from_env(lookup, "CACHE_TTL_MINUTES", &mut settings.cache_ttl_minutes);
    override_from_env(
        lookup,
        "SCHEDULER_INTERVAL_MINUTES",
        &mut settings.scheduler_interval_minutes,
    );
    override_from_env(lookup, "BATCH_SIZE", &mut settings.batch_size);
    override_from_env(lookup, "CURRENCY", &mut settings.currency);
    override_from_env(lookup, "STORAGE_PATH", &mut settings.storage_path);
}

/// Replace `target` with the parsed value of `COINFEED_<name>`, if set.
/// Unparsable values are logged and leave `target` unchanged.
fn override_from_env<F, T>(lookup: &F, name: &str, target: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    let key = format!("{ENV_PREFIX}{name}");
    let Some(raw) = lookup(&key) else {
        return;
    };

    match raw.trim().parse::<T>() {
        Ok(value) => *target = value,
        Err(e) => warn!("Ignoring {}={:?}: {}", key, raw, e),
    }
}
