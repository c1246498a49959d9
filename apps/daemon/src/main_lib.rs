use std::sync::Arc;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use coinfeed_core::{
    AssetQueryService, AssetRepository, AssetRepositoryTrait, FeedSettings, MarketDataScheduler,
};
use coinfeed_market_data::{CoinGeckoProvider, MarketDataProvider};

use crate::config::Config;

pub struct AppState {
    pub settings: FeedSettings,
    pub repository: Arc<AssetRepository>,
    pub query_service: Arc<AssetQueryService>,
    pub scheduler: Arc<MarketDataScheduler>,
}

/// Install the global subscriber. `log` records from the library crates are
/// forwarded into it.
pub fn init_tracing() {
    let log_format = std::env::var("COINFEED_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let settings = config.settings.clone();
    settings.validate()?;

    let provider: Arc<dyn MarketDataProvider> =
        Arc::new(CoinGeckoProvider::new(settings.provider_config())?);
    tracing::info!("Market data provider: {}", provider.id());

    let repository = Arc::new(AssetRepository::new(settings.storage_path.clone()));
    tracing::info!(
        "Snapshot path in use: {} ({} assets loaded)",
        repository.storage_path().display(),
        repository.len()
    );

    let repository_dyn: Arc<dyn AssetRepositoryTrait> = repository.clone();
    let query_service = Arc::new(AssetQueryService::new(
        repository_dyn.clone(),
        settings.cache_ttl(),
    ));
    let scheduler = Arc::new(MarketDataScheduler::new(
        provider,
        repository_dyn,
        settings.scheduler_config(),
    )?);

    Ok(AppState {
        settings,
        repository,
        query_service,
        scheduler,
    })
}
