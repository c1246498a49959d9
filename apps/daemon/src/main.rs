mod config;
mod main_lib;

use coinfeed_core::AssetRepositoryTrait;
use config::Config;
use main_lib::{build_state, init_tracing};

/// Number of assets listed in the shutdown summary.
const SUMMARY_SIZE: usize = 5;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env();
    if let Some(path) = &config.config_file {
        tracing::debug!("Config file: {}", path.display());
    }
    let state = build_state(&config)?;

    state.scheduler.start().await;
    tracing::info!(
        "Refreshing top {} assets every {} minute(s); press Ctrl-C to stop",
        state.settings.batch_size,
        state.settings.scheduler_interval_minutes
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    state.scheduler.stop().await;

    if let Some(report) = state.scheduler.last_refresh() {
        tracing::info!(
            "Last refresh at {}: {:?}",
            report.completed_at.to_rfc3339(),
            report.outcome
        );
    }

    let top: Vec<String> = state
        .query_service
        .top_by_volume(SUMMARY_SIZE)
        .into_iter()
        .map(|asset| asset.symbol)
        .collect();
    tracing::info!(
        "{} assets stored; top by volume: {}",
        state.repository.len(),
        top.join(", ")
    );

    Ok(())
}
