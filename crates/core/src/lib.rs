//! Coinfeed Core - caching, persistence, and scheduled refresh.
//!
//! This crate keeps the latest market record per asset in memory, persists
//! it as a JSON snapshot, and refreshes it on a timer from any
//! `MarketDataProvider`. It is transport-agnostic: providers live in the
//! `market-data` crate.

pub mod assets;
pub mod cache;
pub mod errors;
pub mod settings;
pub mod sync;

// Re-export common types
pub use assets::{AssetQueryService, AssetRepository, AssetRepositoryTrait};
pub use cache::TtlCache;
pub use settings::FeedSettings;
pub use sync::{MarketDataScheduler, RefreshOutcome, SchedulerConfig, SchedulerState};

// Re-export error types
pub use errors::Error;
pub use errors::Result;
