//! Scheduled refresh of market data into the asset repository.

mod scheduler;

pub use scheduler::{
    MarketDataScheduler, RefreshOutcome, RefreshReport, SchedulerConfig, SchedulerState,
};
