//! Background refresh loop: fetch the top assets, upsert them, wait, repeat.
//!
//! The scheduler owns at most one worker task. `stop` cancels it and waits
//! for it to exit, so once `stop` returns no further fetch or upsert from
//! this scheduler can happen.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use log::{debug, error, info, warn};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use coinfeed_market_data::MarketDataProvider;

use crate::assets::AssetRepositoryTrait;
use crate::errors::{Error, Result};

/// Refresh cadence and request shape.
#[derive(Clone, Debug, PartialEq)]
pub struct SchedulerConfig {
    /// Wait between the end of one cycle and the start of the next.
    pub interval: Duration,
    /// Number of assets requested per cycle.
    pub batch_size: usize,
    /// Quote currency passed to the provider.
    pub currency: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5 * 60),
            batch_size: 50,
            currency: "usd".to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    Stopped,
    Running,
}

/// What a single refresh cycle did.
#[derive(Clone, Debug, PartialEq)]
pub enum RefreshOutcome {
    /// Records were fetched and handed to the repository.
    Updated { fetched: usize, applied: usize },
    /// The provider answered with no records; the repository was not touched.
    Empty,
    /// The provider failed; the repository was not touched.
    FetchFailed(String),
    /// The in-memory update went through but the snapshot could not be written.
    PersistFailed(String),
}

/// Outcome of the most recent cycle and when it finished.
#[derive(Clone, Debug, PartialEq)]
pub struct RefreshReport {
    pub completed_at: DateTime<Utc>,
    pub outcome: RefreshOutcome,
}

struct Worker {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

struct SchedulerInner {
    provider: Arc<dyn MarketDataProvider>,
    repository: Arc<dyn AssetRepositoryTrait>,
    config: SchedulerConfig,
    last_refresh: Mutex<Option<RefreshReport>>,
}

/// Periodically pulls market data from a provider into a repository.
///
/// # Example
///
/// ```ignore
/// let scheduler = MarketDataScheduler::new(provider, repository, SchedulerConfig::default())?;
/// scheduler.start().await;
/// // ...
/// scheduler.stop().await;
/// ```
pub struct MarketDataScheduler {
    inner: Arc<SchedulerInner>,
    worker: tokio::sync::Mutex<Option<Worker>>,
}

impl MarketDataScheduler {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        repository: Arc<dyn AssetRepositoryTrait>,
        config: SchedulerConfig,
    ) -> Result<Self> {
        if config.interval.is_zero() {
            return Err(Error::Scheduler(
                "refresh interval must be greater than 0".into(),
            ));
        }
        if config.batch_size == 0 {
            return Err(Error::Scheduler("batch size must be greater than 0".into()));
        }

        Ok(Self {
            inner: Arc::new(SchedulerInner {
                provider,
                repository,
                config,
                last_refresh: Mutex::new(None),
            }),
            worker: tokio::sync::Mutex::new(None),
        })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.inner.config
    }

    /// Spawns the worker. Calling `start` while running is a no-op.
    pub async fn start(&self) {
        let mut worker = self.worker.lock().await;

        if let Some(existing) = worker.as_ref() {
            if !existing.handle.is_finished() {
                warn!("Market data scheduler is already running");
                return;
            }
            warn!("Previous scheduler worker exited unexpectedly, replacing it");
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_worker(self.inner.clone(), cancel.clone()));
        *worker = Some(Worker { cancel, handle });

        info!(
            "Market data scheduler started (every {:?}, top {} in {})",
            self.inner.config.interval, self.inner.config.batch_size, self.inner.config.currency
        );
    }

    /// Cancels the worker and waits for it to exit.
    ///
    /// An in-flight cycle is allowed to finish; the wait between cycles is
    /// cut short.
    pub async fn stop(&self) {
        let mut worker = self.worker.lock().await;

        let Some(Worker { cancel, handle }) = worker.take() else {
            debug!("Market data scheduler is not running");
            return;
        };

        info!("Stopping market data scheduler...");
        cancel.cancel();
        if let Err(e) = handle.await {
            error!("Market data scheduler worker ended abnormally: {}", e);
        }
        info!("Market data scheduler stopped");
    }

    pub async fn state(&self) -> SchedulerState {
        match self.worker.lock().await.as_ref() {
            Some(worker) if !worker.handle.is_finished() => SchedulerState::Running,
            _ => SchedulerState::Stopped,
        }
    }

    pub async fn is_running(&self) -> bool {
        self.state().await == SchedulerState::Running
    }

    /// Runs one fetch-and-upsert cycle immediately. Never fails; the
    /// outcome says what happened.
    pub async fn refresh_now(&self) -> RefreshOutcome {
        self.inner.refresh().await
    }

    pub fn last_refresh(&self) -> Option<RefreshReport> {
        self.inner.lock_last_refresh().clone()
    }
}

impl SchedulerInner {
    async fn refresh(&self) -> RefreshOutcome {
        let outcome = self.fetch_and_store().await;
        *self.lock_last_refresh() = Some(RefreshReport {
            completed_at: Utc::now(),
            outcome: outcome.clone(),
        });
        outcome
    }

    async fn fetch_and_store(&self) -> RefreshOutcome {
        let provider_id = self.provider.id();
        debug!("Refreshing top {} assets from {}", self.config.batch_size, provider_id);

        let records = match self
            .provider
            .fetch_top(self.config.batch_size, &self.config.currency)
            .await
        {
            Ok(records) => records,
            Err(e) => {
                error!("Market data fetch from {} failed: {}", provider_id, e);
                return RefreshOutcome::FetchFailed(e.to_string());
            }
        };

        if records.is_empty() {
            warn!("No market data fetched from {} in this cycle", provider_id);
            return RefreshOutcome::Empty;
        }

        let fetched = records.len();
        let repository = self.repository.clone();
        match tokio::task::spawn_blocking(move || repository.upsert(records)).await {
            Ok(Ok(applied)) => {
                info!("Updated {} of {} fetched asset(s)", applied, fetched);
                RefreshOutcome::Updated { fetched, applied }
            }
            Ok(Err(e)) => {
                error!("Failed to persist refreshed assets: {}", e);
                RefreshOutcome::PersistFailed(e.to_string())
            }
            Err(e) => {
                error!("Asset upsert task failed: {}", e);
                RefreshOutcome::PersistFailed(e.to_string())
            }
        }
    }

    fn lock_last_refresh(&self) -> MutexGuard<'_, Option<RefreshReport>> {
        self.last_refresh.lock().unwrap_or_else(|poisoned| {
            warn!("Scheduler status mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

async fn run_worker(inner: Arc<SchedulerInner>, cancel: CancellationToken) {
    debug!("Scheduler worker running");

    loop {
        if cancel.is_cancelled() {
            break;
        }

        if let Err(panic) = AssertUnwindSafe(inner.refresh()).catch_unwind().await {
            error!("Refresh cycle panicked: {}", panic_message(panic.as_ref()));
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(inner.config.interval) => {}
        }
    }

    debug!("Scheduler worker exiting");
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
