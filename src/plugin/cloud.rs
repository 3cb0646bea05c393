//! Plugin that orders and slices scenarios using service timings.
//!
//! | Hook | Behavior |
//! |------|----------|
//! | `on_order` | Sorts by duration when a direction is configured |
//! | `on_startup` | Starts a new launch; with more than one worker, ignores every scenario outside this worker's slice |
//! | `on_scenario_end` | Records an execution record |
//! | `on_cleanup` | Posts the history batch once, best effort |
//!
//! Timings are fetched at most once per run, on the first hook that needs
//! them. Failing to fetch them aborts the run with the configured exit code.

use async_trait::async_trait;
use tracing::{debug, error, info};

use super::{Plugin, PluginError, PluginResult, ScenarioScheduler};
use crate::config::{Config, ConfigError};
use crate::history::HistoryAggregator;
use crate::scenario::{Scenario, ScenarioResult};
use crate::scheduling::{ScenarioOrderer, SlicePartitioner, WorkerSelector};
use crate::timing::{Durations, TimingService, TimingStore};

/// Duration-aware ordering, slicing and history for one run.
pub struct CloudPlugin<S> {
    store: TimingStore<S>,
    orderer: Option<ScenarioOrderer>,
    selector: Option<WorkerSelector>,
    history: HistoryAggregator,
    exit_code: i32,
    verbose: bool,
}

impl<S: TimingService> CloudPlugin<S> {
    /// Creates the plugin from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns the first configuration problem found by [`Config::validate`].
    pub fn new(service: S, config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;

        let report_id = config.cloud.report_id.clone();
        let store = TimingStore::new(service, report_id.clone())
            .with_retry(config.cloud.retry.policy());

        Ok(Self {
            store,
            orderer: config.order.direction.map(ScenarioOrderer::new),
            selector: config.selector()?,
            history: HistoryAggregator::new(report_id),
            exit_code: config.cloud.exit_code,
            verbose: config.cloud.verbose,
        })
    }

    pub fn store(&self) -> &TimingStore<S> {
        &self.store
    }

    pub fn history(&self) -> &HistoryAggregator {
        &self.history
    }

    pub fn selector(&self) -> Option<WorkerSelector> {
        self.selector
    }

    /// Returns the timing snapshot, fetching it on first use.
    async fn durations(&mut self) -> PluginResult<&Durations> {
        let exit_code = self.exit_code;
        let verbose = self.verbose;

        let durations = self.store.fetch_durations().await.map_err(|source| {
            error!("Failed to retrieve timings: {}", source);
            PluginError::TimingUnavailable { exit_code, source }
        })?;

        if verbose {
            info!("Retrieved timings: {}", durations.len());
        }
        Ok(durations)
    }
}

#[async_trait]
impl<S: TimingService + 'static> Plugin for CloudPlugin<S> {
    fn name(&self) -> &str {
        "cloud"
    }

    async fn on_order(&mut self, scenarios: Vec<Scenario>) -> PluginResult<Vec<Scenario>> {
        let Some(orderer) = self.orderer else {
            return Ok(scenarios);
        };

        let durations = self.durations().await?;
        debug!(
            "Ordering {} scenarios ({})",
            scenarios.len(),
            orderer.direction()
        );
        Ok(orderer.sort(scenarios, durations))
    }

    async fn on_startup(&mut self, scheduler: &mut ScenarioScheduler) -> PluginResult<()> {
        let launch_id = self.history.begin_launch().to_string();
        debug!("Launch {}", launch_id);

        let Some(selector) = self.selector else {
            return Ok(());
        };
        if selector.total() == 1 {
            return Ok(());
        }

        let durations = self.durations().await?;
        let ignored: Vec<String> =
            SlicePartitioner::ignored(scheduler.scenarios(), durations, selector)
                .into_iter()
                .map(|s| s.hash.clone())
                .collect();

        for hash in &ignored {
            scheduler.ignore(hash);
        }

        info!(
            "Worker {}/{}: {} scenarios scheduled, {} ignored",
            selector.index() + 1,
            selector.total(),
            scheduler.scenarios().len() - ignored.len(),
            ignored.len()
        );
        Ok(())
    }

    async fn on_scenario_end(&mut self, result: &ScenarioResult) {
        self.history.record(result);
    }

    async fn on_cleanup(&mut self) {
        match self.history.flush(&self.store).await {
            Ok(sent) => {
                if self.verbose {
                    info!("Posted history: {}", sent);
                }
            }
            Err(e) => error!("Failed to send history: {}", e),
        }
    }
}
