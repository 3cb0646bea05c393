//! Host lifecycle integration.
//!
//! The host test runtime drives a run through a fixed sequence of hooks.
//! Plugins implement [`Plugin`] and are registered with a [`Dispatcher`],
//! which fans every hook out to the plugins in registration order:
//!
//! ```text
//!   on_order(scenarios) ──► on_startup(scheduler) ──► on_scenario_end(result)* ──► on_cleanup()
//! ```
//!
//! If ordering or startup fails the run is aborted: the error is returned to
//! the host and no further hooks are delivered.
//!
//! Hooks take `&mut self` and are delivered one at a time, so plugins need
//! no internal synchronization.

pub mod cloud;

use std::collections::HashSet;

use async_trait::async_trait;
use tracing::debug;

use crate::scenario::{Scenario, ScenarioResult};
use crate::timing::TimingError;

pub use cloud::CloudPlugin;

/// Result type for plugin hooks.
pub type PluginResult<T> = Result<T, PluginError>;

/// Errors that abort a run.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// Timings were required but could not be retrieved.
    #[error("Failed to retrieve timings: {source}")]
    TimingUnavailable {
        exit_code: i32,
        #[source]
        source: TimingError,
    },
}

impl PluginError {
    /// Process exit code the host should terminate with.
    pub fn exit_code(&self) -> i32 {
        match self {
            PluginError::TimingUnavailable { exit_code, .. } => *exit_code,
        }
    }
}

/// The runnable scenarios of a run, plus the ones a plugin asked to ignore.
///
/// # Example
///
/// ```
/// use timeslice::plugin::ScenarioScheduler;
/// use timeslice::scenario::Scenario;
///
/// let mut scheduler = ScenarioScheduler::new(vec![Scenario::new("a"), Scenario::new("b")]);
/// scheduler.ignore("a");
///
/// let scheduled: Vec<_> = scheduler.scheduled().map(|s| s.hash.as_str()).collect();
/// assert_eq!(scheduled, ["b"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScenarioScheduler {
    scenarios: Vec<Scenario>,
    ignored: HashSet<String>,
}

impl ScenarioScheduler {
    pub fn new(scenarios: Vec<Scenario>) -> Self {
        Self {
            scenarios,
            ignored: HashSet::new(),
        }
    }

    /// All scenarios, including ignored ones, in execution order.
    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// Marks a scenario as not to be run by this worker.
    pub fn ignore(&mut self, hash: &str) {
        debug!("Ignoring scenario {}", hash);
        self.ignored.insert(hash.to_string());
    }

    pub fn is_ignored(&self, hash: &str) -> bool {
        self.ignored.contains(hash)
    }

    pub fn ignored_count(&self) -> usize {
        self.scenarios
            .iter()
            .filter(|s| self.is_ignored(&s.hash))
            .count()
    }

    /// Scenarios that are still scheduled, in execution order.
    pub fn scheduled(&self) -> impl Iterator<Item = &Scenario> {
        self.scenarios.iter().filter(|s| !self.is_ignored(&s.hash))
    }
}

/// A set of lifecycle hooks registered with the host.
///
/// Every hook has a no-op default, so a plugin only implements what it needs.
#[async_trait]
pub trait Plugin: Send {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Called once with the discovered scenarios; returns them reordered.
    async fn on_order(&mut self, scenarios: Vec<Scenario>) -> PluginResult<Vec<Scenario>> {
        Ok(scenarios)
    }

    /// Called once before any scenario runs.
    async fn on_startup(&mut self, _scheduler: &mut ScenarioScheduler) -> PluginResult<()> {
        Ok(())
    }

    /// Called after each scenario passes, fails or is skipped.
    async fn on_scenario_end(&mut self, _result: &ScenarioResult) {}

    /// Called once when the run finishes.
    async fn on_cleanup(&mut self) {}
}

/// Delivers lifecycle hooks to registered plugins.
pub struct Dispatcher {
    plugins: Vec<Box<dyn Plugin>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
        }
    }

    /// Registers a plugin. Hooks are delivered in registration order.
    pub fn with_plugin<P: Plugin + 'static>(mut self, plugin: P) -> Self {
        debug!("Registered plugin {}", plugin.name());
        self.plugins.push(Box::new(plugin));
        self
    }

    pub async fn order(&mut self, mut scenarios: Vec<Scenario>) -> PluginResult<Vec<Scenario>> {
        for plugin in &mut self.plugins {
            scenarios = plugin.on_order(scenarios).await?;
        }
        Ok(scenarios)
    }

    pub async fn startup(&mut self, scheduler: &mut ScenarioScheduler) -> PluginResult<()> {
        for plugin in &mut self.plugins {
            plugin.on_startup(scheduler).await?;
        }
        Ok(())
    }

    pub async fn scenario_end(&mut self, result: &ScenarioResult) {
        for plugin in &mut self.plugins {
            plugin.on_scenario_end(result).await;
        }
    }

    pub async fn cleanup(&mut self) {
        for plugin in &mut self.plugins {
            plugin.on_cleanup().await;
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::ScenarioStatus;
    use std::sync::{Arc, Mutex};

    /// Records every hook it receives.
    struct Recorder {
        name: String,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Plugin for Recorder {
        fn name(&self) -> &str {
            &self.name
        }

        async fn on_order(&mut self, mut scenarios: Vec<Scenario>) -> PluginResult<Vec<Scenario>> {
            self.log.lock().unwrap().push(format!("{}:order", self.name));
            scenarios.reverse();
            Ok(scenarios)
        }

        async fn on_startup(&mut self, scheduler: &mut ScenarioScheduler) -> PluginResult<()> {
            self.log.lock().unwrap().push(format!("{}:startup", self.name));
            scheduler.ignore("b");
            Ok(())
        }

        async fn on_scenario_end(&mut self, result: &ScenarioResult) {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}:end:{}", self.name, result.scenario.hash));
        }

        async fn on_cleanup(&mut self) {
            self.log.lock().unwrap().push(format!("{}:cleanup", self.name));
        }
    }

    /// Uses only the default hooks.
    struct Passive;

    #[async_trait]
    impl Plugin for Passive {
        fn name(&self) -> &str {
            "passive"
        }
    }

    fn recorder(name: &str, log: &Arc<Mutex<Vec<String>>>) -> Recorder {
        Recorder {
            name: name.to_string(),
            log: Arc::clone(log),
        }
    }

    #[tokio::test]
    async fn test_hooks_fan_out_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = Dispatcher::new()
            .with_plugin(recorder("first", &log))
            .with_plugin(Passive)
            .with_plugin(recorder("second", &log));

        let scenarios = vec![Scenario::new("a"), Scenario::new("b"), Scenario::new("c")];
        let ordered = dispatcher.order(scenarios).await.unwrap();
        // Reversed twice.
        let hashes: Vec<_> = ordered.iter().map(|s| s.hash.as_str()).collect();
        assert_eq!(hashes, ["a", "b", "c"]);

        let mut scheduler = ScenarioScheduler::new(ordered);
        dispatcher.startup(&mut scheduler).await.unwrap();
        assert_eq!(scheduler.ignored_count(), 1);

        let result = ScenarioResult::new(Scenario::new("a"), ScenarioStatus::Passed);
        dispatcher.scenario_end(&result).await;
        dispatcher.cleanup().await;

        assert_eq!(
            *log.lock().unwrap(),
            [
                "first:order",
                "second:order",
                "first:startup",
                "second:startup",
                "first:end:a",
                "second:end:a",
                "first:cleanup",
                "second:cleanup",
            ]
        );
    }

    #[test]
    fn test_scheduler_ignore() {
        let mut scheduler =
            ScenarioScheduler::new(vec![Scenario::new("a"), Scenario::new("b"), Scenario::new("c")]);
        scheduler.ignore("b");
        scheduler.ignore("b");
        scheduler.ignore("unknown");

        assert!(scheduler.is_ignored("b"));
        assert_eq!(scheduler.ignored_count(), 1);
        let scheduled: Vec<_> = scheduler.scheduled().map(|s| s.hash.as_str()).collect();
        assert_eq!(scheduled, ["a", "c"]);
        assert_eq!(scheduler.scenarios().len(), 3);
    }

    #[test]
    fn test_exit_code() {
        let err = PluginError::TimingUnavailable {
            exit_code: 9,
            source: TimingError::Client("boom".to_string()),
        };
        assert_eq!(err.exit_code(), 9);
        assert!(err.to_string().contains("boom"));
    }
}
