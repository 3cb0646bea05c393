//! Execution history collected during a run.
//!
//! The [`HistoryAggregator`] appends one [`ExecutionRecord`] for every
//! finished scenario and hands the whole batch to the timing service once,
//! at cleanup. Delivery is at most once: the batch is cleared whether the
//! submission succeeds or not.

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::scenario::{ScenarioResult, ScenarioStatus};
use crate::timing::{TimingResult, TimingService, TimingStore};

/// One scenario outcome, as submitted to the timing service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// Unique id of this record.
    pub id: String,
    /// Launch (run) the record belongs to.
    pub launch_id: String,
    /// Report used to group launches, if any.
    pub report_id: Option<String>,

    pub scenario_hash: String,
    pub scenario_rel_path: String,
    pub scenario_subject: String,
    pub scenario_namespace: String,

    pub status: ScenarioStatus,
    /// Start time in milliseconds since epoch.
    pub started_at: i64,
    /// End time in milliseconds since epoch.
    pub ended_at: i64,
}

/// Converts epoch seconds to rounded epoch milliseconds.
fn to_millis(secs: Option<f64>) -> i64 {
    (secs.unwrap_or(0.0) * 1000.0).round() as i64
}

/// Accumulates execution records for one launch.
///
/// # Example
///
/// ```
/// use timeslice::history::HistoryAggregator;
/// use timeslice::scenario::{Scenario, ScenarioResult, ScenarioStatus};
///
/// let mut history = HistoryAggregator::new(Some("nightly".to_string()));
/// history.record(
///     &ScenarioResult::new(Scenario::new("9f2c"), ScenarioStatus::Passed).with_times(1.0, 2.5),
/// );
///
/// assert_eq!(history.len(), 1);
/// assert_eq!(history.records()[0].ended_at, 2500);
/// ```
#[derive(Debug, Clone)]
pub struct HistoryAggregator {
    launch_id: String,
    report_id: Option<String>,
    records: Vec<ExecutionRecord>,
}

impl HistoryAggregator {
    /// Creates an aggregator with a fresh launch id.
    pub fn new(report_id: Option<String>) -> Self {
        Self {
            launch_id: Uuid::new_v4().to_string(),
            report_id,
            records: Vec::new(),
        }
    }

    /// Uses an explicit launch id instead of a generated one.
    pub fn with_launch_id(mut self, launch_id: impl Into<String>) -> Self {
        self.launch_id = launch_id.into();
        self
    }

    /// Starts a new launch with a fresh id.
    pub fn begin_launch(&mut self) -> &str {
        self.launch_id = Uuid::new_v4().to_string();
        debug!("Started launch {}", self.launch_id);
        &self.launch_id
    }

    /// Returns the current launch id.
    pub fn launch_id(&self) -> &str {
        &self.launch_id
    }

    /// Returns the records accumulated so far.
    pub fn records(&self) -> &[ExecutionRecord] {
        &self.records
    }

    /// Returns the number of accumulated records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Appends a record for a finished scenario.
    pub fn record(&mut self, result: &ScenarioResult) {
        let scenario = &result.scenario;
        self.records.push(ExecutionRecord {
            id: Uuid::new_v4().to_string(),
            launch_id: self.launch_id.clone(),
            report_id: self.report_id.clone(),
            scenario_hash: scenario.hash.clone(),
            scenario_rel_path: scenario.rel_path.to_string_lossy().to_string(),
            scenario_subject: scenario.subject.clone(),
            scenario_namespace: scenario.namespace.clone(),
            status: result.status,
            started_at: to_millis(result.started_at),
            ended_at: to_millis(result.ended_at),
        });
    }

    /// Submits the accumulated batch and clears it.
    ///
    /// The batch is cleared before the result is known, so a failed
    /// submission loses the records. Returns the number of records sent.
    pub async fn flush<S: TimingService>(&mut self, store: &TimingStore<S>) -> TimingResult<usize> {
        let batch = std::mem::take(&mut self.records);
        store.submit_history(&batch).await?;
        Ok(batch.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::Scenario;
    use crate::timing::Durations;
    use crate::timing::mock::MockService;

    fn result(hash: &str, status: ScenarioStatus) -> ScenarioResult {
        ScenarioResult::new(
            Scenario::new(hash)
                .with_rel_path("scenarios/login.py")
                .with_subject("login")
                .with_namespace("auth"),
            status,
        )
    }

    #[test]
    fn test_timestamps_rounded_to_millis() {
        assert_eq!(to_millis(Some(1.0004)), 1000);
        assert_eq!(to_millis(Some(1.0006)), 1001);
        assert_eq!(to_millis(None), 0);
    }

    #[test]
    fn test_record_copies_metadata() {
        let mut history = HistoryAggregator::new(Some("nightly".to_string())).with_launch_id("L1");
        history.record(&result("a", ScenarioStatus::Failed).with_times(10.0, 12.5));

        let record = &history.records()[0];
        assert_eq!(record.launch_id, "L1");
        assert_eq!(record.report_id.as_deref(), Some("nightly"));
        assert_eq!(record.scenario_hash, "a");
        assert_eq!(record.scenario_rel_path, "scenarios/login.py");
        assert_eq!(record.scenario_subject, "login");
        assert_eq!(record.scenario_namespace, "auth");
        assert_eq!(record.status, ScenarioStatus::Failed);
        assert_eq!(record.started_at, 10_000);
        assert_eq!(record.ended_at, 12_500);
    }

    #[test]
    fn test_every_status_is_recorded() {
        let mut history = HistoryAggregator::new(None);
        history.record(&result("a", ScenarioStatus::Passed));
        history.record(&result("b", ScenarioStatus::Failed));
        history.record(&result("c", ScenarioStatus::Skipped));

        assert_eq!(history.len(), 3);
        let ids: std::collections::HashSet<_> = history.records().iter().map(|r| &r.id).collect();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_begin_launch_changes_id() {
        let mut history = HistoryAggregator::new(None).with_launch_id("old");
        let new_id = history.begin_launch().to_string();
        assert_ne!(new_id, "old");
        assert_eq!(history.launch_id(), new_id);
    }

    #[test]
    fn test_flush_submits_and_clears() {
        let store = TimingStore::new(MockService::new(Durations::new()), None);
        let mut history = HistoryAggregator::new(None);
        history.record(&result("a", ScenarioStatus::Passed));
        history.record(&result("b", ScenarioStatus::Passed));

        let sent = tokio_test::block_on(history.flush(&store)).unwrap();

        assert_eq!(sent, 2);
        assert!(history.is_empty());
        assert_eq!(store.service().posted().len(), 2);
    }

    #[test]
    fn test_flush_failure_still_clears() {
        let store = TimingStore::new(MockService::new(Durations::new()).failing_posts(), None);
        let mut history = HistoryAggregator::new(None);
        history.record(&result("a", ScenarioStatus::Passed));

        let outcome = tokio_test::block_on(history.flush(&store));

        assert!(outcome.is_err());
        assert!(history.is_empty());
        assert_eq!(store.service().post_calls(), 1);
    }
}
