//! Scenario data model.
//!
//! A [`Scenario`] is the unit the ordering and slicing engine works on. It is
//! identified by a stable `hash`; every other attribute is descriptive
//! metadata passed through to execution history.
//!
//! Scenarios and their results are exchanged with the host as JSON:
//!
//! ```json
//! [
//!   {"hash": "9f2c", "rel_path": "scenarios/login.py", "subject": "login", "namespace": "auth"},
//!   {"hash": "41aa", "rel_path": "scenarios/logout.py", "subject": "logout", "namespace": "auth", "skipped": true}
//! ]
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// A single executable test scenario.
///
/// # Example
///
/// ```
/// use timeslice::scenario::Scenario;
///
/// let scenario = Scenario::new("9f2c")
///     .with_rel_path("scenarios/login.py")
///     .with_subject("login");
///
/// assert_eq!(scenario.hash, "9f2c");
/// assert!(!scenario.skipped);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Stable identifier of the scenario across runs.
    pub hash: String,

    /// Path of the scenario file relative to the project root.
    #[serde(default)]
    pub rel_path: PathBuf,

    /// Human-readable subject line.
    #[serde(default)]
    pub subject: String,

    /// Namespace (usually the directory) the scenario belongs to.
    #[serde(default)]
    pub namespace: String,

    /// Whether the host already decided to skip this scenario.
    #[serde(default)]
    pub skipped: bool,
}

impl Scenario {
    /// Creates a scenario with the given hash and empty metadata.
    pub fn new(hash: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            rel_path: PathBuf::new(),
            subject: String::new(),
            namespace: String::new(),
            skipped: false,
        }
    }

    /// Sets the relative path.
    pub fn with_rel_path(mut self, rel_path: impl Into<PathBuf>) -> Self {
        self.rel_path = rel_path.into();
        self
    }

    /// Sets the subject.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Sets the namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Marks this scenario as skipped upstream.
    pub fn set_skipped(mut self) -> Self {
        self.skipped = true;
        self
    }
}

/// Final status of a finished scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioStatus {
    Passed,
    Failed,
    Skipped,
}

impl ScenarioStatus {
    /// Returns the wire name of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioStatus::Passed => "passed",
            ScenarioStatus::Failed => "failed",
            ScenarioStatus::Skipped => "skipped",
        }
    }
}

impl std::fmt::Display for ScenarioStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one scenario execution as reported by the host.
///
/// Timestamps are seconds since the Unix epoch. Skipped scenarios usually
/// carry no timestamps at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// The scenario that finished.
    pub scenario: Scenario,

    /// How it finished.
    pub status: ScenarioStatus,

    /// When execution started.
    #[serde(default)]
    pub started_at: Option<f64>,

    /// When execution ended.
    #[serde(default)]
    pub ended_at: Option<f64>,
}

impl ScenarioResult {
    /// Creates a result without timestamps.
    pub fn new(scenario: Scenario, status: ScenarioStatus) -> Self {
        Self {
            scenario,
            status,
            started_at: None,
            ended_at: None,
        }
    }

    /// Sets the start and end timestamps, in seconds since epoch.
    pub fn with_times(mut self, started_at: f64, ended_at: f64) -> Self {
        self.started_at = Some(started_at);
        self.ended_at = Some(ended_at);
        self
    }
}

/// Loads a JSON array of scenarios from a file.
pub fn load_scenarios(path: &Path) -> Result<Vec<Scenario>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenarios file: {}", path.display()))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse scenarios file: {}", path.display()))
}

/// Loads a JSON array of scenario results from a file.
pub fn load_results(path: &Path) -> Result<Vec<ScenarioResult>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read results file: {}", path.display()))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse results file: {}", path.display()))
}
