//! Configuration schema definitions for timeslice.
//!
//! This module defines all configuration types that can be deserialized from
//! TOML configuration files. Every section and field is optional and falls
//! back to the defaults documented on each type.
//!
//! # Schema Overview
//!
//! ```text
//! Config (root)
//! ├── CloudConfig        - Timing service connection and failure policy
//! │   └── RetryConfig    - Retry policy for fetching timings
//! ├── SlicerConfig       - Worker total/index for multi-worker runs
//! └── OrderConfig        - Ordering direction for single-worker runs
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::scheduling::Direction;
use crate::timing::RetryPolicy;

/// Root configuration structure for timeslice.
///
/// # TOML Structure
///
/// ```toml
/// [cloud]
/// api_url = "http://localhost:8080"
/// project_id = "shop"
/// report_id = "nightly"
///
/// [slicer]
/// total = 4
/// index = 0
///
/// [order]
/// direction = "descending"
/// ```
///
/// # Example
///
/// ```
/// use timeslice::config::Config;
///
/// let config: Config = toml::from_str(r#"
///     [slicer]
///     total = 2
///     index = 1
/// "#).unwrap();
///
/// assert_eq!(config.slicer.total, Some(2));
/// assert_eq!(config.cloud.project_id, "default");
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Timing service settings.
    #[serde(default)]
    pub cloud: CloudConfig,

    /// Multi-worker slicing settings.
    #[serde(default)]
    pub slicer: SlicerConfig,

    /// Ordering settings.
    #[serde(default)]
    pub order: OrderConfig,
}

/// Timing service connection settings.
///
/// # Defaults
///
/// | Field | Default |
/// |-------|---------|
/// | `api_url` | `http://localhost:8080` |
/// | `timeout_secs` | 5.0 |
/// | `project_id` | `default` |
/// | `report_id` | None |
/// | `verbose` | false |
/// | `exit_code` | 1 |
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CloudConfig {
    /// Base URL of the timing service.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Timeout for each request, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: f64,

    /// Project the timings and history belong to.
    ///
    /// Must start with a lowercase letter followed by 2 to 39 lowercase
    /// letters, digits or dashes.
    #[serde(default = "default_project_id")]
    pub project_id: String,

    /// Report used to scope timings and group launches.
    ///
    /// Required when more than one worker is configured.
    pub report_id: Option<String>,

    /// Log retrieved timings and posted history at info level.
    #[serde(default)]
    pub verbose: bool,

    /// Process exit code used when timings cannot be retrieved.
    #[serde(default = "default_exit_code")]
    pub exit_code: i32,

    /// Retry policy for fetching timings.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_secs: default_timeout(),
            project_id: default_project_id(),
            report_id: None,
            verbose: false,
            exit_code: default_exit_code(),
            retry: RetryConfig::default(),
        }
    }
}

impl CloudConfig {
    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_secs)
            .unwrap_or_else(|_| Duration::from_secs_f64(default_timeout()))
    }
}

fn default_api_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout() -> f64 {
    5.0
}

fn default_project_id() -> String {
    "default".to_string()
}

fn default_exit_code() -> i32 {
    1
}

/// Retry policy for fetching timings.
///
/// ```toml
/// [cloud.retry]
/// attempts = 3
/// delay_secs = 1.0
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    /// Total number of attempts, including the first one.
    ///
    /// Default: 3
    #[serde(default = "default_attempts")]
    pub attempts: usize,

    /// Fixed delay between attempts, in seconds.
    ///
    /// Default: 1.0
    #[serde(default = "default_delay")]
    pub delay_secs: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            delay_secs: default_delay(),
        }
    }
}

impl RetryConfig {
    /// Builds the runtime retry policy.
    pub fn policy(&self) -> RetryPolicy {
        let delay = Duration::try_from_secs_f64(self.delay_secs)
            .unwrap_or_else(|_| Duration::from_secs_f64(default_delay()));
        RetryPolicy::new(self.attempts, delay)
    }
}

fn default_attempts() -> usize {
    3
}

fn default_delay() -> f64 {
    1.0
}

/// Multi-worker slicing settings.
///
/// Both values must be set together; leaving both unset disables slicing.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SlicerConfig {
    /// Total number of workers.
    pub total: Option<usize>,

    /// Zero-based index of this worker.
    pub index: Option<usize>,
}

/// Ordering settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OrderConfig {
    /// Sort scenarios by duration in this direction. Unset keeps the
    /// host's order.
    pub direction: Option<Direction>,
}
