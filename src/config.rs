//! Configuration loading, schema definitions and validation.
//!
//! Configuration is read from a TOML file (see [`schema`]) and checked with
//! [`Config::validate`] before any scenario is scheduled, so an invalid
//! worker selector or a missing report id fails the run up front.

pub mod schema;

pub use schema::*;

use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;

use crate::scheduling::{SelectorError, WorkerSelector};

static PROJECT_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9-]{2,39}$").expect("valid project id pattern"));

static REPORT_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.{1,40}$").expect("valid report id pattern"));

/// Invalid configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Slicer index is set but slicer total is not")]
    IndexWithoutTotal,

    #[error("Slicer total is set but slicer index is not")]
    TotalWithoutIndex,

    #[error(transparent)]
    Selector(#[from] SelectorError),

    #[error("Report ID is required when total workers > 1")]
    MissingReportId,

    #[error("Invalid configuration:\n - {}", .0.join("\n - "))]
    InvalidParams(Vec<String>),
}

/// Loads timeslice configuration from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or doesn't match the schema.
/// The result is not validated; call [`Config::validate`] for that.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    Ok(config)
}

/// Loads timeslice configuration from a TOML string.
///
/// # Example
///
/// ```
/// use timeslice::config::load_config_str;
///
/// let config = load_config_str(r#"
///     [cloud]
///     project_id = "shop"
///     exit_code = 3
/// "#)?;
///
/// assert_eq!(config.cloud.exit_code, 3);
/// assert!(config.slicer.total.is_none());
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn load_config_str(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).context("Failed to parse config")?;

    Ok(config)
}

/// Checks the project and report identifiers against the service's rules.
///
/// Returns one message per invalid value; an empty list means both are valid.
pub fn validate_params(project_id: &str, report_id: Option<&str>) -> Vec<String> {
    let mut errors = Vec::new();

    if !PROJECT_ID_PATTERN.is_match(project_id) {
        errors.push(format!(
            "Invalid project_id: {:?} does not match pattern {:?}",
            project_id,
            PROJECT_ID_PATTERN.as_str()
        ));
    }

    if let Some(report_id) = report_id
        && !REPORT_ID_PATTERN.is_match(report_id)
    {
        errors.push(format!(
            "Invalid report_id: {:?} does not match pattern {:?}",
            report_id,
            REPORT_ID_PATTERN.as_str()
        ));
    }

    errors
}

impl Config {
    /// Returns the worker selector, or `None` when slicing is disabled.
    ///
    /// # Errors
    ///
    /// Fails if only one of `total`/`index` is set or the pair is out of range.
    pub fn selector(&self) -> Result<Option<WorkerSelector>, ConfigError> {
        match (self.slicer.total, self.slicer.index) {
            (None, None) => Ok(None),
            (None, Some(_)) => Err(ConfigError::IndexWithoutTotal),
            (Some(_), None) => Err(ConfigError::TotalWithoutIndex),
            (Some(total), Some(index)) => Ok(Some(WorkerSelector::new(total, index)?)),
        }
    }

    /// Validates the whole configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let selector = self.selector()?;

        let mut errors = validate_params(&self.cloud.project_id, self.cloud.report_id.as_deref());
        if !(self.cloud.timeout_secs.is_finite() && self.cloud.timeout_secs > 0.0) {
            errors.push(format!(
                "Invalid timeout_secs: {} must be a positive number",
                self.cloud.timeout_secs
            ));
        }
        if !(self.cloud.retry.delay_secs.is_finite() && self.cloud.retry.delay_secs >= 0.0) {
            errors.push(format!(
                "Invalid retry.delay_secs: {} must be zero or positive",
                self.cloud.retry.delay_secs
            ));
        }
        if self.cloud.retry.attempts == 0 {
            errors.push("Invalid retry.attempts: must be at least 1".to_string());
        }
        if !errors.is_empty() {
            return Err(ConfigError::InvalidParams(errors));
        }

        if selector.is_some_and(|s| s.total() > 1) && self.cloud.report_id.is_none() {
            return Err(ConfigError::MissingReportId);
        }

        Ok(())
    }
}
