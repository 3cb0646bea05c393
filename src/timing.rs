//! Access to historical scenario timings.
//!
//! The remote timing service is reached through the [`TimingService`]
//! trait, which covers exactly two operations: fetching the median duration
//! of every known scenario, and submitting a batch of execution records.
//! [`CloudClient`] is the HTTP implementation.
//!
//! [`TimingStore`] sits in front of a service and adds the run-level policy:
//!
//! | Operation | Attempts | On failure |
//! |-----------|----------|------------|
//! | [`fetch_durations`](TimingStore::fetch_durations) | 3, 1 s apart | [`TimingError::Unavailable`] (fatal for the run) |
//! | [`submit_history`](TimingStore::submit_history) | 1 | error returned, batch is not re-queued |
//!
//! Fetched durations are cached as an immutable snapshot, so ordering and
//! slicing within one run always see the same numbers.

pub mod client;
pub mod retry;

#[cfg(test)]
pub(crate) mod mock;

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::debug;

use crate::history::ExecutionRecord;

pub use client::CloudClient;
pub use retry::RetryPolicy;

/// Median duration in milliseconds, keyed by scenario hash.
pub type Durations = HashMap<String, u64>;

/// Result type for timing operations.
pub type TimingResult<T> = Result<T, TimingError>;

/// Errors raised while talking to the timing service.
#[derive(Debug, thiserror::Error)]
pub enum TimingError {
    /// The request could not be sent or no response was received.
    #[error("Request to '{url}' failed: {message}")]
    Request { url: String, message: String },

    /// The service answered with a non-200 status or a non-JSON body.
    #[error("Invalid response from '{url}': {status} {body}")]
    InvalidResponse {
        url: String,
        status: u16,
        body: String,
    },

    /// The HTTP client could not be constructed.
    #[error("Failed to create HTTP client: {0}")]
    Client(String),

    /// Every fetch attempt failed.
    #[error("Timings unavailable after {attempts} attempts: {source}")]
    Unavailable {
        attempts: usize,
        #[source]
        source: Box<TimingError>,
    },
}

/// The remote timing/history contract.
#[async_trait]
pub trait TimingService: Send + Sync {
    /// Fetches the median duration of every known scenario, optionally
    /// scoped to a report.
    async fn get_timings(&self, report_id: Option<&str>) -> TimingResult<Durations>;

    /// Submits a batch of execution records.
    async fn post_history(&self, history: &[ExecutionRecord]) -> TimingResult<()>;
}

/// Retry-protected access to a [`TimingService`].
pub struct TimingStore<S> {
    service: S,
    retry: RetryPolicy,
    report_id: Option<String>,
    snapshot: Option<Durations>,
}

impl<S: TimingService> TimingStore<S> {
    /// Creates a store with the default retry policy.
    pub fn new(service: S, report_id: Option<String>) -> Self {
        Self {
            service,
            retry: RetryPolicy::default(),
            report_id,
            snapshot: None,
        }
    }

    /// Replaces the retry policy used for fetching.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Returns the underlying service.
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Returns the report id timings are scoped to.
    pub fn report_id(&self) -> Option<&str> {
        self.report_id.as_deref()
    }

    /// Returns the cached snapshot, if timings were already fetched.
    pub fn durations(&self) -> Option<&Durations> {
        self.snapshot.as_ref()
    }

    /// Fetches durations, retrying according to the policy.
    ///
    /// The first successful result is cached and returned by every later
    /// call without contacting the service again.
    ///
    /// # Errors
    ///
    /// Returns [`TimingError::Unavailable`] wrapping the last failure once
    /// all attempts are exhausted.
    pub async fn fetch_durations(&mut self) -> TimingResult<&Durations> {
        if self.snapshot.is_none() {
            let service = &self.service;
            let report_id = self.report_id.as_deref();
            let durations = self
                .retry
                .run(|attempt| {
                    debug!("Fetching timings (attempt {})", attempt);
                    service.get_timings(report_id)
                })
                .await
                .map_err(|e| TimingError::Unavailable {
                    attempts: self.retry.attempts(),
                    source: Box::new(e),
                })?;

            debug!(
                "Retrieved {} timings (report: {})",
                durations.len(),
                report_id.unwrap_or("-")
            );
            self.snapshot = Some(durations);
        }

        Ok(self.snapshot.get_or_insert_with(Durations::new))
    }

    /// Submits execution records in a single attempt.
    pub async fn submit_history(&self, records: &[ExecutionRecord]) -> TimingResult<()> {
        self.service.post_history(records).await?;
        debug!("Posted {} history records", records.len());
        Ok(())
    }
}
