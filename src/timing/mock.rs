//! In-memory timing service for unit tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{Durations, TimingError, TimingResult, TimingService};
use crate::history::ExecutionRecord;

/// Serves fixed timings and stores posted history.
///
/// The first `fail_fetches` fetches fail; posts fail when `fail_posts` is set.
pub(crate) struct MockService {
    timings: Durations,
    fail_fetches: usize,
    fail_posts: bool,
    fetch_calls: AtomicUsize,
    post_calls: AtomicUsize,
    last_report_id: Mutex<Option<String>>,
    posted: Mutex<Vec<ExecutionRecord>>,
}

impl MockService {
    pub(crate) fn new(timings: Durations) -> Self {
        Self {
            timings,
            fail_fetches: 0,
            fail_posts: false,
            fetch_calls: AtomicUsize::new(0),
            post_calls: AtomicUsize::new(0),
            last_report_id: Mutex::new(None),
            posted: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing_fetches(mut self, count: usize) -> Self {
        self.fail_fetches = count;
        self
    }

    pub(crate) fn failing_posts(mut self) -> Self {
        self.fail_posts = true;
        self
    }

    pub(crate) fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn post_calls(&self) -> usize {
        self.post_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_report_id(&self) -> Option<String> {
        self.last_report_id.lock().unwrap().clone()
    }

    pub(crate) fn posted(&self) -> Vec<ExecutionRecord> {
        self.posted.lock().unwrap().clone()
    }
}

#[async_trait]
impl TimingService for MockService {
    async fn get_timings(&self, report_id: Option<&str>) -> TimingResult<Durations> {
        let call = self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_report_id.lock().unwrap() = report_id.map(str::to_string);

        if call < self.fail_fetches {
            return Err(TimingError::Request {
                url: "mock://scenarios".to_string(),
                message: "connection refused".to_string(),
            });
        }
        Ok(self.timings.clone())
    }

    async fn post_history(&self, history: &[ExecutionRecord]) -> TimingResult<()> {
        self.post_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_posts {
            return Err(TimingError::InvalidResponse {
                url: "mock://history".to_string(),
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        self.posted.lock().unwrap().extend_from_slice(history);
        Ok(())
    }
}
