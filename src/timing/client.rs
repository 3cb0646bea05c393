//! HTTP client for the timing service.
//!
//! Routes are scoped to a project:
//!
//! | Method | Path | Body |
//! |--------|------|------|
//! | `GET` | `/v0.2/projects/{project_id}/scenarios?order_by=duration[&report_id=..]` | `[{"hash": .., "median": ..}]` |
//! | `POST` | `/v0.2/projects/{project_id}/history` | `[ExecutionRecord, ..]` |
//!
//! Any status other than `200 OK`, or a body that is not JSON, is treated
//! as an invalid response.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use super::{Durations, TimingError, TimingResult, TimingService};
use crate::config::CloudConfig;
use crate::history::ExecutionRecord;

/// User agent for timing service requests.
const USER_AGENT_VALUE: &str = concat!("timeslice/", env!("CARGO_PKG_VERSION"));

/// One entry of the scenario timings listing.
///
/// The median of an even number of runs may be fractional.
#[derive(Debug, Deserialize)]
struct ScenarioTiming {
    hash: String,
    median: f64,
}

impl ScenarioTiming {
    fn millis(&self) -> u64 {
        self.median.max(0.0).round() as u64
    }
}

/// [`TimingService`] implementation over HTTP.
#[derive(Debug, Clone)]
pub struct CloudClient {
    client: reqwest::Client,
    api_url: String,
    project_id: String,
}

impl CloudClient {
    /// Creates a client for the given service URL and project.
    pub fn new(
        api_url: impl Into<String>,
        project_id: impl Into<String>,
        timeout: Duration,
    ) -> TimingResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT_VALUE)
            .build()
            .map_err(|e| TimingError::Client(e.to_string()))?;

        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            project_id: project_id.into(),
        })
    }

    /// Creates a client from the `[cloud]` configuration section.
    pub fn from_config(config: &CloudConfig) -> TimingResult<Self> {
        Self::new(
            config.api_url.clone(),
            config.project_id.clone(),
            config.timeout(),
        )
    }

    /// Returns the normalized service URL.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn project_url(&self, resource: &str) -> String {
        format!(
            "{}/v0.2/projects/{}/{}",
            self.api_url, self.project_id, resource
        )
    }

    /// Sends a request and decodes a JSON body from a `200 OK` response.
    async fn do_request<T>(&self, url: &str, request: reqwest::RequestBuilder) -> TimingResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = request.send().await.map_err(|e| TimingError::Request {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| TimingError::Request {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        if status != StatusCode::OK {
            return Err(TimingError::InvalidResponse {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|_| TimingError::InvalidResponse {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl TimingService for CloudClient {
    async fn get_timings(&self, report_id: Option<&str>) -> TimingResult<Durations> {
        let url = self.project_url("scenarios");
        debug!("GET {} (report: {:?})", url, report_id);

        let mut request = self
            .client
            .get(&url)
            .query(&[("order_by", "duration")]);
        if let Some(report_id) = report_id.filter(|r| !r.is_empty()) {
            request = request.query(&[("report_id", report_id)]);
        }

        let scenarios: Vec<ScenarioTiming> = self.do_request(&url, request).await?;
        Ok(scenarios
            .into_iter()
            .map(|s| {
                let millis = s.millis();
                (s.hash, millis)
            })
            .collect())
    }

    async fn post_history(&self, history: &[ExecutionRecord]) -> TimingResult<()> {
        let url = self.project_url("history");
        debug!("POST {} ({} records)", url, history.len());

        let request = self.client.post(&url).json(history);
        let _: serde_json::Value = self.do_request(&url, request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_trimmed() {
        let client =
            CloudClient::new("http://localhost:8080/", "demo", Duration::from_secs(5)).unwrap();
        assert_eq!(client.api_url(), "http://localhost:8080");
        assert_eq!(
            client.project_url("history"),
            "http://localhost:8080/v0.2/projects/demo/history"
        );
    }

    #[test]
    fn test_fractional_median_rounded() {
        let timings: Vec<ScenarioTiming> =
            serde_json::from_str(r#"[{"hash": "a", "median": 12.5}, {"hash": "b", "median": 7}]"#)
                .unwrap();
        assert_eq!(timings[0].millis(), 13);
        assert_eq!(timings[1].millis(), 7);
    }

    #[test]
    fn test_from_config() {
        let config = CloudConfig::default();
        let client = CloudClient::from_config(&config).unwrap();
        assert_eq!(
            client.project_url("scenarios"),
            "http://localhost:8080/v0.2/projects/default/scenarios"
        );
    }
}
