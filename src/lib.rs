//! timeslice: duration-aware ordering and slicing of test scenarios.
//!
//! This crate distributes a fixed set of test scenarios across parallel
//! workers so that every worker finishes in about the same time, using
//! historical durations fetched from a remote timing service.
//!
//! # Architecture
//!
//! The main components are:
//!
//! - **Timing**: Retry-protected access to the timing service ([`timing`])
//! - **Scheduling**: Duration ordering and LPT slicing ([`scheduling`])
//! - **History**: Execution records flushed at the end of a run ([`history`])
//! - **Plugin**: Lifecycle hooks wiring the above into a host runtime ([`plugin`])
//!
//! # Example
//!
//! ```no_run
//! use timeslice::config::load_config;
//! use timeslice::plugin::{CloudPlugin, Dispatcher, ScenarioScheduler};
//! use timeslice::scenario::load_scenarios;
//! use timeslice::timing::CloudClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config(std::path::Path::new("timeslice.toml"))?;
//!     let client = CloudClient::from_config(&config.cloud)?;
//!     let mut dispatcher = Dispatcher::new().with_plugin(CloudPlugin::new(client, &config)?);
//!
//!     let scenarios = load_scenarios(std::path::Path::new("scenarios.json"))?;
//!     let ordered = dispatcher.order(scenarios).await?;
//!     let mut scheduler = ScenarioScheduler::new(ordered);
//!     dispatcher.startup(&mut scheduler).await?;
//!
//!     for scenario in scheduler.scheduled() {
//!         println!("{}", scenario.hash);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod history;
pub mod plugin;
pub mod report;
pub mod scenario;
pub mod scheduling;
pub mod timing;

// Re-export commonly used types
pub use config::{Config, load_config};
pub use history::{ExecutionRecord, HistoryAggregator};
pub use plugin::{CloudPlugin, Dispatcher, Plugin, ScenarioScheduler};
pub use scenario::{Scenario, ScenarioResult, ScenarioStatus};
pub use scheduling::{Direction, ScenarioOrderer, SlicePartitioner, WorkerSelector};
pub use timing::{CloudClient, TimingService, TimingStore};
