//! Duration-aware scenario scheduling.
//!
//! Two independent consumers of the same duration snapshot:
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`ScenarioOrderer`] | Total order for single-process execution (shortest or longest first) |
//! | [`SlicePartitioner`] | Splits scenarios into `total` balanced slices, one per worker |
//!
//! ```text
//!   Durations ──┬──► ScenarioOrderer ───► Vec<Scenario> (ordered)
//!               │
//!               └──► SlicePartitioner ──► Vec<Slice> ──► ignored(selector)
//! ```

pub mod orderer;
pub mod partitioner;

pub use orderer::{Direction, ScenarioOrderer};
pub use partitioner::{MAX_WORKERS, SelectorError, Slice, SlicePartitioner, WorkerSelector};
