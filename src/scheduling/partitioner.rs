//! Load-balanced slicing of scenarios across workers.
//!
//! Uses the Longest-Processing-Time-first heuristic: scenarios are taken in
//! descending duration order and each one goes to the slice with the
//! smallest `(sum, count)`, ties going to the lowest slice index. The
//! resulting makespan is at most `4/3 - 1/(3 * total)` times the optimum.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

use crate::scenario::Scenario;
use crate::timing::Durations;

/// Largest accepted number of workers.
pub const MAX_WORKERS: usize = 10_000;

/// Errors for an invalid worker selector.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("Slicer total must be greater than 0")]
    ZeroTotal,

    #[error("Slicer index {index} is out of range for total {total}")]
    IndexOutOfRange { index: usize, total: usize },

    #[error("Slicer total {total} exceeds the maximum of {max}")]
    TotalTooLarge { total: usize, max: usize },
}

/// Identifies which slice the current worker executes.
///
/// Always satisfies `0 < total <= MAX_WORKERS` and `index < total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSelector {
    total: usize,
    index: usize,
}

impl WorkerSelector {
    pub fn new(total: usize, index: usize) -> Result<Self, SelectorError> {
        if total == 0 {
            return Err(SelectorError::ZeroTotal);
        }
        if total > MAX_WORKERS {
            return Err(SelectorError::TotalTooLarge {
                total,
                max: MAX_WORKERS,
            });
        }
        if index >= total {
            return Err(SelectorError::IndexOutOfRange { index, total });
        }
        Ok(Self { total, index })
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

/// One worker's share of the scenarios.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Slice {
    sum: u64,
    entries: Vec<(String, u64)>,
    members: HashSet<String>,
}

impl Slice {
    fn push(&mut self, hash: &str, duration: u64) {
        self.sum += duration;
        self.entries.push((hash.to_string(), duration));
        self.members.insert(hash.to_string());
    }

    /// Total duration assigned to this slice.
    pub fn sum(&self) -> u64 {
        self.sum
    }

    /// Number of scenarios in this slice.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if the scenario with this hash belongs to the slice.
    pub fn contains(&self, hash: &str) -> bool {
        self.members.contains(hash)
    }

    /// Assigned `(hash, duration)` pairs in assignment order.
    pub fn entries(&self) -> &[(String, u64)] {
        &self.entries
    }

    /// Assigned hashes in assignment order.
    pub fn hashes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(hash, _)| hash.as_str())
    }
}

/// Partitions scenarios into a fixed number of balanced slices.
///
/// # Example
///
/// ```
/// use timeslice::scenario::Scenario;
/// use timeslice::scheduling::SlicePartitioner;
/// use timeslice::timing::Durations;
///
/// let durations: Durations = [("a", 10), ("b", 10), ("c", 6), ("d", 4)]
///     .into_iter()
///     .map(|(h, d)| (h.to_string(), d))
///     .collect();
/// let scenarios: Vec<_> = ["a", "b", "c", "d"].into_iter().map(Scenario::new).collect();
///
/// let slices = SlicePartitioner::new(2).partition(&scenarios, &durations);
/// assert_eq!(slices[0].hashes().collect::<Vec<_>>(), ["a", "c"]);
/// assert_eq!(slices[1].hashes().collect::<Vec<_>>(), ["b", "d"]);
/// assert_eq!((slices[0].sum(), slices[1].sum()), (16, 14));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SlicePartitioner {
    total: usize,
}

impl SlicePartitioner {
    /// Creates a partitioner for `total` slices. Values below 1 are clamped.
    pub fn new(total: usize) -> Self {
        Self {
            total: total.max(1),
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Duration used for partitioning; skipped scenarios weigh nothing.
    fn duration_of(scenario: &Scenario, durations: &Durations) -> u64 {
        if scenario.skipped {
            0
        } else {
            durations.get(&scenario.hash).copied().unwrap_or(0)
        }
    }

    /// Partitions scenarios into exactly `total` slices.
    ///
    /// Every scenario ends up in exactly one slice. The result depends only
    /// on the input order and durations.
    pub fn partition(&self, scenarios: &[Scenario], durations: &Durations) -> Vec<Slice> {
        let mut weighted: Vec<(&Scenario, u64)> = scenarios
            .iter()
            .map(|s| (s, Self::duration_of(s, durations)))
            .collect();
        weighted.sort_by_key(|&(_, duration)| Reverse(duration));

        let mut slices: Vec<Slice> = (0..self.total).map(|_| Slice::default()).collect();

        // Min-heap over (sum, count, index).
        let mut loads: BinaryHeap<Reverse<(u64, usize, usize)>> =
            (0..self.total).map(|i| Reverse((0, 0, i))).collect();

        for (scenario, duration) in weighted {
            let Some(Reverse((sum, count, index))) = loads.pop() else {
                break;
            };
            slices[index].push(&scenario.hash, duration);
            loads.push(Reverse((sum + duration, count + 1, index)));
        }

        slices
    }

    /// Creates a partitioner with one slice per worker of `selector`.
    pub fn for_selector(selector: WorkerSelector) -> Self {
        Self::new(selector.total())
    }

    /// Returns the scenarios outside the slice owned by `selector`.
    ///
    /// The scenarios are partitioned into `selector.total()` slices and
    /// returned in input order. With a single worker nothing is ignored.
    pub fn ignored<'a>(
        scenarios: &'a [Scenario],
        durations: &Durations,
        selector: WorkerSelector,
    ) -> Vec<&'a Scenario> {
        let slices = Self::for_selector(selector).partition(scenarios, durations);
        // partition() yields exactly `total` slices and `index < total`.
        let owned = &slices[selector.index()];

        scenarios
            .iter()
            .filter(|s| !owned.contains(&s.hash))
            .collect()
    }
}
