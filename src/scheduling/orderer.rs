//! Duration-based scenario ordering.

use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::scenario::Scenario;
use crate::timing::Durations;

/// Sort direction of a [`ScenarioOrderer`].
///
/// | Direction | Runs first | Unknown scenarios |
/// |-----------|------------|-------------------|
/// | `Ascending` | shortest | first |
/// | `Descending` | longest | last |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ascending,
    Descending,
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Direction::Ascending),
            "desc" | "descending" => Ok(Direction::Descending),
            other => Err(format!(
                "unknown order direction '{}' (expected asc or desc)",
                other
            )),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Ascending => f.write_str("ascending"),
            Direction::Descending => f.write_str("descending"),
        }
    }
}

/// Orders scenarios by their historical duration.
///
/// Sorting is stable: scenarios with equal durations, including all
/// scenarios missing from the duration map, keep their relative order.
///
/// # Example
///
/// ```
/// use timeslice::scenario::Scenario;
/// use timeslice::scheduling::{Direction, ScenarioOrderer};
/// use timeslice::timing::Durations;
///
/// let durations = Durations::from([("slow".to_string(), 900), ("fast".to_string(), 10)]);
/// let scenarios = vec![Scenario::new("slow"), Scenario::new("new"), Scenario::new("fast")];
///
/// let ordered = ScenarioOrderer::new(Direction::Ascending).sort(scenarios, &durations);
/// let hashes: Vec<_> = ordered.iter().map(|s| s.hash.as_str()).collect();
/// assert_eq!(hashes, ["new", "fast", "slow"]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ScenarioOrderer {
    direction: Direction,
}

impl ScenarioOrderer {
    pub fn new(direction: Direction) -> Self {
        Self { direction }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Returns the scenarios sorted by duration in this orderer's direction.
    pub fn sort(&self, mut scenarios: Vec<Scenario>, durations: &Durations) -> Vec<Scenario> {
        let duration = |s: &Scenario| durations.get(&s.hash).copied().unwrap_or(0);
        match self.direction {
            Direction::Ascending => scenarios.sort_by_key(|s| duration(s)),
            Direction::Descending => scenarios.sort_by_key(|s| Reverse(duration(s))),
        }
        scenarios
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenarios(hashes: &[&str]) -> Vec<Scenario> {
        hashes.iter().map(|h| Scenario::new(*h)).collect()
    }

    fn hashes(scenarios: &[Scenario]) -> Vec<&str> {
        scenarios.iter().map(|s| s.hash.as_str()).collect()
    }

    fn durations(entries: &[(&str, u64)]) -> Durations {
        entries.iter().map(|(h, d)| (h.to_string(), *d)).collect()
    }

    #[test]
    fn test_ascending() {
        let d = durations(&[("a", 30), ("b", 10), ("c", 20)]);
        let sorted = ScenarioOrderer::new(Direction::Ascending).sort(scenarios(&["a", "b", "c"]), &d);
        assert_eq!(hashes(&sorted), ["b", "c", "a"]);
    }

    #[test]
    fn test_descending() {
        let d = durations(&[("a", 30), ("b", 10), ("c", 20)]);
        let sorted =
            ScenarioOrderer::new(Direction::Descending).sort(scenarios(&["a", "b", "c"]), &d);
        assert_eq!(hashes(&sorted), ["a", "c", "b"]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let d = durations(&[("a", 5), ("b", 5), ("c", 1), ("d", 5)]);

        let asc = ScenarioOrderer::new(Direction::Ascending)
            .sort(scenarios(&["d", "a", "c", "b"]), &d);
        assert_eq!(hashes(&asc), ["c", "d", "a", "b"]);

        let desc = ScenarioOrderer::new(Direction::Descending)
            .sort(scenarios(&["d", "a", "c", "b"]), &d);
        assert_eq!(hashes(&desc), ["d", "a", "b", "c"]);
    }

    #[test]
    fn test_missing_durations_default_to_zero() {
        let d = durations(&[("known", 50)]);
        let input = scenarios(&["x", "known", "y"]);

        let asc = ScenarioOrderer::new(Direction::Ascending).sort(input.clone(), &d);
        assert_eq!(hashes(&asc), ["x", "y", "known"]);

        let desc = ScenarioOrderer::new(Direction::Descending).sort(input, &d);
        assert_eq!(hashes(&desc), ["known", "x", "y"]);
    }

    #[test]
    fn test_no_timings_keeps_input_order() {
        let input = scenarios(&["c", "a", "b"]);
        let sorted = ScenarioOrderer::new(Direction::Descending).sort(input, &Durations::new());
        assert_eq!(hashes(&sorted), ["c", "a", "b"]);
    }

    #[test]
    fn test_direction_from_str() {
        assert_eq!("asc".parse::<Direction>(), Ok(Direction::Ascending));
        assert_eq!("Descending".parse::<Direction>(), Ok(Direction::Descending));
        assert!("sideways".parse::<Direction>().is_err());
    }
}
