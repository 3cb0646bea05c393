//! Console and JSON output of a worker's plan.
//!
//! A plan is the ordered list of scenarios this worker will run plus the
//! ones it ignores because they belong to another worker's slice.

use serde::Serialize;

use crate::plugin::ScenarioScheduler;
use crate::scheduling::WorkerSelector;

/// Serializable view of a worker's plan.
#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    /// Total number of workers, if slicing is enabled.
    pub total: Option<usize>,
    /// This worker's index, if slicing is enabled.
    pub index: Option<usize>,
    /// Hashes to run, in order.
    pub scheduled: Vec<String>,
    /// Hashes left to other workers, in input order.
    pub ignored: Vec<String>,
}

impl PlanReport {
    pub fn new(scheduler: &ScenarioScheduler, selector: Option<WorkerSelector>) -> Self {
        let scheduled = scheduler.scheduled().map(|s| s.hash.clone()).collect();
        let ignored = scheduler
            .scenarios()
            .iter()
            .filter(|s| scheduler.is_ignored(&s.hash))
            .map(|s| s.hash.clone())
            .collect();

        Self {
            total: selector.map(|s| s.total()),
            index: selector.map(|s| s.index()),
            scheduled,
            ignored,
        }
    }
}

/// Prints the scheduled scenarios and a short summary to the console.
///
/// In verbose mode each scenario's path and subject are listed as well.
pub fn print_plan(scheduler: &ScenarioScheduler, selector: Option<WorkerSelector>, verbose: bool) {
    for scenario in scheduler.scheduled() {
        if verbose {
            println!(
                "{}  {}  {}",
                scenario.hash,
                console::style(scenario.rel_path.display()).dim(),
                scenario.subject
            );
        } else {
            println!("{}", scenario.hash);
        }
    }

    let scheduled = scheduler.scenarios().len() - scheduler.ignored_count();
    let skipped = scheduler
        .scheduled()
        .filter(|s| s.skipped)
        .count();

    eprintln!();
    eprintln!("Plan:");
    if let Some(selector) = selector {
        eprintln!(
            "  Worker:    {}/{}",
            selector.index() + 1,
            selector.total()
        );
    }
    eprintln!("  Total:     {}", scheduler.scenarios().len());
    eprintln!("  Scheduled: {}", console::style(scheduled).green());
    eprintln!(
        "  Ignored:   {}",
        console::style(scheduler.ignored_count()).yellow()
    );
    if skipped > 0 {
        eprintln!("  Skipped:   {}", console::style(skipped).yellow());
    }
}
