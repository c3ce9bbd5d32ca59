//! Branch-and-price search statistics.
//!
//! These only appear when the solver runs with its verbose trace enabled.
//! Each rule reports `None` when its marker never shows up, so a log from a
//! quiet run does not read as "zero branches".

use crate::domain::models::SearchStats;
use crate::domain::ports::{ExtractionRule, LogView, MetricPatch};

use super::{last_number, number_before, occurrences};

const NODE_OPENED: &str = "{ next ub=";
const STACK_SIZE: &str = "Stack size";
const ROOT_VALUE: &str = "Root with value ";
const FINAL_MODEL: &str = "Final model with ";
const PRICING_CALL: &str = " s: Pricing::solve";
const SINGLE_SET_FOUND: &str = "Found 1 violated sets!";
const LP_SOLVED: &str = "Solved in ";

fn round_millis(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn patch(search: SearchStats) -> MetricPatch {
    MetricPatch {
        search,
        ..Default::default()
    }
}

/// Branch nodes explored. The root node also prints the marker, so it is
/// not counted.
#[derive(Debug, Default, Clone, Copy)]
pub struct BranchCountRule;

impl ExtractionRule for BranchCountRule {
    fn name(&self) -> &'static str {
        "branches"
    }

    fn extract(&self, log: &LogView<'_>) -> MetricPatch {
        patch(SearchStats {
            branches: occurrences(log, NODE_OPENED).map(|n| n.saturating_sub(1)),
            ..Default::default()
        })
    }
}

/// Deepest branching stack reached.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeepestBranchRule;

impl ExtractionRule for DeepestBranchRule {
    fn name(&self) -> &'static str {
        "deepest_branch"
    }

    fn extract(&self, log: &LogView<'_>) -> MetricPatch {
        let deepest = log
            .matching(STACK_SIZE)
            .filter_map(last_number)
            .map(|depth| depth.max(0.0) as u32)
            .max();
        patch(SearchStats {
            deepest_branch: deepest,
            ..Default::default()
        })
    }
}

/// LP relaxation value at the root node.
#[derive(Debug, Default, Clone, Copy)]
pub struct RootValueRule;

impl ExtractionRule for RootValueRule {
    fn name(&self) -> &'static str {
        "root_value"
    }

    fn extract(&self, log: &LogView<'_>) -> MetricPatch {
        patch(SearchStats {
            root_value: log.first_matching(ROOT_VALUE).and_then(last_number),
            ..Default::default()
        })
    }
}

/// Column count of the final root model: `Final model with 42 sets`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RootSetsRule;

impl ExtractionRule for RootSetsRule {
    fn name(&self) -> &'static str {
        "root_sets"
    }

    fn extract(&self, log: &LogView<'_>) -> MetricPatch {
        let sets = log
            .first_matching(FINAL_MODEL)
            .and_then(|line| number_before(line, "sets"))
            .map(|n| n.max(0.0) as u32);
        patch(SearchStats {
            root_sets: sets,
            ..Default::default()
        })
    }
}

/// Pricing calls and their summed wall time, rounded to milliseconds.
#[derive(Debug, Default, Clone, Copy)]
pub struct PricingRule;

impl ExtractionRule for PricingRule {
    fn name(&self) -> &'static str {
        "pricing"
    }

    fn extract(&self, log: &LogView<'_>) -> MetricPatch {
        let calls = occurrences(log, PRICING_CALL);
        let time = calls.map(|_| {
            round_millis(
                log.matching(PRICING_CALL)
                    .filter_map(|line| number_before(line, PRICING_CALL))
                    .sum(),
            )
        });
        patch(SearchStats {
            pricing_calls: calls,
            pricing_time_secs: time,
            ..Default::default()
        })
    }
}

/// Pricing rounds that produced exactly one violated set.
#[derive(Debug, Default, Clone, Copy)]
pub struct SinglePricingRule;

impl ExtractionRule for SinglePricingRule {
    fn name(&self) -> &'static str {
        "pricing_one_set"
    }

    fn extract(&self, log: &LogView<'_>) -> MetricPatch {
        patch(SearchStats {
            pricing_one_set: occurrences(log, SINGLE_SET_FOUND),
            ..Default::default()
        })
    }
}

/// Summed LP solve time: `Solved in 12 iterations and 0.01 seconds`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LpTimeRule;

impl ExtractionRule for LpTimeRule {
    fn name(&self) -> &'static str {
        "lp_time"
    }

    fn extract(&self, log: &LogView<'_>) -> MetricPatch {
        let seconds: Vec<f64> = log
            .matching(LP_SOLVED)
            .filter_map(|line| number_before(line, " seconds"))
            .collect();
        let total = (!seconds.is_empty()).then(|| round_millis(seconds.iter().sum()));
        patch(SearchStats {
            lp_time_secs: total,
            ..Default::default()
        })
    }
}
