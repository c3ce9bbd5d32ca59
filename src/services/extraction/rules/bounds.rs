//! Lower/upper bound extraction.
//!
//! Preference order:
//! 1. a terminal `Coloring: SOL <value>` line closes the instance (lb = ub);
//! 2. a terminal `Compute coloring finished: LB x and UB y` summary;
//! 3. otherwise the best improvement seen anywhere in the log (max lower,
//!    min upper), falling back per side to the root / initial heuristic value.
//!
//! Lower bounds are rounded up and upper bounds down before they leave the
//! rule.

use crate::domain::models::{round_lower, round_upper};
use crate::domain::ports::{ExtractionRule, LogView, MetricPatch};

use super::{last_number, number_after};

const OPTIMAL: &str = "Coloring: SOL";
const FINISHED: &str = "Compute coloring finished:";
const ROOT_LOWER: &str = "Root with value ";
const INITIAL_UPPER: &str = "DSATUR: ";
const LOWER_IMPROVED: &str = "Lower bound ";
const UPPER_IMPROVED: &str = "New upper bound";

#[derive(Debug, Default, Clone, Copy)]
pub struct BoundsRule;

impl BoundsRule {
    fn best(log: &LogView<'_>, marker: &str, better: fn(f64, f64) -> f64) -> Option<f64> {
        log.matching(marker)
            .filter_map(last_number)
            .fold(None, |best, value| {
                Some(best.map_or(value, |current| better(current, value)))
            })
    }

    fn lower(log: &LogView<'_>) -> Option<f64> {
        Self::best(log, LOWER_IMPROVED, f64::max)
            .or_else(|| log.first_matching(ROOT_LOWER).and_then(last_number))
    }

    fn upper(log: &LogView<'_>) -> Option<f64> {
        Self::best(log, UPPER_IMPROVED, f64::min)
            .or_else(|| log.first_matching(INITIAL_UPPER).and_then(last_number))
    }
}

impl ExtractionRule for BoundsRule {
    fn name(&self) -> &'static str {
        "bounds"
    }

    fn extract(&self, log: &LogView<'_>) -> MetricPatch {
        if let Some(value) = log
            .last_matching(OPTIMAL)
            .and_then(|line| number_after(line, "SOL"))
        {
            return MetricPatch {
                lower_bound: Some(round_lower(value)),
                upper_bound: Some(round_upper(value)),
                solved: Some(true),
                ..Default::default()
            };
        }

        if let Some(line) = log.last_matching(FINISHED) {
            let lower = number_after(line, "LB ");
            let upper = number_after(line, "UB ");
            if lower.is_some() || upper.is_some() {
                return MetricPatch {
                    lower_bound: lower.map(round_lower),
                    upper_bound: upper.map(round_upper),
                    ..Default::default()
                };
            }
        }

        MetricPatch {
            lower_bound: Self::lower(log).map(round_lower),
            upper_bound: Self::upper(log).map(round_upper),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn run(text: &str) -> MetricPatch {
        BoundsRule.extract(&LogView::new("inst", text, Duration::from_secs(60)))
    }

    #[test]
    fn optimal_marker_closes_instance() {
        let patch = run(
            "(   0.010s)       main.cpp:44    INFO| Root with value 3.200000\n\
             (   0.900s)       main.cpp:71    INFO| Coloring: SOL 4.000000 = {0, 2} {1} {3}\n",
        );
        assert_eq!(patch.lower_bound, Some(4));
        assert_eq!(patch.upper_bound, Some(4));
        assert_eq!(patch.solved, Some(true));
    }

    #[test]
    fn tracks_best_improvements() {
        let patch = run(
            "(   0.010s)  main.cpp:44  INFO| Root with value 2.500000\n\
             (   0.011s)  dsatur.cpp:90 INFO| DSATUR: 9\n\
             (   0.200s)  bnp.cpp:88  INFO| New upper bound 8 (integral sol)\n\
             (   0.300s)  bnp.cpp:60  INFO| Lower bound 3\n\
             (   0.400s)  bnp.cpp:88  INFO| New upper bound 6 (integral sol)\n\
             (   0.500s)  bnp.cpp:60  INFO| Lower bound 4.2\n\
             (   0.600s)  bnp.cpp:60  INFO| Lower bound 3.5\n",
        );
        // max lower = 4.2 -> ceil 5; min upper = 6.
        assert_eq!(patch.lower_bound, Some(5));
        assert_eq!(patch.upper_bound, Some(6));
        assert_eq!(patch.solved, None);
    }

    #[test]
    fn falls_back_to_root_and_initial_heuristic() {
        let patch = run(
            "(   0.010s)  main.cpp:44  INFO| Root with value 3.100000\n\
             (   0.011s)  dsatur.cpp:90 INFO| DSATUR: 7\n",
        );
        assert_eq!(patch.lower_bound, Some(4));
        assert_eq!(patch.upper_bound, Some(7));
    }

    #[test]
    fn sides_fall_back_independently() {
        let patch = run(
            "Root with value 3.000000\n\
             DSATUR: 7\n\
             New upper bound 6\n",
        );
        assert_eq!(patch.lower_bound, Some(3));
        assert_eq!(patch.upper_bound, Some(6));
    }

    #[test]
    fn finished_summary_gives_both_sides() {
        let patch = run("Compute coloring finished: LB 4 and UB 6\n");
        assert_eq!(patch.lower_bound, Some(4));
        assert_eq!(patch.upper_bound, Some(6));
    }

    #[test]
    fn fractional_optimal_rounds_apart() {
        let patch = run("Coloring: SOL 4.500000\n");
        assert_eq!(patch.lower_bound, Some(5));
        assert_eq!(patch.upper_bound, Some(4));
    }

    #[test]
    fn absent_markers_leave_bounds_unknown() {
        let patch = run("(   0.001s)  main.cpp:20  INFO| reading instance\n");
        assert!(patch.is_empty());
    }

    #[test]
    fn initial_lower_bound_text_is_not_an_improvement() {
        // lowercase "lower bound:" belongs to the summary line, not the marker.
        let patch = run("Computing coloring took 3.0 seconds (initial lower bound:9.000000)\n");
        assert_eq!(patch.lower_bound, None);
    }
}
