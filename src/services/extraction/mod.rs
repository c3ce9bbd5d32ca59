//! Pattern Extraction Engine
//!
//! Turns a raw solver log into a [`MetricSet`] by folding the patches of
//! every registered rule, then applying the policies that span fields:
//!
//! - more than one processed component withholds both bounds and the
//!   solved flag;
//! - a known runtime without an optimal marker means "not solved";
//! - `lower > upper` after rounding is recorded, never corrected.

pub mod registry;
pub mod rules;

use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::models::{Anomaly, MetricSet};
use crate::domain::ports::LogView;

pub use registry::RuleRegistry;

/// Result of extracting one log.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub metrics: MetricSet,
    /// Partition text the solver reported, if any.
    pub solution: Option<String>,
}

/// Runs a [`RuleRegistry`] over solver logs.
#[derive(Debug, Clone, Default)]
pub struct ExtractionEngine {
    registry: RuleRegistry,
}

impl ExtractionEngine {
    pub fn new(registry: RuleRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Extract metrics for `instance` from the full log `text`.
    ///
    /// Never fails: fields whose markers are absent stay unknown.
    pub fn extract(&self, instance: &str, text: &str, time_limit: Duration) -> Extraction {
        let view = LogView::new(instance, text, time_limit);
        let mut metrics = MetricSet::new(instance);
        let mut solution = None;

        for rule in self.registry.iter() {
            let patch = rule.extract(&view);
            if !patch.is_empty() {
                debug!(instance, rule = rule.name(), "rule matched");
            }
            patch.apply(&mut metrics, &mut solution);
        }

        Self::default_solved_flag(&mut metrics);
        Self::withhold_multi_component_bounds(&mut metrics);
        Self::flag_inverted_bounds(&mut metrics);

        Extraction { metrics, solution }
    }

    fn withhold_multi_component_bounds(metrics: &mut MetricSet) {
        let Some(components) = metrics.components.filter(|&n| n > 1) else {
            return;
        };
        warn!(
            instance = %metrics.instance,
            components,
            "multiple components processed; bounds withheld"
        );
        metrics.lower_bound = None;
        metrics.upper_bound = None;
        // A per-component optimum does not close the instance.
        metrics.solved = None;
        metrics.anomalies.push(Anomaly::MultiComponent { components });
    }

    fn default_solved_flag(metrics: &mut MetricSet) {
        if metrics.solved.is_none() && metrics.runtime_secs.is_some() {
            metrics.solved = Some(false);
        }
    }

    fn flag_inverted_bounds(metrics: &mut MetricSet) {
        if let (Some(lower), Some(upper)) = (metrics.lower_bound, metrics.upper_bound) {
            if lower > upper {
                warn!(instance = %metrics.instance, lower, upper, "inverted bounds");
                metrics
                    .anomalies
                    .push(Anomaly::InvertedBounds { lower, upper });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: Duration = Duration::from_secs(100);

    fn extract(text: &str) -> Extraction {
        ExtractionEngine::default().extract("myciel3", text, LIMIT)
    }

    #[test]
    fn solved_run() {
        let log = "\
(   0.001s)                main.cpp:20    INFO| reading instance
(   0.002s)              dsatur.cpp:90    INFO| DSATUR: 5
(   0.010s)                main.cpp:44    INFO| Root with value 3.500000
(   0.020s)                main.cpp:71    INFO| Coloring: SOL 4.000000 = {0, 2, 5, 7} {1, 3} {4, 6, 8} {9, 10}
(   0.020s)              loguru.cpp:560   INFO| atexit
";
        let result = extract(log);
        let m = &result.metrics;
        assert_eq!(m.lower_bound, Some(4));
        assert_eq!(m.upper_bound, Some(4));
        assert_eq!(m.runtime_secs, Some(0.02));
        assert_eq!(m.solved, Some(true));
        assert_eq!(m.search.root_value, Some(3.5));
        assert!(m.anomalies.is_empty());
        assert_eq!(
            result.solution.as_deref(),
            Some("{0, 2, 5, 7} {1, 3} {4, 6, 8} {9, 10}")
        );
    }

    #[test]
    fn timed_out_run_uses_time_limit_and_best_bounds() {
        let log = "\
Root with value 3.100000
DSATUR: 8
New upper bound 6 (integral sol)
Lower bound 4
Branching on node 3141
";
        let m = extract(log).metrics;
        assert_eq!(m.runtime_secs, Some(100.0));
        assert_eq!(m.lower_bound, Some(4));
        assert_eq!(m.upper_bound, Some(6));
        assert_eq!(m.solved, Some(false));
    }

    #[test]
    fn multi_component_withholds_bounds() {
        let log = "\
DSATUR: 5
Connected component processed
Root with value 3.0
Connected component processed
Coloring: SOL 4.000000 = {0} {1}
(   1.000s)              loguru.cpp:560   INFO| atexit
";
        let m = extract(log).metrics;
        assert_eq!(m.components, Some(2));
        assert_eq!(m.lower_bound, None);
        assert_eq!(m.upper_bound, None);
        assert_eq!(m.solved, None);
        assert_eq!(m.anomalies, vec![Anomaly::MultiComponent { components: 2 }]);
    }

    #[test]
    fn single_component_keeps_bounds() {
        let m = extract("Connected component processed\nDSATUR: 5\nRoot with value 5\n").metrics;
        assert_eq!(m.components, Some(1));
        assert_eq!(m.lower_bound, Some(5));
        assert_eq!(m.upper_bound, Some(5));
    }

    #[test]
    fn inverted_bounds_are_recorded_not_corrected() {
        let m = extract("Compute coloring finished: LB 7 and UB 5\n").metrics;
        assert_eq!(m.lower_bound, Some(7));
        assert_eq!(m.upper_bound, Some(5));
        assert_eq!(
            m.anomalies,
            vec![Anomaly::InvertedBounds { lower: 7, upper: 5 }]
        );
    }

    #[test]
    fn empty_log_is_all_unknown() {
        let m = extract("").metrics;
        assert_eq!(m.lower_bound, None);
        assert_eq!(m.upper_bound, None);
        assert_eq!(m.runtime_secs, None);
        assert_eq!(m.solved, None);
        assert_eq!(m.components, None);
        assert_eq!(m.warnings, 0);
        assert!(m.errors.is_empty());
    }

    #[test]
    fn errors_do_not_halt_extraction() {
        let log = "\
(   0.001s)                 lp.cpp:140   ERR| LP solver returned status 12
(   0.002s)              dsatur.cpp:90    INFO| DSATUR: 5
(   0.003s)              loguru.cpp:560   INFO| atexit
";
        let m = extract(log).metrics;
        assert_eq!(m.error_count(), 1);
        assert_eq!(m.upper_bound, Some(5));
        assert_eq!(m.runtime_secs, Some(0.003));
    }

    #[test]
    fn license_failure_without_runtime() {
        let m = extract("Academic license - for non-commercial use only\n").metrics;
        assert_eq!(m.runtime_secs, None);
        assert_eq!(m.solved, None);
        assert!(m.has_anomaly(|a| *a == Anomaly::LicenseFailure));
        assert!(m.has_unverified_errors());
    }
}
