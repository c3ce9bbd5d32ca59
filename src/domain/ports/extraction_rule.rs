//! Extraction rule port - one rule per log marker.

use std::time::Duration;

use crate::domain::models::{Anomaly, MetricSet, SearchStats};

/// Read-only view of a finished solver log handed to every rule.
#[derive(Debug, Clone)]
pub struct LogView<'a> {
    instance: &'a str,
    lines: Vec<&'a str>,
    time_limit: Duration,
}

impl<'a> LogView<'a> {
    pub fn new(instance: &'a str, text: &'a str, time_limit: Duration) -> Self {
        Self {
            instance,
            lines: text.lines().collect(),
            time_limit,
        }
    }

    pub const fn instance(&self) -> &'a str {
        self.instance
    }

    /// Soft time limit the job ran under.
    pub const fn time_limit(&self) -> Duration {
        self.time_limit
    }

    pub fn lines(&self) -> &[&'a str] {
        &self.lines
    }

    /// Lines containing `marker`, in log order.
    pub fn matching<'m>(&'m self, marker: &'m str) -> impl Iterator<Item = &'a str> + 'm {
        self.lines
            .iter()
            .copied()
            .filter(move |line| line.contains(marker))
    }

    pub fn first_matching(&self, marker: &str) -> Option<&'a str> {
        self.matching(marker).next()
    }

    pub fn last_matching(&self, marker: &str) -> Option<&'a str> {
        self.lines
            .iter()
            .rev()
            .copied()
            .find(|line| line.contains(marker))
    }

    pub fn count(&self, marker: &str) -> usize {
        self.matching(marker).count()
    }

    /// Last line with visible content.
    pub fn last_line(&self) -> Option<&'a str> {
        self.lines
            .iter()
            .rev()
            .copied()
            .find(|line| !line.trim().is_empty())
    }
}

/// Partial metric set produced by a single rule.
///
/// `None` means the rule has nothing to say about that field. Diagnostics
/// (`errors`, `anomalies`) accumulate across rules.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricPatch {
    pub lower_bound: Option<i64>,
    pub upper_bound: Option<i64>,
    pub runtime_secs: Option<f64>,
    pub solved: Option<bool>,
    pub components: Option<u32>,
    pub errors: Vec<String>,
    pub warnings: Option<u32>,
    pub anomalies: Vec<Anomaly>,
    pub search: SearchStats,
    /// Raw partition text reported by the solver, for verification.
    pub solution: Option<String>,
}

impl MetricPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Fold this patch into `metrics`; known fields override.
    pub fn apply(self, metrics: &mut MetricSet, solution: &mut Option<String>) {
        fn set<T>(target: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *target = value;
            }
        }

        set(&mut metrics.lower_bound, self.lower_bound);
        set(&mut metrics.upper_bound, self.upper_bound);
        set(&mut metrics.runtime_secs, self.runtime_secs);
        set(&mut metrics.solved, self.solved);
        set(&mut metrics.components, self.components);
        if let Some(warnings) = self.warnings {
            metrics.warnings = warnings;
        }
        metrics.errors.extend(self.errors);
        metrics.anomalies.extend(self.anomalies);

        let search = &mut metrics.search;
        set(&mut search.branches, self.search.branches);
        set(&mut search.deepest_branch, self.search.deepest_branch);
        set(&mut search.root_value, self.search.root_value);
        set(&mut search.root_sets, self.search.root_sets);
        set(&mut search.pricing_calls, self.search.pricing_calls);
        set(&mut search.pricing_one_set, self.search.pricing_one_set);
        set(&mut search.pricing_time_secs, self.search.pricing_time_secs);
        set(&mut search.lp_time_secs, self.search.lp_time_secs);

        set(solution, self.solution);
    }
}

/// A pure function from log lines to a partial metric set.
///
/// Rules must not fail when their marker is absent: they return an empty
/// patch and the field stays unknown.
pub trait ExtractionRule: Send + Sync {
    /// Stable rule name, used in logs and the registry listing.
    fn name(&self) -> &'static str;

    fn extract(&self, log: &LogView<'_>) -> MetricPatch;
}
