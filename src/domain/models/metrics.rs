//! Per-instance metric sets recovered from solver logs.
//!
//! Every measured field is an `Option`: `None` means the log did not say,
//! which is different from a measured zero.

use serde::{Deserialize, Serialize};

/// Round a lower bound up to the nearest integer.
///
/// The optimum is integral, so a fractional lower bound proves the next
/// integer.
pub fn round_lower(value: f64) -> i64 {
    value.ceil() as i64
}

/// Round an upper bound down to the nearest integer.
pub fn round_upper(value: f64) -> i64 {
    value.floor() as i64
}

/// Conditions that make an instance's metrics suspect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Anomaly {
    /// The solver stopped at its license check and never ran.
    LicenseFailure,
    /// More than one connected component was processed; bounds withheld.
    MultiComponent { components: u32 },
    /// Extracted lower bound exceeds the extracted upper bound.
    InvertedBounds { lower: i64, upper: i64 },
    /// The reported solution failed verification.
    InvalidSolution { violations: usize },
    /// The reported solution could not be parsed.
    MalformedSolution { reason: String },
}

impl Anomaly {
    /// Whether the anomaly means the instance's result cannot be trusted.
    pub const fn is_error(&self) -> bool {
        matches!(
            self,
            Self::LicenseFailure | Self::InvalidSolution { .. } | Self::MalformedSolution { .. }
        )
    }
}

/// Search statistics recovered from the solver's branch-and-price trace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchStats {
    pub branches: Option<u64>,
    pub deepest_branch: Option<u32>,
    pub root_value: Option<f64>,
    pub root_sets: Option<u32>,
    pub pricing_calls: Option<u64>,
    pub pricing_one_set: Option<u64>,
    pub pricing_time_secs: Option<f64>,
    pub lp_time_secs: Option<f64>,
}

/// Metrics extracted for one instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSet {
    pub instance: String,
    pub lower_bound: Option<i64>,
    pub upper_bound: Option<i64>,
    pub runtime_secs: Option<f64>,
    pub solved: Option<bool>,
    pub components: Option<u32>,
    pub errors: Vec<String>,
    pub warnings: u32,
    pub anomalies: Vec<Anomaly>,
    pub search: SearchStats,
}

impl MetricSet {
    /// An empty metric set: everything unknown, no diagnostics.
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
            lower_bound: None,
            upper_bound: None,
            runtime_secs: None,
            solved: None,
            components: None,
            errors: Vec::new(),
            warnings: 0,
            anomalies: Vec::new(),
            search: SearchStats::default(),
        }
    }

    /// Both bounds known and equal: the optimum is proven.
    pub fn is_closed(&self) -> bool {
        matches!((self.lower_bound, self.upper_bound), (Some(lb), Some(ub)) if lb == ub)
    }

    /// Gap between the bounds when both are known and the difference fits.
    pub fn gap(&self) -> Option<i64> {
        self.upper_bound?.checked_sub(self.lower_bound?)
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn has_anomaly(&self, predicate: impl Fn(&Anomaly) -> bool) -> bool {
        self.anomalies.iter().any(predicate)
    }

    /// Whether anything in this metric set should fail a gated run.
    pub fn has_unverified_errors(&self) -> bool {
        !self.errors.is_empty() || self.has_anomaly(Anomaly::is_error)
    }

    /// Whether the bounds violate `lower <= upper`.
    pub fn has_inverted_bounds(&self) -> bool {
        matches!((self.lower_bound, self.upper_bound), (Some(lb), Some(ub)) if lb > ub)
    }
}
