//! Bound Reconciler
//!
//! Compares candidate bounds against a baseline ledger. Only a candidate
//! bound that crosses the baseline's opposite bound is a hard finding; it
//! means one of the two runs is wrong. Everything else is informational.

use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::models::{BoundObservation, Ledger, LedgerEntry, MergeOutcome, MetricSet};

/// Why a candidate disagrees with the baseline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InconsistencyReason {
    /// Candidate lower bound above the baseline upper bound.
    LowerAboveBaselineUpper { lower: i64, baseline_upper: i64 },
    /// Candidate upper bound below the baseline lower bound.
    UpperBelowBaselineLower { upper: i64, baseline_lower: i64 },
    /// Both sides closed, at different values.
    DifferentOptimal { baseline: i64, candidate: i64 },
    /// Candidate reports `lower > upper`.
    InvertedCandidate { lower: i64, upper: i64 },
    /// Baseline holds `lower > upper`.
    InvertedBaseline { lower: i64, upper: i64 },
}

impl InconsistencyReason {
    /// Hard reasons gate; the rest are reported only.
    pub const fn is_hard(&self) -> bool {
        matches!(
            self,
            Self::LowerAboveBaselineUpper { .. } | Self::UpperBelowBaselineLower { .. }
        )
    }
}

impl std::fmt::Display for InconsistencyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LowerAboveBaselineUpper {
                lower,
                baseline_upper,
            } => write!(f, "lower {lower} > baseline upper {baseline_upper}"),
            Self::UpperBelowBaselineLower {
                upper,
                baseline_lower,
            } => write!(f, "upper {upper} < baseline lower {baseline_lower}"),
            Self::DifferentOptimal {
                baseline,
                candidate,
            } => write!(f, "optimal {candidate} differs from baseline {baseline}"),
            Self::InvertedCandidate { lower, upper } => {
                write!(f, "inverted bounds {lower} > {upper}")
            }
            Self::InvertedBaseline { lower, upper } => {
                write!(f, "baseline inverted bounds {lower} > {upper}")
            }
        }
    }
}

/// Bounds on one side of a comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BoundPair {
    pub lower: Option<i64>,
    pub upper: Option<i64>,
}

impl BoundPair {
    fn closed(self) -> Option<i64> {
        match (self.lower, self.upper) {
            (Some(lb), Some(ub)) if lb == ub => Some(lb),
            _ => None,
        }
    }

    fn inverted(self) -> Option<(i64, i64)> {
        match (self.lower, self.upper) {
            (Some(lb), Some(ub)) if lb > ub => Some((lb, ub)),
            _ => None,
        }
    }
}

impl From<&LedgerEntry> for BoundPair {
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            lower: entry.lower(),
            upper: entry.upper(),
        }
    }
}

impl From<&BoundObservation> for BoundPair {
    fn from(observation: &BoundObservation) -> Self {
        Self {
            lower: observation.lower,
            upper: observation.upper,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Inconsistency {
    pub instance: String,
    pub baseline: BoundPair,
    pub candidate: BoundPair,
    pub reasons: Vec<InconsistencyReason>,
}

impl Inconsistency {
    pub fn is_hard(&self) -> bool {
        self.reasons.iter().any(InconsistencyReason::is_hard)
    }
}

/// A candidate that tightens the baseline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Improvement {
    pub instance: String,
    pub baseline: BoundPair,
    /// New lower bound, when strictly above the baseline's.
    pub lower: Option<i64>,
    /// New upper bound, when strictly below the baseline's.
    pub upper: Option<i64>,
    /// Candidate is closed and the baseline was not.
    pub newly_closed: bool,
}

/// Result of comparing a candidate set against a baseline ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComparisonReport {
    pub not_found: Vec<String>,
    pub inconsistent: Vec<Inconsistency>,
    pub improved: Vec<Improvement>,
}

impl ComparisonReport {
    /// The only gating condition.
    pub fn has_hard_inconsistency(&self) -> bool {
        self.inconsistent.iter().any(Inconsistency::is_hard)
    }

    pub fn hard_count(&self) -> usize {
        self.inconsistent.iter().filter(|i| i.is_hard()).count()
    }

    pub fn newly_closed(&self) -> usize {
        self.improved.iter().filter(|i| i.newly_closed).count()
    }

    pub fn is_empty(&self) -> bool {
        self.not_found.is_empty() && self.inconsistent.is_empty() && self.improved.is_empty()
    }
}

/// Reasons a candidate pair disagrees with a baseline pair, in a fixed order.
fn reasons(baseline: BoundPair, candidate: BoundPair) -> Vec<InconsistencyReason> {
    let mut reasons = Vec::new();

    if let (Some(lower), Some(baseline_upper)) = (candidate.lower, baseline.upper) {
        if lower > baseline_upper {
            reasons.push(InconsistencyReason::LowerAboveBaselineUpper {
                lower,
                baseline_upper,
            });
        }
    }
    if let (Some(upper), Some(baseline_lower)) = (candidate.upper, baseline.lower) {
        if upper < baseline_lower {
            reasons.push(InconsistencyReason::UpperBelowBaselineLower {
                upper,
                baseline_lower,
            });
        }
    }
    if let (Some(base), Some(cand)) = (baseline.closed(), candidate.closed()) {
        if base != cand {
            reasons.push(InconsistencyReason::DifferentOptimal {
                baseline: base,
                candidate: cand,
            });
        }
    }
    if let Some((lower, upper)) = candidate.inverted() {
        reasons.push(InconsistencyReason::InvertedCandidate { lower, upper });
    }
    if let Some((lower, upper)) = baseline.inverted() {
        reasons.push(InconsistencyReason::InvertedBaseline { lower, upper });
    }

    reasons
}

/// Tightening of `baseline` by `candidate`; unknown baseline sides are
/// unbounded.
fn improvement(instance: &str, baseline: BoundPair, candidate: BoundPair) -> Option<Improvement> {
    let lower = candidate
        .lower
        .filter(|&lb| baseline.lower.map_or(true, |base| lb > base));
    let upper = candidate
        .upper
        .filter(|&ub| baseline.upper.map_or(true, |base| ub < base));
    if lower.is_none() && upper.is_none() {
        return None;
    }
    Some(Improvement {
        instance: instance.to_string(),
        baseline,
        lower,
        upper,
        newly_closed: candidate.closed().is_some() && baseline.closed().is_none(),
    })
}

/// Compare `candidates` against `baseline`.
///
/// Each output list is sorted by instance id.
pub fn compare(baseline: &Ledger, candidates: &[BoundObservation]) -> ComparisonReport {
    let mut report = ComparisonReport::default();

    for observation in candidates {
        let Some(entry) = baseline.get(&observation.instance) else {
            report.not_found.push(observation.instance.clone());
            continue;
        };
        let base = BoundPair::from(entry);
        let cand = BoundPair::from(observation);

        let reasons = reasons(base, cand);
        if !reasons.is_empty() {
            let inconsistency = Inconsistency {
                instance: observation.instance.clone(),
                baseline: base,
                candidate: cand,
                reasons,
            };
            if inconsistency.is_hard() {
                warn!(
                    instance = %inconsistency.instance,
                    reasons = ?inconsistency.reasons,
                    "bounds contradict baseline"
                );
            }
            report.inconsistent.push(inconsistency);
            continue;
        }

        if let Some(improvement) = improvement(&observation.instance, base, cand) {
            debug!(instance = %improvement.instance, "improvement over baseline");
            report.improved.push(improvement);
        }
    }

    report.not_found.sort();
    report.not_found.dedup();
    report.inconsistent.sort_by(|a, b| a.instance.cmp(&b.instance));
    report.improved.sort_by(|a, b| a.instance.cmp(&b.instance));
    report
}

/// Fold a metrics table into `ledger` under `source`.
///
/// Instances with inverted bounds are skipped: one of the two sides is
/// wrong and there is no telling which. Returns how many entries changed.
pub fn merge_metrics(ledger: &mut Ledger, metrics: &[MetricSet], source: &str) -> usize {
    metrics
        .iter()
        .filter(|m| {
            if m.has_inverted_bounds() {
                warn!(instance = %m.instance, source, "inverted bounds not merged");
                return false;
            }
            true
        })
        .map(|m| ledger.merge(&m.instance, m.lower_bound, m.upper_bound, source))
        .filter(|outcome: &MergeOutcome| outcome.changed())
        .count()
}
