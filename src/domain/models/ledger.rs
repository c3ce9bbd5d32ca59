//! Best-known bounds per instance, with provenance.
//!
//! A ledger only ever tightens: [`Ledger::merge`] raises a lower bound or
//! lowers an upper bound when the new observation is strictly better, and
//! leaves the entry untouched otherwise.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::metrics::MetricSet;

/// A bound value and the source that established it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcedBound {
    pub value: i64,
    pub source: String,
}

impl SourcedBound {
    pub fn new(value: i64, source: impl Into<String>) -> Self {
        Self {
            value,
            source: source.into(),
        }
    }
}

/// Ledger record for one instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower_bound: Option<SourcedBound>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_bound: Option<SourcedBound>,
}

impl LedgerEntry {
    pub fn lower(&self) -> Option<i64> {
        self.lower_bound.as_ref().map(|b| b.value)
    }

    pub fn upper(&self) -> Option<i64> {
        self.upper_bound.as_ref().map(|b| b.value)
    }

    pub fn is_closed(&self) -> bool {
        matches!((self.lower(), self.upper()), (Some(lb), Some(ub)) if lb == ub)
    }
}

/// Which sides of an entry a merge tightened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub lower_improved: bool,
    pub upper_improved: bool,
}

impl MergeOutcome {
    pub const fn changed(self) -> bool {
        self.lower_improved || self.upper_improved
    }
}

/// A bound pair observed for an instance by some candidate data set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundObservation {
    pub instance: String,
    pub lower: Option<i64>,
    pub upper: Option<i64>,
}

impl BoundObservation {
    pub fn is_closed(&self) -> bool {
        matches!((self.lower, self.upper), (Some(lb), Some(ub)) if lb == ub)
    }
}

impl From<&MetricSet> for BoundObservation {
    fn from(metrics: &MetricSet) -> Self {
        Self {
            instance: metrics.instance.clone(),
            lower: metrics.lower_bound,
            upper: metrics.upper_bound,
        }
    }
}

/// Instance → best bounds. Ordered by instance id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    entries: BTreeMap<String, LedgerEntry>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, instance: &str) -> Option<&LedgerEntry> {
        self.entries.get(instance)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &LedgerEntry)> {
        self.entries.iter()
    }

    /// Merge an observation, keeping the tighter bound on each side.
    ///
    /// A side is only replaced when strictly better, so replaying the same or
    /// a weaker observation never changes the ledger or its provenance.
    pub fn merge(
        &mut self,
        instance: &str,
        lower: Option<i64>,
        upper: Option<i64>,
        source: &str,
    ) -> MergeOutcome {
        if lower.is_none() && upper.is_none() {
            return MergeOutcome::default();
        }

        let entry = self.entries.entry(instance.to_string()).or_default();
        let mut outcome = MergeOutcome::default();

        if let Some(lb) = lower {
            if entry.lower().map_or(true, |current| lb > current) {
                entry.lower_bound = Some(SourcedBound::new(lb, source));
                outcome.lower_improved = true;
            }
        }

        if let Some(ub) = upper {
            if entry.upper().map_or(true, |current| ub < current) {
                entry.upper_bound = Some(SourcedBound::new(ub, source));
                outcome.upper_improved = true;
            }
        }

        outcome
    }

    /// Candidate view of every entry, for comparison against another ledger.
    pub fn observations(&self) -> Vec<BoundObservation> {
        self.entries
            .iter()
            .map(|(instance, entry)| BoundObservation {
                instance: instance.clone(),
                lower: entry.lower(),
                upper: entry.upper(),
            })
            .collect()
    }
}

impl FromIterator<(String, LedgerEntry)> for Ledger {
    fn from_iter<I: IntoIterator<Item = (String, LedgerEntry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
