//! Runtime extraction.
//!
//! The solver prints its final elapsed time on the `atexit` line. A log that
//! ends mid-branching was cut by the time limit, so the run used the whole
//! budget. A log that stops at the license banner never ran at all.

use crate::domain::models::Anomaly;
use crate::domain::ports::{ExtractionRule, LogView, MetricPatch};

use super::number_after;

/// `(  12.345s)   loguru.cpp:560   INFO| atexit`
const RUN_COMPLETED: &str = "atexit";
/// `Computing coloring took 35.000000 seconds (...)`
const RUN_COMPLETED_SUMMARY: &str = "Computing coloring took";
const BRANCHING: &str = "Branching";
const LICENSE_FAILURE: &str = "Academic license";

/// Final elapsed seconds, with time-limit and license fallbacks.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuntimeRule;

impl RuntimeRule {
    /// Elapsed seconds from the loguru uptime prefix `(   0.020s)`.
    fn elapsed(line: &str) -> Option<f64> {
        let (head, _) = line.split_once("s)")?;
        let value = head.rsplit('(').next()?;
        value.trim().parse::<f64>().ok()
    }
}

impl ExtractionRule for RuntimeRule {
    fn name(&self) -> &'static str {
        "runtime"
    }

    fn extract(&self, log: &LogView<'_>) -> MetricPatch {
        let completed = log
            .first_matching(RUN_COMPLETED)
            .and_then(Self::elapsed)
            .or_else(|| {
                log.first_matching(RUN_COMPLETED_SUMMARY)
                    .and_then(|line| number_after(line, RUN_COMPLETED_SUMMARY))
            });

        if let Some(secs) = completed {
            return MetricPatch {
                runtime_secs: Some(secs),
                ..Default::default()
            };
        }

        if log.last_line().is_some_and(|line| line.contains(BRANCHING)) {
            return MetricPatch {
                runtime_secs: Some(log.time_limit().as_secs_f64()),
                ..Default::default()
            };
        }

        if let Some(line) = log.first_matching(LICENSE_FAILURE) {
            tracing::error!(
                instance = log.instance(),
                line = line.trim(),
                "solver halted at the license check"
            );
            return MetricPatch {
                anomalies: vec![Anomaly::LicenseFailure],
                ..Default::default()
            };
        }

        MetricPatch::default()
    }
}
