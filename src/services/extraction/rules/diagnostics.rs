//! Error and warning markers.
//!
//! The solver logs through loguru, whose level column reads `FATL|`, `ERR|`
//! or `WARN|`. Matching on the column rather than the bare word keeps text
//! such as `INTERRUPTED` or `error bound` out of the counts.

use crate::domain::ports::{ExtractionRule, LogView, MetricPatch};

const ERROR_LEVELS: [&str; 2] = ["FATL|", "ERR|"];
const WARNING_LEVEL: &str = "WARN|";

/// Collects every error-level line verbatim.
#[derive(Debug, Default, Clone, Copy)]
pub struct ErrorMarkerRule;

impl ExtractionRule for ErrorMarkerRule {
    fn name(&self) -> &'static str {
        "errors"
    }

    fn extract(&self, log: &LogView<'_>) -> MetricPatch {
        let errors: Vec<String> = log
            .lines()
            .iter()
            .filter(|line| ERROR_LEVELS.iter().any(|level| line.contains(level)))
            .map(|line| line.trim().to_string())
            .collect();

        for line in &errors {
            tracing::error!(instance = log.instance(), line = %line, "solver reported an error");
        }

        MetricPatch {
            errors,
            ..Default::default()
        }
    }
}

/// Counts warning-level lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct WarningMarkerRule;

impl ExtractionRule for WarningMarkerRule {
    fn name(&self) -> &'static str {
        "warnings"
    }

    fn extract(&self, log: &LogView<'_>) -> MetricPatch {
        let warnings = u32::try_from(log.count(WARNING_LEVEL)).unwrap_or(u32::MAX);
        MetricPatch {
            warnings: Some(warnings),
            ..Default::default()
        }
    }
}
