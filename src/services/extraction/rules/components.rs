use crate::domain::ports::{ExtractionRule, LogView, MetricPatch};

use super::occurrences;

const COMPONENT_PROCESSED: &str = "Connected component processed";

/// Number of connected components the solver processed separately.
#[derive(Debug, Default, Clone, Copy)]
pub struct ComponentCountRule;

impl ExtractionRule for ComponentCountRule {
    fn name(&self) -> &'static str {
        "components"
    }

    fn extract(&self, log: &LogView<'_>) -> MetricPatch {
        MetricPatch {
            components: occurrences(log, COMPONENT_PROCESSED)
                .map(|n| u32::try_from(n).unwrap_or(u32::MAX)),
            ..Default::default()
        }
    }
}
