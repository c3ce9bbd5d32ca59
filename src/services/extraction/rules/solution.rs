use crate::domain::ports::{ExtractionRule, LogView, MetricPatch};

const SOLUTION_MARKER: &str = "SOL";
const PARTITION_SEPARATOR: &str = " = ";

/// Raw partition text from the last `SOL: <value> = {..} {..}` line.
///
/// Parsing and checking the partition is the verifier's job; this rule only
/// hands the text on.
#[derive(Debug, Default, Clone, Copy)]
pub struct SolutionRule;

impl ExtractionRule for SolutionRule {
    fn name(&self) -> &'static str {
        "solution"
    }

    fn extract(&self, log: &LogView<'_>) -> MetricPatch {
        let solution = log
            .lines()
            .iter()
            .rev()
            .filter(|line| line.contains(SOLUTION_MARKER))
            .find_map(|line| line.rsplit_once(PARTITION_SEPARATOR))
            .map(|(_, partition)| partition.trim().to_string())
            .filter(|partition| partition.starts_with('{'));

        MetricPatch {
            solution,
            ..Default::default()
        }
    }
}
