use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::cli::display::{self, action_failure, action_success, count_label, CommandOutput};
use crate::cli::Verdict;
use crate::domain::models::Solution;
use crate::services::{SolutionVerifier, Violation};

/// Violations listed in human output before the rest are summarized.
const SHOWN_VIOLATIONS: usize = 20;

#[derive(Debug, Args)]
pub struct VerifyArgs {
    /// Solution such as `{0,1} {2}`, or `@FILE` to read it from a file
    pub solution: String,

    /// Instance file the solution colors
    pub instance: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct VerifyOutput {
    pub instance: PathBuf,
    pub vertices: usize,
    pub classes: usize,
    pub valid: bool,
    pub violations: Vec<Violation>,
}

impl CommandOutput for VerifyOutput {
    fn to_human(&self) -> String {
        if self.valid {
            return action_success(&format!(
                "{}: valid coloring of {} with {}",
                self.instance.display(),
                count_label(self.vertices, "vertex", "vertices"),
                count_label(self.classes, "color", "colors")
            ));
        }

        let mut out = action_failure(&format!(
            "{}: {}",
            self.instance.display(),
            count_label(self.violations.len(), "violation", "violations")
        ));
        for v in self.violations.iter().take(SHOWN_VIOLATIONS) {
            out.push_str(&format!("\n  {v}"));
        }
        if self.violations.len() > SHOWN_VIOLATIONS {
            out.push_str(&format!(
                "\n  ... and {} more",
                self.violations.len() - SHOWN_VIOLATIONS
            ));
        }
        out
    }
}

/// Solution text from the argument, reading `@FILE` when given.
///
/// A pasted log line (`... SOL 4.000000 = {0} {1}`) is reduced to the part
/// after the last ` = `.
fn solution_text(arg: &str) -> Result<String> {
    let raw = match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read solution file {path}"))?,
        None => arg.to_string(),
    };
    let text = raw
        .rsplit_once(" = ")
        .map_or(raw.as_str(), |(_, solution)| solution);
    Ok(text.trim().to_string())
}

pub async fn execute(args: VerifyArgs, json: bool) -> Result<Verdict> {
    let text = solution_text(&args.solution)?;
    let solution: Solution = text.parse().context("Malformed solution")?;

    let verifier = SolutionVerifier::new();
    let adjacency = verifier
        .adjacency(&args.instance)
        .with_context(|| format!("Failed to load instance {}", args.instance.display()))?;
    let violations = crate::services::verify(&adjacency, &solution);

    let valid = violations.is_empty();
    display::output(
        &VerifyOutput {
            instance: args.instance,
            vertices: adjacency.vertex_count(),
            classes: solution.len(),
            valid,
            violations,
        },
        json,
    );
    Ok(Verdict::from_clean(valid))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn literal_solution_passes_through() {
        assert_eq!(solution_text("{0,1} {2}").unwrap(), "{0,1} {2}");
    }

    #[test]
    fn log_line_is_reduced_to_the_solution() {
        let line = "(  0.1s) color.cpp:88 INFO| Coloring: SOL 2.000000 = {0, 2} {1}";
        assert_eq!(solution_text(line).unwrap(), "{0, 2} {1}");
    }

    #[test]
    fn solution_is_read_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{0}} {{1, 2}}").unwrap();
        let arg = format!("@{}", file.path().display());
        assert_eq!(solution_text(&arg).unwrap(), "{0} {1, 2}");
    }

    #[test]
    fn missing_solution_file_is_an_error() {
        assert!(solution_text("@/nonexistent/solution.txt").is_err());
    }

    #[tokio::test]
    async fn invalid_coloring_is_a_finding() {
        let mut instance = tempfile::NamedTempFile::new().unwrap();
        writeln!(instance, "p edge 3 2\ne 1 2\ne 2 3").unwrap();

        let args = VerifyArgs {
            solution: "{0, 1} {2}".into(),
            instance: instance.path().to_path_buf(),
        };
        assert_eq!(execute(args, true).await.unwrap(), Verdict::Findings);

        let args = VerifyArgs {
            solution: "{0, 2} {1}".into(),
            instance: instance.path().to_path_buf(),
        };
        assert_eq!(execute(args, true).await.unwrap(), Verdict::Clean);
    }

    #[test]
    fn human_output_caps_violation_list() {
        let out = VerifyOutput {
            instance: PathBuf::from("g.col"),
            vertices: 30,
            classes: 0,
            valid: false,
            violations: (0..30).map(|vertex| Violation::Uncovered { vertex }).collect(),
        };
        let text = out.to_human();
        assert!(text.contains("30 violations"));
        assert!(text.contains("... and 10 more"));
    }
}
