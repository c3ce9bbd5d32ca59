use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::cli::commands::{load_ledger, load_observations};
use crate::cli::display::{
    self, alert, bound_pair, count_label, list_table, notice, render_list, section_header,
    CommandOutput,
};
use crate::cli::Verdict;
use crate::services::{compare, ComparisonReport, Inconsistency};

#[derive(Debug, Args)]
pub struct CompareArgs {
    /// Baseline bounds: a YAML ledger or a CSV metrics table
    pub baseline: PathBuf,

    /// Candidate bounds: a CSV metrics table or a YAML ledger
    pub candidate: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct CompareOutput {
    pub baseline: PathBuf,
    pub candidate: PathBuf,
    pub candidates: usize,
    pub hard_inconsistencies: usize,
    #[serde(flatten)]
    pub report: ComparisonReport,
}

impl CommandOutput for CompareOutput {
    fn to_human(&self) -> String {
        let report = &self.report;
        let mut out = format!(
            "Compared {} from {} against {}",
            count_label(self.candidates, "instance", "instances"),
            self.candidate.display(),
            self.baseline.display()
        );

        let (hard, soft): (Vec<&Inconsistency>, Vec<&Inconsistency>) =
            report.inconsistent.iter().partition(|i| i.is_hard());

        if !hard.is_empty() {
            out.push_str(&section_header("Contradictions"));
            out.push_str(&format!("\n{}", inconsistency_table(&hard, true)));
        }
        if !soft.is_empty() {
            out.push_str(&section_header("Disagreements"));
            out.push_str(&format!("\n{}", inconsistency_table(&soft, false)));
        }

        out.push_str(&section_header("Improvements"));
        let mut table = list_table(&["instance", "baseline", "lb", "ub", "closed"]);
        for imp in &report.improved {
            table.add_row(vec![
                imp.instance.clone(),
                bound_pair(imp.baseline.lower, imp.baseline.upper),
                display::bound(imp.lower),
                display::bound(imp.upper),
                if imp.newly_closed { "new" } else { "" }.to_string(),
            ]);
        }
        out.push('\n');
        out.push_str(&render_list("improvement", &table, report.improved.len()));

        if !report.not_found.is_empty() {
            out.push_str(&format!(
                "\n\n{} not in baseline: {}",
                count_label(report.not_found.len(), "instance", "instances"),
                report.not_found.join(", ")
            ));
        }

        out.push_str(&format!(
            "\n\n{} hard, {} soft, {} improved ({} newly closed)",
            self.hard_inconsistencies,
            soft.len(),
            report.improved.len(),
            report.newly_closed()
        ));
        out
    }
}

fn inconsistency_table(rows: &[&Inconsistency], hard: bool) -> String {
    let mut table = list_table(&["instance", "baseline", "candidate", "reason"]);
    for row in rows {
        let reasons = row
            .reasons
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        table.add_row(vec![
            if hard {
                alert(&row.instance)
            } else {
                notice(&row.instance)
            },
            bound_pair(row.baseline.lower, row.baseline.upper),
            bound_pair(row.candidate.lower, row.candidate.upper),
            reasons,
        ]);
    }
    table.to_string()
}

pub async fn execute(args: CompareArgs, json: bool) -> Result<Verdict> {
    let baseline = load_ledger(&args.baseline)?;
    let candidates = load_observations(&args.candidate)?;
    tracing::info!(
        baseline = %args.baseline.display(),
        baseline_entries = baseline.len(),
        candidate = %args.candidate.display(),
        candidates = candidates.len(),
        "comparing bounds"
    );

    let report = compare(&baseline, &candidates);
    let verdict = Verdict::from_clean(!report.has_hard_inconsistency());

    display::output(
        &CompareOutput {
            baseline: args.baseline,
            candidate: args.candidate,
            candidates: candidates.len(),
            hard_inconsistencies: report.hard_count(),
            report,
        },
        json,
    );
    Ok(verdict)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{BoundObservation, Ledger};

    fn output() -> CompareOutput {
        let mut baseline = Ledger::new();
        baseline.merge("x", Some(3), Some(5), "base");
        baseline.merge("y", Some(4), Some(4), "base");
        baseline.merge("z", Some(2), Some(9), "base");

        let candidates = vec![
            BoundObservation {
                instance: "x".into(),
                lower: Some(6),
                upper: Some(6),
            },
            BoundObservation {
                instance: "z".into(),
                lower: Some(3),
                upper: Some(3),
            },
            BoundObservation {
                instance: "w".into(),
                lower: None,
                upper: Some(2),
            },
        ];
        let report = compare(&baseline, &candidates);
        CompareOutput {
            baseline: PathBuf::from("best.yaml"),
            candidate: PathBuf::from("run.csv"),
            candidates: candidates.len(),
            hard_inconsistencies: report.hard_count(),
            report,
        }
    }

    #[test]
    fn human_output_separates_sections() {
        let text = output().to_human();
        assert!(text.contains("Contradictions"));
        assert!(text.contains("lower 6 > baseline upper 5"));
        assert!(text.contains("Improvements"));
        assert!(text.contains("not in baseline: w"));
        assert!(text.contains("1 hard, 0 soft, 1 improved (1 newly closed)"));
    }

    #[test]
    fn json_output_flattens_report() {
        let json = output().to_json();
        assert_eq!(json["hard_inconsistencies"], 1);
        assert_eq!(json["not_found"][0], "w");
        assert_eq!(json["improved"][0]["instance"], "z");
        assert_eq!(
            json["inconsistent"][0]["reasons"][0]["kind"],
            "lower_above_baseline_upper"
        );
    }
}
