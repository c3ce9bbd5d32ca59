use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::cli::display::{
    alert, bound, count_label, flag, list_table, notice, render_list, section_header, seconds,
    truncate_ellipsis, CommandOutput,
};
use crate::cli::{display, Verdict};
use crate::domain::models::{Config, MetricSet};
use crate::infrastructure::storage::{build_index, write_ledger, write_metrics};
use crate::services::{BatchContext, BatchReport};

#[derive(Debug, Args)]
pub struct ParseArgs {
    /// Directory holding one `<instance>.log` per instance
    pub log_dir: PathBuf,

    /// Metrics table to write (CSV)
    pub output: PathBuf,

    /// Also write the batch's bounds as a YAML ledger
    #[arg(short, long, value_name = "FILE")]
    pub ledger: Option<PathBuf>,

    /// Provenance label for the bounds; defaults to the log directory name
    #[arg(short, long)]
    pub source: Option<String>,

    /// Time limit the logs were produced under, in seconds
    #[arg(short, long, value_name = "SECS")]
    pub time_limit: Option<u64>,

    /// Parse worker count
    #[arg(short, long)]
    pub workers: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ParseOutput {
    pub report: BatchReport,
    pub output: PathBuf,
    pub ledger_path: Option<PathBuf>,
}

impl CommandOutput for ParseOutput {
    fn to_human(&self) -> String {
        let mut out = render_batch(&self.report);
        out.push_str(&format!("\n\nMetrics written to {}", self.output.display()));
        if let Some(path) = &self.ledger_path {
            out.push_str(&format!("\nLedger written to {}", path.display()));
        }
        out
    }
}

pub async fn execute(args: ParseArgs, config: &Config, json: bool) -> Result<Verdict> {
    let source = args.source.clone().unwrap_or_else(|| {
        args.log_dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("logs")
            .to_string()
    });
    let index = build_index(&config.paths.instances_dir)
        .context("Failed to index instance files")?;

    let mut batch = BatchContext::new(source, index, config);
    if let Some(secs) = args.time_limit {
        batch = batch.with_time_limit(Duration::from_secs(secs));
    }
    if let Some(workers) = args.workers {
        batch = batch.with_workers(workers);
    }

    let report = batch
        .parse_logs(&args.log_dir)
        .await
        .with_context(|| format!("Failed to parse logs in {}", args.log_dir.display()))?;

    write_metrics(&args.output, &report.metrics)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    if let Some(path) = &args.ledger {
        write_ledger(path, &report.ledger)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    let verdict = Verdict::from_clean(report.is_clean());
    display::output(
        &ParseOutput {
            report,
            output: args.output,
            ledger_path: args.ledger,
        },
        json,
    );
    Ok(verdict)
}

/// Metrics table plus every finding of a batch.
pub(crate) fn render_batch(report: &BatchReport) -> String {
    let mut out = format!(
        "Batch {} ({}): {}, {} solved",
        report.batch_id,
        report.source,
        count_label(report.metrics.len(), "instance", "instances"),
        report.solved()
    );

    out.push('\n');
    out.push_str(&render_list(
        "instance",
        &metrics_table(&report.metrics),
        report.metrics.len(),
    ));

    let flagged: Vec<&MetricSet> = report
        .metrics
        .iter()
        .filter(|m| m.has_unverified_errors())
        .collect();
    if !flagged.is_empty() {
        out.push_str(&section_header("Errors"));
        for m in flagged {
            out.push_str(&format!("\n  {}", alert(&m.instance)));
            for line in &m.errors {
                out.push_str(&format!("\n    {}", truncate_ellipsis(line, 100)));
            }
            for anomaly in m.anomalies.iter().filter(|a| a.is_error()) {
                out.push_str(&format!("\n    {anomaly:?}"));
            }
        }
    }

    if !report.violations.is_empty() {
        out.push_str(&section_header("Rejected solutions"));
        for (instance, violations) in &report.violations {
            out.push_str(&format!(
                "\n  {}: {}",
                alert(instance),
                count_label(violations.len(), "violation", "violations")
            ));
            for v in violations.iter().take(5) {
                out.push_str(&format!("\n    {v}"));
            }
        }
    }

    if !report.failures.is_empty() {
        out.push_str(&section_header("Unreadable logs"));
        for failure in &report.failures {
            out.push_str(&format!(
                "\n  {}: {}",
                alert(&failure.instance),
                failure.reason
            ));
        }
    }

    let multi: Vec<&str> = report
        .metrics
        .iter()
        .filter(|m| m.components.is_some_and(|c| c > 1))
        .map(|m| m.instance.as_str())
        .collect();
    if !multi.is_empty() {
        out.push_str(&format!(
            "\n\n{}",
            notice(&format!(
                "Bounds withheld for multi-component instances: {}",
                multi.join(", ")
            ))
        ));
    }

    out
}

fn metrics_table(metrics: &[MetricSet]) -> comfy_table::Table {
    let mut table = list_table(&[
        "instance", "lb", "ub", "time", "solved", "comps", "errors", "warnings",
    ]);
    for m in metrics {
        table.add_row(vec![
            m.instance.clone(),
            bound(m.lower_bound),
            bound(m.upper_bound),
            seconds(m.runtime_secs),
            flag(m.solved).to_string(),
            m.components.map_or_else(|| "-".to_string(), |c| c.to_string()),
            m.error_count().to_string(),
            m.warnings.to_string(),
        ]);
    }
    table
}
