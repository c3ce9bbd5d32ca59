use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::cli::commands::parse::render_batch;
use crate::cli::display::{self, alert, job_status, section_header, CommandOutput};
use crate::cli::output::spawn_run_progress;
use crate::cli::Verdict;
use crate::domain::models::{Config, JobStatus, RunSummary};
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::solver::SubprocessLauncher;
use crate::infrastructure::storage::{build_index, resolve_sets, write_ledger, write_metrics};
use crate::services::{BatchContext, BatchReport, JobRunner, JobRunnerConfig};

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Instance sets to run, joined with `+` (e.g. `easy+hard`)
    pub instances: String,

    /// Soft time limit per instance, in seconds
    #[arg(short, long, value_name = "SECS")]
    pub time_limit: Option<u64>,

    /// Re-run instances whose log already exists
    #[arg(short, long)]
    pub force: bool,

    /// Concurrent solver processes
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Write the metrics table here (CSV)
    #[arg(short, long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Write the batch's bounds here (YAML ledger)
    #[arg(short, long, value_name = "FILE")]
    pub ledger: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct RunOutput {
    pub summary: RunSummary,
    pub report: BatchReport,
    pub report_path: Option<PathBuf>,
    pub ledger_path: Option<PathBuf>,
}

impl CommandOutput for RunOutput {
    fn to_human(&self) -> String {
        let s = &self.summary;
        let elapsed = (s.finished_at - s.started_at).to_std().unwrap_or_default();
        let mut out = format!(
            "Ran {} jobs on {} workers in {}: {} completed, {} timed out, {} failed, {} skipped",
            s.total(),
            s.workers,
            display::duration(elapsed),
            s.completed(),
            s.timed_out(),
            s.failed(),
            s.skipped()
        );

        let failures = s.failures();
        if !failures.is_empty() {
            out.push_str(&section_header("Failed jobs"));
            for record in failures {
                if let JobStatus::Failed { reason } = &record.status {
                    out.push_str(&format!(
                        "\n  {} [{}] {reason}",
                        alert(&record.instance),
                        job_status(&record.status)
                    ));
                }
            }
        }

        out.push_str("\n\n");
        out.push_str(&render_batch(&self.report));
        if let Some(path) = &self.report_path {
            out.push_str(&format!("\n\nMetrics written to {}", path.display()));
        }
        if let Some(path) = &self.ledger_path {
            out.push_str(&format!("\nLedger written to {}", path.display()));
        }
        out
    }
}

pub async fn execute(args: RunArgs, config: &Config, json: bool) -> Result<Verdict> {
    ConfigLoader::validate_for_run(config).context("Configuration cannot launch the solver")?;
    if args.time_limit == Some(0) {
        anyhow::bail!("--time-limit must be greater than zero");
    }

    let instances = resolve_sets(&config.paths.instances_dir, &args.instances)
        .with_context(|| format!("Failed to resolve instance set '{}'", args.instances))?;

    let mut runner_config = JobRunnerConfig::from_config(config).with_force(args.force);
    if let Some(secs) = args.time_limit {
        runner_config = runner_config.with_time_limit(Duration::from_secs(secs));
    }
    if let Some(workers) = args.workers {
        runner_config.workers = workers.max(1);
    }
    let time_limit = runner_config.time_limit;

    let launcher = Arc::new(SubprocessLauncher::from_config(&config.solver));
    let runner = JobRunner::new(launcher, runner_config);

    let index = build_index(&config.paths.instances_dir)
        .context("Failed to index instance files")?;
    let mut batch =
        BatchContext::new(config.solver.label(), index, config).with_time_limit(time_limit);

    let (event_tx, event_rx) = mpsc::channel(100);
    let progress = spawn_run_progress(event_rx, json);
    let result = batch
        .run_and_parse_with_events(&runner, &instances, event_tx)
        .await;
    if let Err(e) = progress.await {
        tracing::debug!(error = %e, "progress task ended abnormally");
    }
    let (summary, report) = result.context("Run failed")?;

    if let Some(path) = &args.report {
        write_metrics(path, &report.metrics)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    if let Some(path) = &args.ledger {
        write_ledger(path, &report.ledger)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    let verdict = Verdict::from_clean(summary.failed() == 0 && report.is_clean());
    display::output(
        &RunOutput {
            summary,
            report,
            report_path: args.report,
            ledger_path: args.ledger,
        },
        json,
    );
    Ok(verdict)
}
