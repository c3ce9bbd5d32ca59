//! Solver jobs and their terminal states.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One solver invocation: an instance under a time budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Instance id (file name without `.col`/`.gph`).
    pub instance: String,
    /// Path of the instance file handed to the solver.
    pub instance_path: PathBuf,
    /// Dedicated log capturing the solver's stdout and stderr.
    pub log_path: PathBuf,
    /// Soft limit the solver is told about.
    pub time_limit: Duration,
    /// Wall-clock envelope after which the process is killed.
    pub hard_timeout: Duration,
}

/// Lifecycle of a job. Every state except `Pending` is terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    /// Solver exited cleanly.
    Completed,
    /// Killed after the hard timeout. Expected, not a failure.
    TimedOut,
    /// Spawn failure or abnormal exit.
    Failed { reason: String },
    /// Log already present and the run was not forced.
    Skipped,
}

impl JobStatus {
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::TimedOut => "timed-out",
            Self::Failed { .. } => "failed",
            Self::Skipped => "skipped",
        }
    }
}

/// Terminal record of a dispatched job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub instance: String,
    pub log_path: PathBuf,
    #[serde(flatten)]
    pub status: JobStatus,
    pub elapsed_ms: u64,
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub workers: usize,
    pub records: Vec<JobRecord>,
}

impl RunSummary {
    fn count(&self, f: impl Fn(&JobStatus) -> bool) -> usize {
        self.records.iter().filter(|r| f(&r.status)).count()
    }

    pub fn completed(&self) -> usize {
        self.count(|s| matches!(s, JobStatus::Completed))
    }

    pub fn timed_out(&self) -> usize {
        self.count(|s| matches!(s, JobStatus::TimedOut))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, JobStatus::Failed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, JobStatus::Skipped))
    }

    pub fn total(&self) -> usize {
        self.records.len()
    }

    /// Records of failed jobs, in instance order.
    pub fn failures(&self) -> Vec<&JobRecord> {
        let mut failures: Vec<&JobRecord> = self
            .records
            .iter()
            .filter(|r| matches!(r.status, JobStatus::Failed { .. }))
            .collect();
        failures.sort_by(|a, b| a.instance.cmp(&b.instance));
        failures
    }
}
