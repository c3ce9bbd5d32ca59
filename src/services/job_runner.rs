//! Job Runner service: one solver process per instance on a bounded pool.
//!
//! Every job ends in exactly one terminal state. A log that already exists is
//! the resume marker: without `force` the job is skipped and the file is not
//! touched.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tokio::sync::{mpsc, Semaphore};
use tracing::{error, info, warn};

use crate::domain::errors::{DomainError, DomainResult, LaunchError};
use crate::domain::models::{instance_id, Config, Job, JobRecord, JobStatus, RunSummary};
use crate::domain::ports::{LaunchOutcome, SolverLauncher};

/// Configuration for the job runner.
#[derive(Debug, Clone)]
pub struct JobRunnerConfig {
    /// Directory receiving one `<instance file name>.log` per job.
    pub logs_dir: PathBuf,
    /// Soft limit passed to the solver.
    pub time_limit: Duration,
    /// Multiplier applied to the soft limit to get the kill timeout.
    pub kill_grace_factor: f64,
    /// Maximum concurrent solver processes.
    pub workers: usize,
    /// Re-run jobs whose log already exists.
    pub force: bool,
    /// Fixed seed for dispatch order; random when unset.
    pub shuffle_seed: Option<u64>,
}

impl JobRunnerConfig {
    /// Runner settings from the loaded configuration. Logs go under
    /// `<logs_dir>/<solver label>/`.
    pub fn from_config(config: &Config) -> Self {
        Self {
            logs_dir: config.paths.logs_dir.join(config.solver.label()),
            time_limit: config.runner.time_limit(),
            kill_grace_factor: config.runner.kill_grace_factor,
            workers: config.runner.workers(),
            force: false,
            shuffle_seed: config.runner.shuffle_seed,
        }
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = time_limit;
        self
    }

    /// Wall-clock envelope after which a solver is killed.
    pub fn hard_timeout(&self) -> Duration {
        self.time_limit.mul_f64(self.kill_grace_factor)
    }
}

impl Default for JobRunnerConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Progress event emitted while a run is in flight.
#[derive(Debug, Clone)]
pub enum RunnerEvent {
    /// Dispatch is about to begin.
    Started { total: usize, workers: usize },
    /// A solver process is being launched.
    JobStarted { instance: String },
    /// A job reached its terminal state.
    JobFinished {
        record: JobRecord,
        done: usize,
        total: usize,
    },
    /// Every job is terminal.
    Finished { summary: RunSummary },
}

/// Launches the solver over a set of instances.
pub struct JobRunner {
    launcher: Arc<dyn SolverLauncher>,
    config: JobRunnerConfig,
}

impl JobRunner {
    pub fn new(launcher: Arc<dyn SolverLauncher>, config: JobRunnerConfig) -> Self {
        Self { launcher, config }
    }

    pub fn config(&self) -> &JobRunnerConfig {
        &self.config
    }

    /// Jobs for `instances` in dispatch order.
    pub fn plan(&self, instances: &[PathBuf]) -> Vec<Job> {
        self.partition(instances).0
    }

    /// Jobs in dispatch order, plus a `Failed` record for every path whose
    /// file name cannot name a log.
    fn partition(&self, instances: &[PathBuf]) -> (Vec<Job>, Vec<JobRecord>) {
        let mut jobs = Vec::with_capacity(instances.len());
        let mut rejected = Vec::new();

        for path in instances {
            match path.file_name().and_then(|name| name.to_str()) {
                Some(file_name) => jobs.push(Job {
                    instance: instance_id(file_name),
                    instance_path: path.clone(),
                    log_path: self.config.logs_dir.join(format!("{file_name}.log")),
                    time_limit: self.config.time_limit,
                    hard_timeout: self.config.hard_timeout(),
                }),
                None => {
                    let name = path.file_name().map_or_else(
                        || path.display().to_string(),
                        |name| name.to_string_lossy().into_owned(),
                    );
                    warn!(path = %path.display(), "instance file name is not valid UTF-8");
                    rejected.push(JobRecord {
                        instance: instance_id(&name),
                        log_path: self.config.logs_dir.join(format!("{name}.log")),
                        status: JobStatus::Failed {
                            reason: format!("unusable instance file name: {}", path.display()),
                        },
                        elapsed_ms: 0,
                    });
                }
            }
        }

        match self.config.shuffle_seed {
            Some(seed) => jobs.shuffle(&mut StdRng::seed_from_u64(seed)),
            None => jobs.shuffle(&mut rand::thread_rng()),
        }
        (jobs, rejected)
    }

    /// Run every instance and wait for all jobs to finish.
    pub async fn run(&self, instances: &[PathBuf]) -> DomainResult<RunSummary> {
        // No listener: sends fail immediately instead of filling the buffer.
        let (tx, _) = mpsc::channel(1);
        self.run_with_events(instances, tx).await
    }

    /// Run every instance, streaming progress over `event_tx`.
    ///
    /// Only setup problems (an unusable log directory) fail the call; each
    /// job's own failure is recorded in the summary.
    pub async fn run_with_events(
        &self,
        instances: &[PathBuf],
        event_tx: mpsc::Sender<RunnerEvent>,
    ) -> DomainResult<RunSummary> {
        std::fs::create_dir_all(&self.config.logs_dir)
            .map_err(|e| DomainError::io(&self.config.logs_dir, e))?;

        let (jobs, rejected) = self.partition(instances);
        let total = jobs.len() + rejected.len();
        let workers = self.config.workers.max(1);
        let started_at = Utc::now();
        let clock = Instant::now();

        info!(
            instances = total,
            workers,
            time_limit_secs = self.config.time_limit.as_secs(),
            hard_timeout_secs = self.config.hard_timeout().as_secs_f64(),
            logs_dir = %self.config.logs_dir.display(),
            "starting run"
        );
        let _ = event_tx.send(RunnerEvent::Started { total, workers }).await;

        for (i, record) in rejected.iter().enumerate() {
            let _ = event_tx
                .send(RunnerEvent::JobFinished {
                    record: record.clone(),
                    done: i + 1,
                    total,
                })
                .await;
        }

        let semaphore = Arc::new(Semaphore::new(workers));
        let done = Arc::new(AtomicUsize::new(rejected.len()));
        let mut handles = Vec::with_capacity(total);

        for job in jobs {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| DomainError::ValidationFailed("worker pool closed".to_string()))?;

            let launcher = Arc::clone(&self.launcher);
            let force = self.config.force;
            let event_tx = event_tx.clone();
            let done = Arc::clone(&done);
            let instance = job.instance.clone();
            let log_path = job.log_path.clone();

            let handle = tokio::spawn(async move {
                let record = {
                    let _permit = permit;
                    execute_job(launcher, job, force, &event_tx).await
                };
                let finished = done.fetch_add(1, Ordering::SeqCst) + 1;
                log_progress(clock.elapsed(), finished, total);
                let _ = event_tx
                    .send(RunnerEvent::JobFinished {
                        record: record.clone(),
                        done: finished,
                        total,
                    })
                    .await;
                record
            });
            handles.push((instance, log_path, handle));
        }

        let mut records = rejected;
        records.reserve(total);
        for (instance, log_path, handle) in handles {
            match handle.await {
                Ok(record) => records.push(record),
                Err(e) => {
                    error!(instance = %instance, error = %e, "job worker panicked");
                    records.push(JobRecord {
                        instance,
                        log_path,
                        status: JobStatus::Failed {
                            reason: format!("worker panicked: {e}"),
                        },
                        elapsed_ms: 0,
                    });
                }
            }
        }

        let summary = RunSummary {
            started_at,
            finished_at: Utc::now(),
            workers,
            records,
        };
        info!(
            completed = summary.completed(),
            timed_out = summary.timed_out(),
            failed = summary.failed(),
            skipped = summary.skipped(),
            elapsed_secs = clock.elapsed().as_secs(),
            "run finished"
        );
        let _ = event_tx
            .send(RunnerEvent::Finished {
                summary: summary.clone(),
            })
            .await;

        Ok(summary)
    }
}

/// Drive one job to its terminal state.
async fn execute_job(
    launcher: Arc<dyn SolverLauncher>,
    job: Job,
    force: bool,
    event_tx: &mpsc::Sender<RunnerEvent>,
) -> JobRecord {
    let start = Instant::now();
    let record = |status: JobStatus| JobRecord {
        instance: job.instance.clone(),
        log_path: job.log_path.clone(),
        status,
        elapsed_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
    };

    if !force && job.log_path.exists() {
        warn!(instance = %job.instance, "log exists, skipping");
        return record(JobStatus::Skipped);
    }

    let log = match std::fs::File::create(&job.log_path) {
        Ok(file) => file,
        Err(source) => {
            let err = LaunchError::LogFile {
                path: job.log_path.clone(),
                source,
            };
            error!(instance = %job.instance, error = %err, "cannot open log");
            return record(JobStatus::Failed {
                reason: err.to_string(),
            });
        }
    };

    info!(instance = %job.instance, launcher = launcher.name(), "started");
    let _ = event_tx
        .send(RunnerEvent::JobStarted {
            instance: job.instance.clone(),
        })
        .await;

    let status = match launcher.launch(&job, log).await {
        Ok(LaunchOutcome::Exited { code: Some(0) }) => {
            match last_summary_line(&job.log_path) {
                Some(tail) => info!(instance = %job.instance, tail = %tail, "done"),
                None => info!(instance = %job.instance, "done"),
            }
            JobStatus::Completed
        }
        Ok(LaunchOutcome::Exited { code }) => {
            let reason = match code {
                Some(code) => format!("solver exited with status {code}"),
                None => "solver terminated by signal".to_string(),
            };
            error!(instance = %job.instance, reason = %reason, "solver failed");
            JobStatus::Failed { reason }
        }
        Ok(LaunchOutcome::TimedOut) => {
            warn!(
                instance = %job.instance,
                hard_timeout_secs = job.hard_timeout.as_secs_f64(),
                "timed out"
            );
            JobStatus::TimedOut
        }
        Err(err) => {
            if matches!(err, LaunchError::Spawn { .. }) {
                // Nothing ran; drop the empty log so a resume retries the job.
                if let Err(e) = std::fs::remove_file(&job.log_path) {
                    warn!(instance = %job.instance, error = %e, "could not remove empty log");
                }
            }
            error!(instance = %job.instance, error = %err, "launch failed");
            JobStatus::Failed {
                reason: err.to_string(),
            }
        }
    };

    record(status)
}

/// Second-to-last non-blank log line, trimmed for a one-line report.
fn last_summary_line(path: &Path) -> Option<String> {
    let text = std::fs::read_to_string(path).ok()?;
    let line = text
        .lines()
        .rev()
        .filter(|line| !line.trim().is_empty())
        .nth(1)?;
    Some(line.split_whitespace().collect::<Vec<_>>().join(" ").chars().take(80).collect())
}

fn log_progress(elapsed: Duration, done: usize, total: usize) {
    if done == 0 {
        return;
    }
    let average = elapsed.as_secs_f64() / done as f64;
    let remaining = average * (total - done) as f64;
    info!(
        done,
        total,
        elapsed_secs = elapsed.as_secs(),
        average_secs = format!("{average:.1}"),
        remaining_secs = remaining as u64,
        "progress"
    );
}
