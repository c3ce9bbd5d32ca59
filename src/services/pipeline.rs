//! Batch pipeline: job runner, then extraction, verification and ledger
//! merge for every log of the batch.
//!
//! All per-batch state (rule registry, adjacency cache, instance index,
//! ledger) lives on an explicit [`BatchContext`]; nothing is global.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    instance_id, Anomaly, Config, InstanceIndex, Ledger, MetricSet, RunSummary, Solution,
};
use crate::services::extraction::ExtractionEngine;
use crate::services::job_runner::{JobRunner, RunnerEvent};
use crate::services::verifier::{SolutionVerifier, Violation};

const LOG_EXTENSION: &str = "log";

/// A log that could not be turned into metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseFailure {
    pub instance: String,
    pub path: PathBuf,
    pub reason: String,
}

/// Everything a batch produced.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub batch_id: Uuid,
    pub source: String,
    /// Sorted by instance id.
    pub metrics: Vec<MetricSet>,
    /// Verification violations per instance; only rejected solutions appear.
    pub violations: BTreeMap<String, Vec<Violation>>,
    pub failures: Vec<ParseFailure>,
    pub ledger: Ledger,
}

impl BatchReport {
    /// No error markers, license failures, rejected solutions or unreadable
    /// logs.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
            && self.violations.is_empty()
            && self.metrics.iter().all(|m| !m.has_unverified_errors())
    }

    pub fn solved(&self) -> usize {
        self.metrics.iter().filter(|m| m.solved == Some(true)).count()
    }

    pub fn with_errors(&self) -> usize {
        self.metrics.iter().filter(|m| m.has_unverified_errors()).count()
    }
}

enum LogOutcome {
    Parsed {
        metrics: MetricSet,
        violations: Vec<Violation>,
    },
    Failed(ParseFailure),
}

/// Per-batch state shared by every parse task.
pub struct BatchContext {
    id: Uuid,
    source: String,
    engine: Arc<ExtractionEngine>,
    verifier: Arc<SolutionVerifier>,
    instances: Arc<InstanceIndex>,
    time_limit: Duration,
    workers: usize,
    ledger: Ledger,
}

impl BatchContext {
    /// A batch labelled `source`, verifying against `instances`.
    pub fn new(source: impl Into<String>, instances: InstanceIndex, config: &Config) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: source.into(),
            engine: Arc::new(ExtractionEngine::default()),
            verifier: Arc::new(SolutionVerifier::new()),
            instances: Arc::new(instances),
            time_limit: config.runner.time_limit(),
            workers: config.parser.workers(),
            ledger: Ledger::new(),
        }
    }

    pub fn with_engine(mut self, engine: ExtractionEngine) -> Self {
        self.engine = Arc::new(engine);
        self
    }

    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = time_limit;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Start from an existing ledger instead of an empty one.
    pub fn with_ledger(mut self, ledger: Ledger) -> Self {
        self.ledger = ledger;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Run the solver over `instances`, then parse the resulting logs.
    pub async fn run_and_parse(
        &mut self,
        runner: &JobRunner,
        instances: &[PathBuf],
    ) -> DomainResult<(RunSummary, BatchReport)> {
        // No listener: sends fail immediately instead of filling the buffer.
        let (tx, _) = mpsc::channel(1);
        self.run_and_parse_with_events(runner, instances, tx).await
    }

    /// [`Self::run_and_parse`], streaming runner progress over `event_tx`.
    pub async fn run_and_parse_with_events(
        &mut self,
        runner: &JobRunner,
        instances: &[PathBuf],
        event_tx: mpsc::Sender<RunnerEvent>,
    ) -> DomainResult<(RunSummary, BatchReport)> {
        let summary = runner.run_with_events(instances, event_tx).await?;
        let report = self.parse_logs(&runner.config().logs_dir).await?;
        Ok((summary, report))
    }

    /// Parse every `*.log` file directly under `log_dir`.
    ///
    /// Only an unreadable directory fails the call. Each log that cannot be
    /// read is reported in [`BatchReport::failures`].
    #[instrument(skip(self), fields(batch = %self.id, source = %self.source))]
    pub async fn parse_logs(&mut self, log_dir: &Path) -> DomainResult<BatchReport> {
        let logs = list_logs(log_dir)?;
        info!(logs = logs.len(), workers = self.workers, "parsing logs");

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut handles = Vec::with_capacity(logs.len());

        for path in logs {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| DomainError::ValidationFailed("parse pool closed".to_string()))?;

            let engine = Arc::clone(&self.engine);
            let verifier = Arc::clone(&self.verifier);
            let instances = Arc::clone(&self.instances);
            let time_limit = self.time_limit;
            let task_path = path.clone();

            let handle = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                process_log(&engine, &verifier, &instances, &task_path, time_limit)
            });
            handles.push((path, handle));
        }

        let mut metrics = Vec::new();
        let mut violations = BTreeMap::new();
        let mut failures = Vec::new();

        for (path, handle) in handles {
            match handle.await {
                Ok(LogOutcome::Parsed {
                    metrics: m,
                    violations: v,
                }) => {
                    if !v.is_empty() {
                        violations.insert(m.instance.clone(), v);
                    }
                    metrics.push(m);
                }
                Ok(LogOutcome::Failed(failure)) => failures.push(failure),
                Err(e) => {
                    error!(path = %path.display(), error = %e, "parse task panicked");
                    failures.push(ParseFailure {
                        instance: log_instance(&path),
                        path,
                        reason: format!("parse task panicked: {e}"),
                    });
                }
            }
        }

        metrics.sort_by(|a, b| a.instance.cmp(&b.instance));
        failures.sort_by(|a, b| a.instance.cmp(&b.instance));

        let mut changed = 0;
        for m in &metrics {
            if self.merge_into_ledger(m) {
                changed += 1;
            }
        }

        info!(
            parsed = metrics.len(),
            failures = failures.len(),
            rejected_solutions = violations.len(),
            ledger_changes = changed,
            "batch parsed"
        );

        Ok(BatchReport {
            batch_id: self.id,
            source: self.source.clone(),
            metrics,
            violations,
            failures,
            ledger: self.ledger.clone(),
        })
    }

    /// Merge one instance's bounds. Inverted bounds are not merged, and an
    /// upper bound backed by a rejected solution is dropped.
    fn merge_into_ledger(&mut self, metrics: &MetricSet) -> bool {
        if metrics.has_inverted_bounds() {
            return false;
        }
        let rejected = metrics.has_anomaly(|a| {
            matches!(
                a,
                Anomaly::InvalidSolution { .. } | Anomaly::MalformedSolution { .. }
            )
        });
        let upper = if rejected { None } else { metrics.upper_bound };
        self.ledger
            .merge(&metrics.instance, metrics.lower_bound, upper, &self.source)
            .changed()
    }
}

/// `*.log` files under `dir`, sorted by path.
fn list_logs(dir: &Path) -> DomainResult<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| DomainError::io(dir, e))?;
    let mut logs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == LOG_EXTENSION))
        .collect();
    logs.sort();
    Ok(logs)
}

/// Instance file name a log belongs to: `myciel3.col.log` -> `myciel3.col`.
fn log_file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}

fn log_instance(path: &Path) -> String {
    instance_id(&log_file_stem(path))
}

fn process_log(
    engine: &ExtractionEngine,
    verifier: &SolutionVerifier,
    instances: &InstanceIndex,
    path: &Path,
    time_limit: Duration,
) -> LogOutcome {
    let file_name = log_file_stem(path);
    let instance = instance_id(&file_name);

    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(instance = %instance, path = %path.display(), error = %e, "unreadable log");
            return LogOutcome::Failed(ParseFailure {
                instance,
                path: path.to_path_buf(),
                reason: e.to_string(),
            });
        }
    };
    let text = String::from_utf8_lossy(&bytes);

    let extraction = engine.extract(&instance, &text, time_limit);
    let mut metrics = extraction.metrics;
    let mut violations = Vec::new();

    if let Some(raw) = extraction.solution {
        match instances.find(&file_name) {
            None => debug!(instance = %instance, "instance file not found; solution not verified"),
            Some(instance_path) => match raw.parse::<Solution>() {
                Err(e) => {
                    warn!(instance = %instance, error = %e, "malformed solution");
                    metrics.anomalies.push(Anomaly::MalformedSolution {
                        reason: e.to_string(),
                    });
                }
                Ok(solution) => match verifier.verify_file(instance_path, &solution) {
                    Ok(found) if found.is_empty() => {
                        debug!(instance = %instance, "solution verified");
                    }
                    Ok(found) => {
                        error!(
                            instance = %instance,
                            violations = found.len(),
                            first = %found[0],
                            "solution rejected"
                        );
                        metrics.anomalies.push(Anomaly::InvalidSolution {
                            violations: found.len(),
                        });
                        violations = found;
                    }
                    Err(e) => {
                        warn!(instance = %instance, error = %e, "instance unreadable; solution not verified");
                    }
                },
            },
        }
    }

    LogOutcome::Parsed {
        metrics,
        violations,
    }
}
