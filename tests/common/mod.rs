//! Common test utilities for integration tests
//!
//! Provides shared fixtures, a scripted solver launcher and helpers used
//! across multiple integration test files.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use colorbench::domain::errors::LaunchError;
use colorbench::domain::models::Job;
use colorbench::domain::ports::{LaunchOutcome, SolverLauncher};
use colorbench::services::JobRunnerConfig;

/// Path graph 0-1-2-3, written 1-indexed.
pub const PATH4: &str = "c path on four vertices\np edge 4 3\ne 1 2\ne 2 3\ne 3 4\n";

/// Triangle, written 0-indexed.
pub const TRIANGLE: &str = "p edge 3 3\ne 0 1\ne 1 2\ne 0 2\n";

/// Create a temporary directory for test isolation
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Setup test logging
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Write `text` to `dir/name`, creating parent directories.
pub fn write_file(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent dir");
    }
    std::fs::write(&path, text).expect("Failed to write fixture");
    path
}

/// A solver log that proved optimality with `solution`.
pub fn solved_log(colors: u32, solution: &str, seconds: f64) -> String {
    format!(
        "(   0.001s)                main.cpp:20    INFO| reading instance\n\
         (   0.002s)              dsatur.cpp:90    INFO| DSATUR: {colors}\n\
         (   0.010s)                main.cpp:44    INFO| Root with value {colors}.000000\n\
         (   0.020s)                main.cpp:71    INFO| Coloring: SOL {colors}.000000 = {solution}\n\
         ({seconds:>8.3}s)              loguru.cpp:560   INFO| atexit\n"
    )
}

/// A solver log cut off by the time limit while branching.
pub fn timed_out_log(lower: u32, upper: u32) -> String {
    format!(
        "Root with value {}.500000\n\
         DSATUR: {}\n\
         New upper bound {upper} (integral sol)\n\
         Lower bound {lower}\n\
         Branching on node 3141\n",
        lower.saturating_sub(1),
        upper + 2
    )
}

/// Runner settings for tests: fixed seed, short limit, logs under `logs_dir`.
pub fn runner_config(logs_dir: &Path, workers: usize) -> JobRunnerConfig {
    JobRunnerConfig {
        logs_dir: logs_dir.to_path_buf(),
        time_limit: Duration::from_secs(1),
        kill_grace_factor: 1.15,
        workers,
        force: false,
        shuffle_seed: Some(42),
    }
}

/// What the scripted launcher does for one instance.
#[derive(Debug, Clone)]
pub enum Script {
    /// Write `log` and exit with `code`.
    Exit { log: String, code: i32 },
    /// Write `log` and report a timeout.
    Timeout { log: String },
    /// Fail to spawn.
    SpawnError,
}

/// Launcher that plays back a script per instance and counts launches.
///
/// Instances without a script write a one-line log and exit cleanly.
#[derive(Debug, Default)]
pub struct CountingLauncher {
    scripts: HashMap<String, Script>,
    launches: AtomicUsize,
    launched: Mutex<Vec<String>>,
    delay: Duration,
}

impl CountingLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(mut self, instance: &str, script: Script) -> Self {
        self.scripts.insert(instance.to_string(), script);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    /// Instances launched, sorted.
    pub fn launched(&self) -> Vec<String> {
        let mut names = self.launched.lock().unwrap().clone();
        names.sort();
        names
    }
}

#[async_trait]
impl SolverLauncher for CountingLauncher {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn launch(&self, job: &Job, mut log: File) -> Result<LaunchOutcome, LaunchError> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        self.launched.lock().unwrap().push(job.instance.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let default = Script::Exit {
            log: format!("solved {}\n", job.instance),
            code: 0,
        };
        match self.scripts.get(&job.instance).unwrap_or(&default) {
            Script::Exit { log: text, code } => {
                log.write_all(text.as_bytes()).map_err(LaunchError::Wait)?;
                Ok(LaunchOutcome::Exited { code: Some(*code) })
            }
            Script::Timeout { log: text } => {
                log.write_all(text.as_bytes()).map_err(LaunchError::Wait)?;
                Ok(LaunchOutcome::TimedOut)
            }
            Script::SpawnError => Err(LaunchError::Spawn {
                program: "missing-solver".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            }),
        }
    }
}
