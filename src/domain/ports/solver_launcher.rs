//! Solver launcher port - interface for running the external solver.

use std::fs::File;

use async_trait::async_trait;

use crate::domain::errors::LaunchError;
use crate::domain::models::Job;

/// How a launched solver process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// The process exited on its own. `code` is `None` when it was killed by
    /// a signal.
    Exited { code: Option<i32> },
    /// The hard timeout expired and the process was killed.
    TimedOut,
}

/// Trait for solver process implementations.
///
/// The launcher owns the whole process lifetime: it spawns the solver with
/// stdout and stderr redirected to `log`, waits at most `job.hard_timeout`,
/// and kills the process if the envelope is exceeded.
#[async_trait]
pub trait SolverLauncher: Send + Sync {
    /// Launcher name, for logging.
    fn name(&self) -> &'static str;

    async fn launch(&self, job: &Job, log: File) -> Result<LaunchOutcome, LaunchError>;
}
