//! Solver launcher backed by a child process.
//!
//! The solver's stdout and stderr both go to the job's log file. On Unix the
//! solver runs in its own process group so a timeout kill also reaches any
//! helpers it forked.

use std::fs::File;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::{Child, Command};

use crate::domain::errors::LaunchError;
use crate::domain::models::{Job, SolverConfig};
use crate::domain::ports::{LaunchOutcome, SolverLauncher};

const INSTANCE_PLACEHOLDER: &str = "{instance}";
const TIME_LIMIT_PLACEHOLDER: &str = "{time_limit}";

/// Launches the configured solver executable once per job.
#[derive(Debug, Clone)]
pub struct SubprocessLauncher {
    executable: PathBuf,
    args: Vec<String>,
}

impl SubprocessLauncher {
    pub fn new(executable: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            executable: executable.into(),
            args,
        }
    }

    pub fn from_config(config: &SolverConfig) -> Self {
        Self::new(&config.executable, config.args.clone())
    }

    /// Argument list for `job`, with placeholders substituted.
    pub fn render_args(&self, job: &Job) -> Vec<String> {
        let instance = job.instance_path.to_string_lossy();
        let time_limit = job.time_limit.as_secs().to_string();
        self.args
            .iter()
            .map(|arg| {
                arg.replace(INSTANCE_PLACEHOLDER, &instance)
                    .replace(TIME_LIMIT_PLACEHOLDER, &time_limit)
            })
            .collect()
    }

    async fn terminate(child: &mut Child) {
        #[cfg(unix)]
        if let Some(pid) = child.id().and_then(|pid| i32::try_from(pid).ok()) {
            use nix::sys::signal::{killpg, Signal};
            use nix::unistd::Pid;

            if let Err(e) = killpg(Pid::from_raw(pid), Signal::SIGKILL) {
                tracing::debug!(pid, error = %e, "process group already gone");
            }
        }

        if let Err(e) = child.kill().await {
            tracing::debug!(error = %e, "solver already exited");
        }
    }
}

#[async_trait]
impl SolverLauncher for SubprocessLauncher {
    fn name(&self) -> &'static str {
        "subprocess"
    }

    async fn launch(&self, job: &Job, log: File) -> Result<LaunchOutcome, LaunchError> {
        let stderr = log.try_clone().map_err(|source| LaunchError::LogFile {
            path: job.log_path.clone(),
            source,
        })?;

        let args = self.render_args(job);
        tracing::debug!(
            instance = %job.instance,
            program = %self.executable.display(),
            args = ?args,
            "spawning solver"
        );

        let mut command = Command::new(&self.executable);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(stderr))
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(|source| LaunchError::Spawn {
            program: self.executable.display().to_string(),
            source,
        })?;

        match tokio::time::timeout(job.hard_timeout, child.wait()).await {
            Ok(Ok(status)) => Ok(LaunchOutcome::Exited {
                code: status.code(),
            }),
            Ok(Err(e)) => Err(LaunchError::Wait(e)),
            Err(_) => {
                Self::terminate(&mut child).await;
                Ok(LaunchOutcome::TimedOut)
            }
        }
    }
}
