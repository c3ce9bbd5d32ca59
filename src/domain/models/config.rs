use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Main configuration structure for colorbench
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Solver executable and argument template
    #[serde(default)]
    pub solver: SolverConfig,

    /// Job runner settings
    #[serde(default)]
    pub runner: RunnerConfig,

    /// Log parsing settings
    #[serde(default)]
    pub parser: ParserConfig,

    /// Instance and log locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Solver invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SolverConfig {
    /// Path to the solver executable
    #[serde(default)]
    pub executable: String,

    /// Argument template; `{instance}` and `{time_limit}` are substituted
    #[serde(default = "default_solver_args")]
    pub args: Vec<String>,

    /// Log sub-directory name; defaults to the executable's file stem
    #[serde(default)]
    pub label: Option<String>,
}

fn default_solver_args() -> Vec<String> {
    vec!["{instance}".to_string()]
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            executable: String::new(),
            args: default_solver_args(),
            label: None,
        }
    }
}

impl SolverConfig {
    /// Name of the per-solver log directory.
    pub fn label(&self) -> String {
        self.label.clone().unwrap_or_else(|| {
            std::path::Path::new(&self.executable)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("solver")
                .to_string()
        })
    }
}

/// Job runner settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RunnerConfig {
    /// Soft time limit per job, in seconds
    #[serde(default = "default_time_limit_secs")]
    pub time_limit_secs: u64,

    /// Hard kill timeout as a multiple of the soft limit
    #[serde(default = "default_kill_grace_factor")]
    pub kill_grace_factor: f64,

    /// Worker pool size; defaults to physical cores minus one
    #[serde(default)]
    pub workers: Option<usize>,

    /// Seed for the dispatch shuffle; random when unset
    #[serde(default)]
    pub shuffle_seed: Option<u64>,
}

const fn default_time_limit_secs() -> u64 {
    100
}

const fn default_kill_grace_factor() -> f64 {
    1.15
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            time_limit_secs: default_time_limit_secs(),
            kill_grace_factor: default_kill_grace_factor(),
            workers: None,
            shuffle_seed: None,
        }
    }
}

impl RunnerConfig {
    pub const fn time_limit(&self) -> Duration {
        Duration::from_secs(self.time_limit_secs)
    }

    /// Worker count, falling back to the physical-core default.
    ///
    /// Physical rather than logical cores keeps per-job wall-clock times
    /// comparable on hyperthreaded machines; one core is left for the OS.
    pub fn workers(&self) -> usize {
        self.workers
            .unwrap_or_else(|| num_cpus::get_physical().saturating_sub(1))
            .max(1)
    }
}

/// Log parsing settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ParserConfig {
    /// Parse pool size; defaults to logical cores
    #[serde(default)]
    pub workers: Option<usize>,
}

impl ParserConfig {
    pub fn workers(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get).max(1)
    }
}

/// Instance and log locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PathsConfig {
    /// Root holding one sub-directory per instance set
    #[serde(default = "default_instances_dir")]
    pub instances_dir: PathBuf,

    /// Root for solver logs
    #[serde(default = "default_logs_dir")]
    pub logs_dir: PathBuf,
}

fn default_instances_dir() -> PathBuf {
    PathBuf::from("inst")
}

fn default_logs_dir() -> PathBuf {
    PathBuf::from("logs")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            instances_dir: default_instances_dir(),
            logs_dir: default_logs_dir(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for log files (optional, if None logs only to stderr)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Log rotation policy for the file output
    #[serde(default)]
    pub rotation: RotationPolicy,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: RotationPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RotationPolicy {
    #[default]
    Daily,
    Hourly,
    Never,
}
