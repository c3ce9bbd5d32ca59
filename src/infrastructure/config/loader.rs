use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Project-local configuration directory.
pub const CONFIG_DIR: &str = ".colorbench";
const ENV_PREFIX: &str = "COLORBENCH_";

/// Configuration error types
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid time_limit_secs: {0}. Must be positive")]
    InvalidTimeLimit(u64),

    #[error("Invalid kill_grace_factor: {0}. Must be between 1.0 and 2.0")]
    InvalidGraceFactor(f64),

    #[error("Invalid {section}.workers: {value}. Must be at least 1")]
    InvalidWorkers { section: &'static str, value: usize },

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Solver executable is not configured (set solver.executable)")]
    MissingExecutable,

    #[error("Solver args must reference {{instance}}")]
    MissingInstancePlaceholder,
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .colorbench/config.yaml (project config)
    /// 3. .colorbench/local.yaml (machine-local overrides, optional)
    /// 4. An explicit `--config` file
    /// 5. Environment variables (COLORBENCH_* prefix, `__` for nesting)
    pub fn load(explicit: Option<&Path>) -> Result<Config> {
        Self::load_from(Path::new("."), explicit)
    }

    /// [`ConfigLoader::load`] with the project files resolved under `root`.
    pub fn load_from(root: &Path, explicit: Option<&Path>) -> Result<Config> {
        if let Some(path) = explicit {
            if !path.is_file() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
        }

        let config: Config = Self::figment(root, explicit)
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    fn figment(root: &Path, explicit: Option<&Path>) -> Figment {
        let dir: PathBuf = root.join(CONFIG_DIR);
        let mut figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(dir.join("config.yaml")))
            .merge(Yaml::file(dir.join("local.yaml")));
        if let Some(path) = explicit {
            figment = figment.merge(Yaml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.runner.time_limit_secs == 0 {
            return Err(ConfigError::InvalidTimeLimit(config.runner.time_limit_secs));
        }

        let grace = config.runner.kill_grace_factor;
        if !(1.0..=2.0).contains(&grace) {
            return Err(ConfigError::InvalidGraceFactor(grace));
        }

        if config.runner.workers == Some(0) {
            return Err(ConfigError::InvalidWorkers {
                section: "runner",
                value: 0,
            });
        }
        if config.parser.workers == Some(0) {
            return Err(ConfigError::InvalidWorkers {
                section: "parser",
                value: 0,
            });
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        Ok(())
    }

    /// Extra checks for commands that launch the solver.
    pub fn validate_for_run(config: &Config) -> Result<(), ConfigError> {
        if config.solver.executable.trim().is_empty() {
            return Err(ConfigError::MissingExecutable);
        }
        if !config.solver.args.iter().any(|arg| arg.contains("{instance}")) {
            return Err(ConfigError::MissingInstancePlaceholder);
        }
        Ok(())
    }
}
