//! colorbench - benchmark runner and result verifier for graph coloring
//! solvers.
//!
//! A batch runs an external solver over a set of DIMACS-style instances,
//! recovers bounds and search statistics from each solver log, verifies the
//! reported colorings and reconciles the bounds against a ledger of best
//! known results.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): models, errors and the ports the services
//!   depend on
//! - **Service Layer** (`services`): job runner, extraction engine, solution
//!   verifier, reconciler and the batch pipeline
//! - **Infrastructure Layer** (`infrastructure`): configuration, logging, the
//!   subprocess launcher and file stores
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use colorbench::{BatchContext, Config, InstanceIndex};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let mut batch = BatchContext::new("nightly", InstanceIndex::new(), &config);
//!     let report = batch.parse_logs("logs/color".as_ref()).await?;
//!     println!("{} instances, clean: {}", report.metrics.len(), report.is_clean());
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    Anomaly, BoundObservation, Config, Graph, InstanceIndex, Job, JobRecord, JobStatus, Ledger,
    MetricSet, RunSummary, Solution,
};
pub use domain::ports::{ExtractionRule, LaunchOutcome, SolverLauncher};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    compare, BatchContext, BatchReport, ComparisonReport, ExtractionEngine, JobRunner,
    JobRunnerConfig, RuleRegistry, SolutionVerifier,
};
