//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines the interfaces that services depend on:
//! - ExtractionRule: one log marker turned into metric fields
//! - SolverLauncher: spawning and supervising the external solver
//!
//! Concrete rules live in `services::extraction::rules`; the subprocess
//! launcher lives in `infrastructure::solver`.

pub mod extraction_rule;
pub mod solver_launcher;

pub use extraction_rule::{ExtractionRule, LogView, MetricPatch};
pub use solver_launcher::{LaunchOutcome, SolverLauncher};
