//! Domain layer for colorbench
//!
//! This module contains the core models (instances, jobs, metric sets,
//! solutions, ledgers), the error taxonomy, and the ports that
//! infrastructure adapters implement.

pub mod errors;
pub mod models;
pub mod ports;

// Re-export error types for convenient access
pub use errors::{
    DomainError, DomainResult, InstanceError, LaunchError, SolutionParseError, StoreError,
};
