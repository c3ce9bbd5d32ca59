//! Infrastructure layer module
//!
//! This module contains the adapters behind the domain ports and the
//! ambient plumbing:
//! - Configuration management
//! - Logging infrastructure
//! - Solver process management
//! - CSV/YAML stores and instance discovery
//!
//! Infrastructure implementations satisfy the port traits defined in the domain layer.

pub mod config;
pub mod logging;
pub mod solver;
pub mod storage;
