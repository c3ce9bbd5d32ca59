//! CLI command implementations.
//!
//! Each handler returns a [`Verdict`](crate::cli::Verdict) when it ran to
//! completion and an error when it could not.

pub mod compare;
pub mod merge;
pub mod parse;
pub mod run;
pub mod verify;

use std::path::Path;

use anyhow::{Context, Result};

use crate::domain::models::{BoundObservation, Ledger};
use crate::infrastructure::storage::{read_ledger, read_metrics, TableFormat};
use crate::services::merge_metrics;

/// Provenance label for a table: its file stem.
pub(crate) fn source_label(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string()
}

/// Load a ledger from a YAML ledger or a CSV metrics table.
///
/// A CSV table becomes a fresh ledger whose provenance is the file stem.
pub(crate) fn load_ledger(path: &Path) -> Result<Ledger> {
    match TableFormat::from_path(path)? {
        TableFormat::Yaml => {
            read_ledger(path).with_context(|| format!("Failed to read ledger {}", path.display()))
        }
        TableFormat::Csv => {
            let metrics = read_metrics(path)
                .with_context(|| format!("Failed to read metrics table {}", path.display()))?;
            let mut ledger = Ledger::new();
            merge_metrics(&mut ledger, &metrics, &source_label(path));
            Ok(ledger)
        }
    }
}

/// Load candidate bounds from a CSV metrics table or a YAML ledger.
pub(crate) fn load_observations(path: &Path) -> Result<Vec<BoundObservation>> {
    match TableFormat::from_path(path)? {
        TableFormat::Csv => {
            let metrics = read_metrics(path)
                .with_context(|| format!("Failed to read metrics table {}", path.display()))?;
            Ok(metrics.iter().map(BoundObservation::from).collect())
        }
        TableFormat::Yaml => Ok(read_ledger(path)
            .with_context(|| format!("Failed to read ledger {}", path.display()))?
            .observations()),
    }
}
