//! YAML persistence for the bound ledger.

use std::path::Path;

use crate::domain::errors::StoreError;
use crate::domain::models::Ledger;

/// File formats the stores understand, picked by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    /// Metrics table (`.csv`).
    Csv,
    /// Bound ledger (`.yaml`, `.yml`).
    Yaml,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Result<Self, StoreError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("csv") => Ok(Self::Csv),
            Some("yaml" | "yml") => Ok(Self::Yaml),
            _ => Err(StoreError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// Parse a ledger document. An empty document is an empty ledger.
pub fn parse_ledger(text: &str) -> Result<Ledger, StoreError> {
    if text.trim().is_empty() {
        return Ok(Ledger::new());
    }
    Ok(serde_yaml::from_str(text)?)
}

pub fn render_ledger(ledger: &Ledger) -> Result<String, StoreError> {
    Ok(serde_yaml::to_string(ledger)?)
}

/// Read the YAML ledger at `path`.
pub fn read_ledger(path: &Path) -> Result<Ledger, StoreError> {
    let text = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let ledger = parse_ledger(&text)?;
    tracing::debug!(path = %path.display(), entries = ledger.len(), "ledger loaded");
    Ok(ledger)
}

/// Write `ledger` to `path` as YAML, replacing any existing file.
pub fn write_ledger(path: &Path, ledger: &Ledger) -> Result<(), StoreError> {
    let text = render_ledger(ledger)?;
    std::fs::write(path, text).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), entries = ledger.len(), "ledger written");
    Ok(())
}
