//! Metrics table: one CSV row per instance.
//!
//! Unknown values are empty cells, never zero. The `errors` and `anomalies`
//! columns hold JSON arrays so a row survives a round trip intact.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::errors::StoreError;
use crate::domain::models::{Anomaly, MetricSet, SearchStats};

/// On-disk shape of a metrics row. Column order is the file's column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct MetricRow {
    instance: String,
    lb: Option<i64>,
    ub: Option<i64>,
    time: Option<f64>,
    solved: Option<bool>,
    components: Option<u32>,
    error_count: usize,
    warnings: u32,
    errors: String,
    anomalies: String,
    branches: Option<u64>,
    deepest: Option<u32>,
    root: Option<f64>,
    root_sets: Option<u32>,
    n_pricing: Option<u64>,
    n_pricing_one_set: Option<u64>,
    sum_pricing_time: Option<f64>,
    sum_lp_time: Option<f64>,
}

impl MetricRow {
    fn from_metrics(m: &MetricSet) -> Result<Self, StoreError> {
        Ok(Self {
            instance: m.instance.clone(),
            lb: m.lower_bound,
            ub: m.upper_bound,
            time: m.runtime_secs,
            solved: m.solved,
            components: m.components,
            error_count: m.error_count(),
            warnings: m.warnings,
            errors: serde_json::to_string(&m.errors).map_err(|source| StoreError::JsonCell {
                column: "errors",
                source,
            })?,
            anomalies: serde_json::to_string(&m.anomalies).map_err(|source| {
                StoreError::JsonCell {
                    column: "anomalies",
                    source,
                }
            })?,
            branches: m.search.branches,
            deepest: m.search.deepest_branch,
            root: m.search.root_value,
            root_sets: m.search.root_sets,
            n_pricing: m.search.pricing_calls,
            n_pricing_one_set: m.search.pricing_one_set,
            sum_pricing_time: m.search.pricing_time_secs,
            sum_lp_time: m.search.lp_time_secs,
        })
    }

    fn into_metrics(self) -> Result<MetricSet, StoreError> {
        let errors: Vec<String> = json_cell(&self.errors, "errors")?;
        let anomalies: Vec<Anomaly> = json_cell(&self.anomalies, "anomalies")?;
        Ok(MetricSet {
            instance: self.instance,
            lower_bound: self.lb,
            upper_bound: self.ub,
            runtime_secs: self.time,
            solved: self.solved,
            components: self.components,
            errors,
            warnings: self.warnings,
            anomalies,
            search: SearchStats {
                branches: self.branches,
                deepest_branch: self.deepest,
                root_value: self.root,
                root_sets: self.root_sets,
                pricing_calls: self.n_pricing,
                pricing_one_set: self.n_pricing_one_set,
                pricing_time_secs: self.sum_pricing_time,
                lp_time_secs: self.sum_lp_time,
            },
        })
    }
}

fn json_cell<T: for<'de> Deserialize<'de> + Default>(
    cell: &str,
    column: &'static str,
) -> Result<T, StoreError> {
    if cell.trim().is_empty() {
        return Ok(T::default());
    }
    serde_json::from_str(cell).map_err(|source| StoreError::JsonCell { column, source })
}

/// Write `metrics` as CSV to `writer`.
pub fn write_metrics_to<W: Write>(writer: W, metrics: &[MetricSet]) -> Result<(), StoreError> {
    let mut csv = csv::Writer::from_writer(writer);
    for m in metrics {
        csv.serialize(MetricRow::from_metrics(m)?)?;
    }
    csv.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Read a metrics table from `reader`.
pub fn read_metrics_from<R: Read>(reader: R) -> Result<Vec<MetricSet>, StoreError> {
    let mut csv = csv::Reader::from_reader(reader);
    csv.deserialize::<MetricRow>()
        .map(|row| row.map_err(StoreError::from).and_then(MetricRow::into_metrics))
        .collect()
}

/// Write `metrics` to the CSV file at `path`, replacing it.
pub fn write_metrics(path: &Path, metrics: &[MetricSet]) -> Result<(), StoreError> {
    let file = File::create(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    write_metrics_to(file, metrics)?;
    tracing::debug!(path = %path.display(), rows = metrics.len(), "metrics table written");
    Ok(())
}

/// Read the CSV metrics table at `path`.
pub fn read_metrics(path: &Path) -> Result<Vec<MetricSet>, StoreError> {
    let file = File::open(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_metrics_from(file)
}
