//! File-backed stores: metrics tables (CSV), bound ledgers (YAML) and the
//! on-disk instance catalog.

pub mod instance_catalog;
pub mod ledger_store;
pub mod metrics_table;

pub use instance_catalog::{build_index, resolve_sets};
pub use ledger_store::{read_ledger, write_ledger, TableFormat};
pub use metrics_table::{read_metrics, write_metrics};
