pub mod config;
pub mod instance;
pub mod job;
pub mod ledger;
pub mod metrics;
pub mod solution;

pub use config::{
    Config, LoggingConfig, ParserConfig, PathsConfig, RotationPolicy, RunnerConfig, SolverConfig,
};
pub use instance::{instance_id, Adjacency, Graph, IndexBase, InstanceIndex};
pub use job::{Job, JobRecord, JobStatus, RunSummary};
pub use ledger::{BoundObservation, Ledger, LedgerEntry, MergeOutcome, SourcedBound};
pub use metrics::{round_lower, round_upper, Anomaly, MetricSet, SearchStats};
pub use solution::Solution;
