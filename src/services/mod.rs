//! Service layer: the four pipeline stages and the batch pipeline that
//! wires them together.

pub mod extraction;
pub mod job_runner;
pub mod pipeline;
pub mod reconciler;
pub mod verifier;

pub use extraction::{Extraction, ExtractionEngine, RuleRegistry};
pub use job_runner::{JobRunner, JobRunnerConfig, RunnerEvent};
pub use pipeline::{BatchContext, BatchReport, ParseFailure};
pub use reconciler::{compare, merge_metrics, ComparisonReport, Improvement, Inconsistency};
pub use verifier::{verify, SolutionVerifier, Violation};
