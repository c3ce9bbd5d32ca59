//! Domain errors for the colorbench harness.

use std::path::PathBuf;

use thiserror::Error;

/// Domain-level errors that can occur while running or analysing a batch.
///
/// None of these abort a batch on their own: the job runner and the
/// pipeline record them per instance and keep going.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Instance file error: {0}")]
    Instance(#[from] InstanceError),

    #[error("Solution parse error: {0}")]
    Solution(#[from] SolutionParseError),

    #[error("Solver launch error: {0}")]
    Launch(#[from] LaunchError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Instance not found: {0}")]
    InstanceNotFound(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors raised while reading a DIMACS-style instance file.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InstanceError {
    #[error("missing problem line (`p <kind> <vertices> <edges>`)")]
    MissingProblemLine,

    #[error("malformed line {line}: {content:?}")]
    MalformedLine { line: usize, content: String },

    #[error("line {line}: vertex {vertex} out of range for {vertex_count} vertices")]
    VertexOutOfRange {
        line: usize,
        vertex: usize,
        vertex_count: usize,
    },
}

/// Errors raised while parsing a `{0,1} {2}` solution string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SolutionParseError {
    #[error("unbalanced braces at byte {position}")]
    UnbalancedBraces { position: usize },

    #[error("unexpected text at byte {position}: {found:?}")]
    UnexpectedText { position: usize, found: char },

    #[error("class {class} contains an invalid vertex id {token:?}")]
    InvalidVertex { class: usize, token: String },

    #[error("class {class} is empty")]
    EmptyClass { class: usize },
}

/// Errors raised while starting or waiting on a solver process.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to wait for solver process: {0}")]
    Wait(#[source] std::io::Error),

    #[error("cannot attach log file {path}: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by the metrics table and ledger stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON cell error in column {column}: {source}")]
    JsonCell {
        column: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(PathBuf),
}
