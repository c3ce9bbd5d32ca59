//! Logging infrastructure
//!
//! Structured logging using tracing and tracing-subscriber:
//! - pretty or JSON output on stderr
//! - optional JSON log file with rotation

pub mod logger;

pub use logger::{LogFormat, LoggerImpl};
