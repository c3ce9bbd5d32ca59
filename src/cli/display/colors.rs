//! Status color mapping for CLI output.
//!
//! `console` drops styling automatically when stdout is not a terminal.

use console::{style, StyledObject};

use crate::domain::models::JobStatus;

/// Colored label for a job status.
///
/// Completed = green, timed-out = yellow, failed = red bold, skipped = dim.
pub fn job_status(status: &JobStatus) -> StyledObject<&'static str> {
    let label = status.label();
    match status {
        JobStatus::Completed => style(label).green(),
        JobStatus::TimedOut => style(label).yellow(),
        JobStatus::Failed { .. } => style(label).red().bold(),
        JobStatus::Skipped | JobStatus::Pending => style(label).dim(),
    }
}

/// Styled label for detail views (bold + dimmed colon).
pub fn label(name: &str) -> String {
    format!("{}{}", style(name).bold(), style(":").dim())
}

/// Section header with underline.
pub fn section_header(title: &str) -> String {
    format!("\n{}", style(title).bold().underlined())
}

/// Red bold text for findings that fail a gated run.
pub fn alert(text: &str) -> String {
    style(text).red().bold().to_string()
}

/// Yellow text for findings that are reported but do not gate.
pub fn notice(text: &str) -> String {
    style(text).yellow().to_string()
}
