//! Command-line interface: clap types, command handlers and rendering.

pub mod commands;
pub mod display;
pub mod output;
mod types;

use serde_json::json;

pub use types::{Cli, Commands};

/// Exit code for an operational error (bad input, unreadable file, ...).
pub const EXIT_ERROR: i32 = 1;

/// Outcome of a command that ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Nothing that should fail a gated run.
    Clean,
    /// The command ran but flagged hard inconsistencies or unverified errors.
    Findings,
}

impl Verdict {
    pub const fn from_clean(clean: bool) -> Self {
        if clean {
            Self::Clean
        } else {
            Self::Findings
        }
    }

    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Clean => 0,
            Self::Findings => 2,
        }
    }
}

/// Report a command error and return the process exit code.
pub fn handle_error(err: &anyhow::Error, json_mode: bool) -> i32 {
    if json_mode {
        let causes: Vec<String> = err.chain().skip(1).map(ToString::to_string).collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "error": err.to_string(),
                "causes": causes,
            }))
            .unwrap_or_default()
        );
    } else {
        eprintln!("{} {err}", console::style("Error:").red().bold());
        for cause in err.chain().skip(1) {
            eprintln!("  {} {cause}", console::style("caused by:").dim());
        }
    }
    EXIT_ERROR
}
