//! Rendering for command results.
//!
//! Every command builds one output value and hands it to [`output`], which
//! prints either the human view or pretty JSON on stdout. Logs stay on
//! stderr, so `--json` output can be piped.

pub mod colors;
pub mod format;
pub mod table;

use serde::Serialize;

pub use colors::*;
pub use format::*;
pub use table::*;

/// A command result with a human view and a JSON view.
pub trait CommandOutput: Serialize {
    fn to_human(&self) -> String;

    /// JSON view; the serialized value unless a command needs another shape.
    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// The text [`output`] would print.
pub fn render<T: CommandOutput>(result: &T, json_mode: bool) -> String {
    if json_mode {
        serde_json::to_string_pretty(&result.to_json()).unwrap_or_default()
    } else {
        result.to_human()
    }
}

pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    println!("{}", render(result, json_mode));
}

/// Status line for a finished action.
pub fn action_line(ok: bool, message: &str) -> String {
    let mark = if ok {
        console::style("\u{2713}").green().bold()
    } else {
        console::style("\u{2717}").red().bold()
    };
    format!("{mark} {message}")
}

pub fn action_success(message: &str) -> String {
    action_line(true, message)
}

pub fn action_failure(message: &str) -> String {
    action_line(false, message)
}
