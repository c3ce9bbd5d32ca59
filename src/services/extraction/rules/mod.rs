//! Concrete extraction rules, one per log marker.
//!
//! The solver log format is an external contract with no schema, so every
//! rule is pinned by tests against literal lines copied from real logs.

pub mod bounds;
pub mod components;
pub mod diagnostics;
pub mod runtime;
pub mod search;
pub mod solution;

pub use bounds::BoundsRule;
pub use components::ComponentCountRule;
pub use diagnostics::{ErrorMarkerRule, WarningMarkerRule};
pub use runtime::RuntimeRule;
pub use search::{
    BranchCountRule, DeepestBranchRule, LpTimeRule, PricingRule, RootSetsRule, RootValueRule,
    SinglePricingRule,
};
pub use solution::SolutionRule;

/// Parse a numeric token, tolerating surrounding punctuation (`4.`, `5,`).
fn parse_number(token: &str) -> Option<f64> {
    let trimmed = token.trim_matches(|c: char| !(c.is_ascii_digit() || c == '-' || c == '.'));
    let trimmed = trimmed.trim_end_matches('.');
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Last whitespace-separated number on a line, ignoring the
/// `(integral sol)` suffix some bound lines carry.
fn last_number(line: &str) -> Option<f64> {
    line.replace("(integral sol)", "")
        .split_whitespace()
        .last()
        .and_then(parse_number)
}

/// First number following `marker` on a line (`SOL: 4.0`, `LB 4`).
fn number_after(line: &str, marker: &str) -> Option<f64> {
    let (_, rest) = line.split_once(marker)?;
    rest.trim_start_matches(|c: char| c == ':' || c.is_whitespace())
        .split_whitespace()
        .next()
        .and_then(parse_number)
}

/// Last number preceding `marker` on a line (`0.012 s: Pricing::solve`).
fn number_before(line: &str, marker: &str) -> Option<f64> {
    let (head, _) = line.split_once(marker)?;
    head.split_whitespace().last().and_then(parse_number)
}

/// Count of lines containing `marker`, or `None` when it never appears.
fn occurrences(log: &crate::domain::ports::LogView<'_>, marker: &str) -> Option<u64> {
    match log.count(marker) {
        0 => None,
        n => Some(n as u64),
    }
}
