//! Value formatters for CLI output. Unknown values render as "-".

use std::time::Duration;

/// Format an optional bound.
pub fn bound(value: Option<i64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

/// Format a bound pair as `lb..ub`, collapsing closed pairs to one value.
pub fn bound_pair(lower: Option<i64>, upper: Option<i64>) -> String {
    match (lower, upper) {
        (Some(lb), Some(ub)) if lb == ub => lb.to_string(),
        _ => format!("{}..{}", bound(lower), bound(upper)),
    }
}

/// Format optional seconds with millisecond precision.
pub fn seconds(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.3}s"))
}

/// Format a duration as `1h02m03s`, `2m03s` or `3.2s`.
pub fn duration(d: Duration) -> String {
    let secs = d.as_secs();
    match (secs / 3600, (secs % 3600) / 60, secs % 60) {
        (0, 0, _) => format!("{:.1}s", d.as_secs_f64()),
        (0, m, s) => format!("{m}m{s:02}s"),
        (h, m, s) => format!("{h}h{m:02}m{s:02}s"),
    }
}

/// Format an optional flag.
pub fn flag(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "yes",
        Some(false) => "no",
        None => "-",
    }
}

/// Format a count with label: "1 instance", "3 instances".
pub fn count_label(n: usize, singular: &str, plural: &str) -> String {
    if n == 1 {
        format!("{n} {singular}")
    } else {
        format!("{n} {plural}")
    }
}

/// Truncate a string with unicode ellipsis, on a char boundary.
pub fn truncate_ellipsis(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let kept: String = s.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{kept}\u{2026}")
}
