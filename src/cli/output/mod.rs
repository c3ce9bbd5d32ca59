//! CLI output helpers that outlive a single print: progress rendering.

pub mod progress;

pub use progress::{create_progress_bar, spawn_run_progress};
