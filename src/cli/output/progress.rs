//! Progress bar for solver runs using indicatif.
//!
//! The runner streams [`RunnerEvent`]s over a channel; a task drains them
//! into a bar on stderr so stdout stays free for the final report.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::domain::models::JobStatus;
use crate::services::RunnerEvent;

const PROGRESS_TEMPLATE: &str =
    "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg} (ETA: {eta})";
const PROGRESS_CHARS: &str = "█▓▒░ ";

/// Create a progress bar with ETA over `total` jobs.
///
/// With `hidden` set nothing is drawn; used for `--json` output.
pub fn create_progress_bar(total: u64, hidden: bool) -> ProgressBar {
    let pb = ProgressBar::new(total);
    if hidden {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }
    let style = ProgressStyle::default_bar()
        .template(PROGRESS_TEMPLATE)
        .map_or_else(|_| ProgressStyle::default_bar(), |s| s.progress_chars(PROGRESS_CHARS));
    pb.set_style(style);
    pb.enable_steady_tick(Duration::from_millis(200));
    pb
}

/// Drain `events` into a progress bar until the run finishes.
pub fn spawn_run_progress(
    mut events: mpsc::Receiver<RunnerEvent>,
    hidden: bool,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut bar: Option<ProgressBar> = None;
        while let Some(event) = events.recv().await {
            match event {
                RunnerEvent::Started { total, workers } => {
                    let pb = create_progress_bar(total as u64, hidden);
                    pb.set_message(format!("{workers} workers"));
                    bar = Some(pb);
                }
                RunnerEvent::JobStarted { instance } => {
                    if let Some(pb) = &bar {
                        pb.set_message(instance);
                    }
                }
                RunnerEvent::JobFinished { record, done, .. } => {
                    if let Some(pb) = &bar {
                        pb.set_position(done as u64);
                        if let JobStatus::Failed { reason } = &record.status {
                            pb.println(format!("✗ {}: {reason}", record.instance));
                        }
                    }
                }
                RunnerEvent::Finished { summary } => {
                    if let Some(pb) = bar.take() {
                        pb.finish_with_message(format!(
                            "{} completed, {} timed out, {} failed, {} skipped",
                            summary.completed(),
                            summary.timed_out(),
                            summary.failed(),
                            summary.skipped()
                        ));
                    }
                }
            }
        }
        if let Some(pb) = bar {
            pb.abandon();
        }
    })
}
