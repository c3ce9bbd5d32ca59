//! End-to-end batch tests: run, extract, verify, merge into the ledger and
//! reconcile against a baseline.

mod common;

use std::sync::Arc;

use colorbench::domain::models::{Anomaly, BoundObservation, Config, Ledger};
use colorbench::infrastructure::storage::{
    build_index, read_ledger, read_metrics, write_ledger, write_metrics,
};
use colorbench::services::{compare, BatchContext, JobRunner, Violation};
use common::{runner_config, solved_log, temp_dir, timed_out_log, write_file, CountingLauncher, Script};

#[tokio::test]
async fn batch_extracts_verifies_and_merges() {
    common::setup_test_logging();
    let dir = temp_dir();
    let inst = dir.path().join("inst");
    let logs = dir.path().join("logs");

    let path4 = write_file(&inst, "easy/path4.col", common::PATH4);
    let triangle = write_file(&inst, "easy/triangle.col", common::TRIANGLE);
    let hard = write_file(&inst, "hard/hard.col", common::PATH4);

    let launcher = Arc::new(
        CountingLauncher::new()
            .with_script(
                "path4",
                Script::Exit {
                    log: solved_log(2, "{0, 2} {1, 3}", 0.5),
                    code: 0,
                },
            )
            // Reports 2 colors for a triangle: the solution must be rejected.
            .with_script(
                "triangle",
                Script::Exit {
                    log: solved_log(2, "{0, 1} {2}", 0.25),
                    code: 0,
                },
            )
            .with_script(
                "hard",
                Script::Timeout {
                    log: timed_out_log(4, 5),
                },
            ),
    );
    let runner = JobRunner::new(launcher, runner_config(&logs, 2));

    let index = build_index(&inst).unwrap();
    let mut batch = BatchContext::new("nightly", index, &Config::default())
        .with_time_limit(runner.config().time_limit);
    let (summary, report) = batch
        .run_and_parse(&runner, &[path4, triangle, hard])
        .await
        .unwrap();

    assert_eq!(summary.completed(), 2);
    assert_eq!(summary.timed_out(), 1);

    let names: Vec<&str> = report.metrics.iter().map(|m| m.instance.as_str()).collect();
    assert_eq!(names, vec!["hard", "path4", "triangle"]);

    let path4 = &report.metrics[1];
    assert_eq!((path4.lower_bound, path4.upper_bound), (Some(2), Some(2)));
    assert_eq!(path4.solved, Some(true));
    assert_eq!(path4.runtime_secs, Some(0.5));

    let hard = &report.metrics[0];
    assert_eq!((hard.lower_bound, hard.upper_bound), (Some(4), Some(5)));
    assert_eq!(hard.runtime_secs, Some(1.0));
    assert_eq!(hard.solved, Some(false));

    let triangle = &report.metrics[2];
    assert!(triangle.has_anomaly(|a| matches!(a, Anomaly::InvalidSolution { violations: 1 })));
    assert_eq!(
        report.violations["triangle"],
        vec![Violation::AdjacentPair { u: 0, v: 1, class: 0 }]
    );
    assert!(!report.is_clean());

    // A rejected solution does not vouch for its upper bound.
    let entry = report.ledger.get("triangle").unwrap();
    assert_eq!(entry.lower(), Some(2));
    assert_eq!(entry.upper(), None);
    assert!(report.ledger.get("path4").unwrap().is_closed());
    assert_eq!(
        report.ledger.get("hard").unwrap().upper_bound.as_ref().unwrap().source,
        "nightly"
    );
}

#[tokio::test]
async fn garbled_logs_and_foreign_files_do_not_abort_parsing() {
    let dir = temp_dir();
    let logs = dir.path().join("logs");
    write_file(&logs, "ok.col.log", &solved_log(3, "{0} {1} {2}", 1.0));
    write_file(&logs, "binary.col.log", "\u{0}\u{1}garbage\u{fffd}\n");
    write_file(&logs, "notes.txt", "not a log");

    let mut batch = BatchContext::new("adhoc", Default::default(), &Config::default());
    let report = batch.parse_logs(&logs).await.unwrap();

    assert_eq!(report.metrics.len(), 2);
    assert!(report.failures.is_empty());
    // No instance file to check against: the solution is not verified.
    assert!(report.violations.is_empty());
    let binary = report.metrics.iter().find(|m| m.instance == "binary").unwrap();
    assert_eq!(binary.lower_bound, None);
    assert_eq!(binary.runtime_secs, None);
}

#[tokio::test]
async fn missing_log_directory_is_an_error() {
    let mut batch = BatchContext::new("adhoc", Default::default(), &Config::default());
    assert!(batch
        .parse_logs(std::path::Path::new("/nonexistent/logs"))
        .await
        .is_err());
}

#[tokio::test]
async fn tables_round_trip_through_comparison() {
    let dir = temp_dir();
    let logs = dir.path().join("logs");
    write_file(&logs, "x.col.log", &solved_log(6, "{0}", 2.0));
    write_file(&logs, "y.col.log", &timed_out_log(3, 4));
    write_file(&logs, "new.col.log", &timed_out_log(2, 3));

    let mut batch = BatchContext::new("candidate", Default::default(), &Config::default());
    let report = batch.parse_logs(&logs).await.unwrap();

    let table = dir.path().join("candidate.csv");
    write_metrics(&table, &report.metrics).unwrap();
    let reloaded = read_metrics(&table).unwrap();
    assert_eq!(reloaded, report.metrics);

    let mut baseline = Ledger::new();
    baseline.merge("x", Some(3), Some(5), "literature");
    baseline.merge("y", Some(2), Some(6), "literature");
    let baseline_path = dir.path().join("best.yaml");
    write_ledger(&baseline_path, &baseline).unwrap();
    let baseline = read_ledger(&baseline_path).unwrap();

    let observations: Vec<BoundObservation> =
        reloaded.iter().map(BoundObservation::from).collect();
    let comparison = compare(&baseline, &observations);

    assert_eq!(comparison.not_found, vec!["new"]);
    assert!(comparison.has_hard_inconsistency());
    assert_eq!(comparison.inconsistent.len(), 1);
    assert_eq!(comparison.inconsistent[0].instance, "x");
    assert_eq!(comparison.improved.len(), 1);
    assert_eq!(comparison.improved[0].instance, "y");
    assert_eq!(comparison.improved[0].lower, Some(3));
    assert_eq!(comparison.improved[0].upper, Some(4));
}

#[tokio::test]
async fn batch_ledger_accumulates_across_batches() {
    let dir = temp_dir();
    let first = dir.path().join("first");
    let second = dir.path().join("second");
    write_file(&first, "g.col.log", &timed_out_log(3, 7));
    write_file(&second, "g.col.log", &timed_out_log(2, 6));

    let mut batch = BatchContext::new("first", Default::default(), &Config::default());
    let ledger = batch.parse_logs(&first).await.unwrap().ledger;

    let mut batch = BatchContext::new("second", Default::default(), &Config::default())
        .with_ledger(ledger);
    let report = batch.parse_logs(&second).await.unwrap();

    let entry = report.ledger.get("g").unwrap();
    assert_eq!(entry.lower_bound.as_ref().unwrap().value, 3);
    assert_eq!(entry.lower_bound.as_ref().unwrap().source, "first");
    assert_eq!(entry.upper_bound.as_ref().unwrap().value, 6);
    assert_eq!(entry.upper_bound.as_ref().unwrap().source, "second");
}

#[tokio::test]
async fn large_batch_runs_and_parses_without_listener() {
    let dir = temp_dir();
    let inst = dir.path().join("inst");
    let logs = dir.path().join("logs");
    let files: Vec<_> = (0..120)
        .map(|i| write_file(&inst, &format!("easy/g{i}.col"), common::PATH4))
        .collect();

    let runner = JobRunner::new(Arc::new(CountingLauncher::new()), runner_config(&logs, 4));
    let mut batch = BatchContext::new("bulk", build_index(&inst).unwrap(), &Config::default());

    let (summary, report) = tokio::time::timeout(
        std::time::Duration::from_secs(30),
        batch.run_and_parse(&runner, &files),
    )
    .await
    .expect("run_and_parse did not finish")
    .unwrap();
    assert_eq!(summary.completed(), 120);
    assert_eq!(report.metrics.len(), 120);
}
