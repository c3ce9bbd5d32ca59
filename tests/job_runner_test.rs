//! Job runner integration tests: resume semantics, failure isolation and
//! timeouts, with a scripted launcher and with real `sh` processes.

mod common;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use colorbench::domain::models::JobStatus;
use colorbench::services::{JobRunner, RunnerEvent};
use common::{runner_config, temp_dir, write_file, CountingLauncher, Script};
use tokio::sync::mpsc;

fn instances(dir: &std::path::Path, names: &[&str]) -> Vec<PathBuf> {
    names
        .iter()
        .map(|name| write_file(dir, &format!("inst/easy/{name}.col"), common::PATH4))
        .collect()
}

#[tokio::test]
async fn rerun_skips_existing_logs_and_leaves_them_untouched() {
    let dir = temp_dir();
    let logs = dir.path().join("logs");
    let files = instances(dir.path(), &["a", "b", "c"]);

    let launcher = Arc::new(CountingLauncher::new());
    let runner = JobRunner::new(launcher.clone(), runner_config(&logs, 2));

    let first = runner.run(&files).await.unwrap();
    assert_eq!(first.completed(), 3);
    assert_eq!(launcher.launches(), 3);
    let before = std::fs::read(logs.join("a.col.log")).unwrap();

    let second = runner.run(&files).await.unwrap();
    assert_eq!(second.skipped(), 3);
    assert_eq!(launcher.launches(), 3);
    assert_eq!(std::fs::read(logs.join("a.col.log")).unwrap(), before);
}

#[tokio::test]
async fn force_reruns_everything() {
    let dir = temp_dir();
    let logs = dir.path().join("logs");
    let files = instances(dir.path(), &["a", "b"]);

    let launcher = Arc::new(CountingLauncher::new());
    JobRunner::new(launcher.clone(), runner_config(&logs, 2))
        .run(&files)
        .await
        .unwrap();

    let forced = JobRunner::new(launcher.clone(), runner_config(&logs, 2).with_force(true));
    let summary = forced.run(&files).await.unwrap();
    assert_eq!(summary.completed(), 2);
    assert_eq!(summary.skipped(), 0);
    assert_eq!(launcher.launches(), 4);
}

#[tokio::test]
async fn one_bad_instance_does_not_stop_the_batch() {
    let dir = temp_dir();
    let logs = dir.path().join("logs");
    let files = instances(dir.path(), &["good", "crash", "nospawn", "slow"]);

    let launcher = Arc::new(
        CountingLauncher::new()
            .with_script(
                "crash",
                Script::Exit {
                    log: "segfault\n".into(),
                    code: 139,
                },
            )
            .with_script("nospawn", Script::SpawnError)
            .with_script(
                "slow",
                Script::Timeout {
                    log: "Branching on node 7\n".into(),
                },
            ),
    );
    let summary = JobRunner::new(launcher.clone(), runner_config(&logs, 2))
        .run(&files)
        .await
        .unwrap();

    assert_eq!(summary.total(), 4);
    assert_eq!(summary.completed(), 1);
    assert_eq!(summary.timed_out(), 1);
    assert_eq!(summary.failed(), 2);

    let failed: Vec<&str> = summary
        .failures()
        .iter()
        .map(|r| r.instance.as_str())
        .collect();
    assert_eq!(failed, vec!["crash", "nospawn"]);

    // A crash keeps its log as evidence; a spawn failure leaves nothing, so
    // the next run retries it.
    assert!(logs.join("crash.col.log").exists());
    assert!(logs.join("slow.col.log").exists());
    assert!(!logs.join("nospawn.col.log").exists());

    let resumed = JobRunner::new(launcher.clone(), runner_config(&logs, 2))
        .run(&files)
        .await
        .unwrap();
    assert_eq!(resumed.skipped(), 3);
    assert_eq!(resumed.failed(), 1);
    assert_eq!(launcher.launches(), 5);
}

#[tokio::test]
async fn pool_bounds_concurrency() {
    let dir = temp_dir();
    let logs = dir.path().join("logs");
    let names: Vec<String> = (0..6).map(|i| format!("g{i}")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let files = instances(dir.path(), &refs);

    let launcher = Arc::new(CountingLauncher::new().with_delay(Duration::from_millis(100)));
    let started = Instant::now();
    let summary = JobRunner::new(launcher.clone(), runner_config(&logs, 3))
        .run(&files)
        .await
        .unwrap();

    assert_eq!(summary.completed(), 6);
    assert_eq!(summary.workers, 3);
    // Two waves of 100ms at three workers.
    assert!(started.elapsed() >= Duration::from_millis(200));
    assert_eq!(launcher.launched(), names);
}

#[tokio::test]
async fn events_report_every_job() {
    let dir = temp_dir();
    let logs = dir.path().join("logs");
    let files = instances(dir.path(), &["a", "b", "c"]);

    let (tx, mut rx) = mpsc::channel(100);
    let runner = JobRunner::new(Arc::new(CountingLauncher::new()), runner_config(&logs, 2));
    let summary = runner.run_with_events(&files, tx).await.unwrap();

    let mut started = 0;
    let mut finished = Vec::new();
    let mut saw_start = false;
    let mut saw_end = false;
    while let Some(event) = rx.recv().await {
        match event {
            RunnerEvent::Started { total, workers } => {
                assert_eq!((total, workers), (3, 2));
                saw_start = true;
            }
            RunnerEvent::JobStarted { .. } => started += 1,
            RunnerEvent::JobFinished { done, total, .. } => {
                assert_eq!(total, 3);
                finished.push(done);
            }
            RunnerEvent::Finished { summary: s } => {
                assert_eq!(s.total(), summary.total());
                saw_end = true;
            }
        }
    }

    assert!(saw_start && saw_end);
    assert_eq!(started, 3);
    finished.sort_unstable();
    assert_eq!(finished, vec![1, 2, 3]);
}

#[cfg(unix)]
mod subprocess {
    use super::*;
    use colorbench::infrastructure::solver::SubprocessLauncher;

    #[tokio::test]
    async fn real_solver_output_lands_in_the_log() {
        let dir = temp_dir();
        let logs = dir.path().join("logs");
        let files = instances(dir.path(), &["myciel3"]);

        let launcher = Arc::new(SubprocessLauncher::new(
            "sh",
            vec![
                "-c".into(),
                "echo \"instance $0 limit $1\"; echo 'DSATUR: 4' >&2".into(),
                "{instance}".into(),
                "{time_limit}".into(),
            ],
        ));
        let runner = JobRunner::new(launcher, runner_config(&logs, 1));
        let summary = runner.run(&files).await.unwrap();
        assert_eq!(summary.completed(), 1);

        let log = std::fs::read_to_string(logs.join("myciel3.col.log")).unwrap();
        assert!(log.contains("myciel3.col limit 1"));
        assert!(log.contains("DSATUR: 4"));

        // Second run is a no-op and leaves the log byte-identical.
        let again = runner.run(&files).await.unwrap();
        assert_eq!(again.skipped(), 1);
        assert_eq!(std::fs::read_to_string(logs.join("myciel3.col.log")).unwrap(), log);
    }

    #[tokio::test]
    async fn runaway_solver_is_killed_within_the_envelope() {
        let dir = temp_dir();
        let logs = dir.path().join("logs");
        let files = instances(dir.path(), &["stuck"]);

        let launcher = Arc::new(SubprocessLauncher::new(
            "sh",
            vec!["-c".into(), "echo started; sleep 30".into()],
        ));
        let started = Instant::now();
        let summary = JobRunner::new(launcher, runner_config(&logs, 1))
            .run(&files)
            .await
            .unwrap();

        assert_eq!(summary.timed_out(), 1);
        assert!(matches!(summary.records[0].status, JobStatus::TimedOut));
        // 1s limit x 1.15 grace, plus slack for process teardown.
        assert!(started.elapsed() < Duration::from_secs(5));
        let log = std::fs::read_to_string(logs.join("stuck.col.log")).unwrap();
        assert!(log.contains("started"));
    }

    #[tokio::test]
    async fn nonzero_exit_is_a_failure() {
        let dir = temp_dir();
        let logs = dir.path().join("logs");
        let files = instances(dir.path(), &["bad"]);

        let launcher = Arc::new(SubprocessLauncher::new(
            "sh",
            vec!["-c".into(), "echo oops; exit 4".into()],
        ));
        let summary = JobRunner::new(launcher, runner_config(&logs, 1))
            .run(&files)
            .await
            .unwrap();

        match &summary.records[0].status {
            JobStatus::Failed { reason } => assert!(reason.contains("status 4")),
            other => panic!("unexpected status {other:?}"),
        }
        assert!(logs.join("bad.col.log").exists());
    }
}

#[tokio::test]
async fn large_batch_without_listener_completes() {
    let dir = temp_dir();
    let logs = dir.path().join("logs");
    let names: Vec<String> = (0..150).map(|i| format!("g{i}")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let files = instances(dir.path(), &refs);

    let launcher = Arc::new(CountingLauncher::new());
    let runner = JobRunner::new(launcher.clone(), runner_config(&logs, 4));

    let summary = tokio::time::timeout(Duration::from_secs(30), runner.run(&files))
        .await
        .expect("run did not finish")
        .unwrap();
    assert_eq!(summary.completed(), 150);
    assert_eq!(launcher.launches(), 150);
}
