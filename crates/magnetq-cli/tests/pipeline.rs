use std::time::Duration;

use magnetq_cli::{BatchRequest, CliError, JobStatus, run_batch};
use magnetq_core::{CoreError, JobFilter, ReleaseMode, TorrentState};
use magnetq_test_support::{DaemonCall, LoginBehavior, StaticLinkSource, StubDaemon, magnets};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

const PAGE: &str = "https://example.test/releases";

#[tokio::test]
async fn two_links_concurrent_release_does_not_poll() -> anyhow::Result<()> {
    let source = StaticLinkSource::new(magnets(2));
    let daemon = StubDaemon::new();
    let request = BatchRequest::new(PAGE, "/downloads");

    let summary = run_batch(&source, &daemon, &request, CancellationToken::new())
        .await
        .map_err(|err| anyhow::anyhow!(err.display_message()))?;

    assert_eq!(source.requested(), vec![PAGE.to_string()]);
    assert_eq!(summary.links_found, 2);
    assert_eq!(summary.run_id, magnetq_telemetry::run_id());
    assert_eq!(summary.jobs.len(), 2);
    assert!(summary.jobs.iter().all(|job| job.status == JobStatus::Released));

    let handles: Vec<_> = summary.jobs.iter().map(|job| job.handle.clone()).collect();
    assert_eq!(daemon.resume_calls(), vec![handles]);
    let calls = daemon.calls();
    assert!(
        !calls
            .iter()
            .any(|call| matches!(call, DaemonCall::ListJobs(JobFilter::Handles(_))))
    );
    assert!(daemon.delete_calls().is_empty());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn hanging_login_ends_with_login_timeout() {
    let source = StaticLinkSource::new(magnets(2));
    let daemon = StubDaemon::new().with_login(LoginBehavior::Hang);
    let request = BatchRequest::new(PAGE, "/downloads");

    let started = Instant::now();
    let err = run_batch(&source, &daemon, &request, CancellationToken::new())
        .await
        .expect_err("login should time out");

    assert!(started.elapsed() <= Duration::from_secs(11));
    assert_eq!(err.exit_code(), 4);
    assert!(matches!(err, CliError::Session(CoreError::LoginTimeout { .. })));
    assert!(err.display_message().contains("ensure the torrent daemon is running"));
    assert_eq!(daemon.calls(), vec![DaemonCall::Login]);
}

#[tokio::test]
async fn rejected_login_stops_before_any_mutation() {
    let source = StaticLinkSource::new(magnets(1));
    let daemon = StubDaemon::new().with_login(LoginBehavior::Reject);
    let request = BatchRequest::new(PAGE, "/downloads");

    let err = run_batch(&source, &daemon, &request, CancellationToken::new())
        .await
        .expect_err("login should fail");

    assert!(matches!(err, CliError::Session(CoreError::LoginFailed)));
    assert_eq!(daemon.calls(), vec![DaemonCall::Login]);
}

#[tokio::test(start_paused = true)]
async fn removal_waits_for_completion_then_deletes_once() -> anyhow::Result<()> {
    let source = StaticLinkSource::new(magnets(1));
    let daemon = StubDaemon::new().with_completion_after(2);
    let request = BatchRequest::new(PAGE, "/downloads").with_removal(true);

    let summary = run_batch(&source, &daemon, &request, CancellationToken::new())
        .await
        .map_err(|err| anyhow::anyhow!(err.display_message()))?;

    assert_eq!(summary.jobs.len(), 1);
    assert_eq!(summary.jobs[0].status, JobStatus::Removed);
    assert_eq!(
        daemon.delete_calls(),
        vec![(vec![summary.jobs[0].handle.clone()], false)]
    );

    let calls = daemon.calls();
    let first_complete = calls
        .iter()
        .position(|call| matches!(call, DaemonCall::Observed { state, .. } if state.is_complete()))
        .expect("completion observed");
    let delete_at = calls
        .iter()
        .position(|call| matches!(call, DaemonCall::Delete { .. }))
        .expect("delete issued");
    assert!(first_complete < delete_at);
    let active_observations = calls
        .iter()
        .filter(|call| matches!(call, DaemonCall::Observed { state, .. } if *state == TorrentState::Downloading))
        .count();
    assert_eq!(active_observations, 2);
    let completion_checks = calls
        .iter()
        .filter(|call| matches!(call, DaemonCall::ListJobs(JobFilter::Handles(_))))
        .count();
    assert_eq!(completion_checks, 3);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn sequential_run_reports_completed_jobs() -> anyhow::Result<()> {
    let source = StaticLinkSource::new(magnets(3));
    let daemon = StubDaemon::new().with_completion_after(1);
    let request = BatchRequest::new(PAGE, "/downloads").with_mode(ReleaseMode::Sequential);

    let summary = run_batch(&source, &daemon, &request, CancellationToken::new())
        .await
        .map_err(|err| anyhow::anyhow!(err.display_message()))?;

    assert_eq!(summary.mode, "sequential");
    assert!(summary.jobs.iter().all(|job| job.status == JobStatus::Complete));
    assert_eq!(daemon.resume_calls().len(), 3);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn interrupt_during_wait_never_removes() {
    let source = StaticLinkSource::new(magnets(2));
    let daemon = StubDaemon::new().with_completion_after(1_000);
    let request = BatchRequest::new(PAGE, "/downloads").with_removal(true);
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(95)).await;
        trigger.cancel();
    });

    let err = run_batch(&source, &daemon, &request, cancel)
        .await
        .expect_err("interrupt should stop the wait");

    assert_eq!(err.exit_code(), 130);
    assert!(matches!(err, CliError::Interrupted("batch.wait")));
    assert!(daemon.delete_calls().is_empty());
}

#[tokio::test]
async fn page_failure_skips_the_daemon() {
    let source = StaticLinkSource::failing();
    let daemon = StubDaemon::new();
    let request = BatchRequest::new(PAGE, "/downloads");

    let err = run_batch(&source, &daemon, &request, CancellationToken::new())
        .await
        .expect_err("page failure");

    assert_eq!(err.exit_code(), 3);
    assert!(err.display_message().contains(PAGE));
    assert!(daemon.calls().is_empty());
}

#[tokio::test]
async fn empty_page_logs_in_but_submits_nothing() -> anyhow::Result<()> {
    let source = StaticLinkSource::new(Vec::new());
    let daemon = StubDaemon::new();
    let request = BatchRequest::new(PAGE, "/downloads").with_removal(true);

    let summary = run_batch(&source, &daemon, &request, CancellationToken::new())
        .await
        .map_err(|err| anyhow::anyhow!(err.display_message()))?;

    assert!(summary.jobs.is_empty());
    assert_eq!(daemon.calls(), vec![DaemonCall::Login]);
    Ok(())
}

#[tokio::test]
async fn dropped_link_surfaces_partial_resolution() {
    let source = StaticLinkSource::new(magnets(3));
    let daemon = StubDaemon::new().with_dropped_adds(1);
    let request = BatchRequest::new(PAGE, "/downloads");

    let err = run_batch(&source, &daemon, &request, CancellationToken::new())
        .await
        .expect_err("mismatch should fail");

    assert_eq!(err.exit_code(), 3);
    assert!(err.display_message().contains("expected 3, resolved 2"));
    assert!(daemon.resume_calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn deadline_is_shared_by_every_item_wait() {
    // Each item takes ~20 s to complete at the 10 s item cadence.
    let source = StaticLinkSource::new(magnets(2));
    let daemon = StubDaemon::new().with_completion_after(2);
    let request = BatchRequest::new(PAGE, "/downloads")
        .with_mode(ReleaseMode::Sequential)
        .with_deadline(Some(Duration::from_secs(30)));

    let started = Instant::now();
    let err = run_batch(&source, &daemon, &request, CancellationToken::new())
        .await
        .expect_err("second item should exceed the run deadline");

    assert!(started.elapsed() < Duration::from_secs(31));
    assert_eq!(err.exit_code(), 3);
    assert!(err.display_message().contains("item.wait"));
    assert_eq!(daemon.resume_calls().len(), 2);
}
