//! Job poller tests

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use common::{FakeSatellite, JOB_ID};
use lastpatch::errors::LastPatchError;
use lastpatch::jobs::poller::JobPoller;
use lastpatch::models::job::JobStatus;
use lastpatch::utils::RetryOptions;
use tokio_test::{assert_err, assert_ok};

const INTERVAL: Duration = Duration::from_secs(5);

fn poller(fake: &Arc<FakeSatellite>) -> JobPoller {
    JobPoller::new(fake.clone(), RetryOptions::default())
}

#[tokio::test(start_paused = true)]
async fn test_pending_running_succeeded() {
    let fake = Arc::new(
        FakeSatellite::with_hosts(&[("7", "demo1.example.com")]).task_sequence(&[
            ("planned", None),
            ("running", Some("pending")),
            ("stopped", Some("success")),
        ]),
    );

    let started = tokio::time::Instant::now();
    let job = assert_ok!(poller(&fake).await_completion(JOB_ID, INTERVAL, Duration::from_secs(900)).await);

    assert_eq!(job.status, JobStatus::Succeeded);
    assert_eq!(job.hosts[0].hostname, "demo1.example.com");
    assert_eq!(fake.status_calls.load(Ordering::SeqCst), 3);
    let elapsed = started.elapsed();
    assert!(elapsed >= INTERVAL * 2 && elapsed < INTERVAL * 3, "{elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn test_failed_job_is_terminal() {
    let fake = Arc::new(
        FakeSatellite::with_hosts(&[]).task_sequence(&[("running", None), ("stopped", Some("error"))]),
    );

    let job = assert_ok!(poller(&fake).await_completion(JOB_ID, INTERVAL, Duration::from_secs(900)).await);
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.status.is_terminal());
}

#[tokio::test(start_paused = true)]
async fn test_unknown_state_keeps_polling() {
    let fake = Arc::new(FakeSatellite::with_hosts(&[]).task_sequence(&[
        ("resuming", None),
        ("resuming", None),
        ("stopped", Some("success")),
    ]));

    let job = assert_ok!(poller(&fake).await_completion(JOB_ID, INTERVAL, Duration::from_secs(900)).await);
    assert_eq!(job.status, JobStatus::Succeeded);
    assert_eq!(fake.status_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_is_bounded() {
    let fake = Arc::new(FakeSatellite::with_hosts(&[]).task_sequence(&[("running", None)]));

    let started = tokio::time::Instant::now();
    let err = assert_err!(poller(&fake).await_completion(JOB_ID, INTERVAL, Duration::from_secs(12)).await);

    match err {
        LastPatchError::JobTimeout {
            job_id,
            waited_secs,
            last_status,
        } => {
            assert_eq!(job_id, JOB_ID);
            assert_eq!(waited_secs, 12);
            assert_eq!(last_status, "running");
        }
        other => panic!("expected a timeout, got {other:?}"),
    }
    // polls at 0s, 5s, 10s and a final one at the deadline
    assert_eq!(fake.status_calls.load(Ordering::SeqCst), 4);
    assert!(started.elapsed() < Duration::from_secs(13));
}

#[tokio::test(start_paused = true)]
async fn test_job_without_task_is_unknown() {
    let fake = Arc::new(FakeSatellite {
        with_task: false,
        ..FakeSatellite::with_hosts(&[])
    });
    let poller = poller(&fake);

    let job = assert_ok!(poller.poll_once(JOB_ID).await);
    assert_eq!(job.status, JobStatus::Unknown);
    assert_eq!(job.task_id, None);

    let err = assert_err!(poller.await_completion(JOB_ID, INTERVAL, Duration::from_secs(10)).await);
    assert!(matches!(err, LastPatchError::JobTimeout { ref last_status, .. } if last_status == "unknown"));
    assert_eq!(fake.status_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_missing_job_is_not_retried() {
    let fake = Arc::new(FakeSatellite::with_hosts(&[]));
    let err = assert_err!(poller(&fake).poll_once("999").await);
    assert!(matches!(err, LastPatchError::NotFound(_)));
}
