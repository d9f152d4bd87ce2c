//! Listing and end-to-end report tests

mod common;

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use common::{rpm_line, summary, FakeSatellite, HostScript, JOB_ID};
use lastpatch::app::cli::Cli;
use lastpatch::app::options::AppOptions;
use lastpatch::app::run::{execute, harvest_job, list_jobs, run_with};
use lastpatch::errors::LastPatchError;
use lastpatch::filesys::file::File;
use lastpatch::jobs::listing::{last_job_id, JobLister};
use lastpatch::models::job::JobStatus;
use lastpatch::report::writer::read_patch_report;
use lastpatch::settings::Settings;
use lastpatch::utils::RetryOptions;
use tokio_test::{assert_err, assert_ok};

fn options(extra: &[&str]) -> AppOptions {
    let base = ["lastpatch", "-s", "satellite.example.com", "-u", "admin:secret"];
    let cli = Cli::try_parse_from(base.iter().chain(extra.iter()).copied()).unwrap();
    AppOptions::from_cli(&cli, &Settings::default()).unwrap()
}

fn scratch_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("lastpatch-it-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[tokio::test]
async fn test_list_is_most_recent_first() {
    let fake = Arc::new(FakeSatellite {
        listing: vec![
            summary("10", Some("2023-04-14 13:05:51 UTC")),
            summary("12", None),
            summary("11", Some("2023-04-15T09:00:00+02:00")),
            summary("13", Some("2023-04-15 08:00:00 UTC")),
        ],
        ..Default::default()
    });
    let lister = JobLister::new(fake, RetryOptions::default());

    let jobs = assert_ok!(lister.list_jobs(false).await);
    let ids: Vec<_> = jobs.iter().map(|j| j.id.as_str()).collect();
    assert_eq!(ids, vec!["13", "11", "10", "12"]);
    assert_eq!(last_job_id(&jobs), Some("13"));
}

#[tokio::test]
async fn test_list_report_and_last_job_id() {
    let fake = Arc::new(FakeSatellite {
        listing: vec![
            summary("7", Some("2023-04-14 13:05:51 UTC")),
            summary("8", Some("2023-04-16 10:00:00 UTC")),
        ],
        ..Default::default()
    });

    let mut out = Vec::new();
    let mut side = Vec::new();
    assert_ok!(list_jobs(fake, &options(&["-l"]), &mut out, &mut side).await);

    let out = String::from_utf8(out).unwrap();
    let mut lines = out.lines();
    assert_eq!(
        lines.next(),
        Some("\"id\",\"description\",\"status\",\"success_fail_total\",\"date_time\"")
    );
    assert_eq!(
        lines.next(),
        Some("\"8\",\"Run rpm -qa --last\",\"succeeded\",\"1/0/1\",\"2023-04-16T10:00:00\"")
    );
    assert_eq!(String::from_utf8(side).unwrap(), "LAST_JOB_ID=8\n");
}

#[tokio::test]
async fn test_empty_listing_is_not_found() {
    let fake = Arc::new(FakeSatellite::default());
    let mut side = Vec::new();
    let err = assert_err!(list_jobs(fake, &options(&["-l"]), Vec::<u8>::new(), &mut side).await);
    assert!(matches!(err, LastPatchError::NotFound(_)));
    assert!(side.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_list_retries_transient_failures() {
    let fake = Arc::new(FakeSatellite {
        listing: vec![summary("7", None)],
        ..Default::default()
    });
    fake.list_failures.store(2, Ordering::SeqCst);
    let lister = JobLister::new(fake, RetryOptions::default());

    let jobs = assert_ok!(lister.list_jobs(false).await);
    assert_eq!(jobs.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_harvest_writes_report_with_partial_failures() {
    let fake = Arc::new(
        FakeSatellite::with_hosts(&[
            ("1", "demo1.example.com"),
            ("2", "demo2.example.com"),
            ("3", "demo3.example.com"),
        ])
        .task_sequence(&[("running", None), ("stopped", Some("success"))])
        .script(
            "1",
            HostScript::Output(format!(
                "{}{}Exit status: 0\n",
                rpm_line("python3-pbr-5.8.1-2.el9ap.noarch", "Fri 14 Apr 2023 01:06:04 PM UTC"),
                rpm_line("broken-1.0-1.noarch", "yesterday-ish"),
            )),
        )
        .script("2", HostScript::Down)
        .script(
            "3",
            HostScript::Output(rpm_line("bash-5.1.8-6.el9.x86_64", "Thu 13 Apr 2023 09:15:00 AM EDT")),
        ),
    );

    let dir = scratch_dir();
    let path = dir.join("last_patch.csv");
    let report = File::new(&path);
    let options = options(&["-j", JOB_ID, "-o", path.to_str().unwrap()]);

    let summary = assert_ok!(harvest_job(fake, JOB_ID, &options, &report).await);
    assert_eq!(summary.status, JobStatus::Succeeded);
    assert_eq!(summary.hosts, 3);
    assert_eq!(summary.records, 2);
    assert_eq!(summary.host_failures.len(), 1);
    assert_eq!(summary.host_failures[0].hostname, "demo2.example.com");
    assert_eq!(summary.skipped_lines.len(), 1);

    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        contents,
        "\"hostname\",\"package name\",\"last updated\"\n\
         \"demo1.example.com\",\"python3-pbr-5.8.1-2.el9ap.noarch\",\"2023-04-14T13:06:04\"\n\
         \"demo3.example.com\",\"bash-5.1.8-6.el9.x86_64\",\"2023-04-13T13:15:00\"\n"
    );
    assert_eq!(read_patch_report(&contents).unwrap().len(), 2);

    std::fs::remove_dir_all(dir).unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_timeout_leaves_previous_report() {
    let fake = Arc::new(FakeSatellite::with_hosts(&[]).task_sequence(&[("running", None)]));

    let dir = scratch_dir();
    let path = dir.join("last_patch.csv");
    std::fs::write(&path, "previous\n").unwrap();
    let options = options(&["-j", JOB_ID, "-o", path.to_str().unwrap(), "--max-wait", "30"]);

    let err = assert_err!(execute(fake, &options).await);
    assert!(matches!(err, LastPatchError::JobTimeout { .. }));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "previous\n");

    std::fs::remove_dir_all(dir).unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_interrupts_and_keeps_previous_report() {
    let fake = Arc::new(FakeSatellite::with_hosts(&[("1", "demo1.example.com")]).task_sequence(&[("running", None)]));

    let dir = scratch_dir();
    let path = dir.join("last_patch.csv");
    std::fs::write(&path, "previous\n").unwrap();
    let options = options(&["-j", JOB_ID, "-o", path.to_str().unwrap()]);

    let shutdown = tokio::time::sleep(Duration::from_secs(60));
    let err = assert_err!(run_with(fake.clone(), options, shutdown).await);

    assert!(matches!(err, LastPatchError::Interrupted(_)));
    assert!(fake.status_calls.load(Ordering::SeqCst) > 1);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "previous\n");
    let leftovers: Vec<_> = std::fs::read_dir(&dir)
        .unwrap()
        .flatten()
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());

    std::fs::remove_dir_all(dir).unwrap();
}

#[tokio::test]
async fn test_unwritable_output_fails_before_create() {
    let fake = Arc::new(FakeSatellite::with_hosts(&[("1", "demo1.example.com")]));

    let dir = scratch_dir();
    let path = dir.join("missing").join("last_patch.csv");
    let options = options(&["-c", "-o", path.to_str().unwrap()]);

    let err = assert_err!(execute(fake.clone(), &options).await);
    assert!(matches!(err, LastPatchError::ConfigError(_)));
    assert!(fake.created.lock().unwrap().is_empty());

    std::fs::remove_dir_all(dir).unwrap();
}

#[tokio::test]
async fn test_create_then_harvest() {
    let fake = Arc::new(
        FakeSatellite::with_hosts(&[("1", "demo1.example.com")]).script(
            "1",
            HostScript::Output(rpm_line("kernel-5.14.0-284.el9.x86_64", "Fri 14 Apr 2023 01:06:04 PM UTC")),
        ),
    );

    let dir = scratch_dir();
    let path = dir.join("last_patch.csv");
    let options = options(&["--create", "name = demo1.example.com", "-o", path.to_str().unwrap()]);

    assert_ok!(execute(fake.clone(), &options).await);
    assert_eq!(fake.created.lock().unwrap().len(), 1);
    assert_eq!(
        fake.created.lock().unwrap()[0].job_invocation.search_query,
        "name = demo1.example.com"
    );

    let records = read_patch_report(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].package_name, "kernel-5.14.0-284.el9.x86_64");

    std::fs::remove_dir_all(dir).unwrap();
}
