//! Main application workflows

use std::future::Future;
use std::io::Write;
use std::sync::Arc;

use tracing::{info, warn};

use crate::app::cli::Action;
use crate::app::options::AppOptions;
use crate::errors::{HostFailure, LastPatchError, ParseError};
use crate::filesys::file::File;
use crate::http::api::SatelliteApi;
use crate::http::client::HttpClient;
use crate::jobs::harvester::OutputHarvester;
use crate::jobs::launcher::JobLauncher;
use crate::jobs::listing::{last_job_id, JobLister};
use crate::jobs::poller::JobPoller;
use crate::models::job::JobStatus;
use crate::report::parser::parse_output;
use crate::report::writer::{render_patch_report, write_job_list};

/// What a harvesting run produced
#[derive(Debug)]
pub struct ReportSummary {
    pub job_id: String,
    pub status: JobStatus,
    pub hosts: usize,
    pub records: usize,
    pub host_failures: Vec<HostFailure>,
    pub skipped_lines: Vec<ParseError>,
}

/// Run lastpatch until the action completes or the shutdown signal fires.
///
/// An interrupted run leaves any previous report untouched.
pub async fn run(
    options: AppOptions,
    shutdown_signal: impl Future<Output = ()>,
) -> Result<(), LastPatchError> {
    let client = HttpClient::new(
        &options.server,
        options.credentials.clone(),
        &options.tls,
        options.per_page,
    )?;
    run_with(Arc::new(client), options, shutdown_signal).await
}

/// Run against an already built API until the action completes or the
/// shutdown signal fires
pub async fn run_with(
    api: Arc<dyn SatelliteApi>,
    options: AppOptions,
    shutdown_signal: impl Future<Output = ()>,
) -> Result<(), LastPatchError> {
    tokio::select! {
        result = execute(api, &options) => result,
        _ = shutdown_signal => Err(LastPatchError::Interrupted(
            "shutdown signal received".to_string(),
        )),
    }
}

/// Perform the selected action against `api`
pub async fn execute(api: Arc<dyn SatelliteApi>, options: &AppOptions) -> Result<(), LastPatchError> {
    match &options.action {
        Action::List => {
            list_jobs(api, options, std::io::stdout(), std::io::stderr()).await
        }
        Action::Create(_) => {
            let report = File::new(&options.output);
            report.ensure_writable().await?;

            let job = JobLauncher::new(api.clone()).create_job(&options.scope).await?;
            harvest_job(api, &job.id, options, &report).await?;
            Ok(())
        }
        Action::Resume(job_id) => {
            let report = File::new(&options.output);
            report.ensure_writable().await?;

            harvest_job(api, job_id, options, &report).await?;
            Ok(())
        }
    }
}

/// Print the job list report to `out` and `LAST_JOB_ID=<id>` to `side`
pub async fn list_jobs<O: Write, S: Write>(
    api: Arc<dyn SatelliteApi>,
    options: &AppOptions,
    out: O,
    mut side: S,
) -> Result<(), LastPatchError> {
    let lister = JobLister::new(api, options.retry.clone());
    let jobs = lister.list_jobs(options.all_pages).await?;

    write_job_list(&jobs, out)?;
    if let Some(id) = last_job_id(&jobs) {
        writeln!(side, "LAST_JOB_ID={id}")?;
        side.flush()?;
    }
    Ok(())
}

/// Wait for a job, collect every host's output and write the patch report
pub async fn harvest_job(
    api: Arc<dyn SatelliteApi>,
    job_id: &str,
    options: &AppOptions,
    report: &File,
) -> Result<ReportSummary, LastPatchError> {
    let poller = JobPoller::new(api.clone(), options.poller.retry.clone());
    let job = poller
        .await_completion(job_id, options.poller.interval, options.poller.max_wait)
        .await?;

    let harvester = OutputHarvester::new(api, options.harvester.clone());
    let hosts = if job.hosts.is_empty() {
        harvester.list_hosts(job_id).await?
    } else {
        job.hosts.clone()
    };
    let harvest = harvester.harvest(job_id, &hosts).await;

    let mut records = Vec::new();
    let mut skipped_lines = Vec::new();
    for output in &harvest.outputs {
        let parsed = parse_output(output);
        records.extend(parsed.records);
        skipped_lines.extend(parsed.skipped);
    }

    info!("Writing {} records to {}", records.len(), report.path().display());
    report
        .write_atomic(render_patch_report(&records).as_bytes())
        .await?;

    if !skipped_lines.is_empty() {
        warn!("Skipped {} unparseable lines", skipped_lines.len());
    }

    Ok(ReportSummary {
        job_id: job.id,
        status: job.status,
        hosts: hosts.len(),
        records: records.len(),
        host_failures: harvest.failures,
        skipped_lines,
    })
}
