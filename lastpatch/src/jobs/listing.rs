//! Recent inventory job listing

use std::sync::Arc;

use tracing::{debug, info};

use crate::errors::LastPatchError;
use crate::http::api::SatelliteApi;
use crate::jobs::PATCH_JOB_DESCRIPTION;
use crate::models::job::JobSummary;
use crate::utils::{retry_transient, RetryOptions};

/// Lists previously launched inventory jobs
pub struct JobLister {
    api: Arc<dyn SatelliteApi>,
    retry: RetryOptions,
}

impl JobLister {
    /// Create a new lister
    pub fn new(api: Arc<dyn SatelliteApi>, retry: RetryOptions) -> Self {
        Self { api, retry }
    }

    /// Inventory jobs, most recent first.
    ///
    /// Jobs without a parseable start time sort last, keeping the API order
    /// among themselves.
    pub async fn list_jobs(&self, all_pages: bool) -> Result<Vec<JobSummary>, LastPatchError> {
        let search = format!("description=\"{PATCH_JOB_DESCRIPTION}\"");
        info!("Listing jobs matching {}", search);

        let invocations = retry_transient(&self.retry, "job list", || {
            self.api.list_job_invocations(&search, all_pages)
        })
        .await?;

        let mut jobs: Vec<JobSummary> = invocations.iter().map(JobSummary::from_invocation).collect();
        if jobs.is_empty() {
            return Err(LastPatchError::NotFound(format!("no jobs match {search}")));
        }

        // stable: ties keep the API order
        jobs.sort_by(|a, b| b.started_at_utc.cmp(&a.started_at_utc));
        debug!("Found {} jobs", jobs.len());
        Ok(jobs)
    }
}

/// Id of the most recent job in a listing
pub fn last_job_id(jobs: &[JobSummary]) -> Option<&str> {
    jobs.first().map(|job| job.id.as_str())
}
