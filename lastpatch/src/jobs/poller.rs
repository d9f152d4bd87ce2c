//! Job completion poller

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::errors::LastPatchError;
use crate::http::api::SatelliteApi;
use crate::models::job::{Job, JobStatus};
use crate::utils::{retry_transient, RetryOptions};

/// Poller options
#[derive(Debug, Clone)]
pub struct Options {
    /// Delay between polls
    pub interval: Duration,

    /// Give up once this much time has passed
    pub max_wait: Duration,

    /// Retry policy for each poll
    pub retry: RetryOptions,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_wait: Duration::from_secs(900),
            retry: RetryOptions::default(),
        }
    }
}

/// Polls a job until it reaches a terminal state
pub struct JobPoller {
    api: Arc<dyn SatelliteApi>,
    retry: RetryOptions,
}

impl JobPoller {
    /// Create a new poller
    pub fn new(api: Arc<dyn SatelliteApi>, retry: RetryOptions) -> Self {
        Self { api, retry }
    }

    /// Fetch the current state of a job. Each call is authoritative.
    pub async fn poll_once(&self, job_id: &str) -> Result<Job, LastPatchError> {
        let invocation = retry_transient(&self.retry, "job status", || {
            self.api.get_job_invocation(job_id)
        })
        .await?;

        let status = match invocation.task.as_ref() {
            Some(task_ref) => {
                let task = retry_transient(&self.retry, "task status", || {
                    self.api.get_task(&task_ref.id)
                })
                .await?;
                debug!(
                    "task {}: state={}, result={:?}, progress={:?}",
                    task.id, task.state, task.result, task.progress
                );
                JobStatus::from_task(&task)
            }
            None => JobStatus::Unknown,
        };

        Ok(Job::from_invocation(&invocation, status))
    }

    /// Poll until the job succeeds or fails.
    ///
    /// Fails with [`LastPatchError::JobTimeout`] once `max_wait` has elapsed;
    /// the remote job keeps running.
    pub async fn await_completion(
        &self,
        job_id: &str,
        interval: Duration,
        max_wait: Duration,
    ) -> Result<Job, LastPatchError> {
        info!("Waiting for job {} (max {:?})", job_id, max_wait);
        let started = Instant::now();
        let mut last_status = None;

        loop {
            let job = self.poll_once(job_id).await?;

            if last_status != Some(job.status) {
                info!("Job {} is {}", job_id, job.status);
                last_status = Some(job.status);
            }

            match job.status {
                JobStatus::Succeeded => return Ok(job),
                JobStatus::Failed => {
                    warn!("Job {} finished with failures", job_id);
                    return Ok(job);
                }
                JobStatus::Unknown => debug!("Job {} status unknown, polling again", job_id),
                JobStatus::Pending | JobStatus::Running => {}
            }

            let elapsed = started.elapsed();
            if elapsed >= max_wait {
                return Err(LastPatchError::JobTimeout {
                    job_id: job_id.to_string(),
                    waited_secs: elapsed.as_secs(),
                    last_status: job.status.to_string(),
                });
            }

            tokio::time::sleep(interval.min(max_wait - elapsed)).await;
        }
    }
}
