//! Per-host output retrieval.
//!
//! Fetches are bounded by a semaphore and independent of each other: a host
//! whose output cannot be retrieved becomes a [`HostFailure`] and the rest of
//! the fleet is still reported.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::errors::{HostFailure, LastPatchError};
use crate::http::api::SatelliteApi;
use crate::models::job::HostTarget;
use crate::models::record::HostOutput;
use crate::utils::{retry_transient, RetryOptions};

/// Harvester options
#[derive(Debug, Clone)]
pub struct Options {
    /// Max concurrent host output fetches
    pub max_concurrent: usize,

    /// Retry policy for each fetch
    pub retry: RetryOptions,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_concurrent: 4,
            retry: RetryOptions::default(),
        }
    }
}

/// Outputs retrieved for a job, plus the hosts that could not be fetched
#[derive(Debug, Default)]
pub struct Harvest {
    /// Outputs in host targeting order
    pub outputs: Vec<HostOutput>,
    pub failures: Vec<HostFailure>,
}

/// Retrieves the raw command output of every host in a job
pub struct OutputHarvester {
    api: Arc<dyn SatelliteApi>,
    options: Options,
}

impl OutputHarvester {
    /// Create a new harvester
    pub fn new(api: Arc<dyn SatelliteApi>, options: Options) -> Self {
        Self { api, options }
    }

    /// Hosts targeted by a job, in targeting order
    pub async fn list_hosts(&self, job_id: &str) -> Result<Vec<HostTarget>, LastPatchError> {
        let invocation = retry_transient(&self.options.retry, "job hosts", || {
            self.api.get_job_invocation(job_id)
        })
        .await?;

        let hosts: Vec<HostTarget> = invocation
            .hosts()
            .iter()
            .map(|h| HostTarget {
                id: h.id.clone(),
                hostname: h.name.clone(),
            })
            .collect();
        debug!("Job {} targets {} hosts", job_id, hosts.len());
        Ok(hosts)
    }

    /// Fetch one host's output
    pub async fn fetch_output(
        &self,
        job_id: &str,
        host: &HostTarget,
    ) -> Result<HostOutput, LastPatchError> {
        fetch_host_output(self.api.as_ref(), &self.options.retry, job_id, host).await
    }

    /// Fetch every host's output with bounded concurrency
    pub async fn harvest(&self, job_id: &str, hosts: &[HostTarget]) -> Harvest {
        info!(
            "Fetching output for {} hosts ({} at a time)",
            hosts.len(),
            self.options.max_concurrent
        );

        let semaphore = Arc::new(Semaphore::new(self.options.max_concurrent.max(1)));
        let mut handles = Vec::with_capacity(hosts.len());

        for host in hosts {
            let sem = Arc::clone(&semaphore);
            let api = Arc::clone(&self.api);
            let retry = self.options.retry.clone();
            let job_id = job_id.to_string();
            let target = host.clone();
            handles.push(tokio::spawn(async move {
                let _permit = sem
                    .acquire()
                    .await
                    .map_err(|e| LastPatchError::Interrupted(e.to_string()))?;
                fetch_host_output(api.as_ref(), &retry, &job_id, &target).await
            }));
        }

        let mut harvest = Harvest::default();
        let results = join_all(handles).await;
        for (host, joined) in hosts.iter().zip(results) {
            let result = match joined {
                Ok(result) => result,
                Err(e) => Err(LastPatchError::Interrupted(e.to_string())),
            };
            match result {
                Ok(output) => harvest.outputs.push(output),
                Err(e) => {
                    let failure = HostFailure {
                        host_id: host.id.clone(),
                        hostname: host.hostname.clone(),
                        message: e.to_string(),
                    };
                    warn!("Failed to fetch output: {}", failure);
                    harvest.failures.push(failure);
                }
            }
        }

        if !harvest.failures.is_empty() {
            let names: Vec<_> = harvest.failures.iter().map(|f| f.hostname.as_str()).collect();
            warn!(
                "Output missing for {} of {} hosts: {}",
                harvest.failures.len(),
                hosts.len(),
                names.join(", ")
            );
        }

        harvest
    }
}

async fn fetch_host_output(
    api: &dyn SatelliteApi,
    retry: &RetryOptions,
    job_id: &str,
    host: &HostTarget,
) -> Result<HostOutput, LastPatchError> {
    let response = retry_transient(retry, &format!("output of {}", host.hostname), || {
        api.get_host_output(job_id, &host.id)
    })
    .await?;

    let stdout = response.stdout();
    if stdout.trim().is_empty() {
        warn!("{} returned no output", host.hostname);
    }
    Ok(HostOutput::from_stdout(host.hostname.clone(), &stdout))
}
