//! Job launcher

use std::sync::Arc;

use satellite_api::models::{
    CommandInputs, CreateJobInvocationRequest, JobInvocationParams, JobTemplate,
};
use tracing::{debug, info};

use crate::errors::LastPatchError;
use crate::http::api::SatelliteApi;
use crate::jobs::PATCH_COMMAND;
use crate::models::job::{Job, JobQuery, JobStatus};

/// Search selecting the stock script template
pub const TEMPLATE_SEARCH: &str =
    r#"job_category = Commands and name = "Run Command - Script Default""#;

/// Launches inventory jobs
pub struct JobLauncher {
    api: Arc<dyn SatelliteApi>,
}

impl JobLauncher {
    /// Create a new launcher
    pub fn new(api: Arc<dyn SatelliteApi>) -> Self {
        Self { api }
    }

    /// Resolve the one template able to run the inventory command
    pub async fn resolve_template(&self) -> Result<JobTemplate, LastPatchError> {
        info!("Resolving job template");
        let mut templates = self.api.search_job_templates(TEMPLATE_SEARCH).await?;

        match templates.len() {
            0 => Err(LastPatchError::TemplateResolution(format!(
                "no job template matches {TEMPLATE_SEARCH}"
            ))),
            1 => {
                let template = templates.remove(0);
                debug!("Found template: {} ({})", template.name, template.id);
                Ok(template)
            }
            n => {
                let ids: Vec<_> = templates.iter().map(|t| t.id.as_str()).collect();
                Err(LastPatchError::TemplateResolution(format!(
                    "{n} job templates match {TEMPLATE_SEARCH}: {}",
                    ids.join(", ")
                )))
            }
        }
    }

    /// Launch a new inventory job. Not idempotent: every call creates a job.
    pub async fn create_job(&self, query: &JobQuery) -> Result<Job, LastPatchError> {
        info!("Creating job with query: {}", query.host_filter);
        let template = self.resolve_template().await?;

        let request = CreateJobInvocationRequest {
            organization_id: query.organization_id,
            location_id: query.location_id,
            job_invocation: JobInvocationParams {
                job_template_id: template.id.clone(),
                inputs: CommandInputs {
                    command: PATCH_COMMAND.to_string(),
                },
                targeting_type: "static_query".to_string(),
                search_query: query.host_filter.clone(),
            },
        };

        let invocation = self.api.create_job_invocation(&request).await?;
        let mut job = Job::from_invocation(&invocation, JobStatus::Pending);
        if job.template_id.is_none() {
            job.template_id = Some(template.id);
        }

        info!("Created job: {}", job.id);
        Ok(job)
    }
}
