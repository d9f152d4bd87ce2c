//! Job invocation API client

use satellite_api::models::{CreateJobInvocationRequest, HostOutputResponse, JobInvocation};
use serde_json::json;

use crate::errors::LastPatchError;
use crate::http::client::HttpClient;

const JOB_INVOCATIONS: &str = "api/job_invocations";

impl HttpClient {
    /// Launch a job invocation. Not idempotent.
    pub async fn create_job_invocation(
        &self,
        request: &CreateJobInvocationRequest,
    ) -> Result<JobInvocation, LastPatchError> {
        self.post(JOB_INVOCATIONS, request).await
    }

    /// Get a specific job invocation by ID
    pub async fn get_job_invocation(&self, job_id: &str) -> Result<JobInvocation, LastPatchError> {
        let path = format!("{}/{}", JOB_INVOCATIONS, job_id);
        self.get(&path, None).await
    }

    /// List job invocations matching a search, newest first
    pub async fn list_job_invocations(
        &self,
        search: &str,
        all_pages: bool,
    ) -> Result<Vec<JobInvocation>, LastPatchError> {
        let params = json!({
            "search": search,
            "order": "start_at DESC",
        });

        if all_pages {
            self.get_all_pages(JOB_INVOCATIONS, &params).await
        } else {
            let page = self.get_page(JOB_INVOCATIONS, &params, 1).await?;
            Ok(page.results)
        }
    }

    /// Get the output a host produced for a job invocation
    pub async fn get_host_output(
        &self,
        job_id: &str,
        host_id: &str,
    ) -> Result<HostOutputResponse, LastPatchError> {
        let path = format!("{}/{}/hosts/{}", JOB_INVOCATIONS, job_id, host_id);
        self.get(&path, None).await
    }
}
