//! Satellite API seam used by the job components

use async_trait::async_trait;
use satellite_api::models::{
    CreateJobInvocationRequest, ForemanTask, HostOutputResponse, JobInvocation, JobTemplate,
};

use crate::errors::LastPatchError;
use crate::http::client::HttpClient;

/// The remote calls the job lifecycle needs, as a trait for testability
#[async_trait]
pub trait SatelliteApi: Send + Sync {
    /// Search job templates
    async fn search_job_templates(&self, search: &str) -> Result<Vec<JobTemplate>, LastPatchError>;

    /// Launch a job invocation
    async fn create_job_invocation(
        &self,
        request: &CreateJobInvocationRequest,
    ) -> Result<JobInvocation, LastPatchError>;

    /// Get a job invocation
    async fn get_job_invocation(&self, job_id: &str) -> Result<JobInvocation, LastPatchError>;

    /// List job invocations matching a search, newest first
    async fn list_job_invocations(
        &self,
        search: &str,
        all_pages: bool,
    ) -> Result<Vec<JobInvocation>, LastPatchError>;

    /// Get a foreman task
    async fn get_task(&self, task_id: &str) -> Result<ForemanTask, LastPatchError>;

    /// Get one host's output for a job invocation
    async fn get_host_output(
        &self,
        job_id: &str,
        host_id: &str,
    ) -> Result<HostOutputResponse, LastPatchError>;
}

#[async_trait]
impl SatelliteApi for HttpClient {
    async fn search_job_templates(&self, search: &str) -> Result<Vec<JobTemplate>, LastPatchError> {
        HttpClient::search_job_templates(self, search).await
    }

    async fn create_job_invocation(
        &self,
        request: &CreateJobInvocationRequest,
    ) -> Result<JobInvocation, LastPatchError> {
        HttpClient::create_job_invocation(self, request).await
    }

    async fn get_job_invocation(&self, job_id: &str) -> Result<JobInvocation, LastPatchError> {
        HttpClient::get_job_invocation(self, job_id).await
    }

    async fn list_job_invocations(
        &self,
        search: &str,
        all_pages: bool,
    ) -> Result<Vec<JobInvocation>, LastPatchError> {
        HttpClient::list_job_invocations(self, search, all_pages).await
    }

    async fn get_task(&self, task_id: &str) -> Result<ForemanTask, LastPatchError> {
        HttpClient::get_task(self, task_id).await
    }

    async fn get_host_output(
        &self,
        job_id: &str,
        host_id: &str,
    ) -> Result<HostOutputResponse, LastPatchError> {
        HttpClient::get_host_output(self, job_id, host_id).await
    }
}
