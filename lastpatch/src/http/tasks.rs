//! Foreman task API client

use satellite_api::models::ForemanTask;

use crate::errors::LastPatchError;
use crate::http::client::HttpClient;

impl HttpClient {
    /// Get the live state of a foreman task
    pub async fn get_task(&self, task_id: &str) -> Result<ForemanTask, LastPatchError> {
        let path = format!("foreman_tasks/api/tasks/{}", task_id);
        self.get(&path, None).await
    }
}
