//! Job template API client

use satellite_api::models::JobTemplate;
use serde_json::json;

use crate::errors::LastPatchError;
use crate::http::client::HttpClient;

impl HttpClient {
    /// Search job templates; every page is fetched so the caller sees the
    /// full match count
    pub async fn search_job_templates(
        &self,
        search: &str,
    ) -> Result<Vec<JobTemplate>, LastPatchError> {
        let params = json!({ "search": search });
        self.get_all_pages("api/job_templates", &params).await
    }
}
