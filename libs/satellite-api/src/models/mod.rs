//! API models

use serde::{Deserialize, Serialize};

pub mod lenient;

/// Paginated index response (`GET api/<resource>`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub total: Option<u64>,
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub subtotal: Option<u64>,
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub page: Option<u64>,
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub per_page: Option<u64>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

/// Job template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobTemplate {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub job_category: Option<String>,
    #[serde(default)]
    pub provider_type: Option<String>,
}

/// Job invocation, as returned by show, index and create
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobInvocation {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub job_category: Option<String>,
    #[serde(default)]
    pub status_label: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub succeeded: Option<u64>,
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub failed: Option<u64>,
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub pending: Option<u64>,
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub total: Option<u64>,
    #[serde(default)]
    pub start_at: Option<String>,
    #[serde(default)]
    pub task: Option<TaskRef>,
    #[serde(default)]
    pub targeting: Option<Targeting>,
    #[serde(default)]
    pub template_invocations: Vec<TemplateInvocation>,
}

impl JobInvocation {
    /// Id of the template the job was launched from, when the payload says
    pub fn template_id(&self) -> Option<&str> {
        self.template_invocations
            .first()
            .and_then(|t| t.template_id.as_deref())
    }

    /// Hosts resolved by the job's targeting, in API order
    pub fn hosts(&self) -> &[HostRef] {
        self.targeting
            .as_ref()
            .map(|t| t.hosts.as_slice())
            .unwrap_or_default()
    }
}

/// Reference to the foreman task backing a job invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRef {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(default)]
    pub state: Option<String>,
}

/// Targeting section of a job invocation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Targeting {
    #[serde(default)]
    pub search_query: Option<String>,
    #[serde(default)]
    pub targeting_type: Option<String>,
    #[serde(default)]
    pub hosts: Vec<HostRef>,
}

/// Host targeted by a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRef {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    pub name: String,
}

/// Template invocation entry of a job invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateInvocation {
    #[serde(default, deserialize_with = "lenient::opt_id")]
    pub template_id: Option<String>,
}

/// Foreman task (`GET foreman_tasks/api/tasks/<id>`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForemanTask {
    #[serde(deserialize_with = "lenient::id")]
    pub id: String,
    pub state: String,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub progress: Option<f64>,
}

/// Per-host output (`GET api/job_invocations/<id>/hosts/<host_id>`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostOutputResponse {
    #[serde(default)]
    pub complete: Option<bool>,
    #[serde(default)]
    pub output: Vec<OutputChunk>,
}

impl HostOutputResponse {
    /// Concatenated stdout chunks, in the order the API returned them
    pub fn stdout(&self) -> String {
        self.output
            .iter()
            .filter(|chunk| chunk.output_type == "stdout")
            .map(|chunk| chunk.output.as_str())
            .collect()
    }
}

/// A single chunk of host output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputChunk {
    pub output: String,
    pub output_type: String,
    #[serde(default)]
    pub timestamp: Option<f64>,
}

/// Job invocation create request (`POST api/job_invocations`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateJobInvocationRequest {
    pub organization_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<i64>,
    pub job_invocation: JobInvocationParams,
}

/// Body of a job invocation create request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobInvocationParams {
    #[serde(serialize_with = "lenient::ser_id", deserialize_with = "lenient::id")]
    pub job_template_id: String,
    pub inputs: CommandInputs,
    pub targeting_type: String,
    pub search_query: String,
}

/// Template inputs for the script template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandInputs {
    pub command: String,
}

/// Error envelope returned by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub full_messages: Vec<String>,
}

impl ErrorResponse {
    /// Best human readable message in the envelope
    pub fn message(&self) -> Option<String> {
        if !self.error.full_messages.is_empty() {
            return Some(self.error.full_messages.join("; "));
        }
        self.error.message.clone()
    }
}
