//! Job models

use std::fmt;

use chrono::{DateTime, Utc};
use satellite_api::models::{ForemanTask, JobInvocation};
use serde::{Deserialize, Serialize};

use crate::report::timestamp::parse_timestamp;

/// Host selection for a new job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobQuery {
    /// Satellite host search, `*` for every host
    pub host_filter: String,

    /// Organization the job runs in
    pub organization_id: i64,

    /// Optional location scope
    pub location_id: Option<i64>,
}

impl Default for JobQuery {
    fn default() -> Self {
        Self {
            host_filter: "*".to_string(),
            organization_id: 1,
            location_id: None,
        }
    }
}

/// Job lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl JobStatus {
    /// Whether no further transition can happen
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }

    /// Derive the job status from its backing foreman task
    pub fn from_task(task: &ForemanTask) -> Self {
        match task.state.as_str() {
            "stopped" => match task.result.as_deref() {
                Some("success") => JobStatus::Succeeded,
                _ => JobStatus::Failed,
            },
            "pending" | "planning" | "planned" | "scheduled" => JobStatus::Pending,
            "running" | "paused" => JobStatus::Running,
            _ => JobStatus::Unknown,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
            JobStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// A host targeted by a job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostTarget {
    pub id: String,
    pub hostname: String,
}

/// A remote job, as last seen from the API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Job invocation id
    pub id: String,

    /// Template the job was launched from, when known
    pub template_id: Option<String>,

    /// Status derived from the most recent poll
    pub status: JobStatus,

    /// Job description
    pub description: String,

    /// Targeted hosts, in targeting order
    pub hosts: Vec<HostTarget>,

    /// Backing foreman task, once the API has planned one
    pub task_id: Option<String>,
}

impl Job {
    /// Build a job snapshot from an invocation payload
    pub fn from_invocation(invocation: &JobInvocation, status: JobStatus) -> Self {
        Self {
            id: invocation.id.clone(),
            template_id: invocation.template_id().map(str::to_string),
            status,
            description: invocation.description.clone().unwrap_or_default(),
            hosts: invocation
                .hosts()
                .iter()
                .map(|h| HostTarget {
                    id: h.id.clone(),
                    hostname: h.name.clone(),
                })
                .collect(),
            task_id: invocation.task.as_ref().map(|t| t.id.clone()),
        }
    }
}

/// One row of the job list report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSummary {
    pub id: String,
    pub description: String,
    pub status_label: String,
    pub succeeded: u64,
    pub failed: u64,
    pub total: Option<u64>,

    /// Start time as the API reported it
    pub start_at: Option<String>,

    /// Start time normalized to UTC, when parseable
    pub started_at_utc: Option<DateTime<Utc>>,
}

impl JobSummary {
    /// Summarize a job invocation from an index listing
    pub fn from_invocation(invocation: &JobInvocation) -> Self {
        let started_at_utc = invocation
            .start_at
            .as_deref()
            .and_then(|s| parse_timestamp(s).ok());

        Self {
            id: invocation.id.clone(),
            description: invocation.description.clone().unwrap_or_default(),
            status_label: invocation.status_label.clone().unwrap_or_default(),
            succeeded: invocation.succeeded.unwrap_or(0),
            failed: invocation.failed.unwrap_or(0),
            total: invocation.total,
            start_at: invocation.start_at.clone(),
            started_at_utc,
        }
    }

    /// `succeeded/failed/total`, with `N/A` for a total not yet known
    pub fn success_fail_total(&self) -> String {
        let total = self
            .total
            .map(|t| t.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        format!("{}/{}/{}", self.succeeded, self.failed, total)
    }
}
