//! In-memory Satellite API for integration tests

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use lastpatch::errors::LastPatchError;
use lastpatch::http::api::SatelliteApi;
use satellite_api::models::{
    CreateJobInvocationRequest, ForemanTask, HostOutputResponse, HostRef, JobInvocation,
    JobTemplate, OutputChunk, Targeting, TaskRef,
};

pub const JOB_ID: &str = "42";
pub const TASK_ID: &str = "5bd1a5e4-6c1f-4a9e-8f4f-2f6c1f0f4b11";

/// Scripted behavior of one host's output endpoint
#[derive(Debug, Clone)]
pub enum HostScript {
    /// Return this stdout
    Output(String),

    /// Fail transiently `n` times, then return the stdout
    FlakyThen(usize, String),

    /// Always fail transiently
    Down,

    /// Return a payload with no output chunks
    Empty,
}

#[derive(Default)]
pub struct FakeSatellite {
    pub templates: Vec<JobTemplate>,
    pub hosts: Vec<HostRef>,
    pub with_task: bool,
    pub task_states: Mutex<VecDeque<(String, Option<String>)>>,
    pub host_scripts: HashMap<String, HostScript>,
    pub listing: Vec<JobInvocation>,
    pub list_failures: AtomicUsize,

    pub created: Mutex<Vec<CreateJobInvocationRequest>>,
    pub status_calls: AtomicUsize,
    pub output_calls: Mutex<HashMap<String, usize>>,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

pub fn template(id: &str, name: &str) -> JobTemplate {
    JobTemplate {
        id: id.to_string(),
        name: name.to_string(),
        job_category: Some("Commands".to_string()),
        provider_type: Some("script".to_string()),
    }
}

pub fn host(id: &str, name: &str) -> HostRef {
    HostRef {
        id: id.to_string(),
        name: name.to_string(),
    }
}

pub fn summary(id: &str, start_at: Option<&str>) -> JobInvocation {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "description": "Run rpm -qa --last",
        "status_label": "succeeded",
        "succeeded": 1,
        "failed": 0,
        "total": 1,
        "start_at": start_at,
    }))
    .expect("valid invocation")
}

pub fn rpm_line(package: &str, when: &str) -> String {
    format!("{package:<40} {when}\n")
}

impl FakeSatellite {
    /// A server with the stock script template and the given hosts
    pub fn with_hosts(hosts: &[(&str, &str)]) -> Self {
        Self {
            templates: vec![template("118", "Run Command - Script Default")],
            hosts: hosts.iter().map(|(id, name)| host(id, name)).collect(),
            with_task: true,
            ..Default::default()
        }
    }

    /// Task states returned by successive polls; the last one repeats
    pub fn task_sequence(self, states: &[(&str, Option<&str>)]) -> Self {
        *self.task_states.lock().unwrap() = states
            .iter()
            .map(|(s, r)| (s.to_string(), r.map(str::to_string)))
            .collect();
        self
    }

    pub fn script(mut self, host_id: &str, script: HostScript) -> Self {
        self.host_scripts.insert(host_id.to_string(), script);
        self
    }

    pub fn output_calls(&self, host_id: &str) -> usize {
        self.output_calls
            .lock()
            .unwrap()
            .get(host_id)
            .copied()
            .unwrap_or(0)
    }

    fn invocation(&self) -> JobInvocation {
        JobInvocation {
            id: JOB_ID.to_string(),
            description: Some("Run rpm -qa --last".to_string()),
            job_category: Some("Commands".to_string()),
            status_label: None,
            succeeded: None,
            failed: None,
            pending: None,
            total: None,
            start_at: None,
            task: self.with_task.then(|| TaskRef {
                id: TASK_ID.to_string(),
                state: None,
            }),
            targeting: Some(Targeting {
                search_query: Some("*".to_string()),
                targeting_type: Some("static_query".to_string()),
                hosts: self.hosts.clone(),
            }),
            template_invocations: vec![],
        }
    }
}

fn transient(what: &str) -> LastPatchError {
    LastPatchError::TransientError(format!("{what}: 503 Service Unavailable"))
}

#[async_trait]
impl SatelliteApi for FakeSatellite {
    async fn search_job_templates(&self, _search: &str) -> Result<Vec<JobTemplate>, LastPatchError> {
        Ok(self.templates.clone())
    }

    async fn create_job_invocation(
        &self,
        request: &CreateJobInvocationRequest,
    ) -> Result<JobInvocation, LastPatchError> {
        self.created.lock().unwrap().push(request.clone());
        Ok(self.invocation())
    }

    async fn get_job_invocation(&self, job_id: &str) -> Result<JobInvocation, LastPatchError> {
        if job_id != JOB_ID {
            return Err(LastPatchError::NotFound(format!("job {job_id}")));
        }
        Ok(self.invocation())
    }

    async fn list_job_invocations(
        &self,
        _search: &str,
        _all_pages: bool,
    ) -> Result<Vec<JobInvocation>, LastPatchError> {
        let remaining = self.list_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.list_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(transient("job list"));
        }
        Ok(self.listing.clone())
    }

    async fn get_task(&self, task_id: &str) -> Result<ForemanTask, LastPatchError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let mut states = self.task_states.lock().unwrap();
        let (state, result) = if states.len() > 1 {
            states.pop_front().unwrap_or_default()
        } else {
            states
                .front()
                .cloned()
                .unwrap_or_else(|| ("stopped".to_string(), Some("success".to_string())))
        };
        Ok(ForemanTask {
            id: task_id.to_string(),
            state,
            result,
            progress: None,
        })
    }

    async fn get_host_output(
        &self,
        _job_id: &str,
        host_id: &str,
    ) -> Result<HostOutputResponse, LastPatchError> {
        let attempt = {
            let mut calls = self.output_calls.lock().unwrap();
            let count = calls.entry(host_id.to_string()).or_insert(0);
            *count += 1;
            *count
        };

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let stdout = match self.host_scripts.get(host_id) {
            Some(HostScript::Output(stdout)) => stdout.clone(),
            Some(HostScript::FlakyThen(n, stdout)) if attempt > *n => stdout.clone(),
            Some(HostScript::FlakyThen(..)) | Some(HostScript::Down) => {
                return Err(transient(host_id));
            }
            Some(HostScript::Empty) => return Ok(HostOutputResponse::default()),
            None => return Err(LastPatchError::NotFound(format!("host {host_id}"))),
        };

        Ok(HostOutputResponse {
            complete: Some(true),
            output: vec![
                OutputChunk {
                    output: stdout,
                    output_type: "stdout".to_string(),
                    timestamp: None,
                },
                OutputChunk {
                    output: "Exit status: 0".to_string(),
                    output_type: "debug".to_string(),
                    timestamp: None,
                },
            ],
        })
    }
}
