//! Satellite API client

pub mod api;
pub mod client;
pub mod job_invocations;
pub mod job_templates;
pub mod tasks;
pub mod tls;
