//! Error types for lastpatch

use thiserror::Error;

/// Main error type for lastpatch
#[derive(Error, Debug)]
pub enum LastPatchError {
    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Transient error: {0}")]
    TransientError(String),

    #[error("Protocol error: {0}")]
    ProtocolError(String),

    #[error("Template resolution error: {0}")]
    TemplateResolution(String),

    #[error("Timed out after {waited_secs}s waiting for job {job_id} (last status: {last_status})")]
    JobTimeout {
        job_id: String,
        waited_secs: u64,
        last_status: String,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Interrupted: {0}")]
    Interrupted(String),
}

impl LastPatchError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, LastPatchError::TransientError(_))
    }
}

impl From<reqwest::Error> for LastPatchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return LastPatchError::ProtocolError(err.to_string());
        }
        if err.is_builder() {
            return LastPatchError::ConfigError(err.to_string());
        }
        if let Some(status) = err.status() {
            return crate::http::client::classify_status(status, &err.to_string());
        }
        // connect, timeout, request and body failures
        LastPatchError::TransientError(err.to_string())
    }
}

/// A line of host output that could not be turned into a record.
///
/// Recovered locally: the line is skipped and a warning is logged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{hostname}: skipped line {line:?}: {reason}")]
pub struct ParseError {
    pub hostname: String,
    pub line: String,
    pub reason: String,
}

/// A host whose output could not be retrieved.
///
/// Recovered locally: the remaining hosts are still reported.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{hostname} (host {host_id}): {message}")]
pub struct HostFailure {
    pub host_id: String,
    pub hostname: String,
    pub message: String,
}
