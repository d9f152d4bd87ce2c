//! Host output and patch record models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw output of one host, consumed once by the parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostOutput {
    pub hostname: String,
    pub raw_lines: Vec<String>,
}

impl HostOutput {
    /// Split a host's stdout into lines
    pub fn from_stdout(hostname: impl Into<String>, stdout: &str) -> Self {
        Self {
            hostname: hostname.into(),
            raw_lines: stdout.lines().map(str::to_string).collect(),
        }
    }
}

/// When a package was last installed or updated on a host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchRecord {
    pub hostname: String,
    pub package_name: String,
    pub installed_at_utc: DateTime<Utc>,
}
