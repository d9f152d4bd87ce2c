//! Settings file management

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::LastPatchError;
use crate::filesys::file::File;
use crate::logs::LogLevel;

/// Tuning knobs read from an optional JSON file. Explicit CLI flags win.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Seconds between job status polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Seconds to wait for a job before giving up
    #[serde(default = "default_max_wait")]
    pub max_wait_secs: u64,

    /// Max concurrent host output fetches
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,

    /// Extra attempts for a transient read failure
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Log level when no `-v` is given
    #[serde(default)]
    pub log_level: Option<LogLevel>,

    /// Emit JSON logs
    #[serde(default)]
    pub json_logs: bool,

    /// Page size for index requests
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_poll_interval() -> u64 {
    5
}

fn default_max_wait() -> u64 {
    900
}

fn default_max_concurrent_fetches() -> usize {
    4
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_per_page() -> u32 {
    100
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            max_wait_secs: default_max_wait(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
            retry_attempts: default_retry_attempts(),
            log_level: None,
            json_logs: false,
            per_page: default_per_page(),
        }
    }
}

impl Settings {
    /// Load settings from a JSON file
    pub async fn load(path: &Path) -> Result<Self, LastPatchError> {
        let file = File::new(path);
        if !file.exists().await {
            return Err(LastPatchError::ConfigError(format!(
                "Settings file not found: {}",
                path.display()
            )));
        }
        let settings: Settings = file.read_json().await.map_err(|e| {
            LastPatchError::ConfigError(format!("Invalid settings file {}: {e}", path.display()))
        })?;
        debug!("Loaded settings from {}", path.display());
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values no run could succeed with
    pub fn validate(&self) -> Result<(), LastPatchError> {
        if self.poll_interval_secs == 0 {
            return Err(LastPatchError::ConfigError(
                "poll_interval_secs must be positive".to_string(),
            ));
        }
        if self.max_concurrent_fetches == 0 {
            return Err(LastPatchError::ConfigError(
                "max_concurrent_fetches must be positive".to_string(),
            ));
        }
        if self.per_page == 0 {
            return Err(LastPatchError::ConfigError("per_page must be positive".to_string()));
        }
        Ok(())
    }
}
