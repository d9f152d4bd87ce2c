//! Utility functions

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::LastPatchError;

/// Version information for the binary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Get version information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown").to_string(),
        build_time: option_env!("BUILD_TIME").unwrap_or("unknown").to_string(),
    }
}

/// Cooldown options for exponential backoff
#[derive(Debug, Clone)]
pub struct CooldownOptions {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for CooldownOptions {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

/// Calculate exponential backoff delay
pub fn calc_exp_backoff(options: &CooldownOptions, attempt: u32) -> Duration {
    let delay_secs = options.base_delay.as_secs_f64() * options.multiplier.powi(attempt as i32);
    let capped_delay = delay_secs.min(options.max_delay.as_secs_f64());
    Duration::from_secs_f64(capped_delay)
}

/// Retry policy for idempotent reads
#[derive(Debug, Clone)]
pub struct RetryOptions {
    /// Extra attempts after the first failure
    pub max_retries: u32,

    /// Delay between attempts
    pub cooldown: CooldownOptions,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_retries: 3,
            cooldown: CooldownOptions::default(),
        }
    }
}

/// Run `op`, retrying transient failures with exponential backoff.
///
/// Non-transient errors are returned immediately. Never use for requests
/// that mutate remote state.
pub async fn retry_transient<T, F, Fut>(
    options: &RetryOptions,
    what: &str,
    mut op: F,
) -> Result<T, LastPatchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LastPatchError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Err(e) if e.is_transient() && attempt < options.max_retries => {
                let delay = calc_exp_backoff(&options.cooldown, attempt);
                attempt += 1;
                warn!(
                    "{} failed (attempt {}/{}), retrying in {:?}: {}",
                    what,
                    attempt,
                    options.max_retries + 1,
                    delay,
                    e
                );
                tokio::time::sleep(delay).await;
            }
            result => return result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_exp_backoff() {
        let options = CooldownOptions::default();

        assert_eq!(calc_exp_backoff(&options, 0), Duration::from_secs(1));
        assert_eq!(calc_exp_backoff(&options, 1), Duration::from_secs(2));
        assert_eq!(calc_exp_backoff(&options, 2), Duration::from_secs(4));
        assert_eq!(calc_exp_backoff(&options, 10), Duration::from_secs(30)); // Capped at max
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_recovers_from_transient() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = retry_transient(&RetryOptions::default(), "fetch", move || async move {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(LastPatchError::TransientError("503".into()))
            } else {
                Ok(7)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_gives_up_after_budget() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), _> = retry_transient(&RetryOptions::default(), "fetch", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(LastPatchError::TransientError("connection reset".into()))
        })
        .await;

        assert!(matches!(result, Err(LastPatchError::TransientError(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_retry_skips_permanent_errors() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), _> = retry_transient(&RetryOptions::default(), "fetch", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(LastPatchError::AuthError("401".into()))
        })
        .await;

        assert!(matches!(result, Err(LastPatchError::AuthError(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
