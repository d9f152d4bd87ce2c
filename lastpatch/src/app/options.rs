//! Application configuration options

use std::path::PathBuf;
use std::time::Duration;

use crate::app::cli::{Action, Cli};
use crate::errors::LastPatchError;
use crate::http::client::{Credentials, ServerAddress};
use crate::http::tls::TlsOptions;
use crate::jobs::{harvester, poller};
use crate::logs::{LogLevel, LogOptions};
use crate::models::job::JobQuery;
use crate::settings::Settings;
use crate::utils::RetryOptions;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// What this run does
    pub action: Action,

    /// Satellite server
    pub server: ServerAddress,

    /// API credentials
    pub credentials: Credentials,

    /// TLS trust configuration
    pub tls: TlsOptions,

    /// Organization and location scope for new jobs
    pub scope: JobQuery,

    /// Report file
    pub output: PathBuf,

    /// Retry policy for idempotent reads
    pub retry: RetryOptions,

    /// Poller options
    pub poller: poller::Options,

    /// Harvester options
    pub harvester: harvester::Options,

    /// Page size for index requests
    pub per_page: u32,

    /// Follow pagination when listing jobs
    pub all_pages: bool,

    /// Logging options
    pub logs: LogOptions,
}

impl AppOptions {
    /// Combine the command line with the settings file. Explicit flags win.
    pub fn from_cli(cli: &Cli, settings: &Settings) -> Result<Self, LastPatchError> {
        if cli.server.trim().is_empty() {
            return Err(LastPatchError::ConfigError("server must not be empty".to_string()));
        }

        let retry = RetryOptions {
            max_retries: settings.retry_attempts,
            ..Default::default()
        };

        let poll_interval = cli.poll_interval.unwrap_or(settings.poll_interval_secs);
        if poll_interval == 0 {
            return Err(LastPatchError::ConfigError(
                "poll interval must be positive".to_string(),
            ));
        }
        let concurrency = cli.concurrency.unwrap_or(settings.max_concurrent_fetches);
        if concurrency == 0 {
            return Err(LastPatchError::ConfigError(
                "concurrency must be positive".to_string(),
            ));
        }

        let log_level = if cli.verbose > 0 {
            LogLevel::from_verbosity(cli.verbose)
        } else {
            settings.log_level.unwrap_or_default()
        };

        Ok(Self {
            action: cli.action(),
            server: ServerAddress {
                host: cli.server.trim().to_string(),
                port: cli.port,
            },
            credentials: Credentials::parse(&cli.user)?,
            tls: TlsOptions {
                insecure: cli.insecure,
                ca_file: cli.cafile.clone(),
                ca_path: cli.capath.clone(),
            },
            scope: JobQuery {
                host_filter: match cli.action() {
                    Action::Create(query) => query,
                    _ => JobQuery::default().host_filter,
                },
                organization_id: cli.organization_id,
                location_id: cli.location_id,
            },
            output: cli.output.clone(),
            poller: poller::Options {
                interval: Duration::from_secs(poll_interval),
                max_wait: Duration::from_secs(cli.max_wait.unwrap_or(settings.max_wait_secs)),
                retry: retry.clone(),
            },
            harvester: harvester::Options {
                max_concurrent: concurrency,
                retry: retry.clone(),
            },
            retry,
            per_page: settings.per_page,
            all_pages: cli.all_pages,
            logs: LogOptions {
                log_level,
                json_format: cli.json_logs || settings.json_logs,
            },
        })
    }
}
