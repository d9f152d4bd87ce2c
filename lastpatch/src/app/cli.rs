//! command line interface

use std::path::PathBuf;

use clap::{ArgAction::Count, ArgGroup, Parser};

use crate::http::client::DEFAULT_PORT;

/// Default report location
pub const DEFAULT_OUTPUT: &str = "/tmp/last_patch.csv";

#[derive(Parser, Debug, Clone)]
#[command(
    name = "lastpatch",
    author,
    version,
    about = "Report when packages were last updated on Satellite managed hosts",
    long_about = None
)]
#[command(group(
    ArgGroup::new("action")
        .required(true)
        .args(["list", "create", "job"])
))]
pub struct Cli {
    #[arg(short, long, help = "List recent inventory jobs and print LAST_JOB_ID")]
    pub list: bool,

    #[arg(
        short,
        long,
        value_name = "QUERY",
        num_args = 0..=1,
        default_missing_value = "*",
        help = "Launch an inventory job on the hosts matching QUERY (default: all hosts)"
    )]
    pub create: Option<String>,

    #[arg(short, long, value_name = "JOBID", help = "Harvest the output of an existing job")]
    pub job: Option<String>,

    #[arg(short, long, help = "Satellite server host name")]
    pub server: String,

    #[arg(short, long, default_value_t = DEFAULT_PORT, help = "Satellite server port")]
    pub port: u16,

    #[arg(short, long, value_name = "USER:PASS", help = "API credentials")]
    pub user: String,

    #[arg(
        short = 'k',
        long,
        conflicts_with_all = ["capath", "cafile"],
        help = "Skip TLS certificate verification"
    )]
    pub insecure: bool,

    #[arg(long, value_name = "DIR", help = "Directory of trusted CA certificates")]
    pub capath: Option<PathBuf>,

    #[arg(long, value_name = "FILE", help = "Trusted CA certificate bundle")]
    pub cafile: Option<PathBuf>,

    #[arg(long, default_value_t = 1, help = "Organization the job runs in")]
    pub organization_id: i64,

    #[arg(long, help = "Location the job runs in")]
    pub location_id: Option<i64>,

    #[arg(short, long, default_value = DEFAULT_OUTPUT, help = "Report file")]
    pub output: PathBuf,

    #[arg(
        short,
        long,
        action = Count,
        help = "Turn up logging verbosity (multiple will turn it up more)"
    )]
    pub verbose: u8,

    #[arg(long, value_name = "FILE", help = "JSON file with tuning settings")]
    pub settings: Option<PathBuf>,

    #[arg(long, value_name = "SECS", help = "Seconds between job status polls")]
    pub poll_interval: Option<u64>,

    #[arg(long, value_name = "SECS", help = "Seconds to wait for the job to finish")]
    pub max_wait: Option<u64>,

    #[arg(long, value_name = "N", help = "Max concurrent host output fetches")]
    pub concurrency: Option<usize>,

    #[arg(long, help = "Follow pagination when listing jobs")]
    pub all_pages: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

/// The one top-level action of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    List,
    Create(String),
    Resume(String),
}

impl Cli {
    /// Selected action. Clap guarantees exactly one is present.
    pub fn action(&self) -> Action {
        if let Some(query) = &self.create {
            Action::Create(query.clone())
        } else if let Some(job_id) = &self.job {
            Action::Resume(job_id.clone())
        } else {
            Action::List
        }
    }
}
