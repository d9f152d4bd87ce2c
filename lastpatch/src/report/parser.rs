//! Parser for `rpm -qa --last` host output

use tracing::{debug, warn};

use crate::errors::ParseError;
use crate::models::record::{HostOutput, PatchRecord};
use crate::report::timestamp::{parse_timestamp, TimestampError};

/// Marker the remote execution plugin appends after the command output
const EXIT_STATUS_MARKER: &str = "exit status";

/// Why a line produced no record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Empty or whitespace-only line
    Blank,

    /// `Exit status: N` trailer
    ExitStatus,

    /// A package name with nothing after it
    MissingTimestamp,

    /// A timestamp none of the known layouts matched
    BadTimestamp(TimestampError),
}

impl SkipReason {
    /// Whether skipping this line deserves a warning
    pub fn is_noise(&self) -> bool {
        matches!(self, SkipReason::Blank | SkipReason::ExitStatus)
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Blank => f.write_str("blank line"),
            SkipReason::ExitStatus => f.write_str("exit status marker"),
            SkipReason::MissingTimestamp => f.write_str("no install time"),
            SkipReason::BadTimestamp(e) => write!(f, "{e}"),
        }
    }
}

/// Result of parsing a single output line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    Record(PatchRecord),
    Skip(SkipReason),
}

/// Records parsed from one host, plus the lines that were dropped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedOutput {
    pub records: Vec<PatchRecord>,
    pub skipped: Vec<ParseError>,
}

/// Parse one `<package> <date-time>` line
pub fn parse_line(hostname: &str, line: &str) -> LineOutcome {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineOutcome::Skip(SkipReason::Blank);
    }
    if trimmed.to_ascii_lowercase().starts_with(EXIT_STATUS_MARKER) {
        return LineOutcome::Skip(SkipReason::ExitStatus);
    }

    let (package, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((package, rest)) if !rest.trim().is_empty() => (package, rest),
        _ => return LineOutcome::Skip(SkipReason::MissingTimestamp),
    };

    match parse_timestamp(rest) {
        Ok(installed_at_utc) => LineOutcome::Record(PatchRecord {
            hostname: hostname.to_string(),
            package_name: package.to_string(),
            installed_at_utc,
        }),
        Err(TimestampError::Missing) => LineOutcome::Skip(SkipReason::MissingTimestamp),
        Err(e) => LineOutcome::Skip(SkipReason::BadTimestamp(e)),
    }
}

/// Parse every line of a host's output. A bad line is skipped with a
/// warning and never affects the other lines.
pub fn parse_output(output: &HostOutput) -> ParsedOutput {
    let mut parsed = ParsedOutput::default();

    for line in &output.raw_lines {
        match parse_line(&output.hostname, line) {
            LineOutcome::Record(record) => parsed.records.push(record),
            LineOutcome::Skip(reason) if reason.is_noise() => {}
            LineOutcome::Skip(reason) => {
                let error = ParseError {
                    hostname: output.hostname.clone(),
                    line: line.clone(),
                    reason: reason.to_string(),
                };
                warn!("{}", error);
                parsed.skipped.push(error);
            }
        }
    }

    debug!(
        "{}: {} lines, {} records, {} skipped",
        output.hostname,
        output.raw_lines.len(),
        parsed.records.len(),
        parsed.skipped.len()
    );

    parsed
}
