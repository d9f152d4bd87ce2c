//! CSV report rendering.
//!
//! Every field is double-quoted, embedded quotes are doubled, rows end in
//! `\n`.

use std::io::Write;

use crate::errors::LastPatchError;
use crate::models::job::JobSummary;
use crate::models::record::PatchRecord;
use crate::report::timestamp::{format_report, parse_report};

/// Header of the per-host patch report
pub const PATCH_REPORT_HEADER: [&str; 3] = ["hostname", "package name", "last updated"];

/// Header of the job list report
pub const JOB_LIST_HEADER: [&str; 5] = ["id", "description", "status", "success_fail_total", "date_time"];

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn row<S: AsRef<str>>(fields: &[S]) -> String {
    let mut line = fields
        .iter()
        .map(|f| quote(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

/// Render the patch report
pub fn render_patch_report(records: &[PatchRecord]) -> String {
    let mut out = row(&PATCH_REPORT_HEADER);
    for record in records {
        let last_updated = format_report(&record.installed_at_utc);
        out.push_str(&row(&[
            record.hostname.as_str(),
            record.package_name.as_str(),
            last_updated.as_str(),
        ]));
    }
    out
}

/// Render the job list report, in the order given
pub fn render_job_list(jobs: &[JobSummary]) -> String {
    let mut out = row(&JOB_LIST_HEADER);
    for job in jobs {
        let date_time = job
            .started_at_utc
            .as_ref()
            .map(format_report)
            .or_else(|| job.start_at.clone())
            .unwrap_or_default();
        let totals = job.success_fail_total();
        out.push_str(&row(&[
            job.id.as_str(),
            job.description.as_str(),
            job.status_label.as_str(),
            totals.as_str(),
            date_time.as_str(),
        ]));
    }
    out
}

/// Write the job list report to a stream
pub fn write_job_list<W: Write>(jobs: &[JobSummary], mut sink: W) -> Result<(), LastPatchError> {
    sink.write_all(render_job_list(jobs).as_bytes())?;
    sink.flush()?;
    Ok(())
}

/// Split one CSV row into fields
fn parse_row(line: &str) -> Result<Vec<String>, LastPatchError> {
    let mut fields = Vec::new();
    let mut chars = line.chars().peekable();

    loop {
        let mut field = String::new();
        if chars.peek() == Some(&'"') {
            chars.next();
            loop {
                match chars.next() {
                    Some('"') if chars.peek() == Some(&'"') => {
                        chars.next();
                        field.push('"');
                    }
                    Some('"') => break,
                    Some(c) => field.push(c),
                    None => {
                        return Err(LastPatchError::ProtocolError(format!(
                            "unterminated quote in CSV row {line:?}"
                        )))
                    }
                }
            }
        } else {
            while let Some(c) = chars.peek().copied() {
                if c == ',' {
                    break;
                }
                field.push(c);
                chars.next();
            }
        }
        fields.push(field);

        match chars.next() {
            Some(',') => continue,
            None => return Ok(fields),
            Some(c) => {
                return Err(LastPatchError::ProtocolError(format!(
                    "unexpected {c:?} after field in CSV row {line:?}"
                )))
            }
        }
    }
}

/// Read a patch report back into records, in file order
pub fn read_patch_report(contents: &str) -> Result<Vec<PatchRecord>, LastPatchError> {
    let mut lines = contents.lines();

    let header = lines
        .next()
        .ok_or_else(|| LastPatchError::ProtocolError("empty report".to_string()))?;
    if parse_row(header)? != PATCH_REPORT_HEADER {
        return Err(LastPatchError::ProtocolError(format!(
            "unexpected report header {header:?}"
        )));
    }

    lines
        .filter(|line| !line.is_empty())
        .map(|line| {
            let fields = parse_row(line)?;
            let [hostname, package_name, last_updated] = <[String; 3]>::try_from(fields)
                .map_err(|f| {
                    LastPatchError::ProtocolError(format!("expected 3 fields, got {}", f.len()))
                })?;
            let installed_at_utc = parse_report(&last_updated)
                .map_err(|e| LastPatchError::ProtocolError(e.to_string()))?;
            Ok(PatchRecord {
                hostname,
                package_name,
                installed_at_utc,
            })
        })
        .collect()
}
