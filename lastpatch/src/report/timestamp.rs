//! Timestamp parsing and UTC normalization.
//!
//! `rpm -qa --last` prints install times with `strftime("%c")` in the host's
//! locale and timezone, so the same instant can arrive in several shapes:
//!
//! ```text
//! Fri 14 Apr 2023 01:06:04 PM UTC     en_US
//! Fri 14 Apr 2023 13:06:04 CEST       24 hour locales
//! Fri Apr 14 13:06:04 2023            C locale, no zone
//! ```
//!
//! A trailing zone token is split off first (numeric offset or a known
//! abbreviation, UTC when absent), the remainder is matched against the
//! known layouts, and the result is converted to UTC. A leading weekday in
//! another language is skipped; month names must be English.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};
use thiserror::Error;

/// Layout used for every timestamp written to a report
pub const REPORT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Date-time layouts tried in order, after the zone token is removed
const LAYOUTS: &[&str] = &[
    "%a %d %b %Y %I:%M:%S %p",
    "%a %d %b %Y %H:%M:%S",
    "%a %b %d %H:%M:%S %Y",
    "%a %b %d %Y %I:%M:%S %p",
    "%a %b %d %Y %H:%M:%S",
    "%d %b %Y %I:%M:%S %p",
    "%d %b %Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
];

/// Zone abbreviations and their offset from UTC in minutes
const ZONES: &[(&str, i32)] = &[
    ("UTC", 0),
    ("UT", 0),
    ("GMT", 0),
    ("Z", 0),
    ("WET", 0),
    ("WEST", 60),
    ("BST", 60),
    ("CET", 60),
    ("CEST", 120),
    ("EET", 120),
    ("EEST", 180),
    ("MSK", 180),
    ("IST", 330),
    ("SGT", 480),
    ("HKT", 480),
    ("AWST", 480),
    ("JST", 540),
    ("KST", 540),
    ("ACST", 570),
    ("AEST", 600),
    ("AEDT", 660),
    ("NZST", 720),
    ("NZDT", 780),
    ("HST", -600),
    ("AKST", -540),
    ("AKDT", -480),
    ("PST", -480),
    ("PDT", -420),
    ("MST", -420),
    ("MDT", -360),
    ("CST", -360),
    ("CDT", -300),
    ("EST", -300),
    ("EDT", -240),
];

/// Alphabetic tokens that may end a date without being a zone
const NON_ZONE_WORDS: &[&str] = &[
    "AM", "PM", "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV",
    "DEC", "MON", "TUE", "WED", "THU", "FRI", "SAT", "SUN",
];

/// Why a timestamp could not be parsed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimestampError {
    #[error("no timestamp")]
    Missing,

    #[error("unknown timezone {0:?}")]
    UnknownZone(String),

    #[error("unrecognized date format {0:?}")]
    Unrecognized(String),
}

/// Parse a human-formatted date-time and normalize it to UTC
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>, TimestampError> {
    let mut tokens: Vec<&str> = input.split_whitespace().collect();
    if tokens.is_empty() {
        return Err(TimestampError::Missing);
    }

    let joined = tokens.join(" ");
    if let Ok(dt) = DateTime::parse_from_rfc3339(&joined) {
        return Ok(normalize_utc(dt));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(&joined) {
        return Ok(normalize_utc(dt));
    }

    let zone = tokens.last().copied().map(zone_offset);
    let offset = match zone {
        Some(Zone::Offset(offset)) => {
            tokens.pop();
            offset
        }
        Some(Zone::Unknown(token)) => return Err(TimestampError::UnknownZone(token)),
        _ => Utc.fix(),
    };

    if tokens.is_empty() {
        return Err(TimestampError::Missing);
    }

    // `Fri,` in RFC 2822 style and `Fr.` in some locales
    tokens[0] = tokens[0].trim_end_matches([',', '.']);

    let naive = match_layouts(&tokens)
        .or_else(|| {
            // weekday names outside English: the date itself still carries the day
            let weekday = tokens[0].chars().all(char::is_alphabetic);
            (weekday && tokens.len() > 1)
                .then(|| match_layouts(&tokens[1..]))
                .flatten()
        })
        .ok_or_else(|| TimestampError::Unrecognized(joined.clone()))?;

    offset
        .from_local_datetime(&naive)
        .single()
        .map(normalize_utc)
        .ok_or(TimestampError::Unrecognized(joined))
}

fn match_layouts(tokens: &[&str]) -> Option<NaiveDateTime> {
    let local = tokens.join(" ");
    LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(&local, layout).ok())
}

/// Convert any zoned timestamp to UTC
pub fn normalize_utc<Tz: TimeZone>(dt: DateTime<Tz>) -> DateTime<Utc> {
    dt.with_timezone(&Utc)
}

/// Render a timestamp the way reports carry it
pub fn format_report(dt: &DateTime<Utc>) -> String {
    dt.format(REPORT_FORMAT).to_string()
}

/// Parse a timestamp previously written by [`format_report`]
pub fn parse_report(input: &str) -> Result<DateTime<Utc>, TimestampError> {
    NaiveDateTime::parse_from_str(input.trim(), REPORT_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| TimestampError::Unrecognized(input.to_string()))
}

enum Zone {
    Offset(FixedOffset),
    Unknown(String),
    NotAZone,
}

fn zone_offset(token: &str) -> Zone {
    if let Some(offset) = numeric_offset(token) {
        return Zone::Offset(offset);
    }

    let upper = token.to_ascii_uppercase();
    if let Some((_, minutes)) = ZONES.iter().find(|(name, _)| *name == upper) {
        if let Some(offset) = FixedOffset::east_opt(minutes * 60) {
            return Zone::Offset(offset);
        }
    }

    let alphabetic = !token.is_empty() && token.chars().all(|c| c.is_ascii_alphabetic());
    let known_word = NON_ZONE_WORDS.iter().any(|w| upper.starts_with(w));
    if alphabetic && !known_word {
        Zone::Unknown(token.to_string())
    } else {
        Zone::NotAZone
    }
}

/// `+0200`, `-05:00`, `+02`
fn numeric_offset(token: &str) -> Option<FixedOffset> {
    let (sign, rest) = match token.as_bytes().first()? {
        b'+' => (1, &token[1..]),
        b'-' => (-1, &token[1..]),
        _ => return None,
    };

    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let (hours, minutes) = match digits.len() {
        2 => (digits.parse::<i32>().ok()?, 0),
        4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
        _ => return None,
    };
    if minutes >= 60 {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
