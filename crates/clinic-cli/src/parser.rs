use anyhow::Result;
use chrono::{Local, NaiveDate, NaiveDateTime};
use chrono_english::{parse_date_string, Dialect};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Parses a clinic-local instant.
///
/// A bare date means midnight. Anything not in an ISO shape is handed to
/// chrono-english relative to `now`.
pub fn parse_when(input: &str, now: NaiveDateTime) -> Result<NaiveDateTime> {
    let input = input.trim();

    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(parsed);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight);
        }
    }

    let base = now
        .and_local_timezone(Local)
        .earliest()
        .ok_or_else(|| anyhow::anyhow!("'{}' does not exist in the local timezone", now))?;
    parse_date_string(input, base, Dialect::Us)
        .map(|parsed| parsed.naive_local())
        .map_err(|e| anyhow::anyhow!("Failed to parse date '{}': {}", input, e))
}
