//! Timestamp parsing and formatting
//!
//! Bookmarks and `start_date` are ISO-8601 strings. Offsets are honoured
//! when present; naive values are taken as UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO-8601 timestamp, with or without timezone
pub fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    // "2020-01-01 00:00:00+00:00" and "...+0000" variants
    for format in ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%.f%z"] {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Format a watermark for the state object, e.g. `2020-03-01T00:00:00+00:00`
///
/// Sub-second values always carry six digits (`.123000`).
pub fn format_bookmark(dt: &DateTime<Utc>) -> String {
    let precision = if dt.timestamp_subsec_nanos() == 0 {
        SecondsFormat::Secs
    } else {
        SecondsFormat::Micros
    };
    dt.to_rfc3339_opts(precision, false)
}

/// Format a coerced `date-time` value, e.g. `2020-03-01T00:00:00.000000Z`
pub fn format_record_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Replication sequence for a file: its modification time in whole epoch seconds
pub fn sequence_of(last_modified: &DateTime<Utc>) -> i64 {
    last_modified.timestamp()
}
