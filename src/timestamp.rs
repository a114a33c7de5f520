//! ISO-8601 timestamp generation and ordering.
//!
//! Every timestamp this crate produces has the same shape: RFC 3339, UTC,
//! microsecond precision, `Z` suffix. Timestamps read back from a log may
//! come from other writers with different precision, so comparisons parse
//! both sides and only fall back to string order when parsing fails.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use std::cmp::Ordering;

/// Current time in the canonical timestamp format.
pub fn now() -> String {
    format(Utc::now())
}

/// Format an instant in the canonical timestamp format.
pub fn format(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse an ISO-8601 timestamp.
///
/// Accepts RFC 3339 with any offset, and naive date-times (with or without
/// fractional seconds) which are taken to be UTC.
pub fn parse(ts: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Order two stored timestamps.
///
/// Chronological when both parse, lexicographic otherwise.
pub fn compare(a: &str, b: &str) -> Ordering {
    match (parse(a), parse(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        _ => a.cmp(b),
    }
}

/// Whether a stored timestamp is at or after `instant`.
pub fn is_at_or_after(ts: &str, instant: DateTime<Utc>) -> bool {
    match parse(ts) {
        Some(parsed) => parsed >= instant,
        None => ts >= format(instant).as_str(),
    }
}
