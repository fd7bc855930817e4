//! Epoch-millisecond time helpers.
//!
//! Persisted timestamps are plain `i64` milliseconds so the on-disk document
//! stays readable by other tooling.

use chrono::{Local, TimeZone, Utc};

/// Milliseconds in one day.
pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Current time as epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Inclusive `[start, end]` millisecond bounds of the local calendar day
/// containing `at_ms`.
pub fn local_day_bounds(at_ms: i64) -> (i64, i64) {
    let Some(at) = Local.timestamp_millis_opt(at_ms).single() else {
        return (at_ms, at_ms);
    };
    let start = at
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|dt| dt.timestamp_millis())
        .unwrap_or(at_ms);
    let end = at
        .date_naive()
        .and_hms_milli_opt(23, 59, 59, 999)
        .and_then(|naive| Local.from_local_datetime(&naive).latest())
        .map(|dt| dt.timestamp_millis())
        .unwrap_or(at_ms);
    (start, end)
}
