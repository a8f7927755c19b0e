// SPDX-FileCopyrightText: 2026 Raidledger Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Timestamp encoding shared by every table.
//!
//! All timestamps are stored as UTC text in `%Y-%m-%dT%H:%M:%S%.3fZ`, the
//! same shape SQLite's `strftime('%Y-%m-%dT%H:%M:%fZ', 'now')` emits, so
//! string comparison in SQL orders chronologically.

use chrono::{DateTime, Duration, SecondsFormat, Utc};

use crate::error::RaidledgerError;

/// Render a timestamp in the canonical storage format.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Render a window bound, rounding sub-millisecond instants up.
///
/// Stored rows carry whole milliseconds, so `created_at >= bound` and
/// `created_at < bound` on the rounded text match the exact comparisons.
pub fn format_window_bound(ts: &DateTime<Utc>) -> String {
    let sub_ms = ts.timestamp_subsec_nanos() % 1_000_000;
    if sub_ms == 0 {
        return format_timestamp(ts);
    }
    let floor = *ts - Duration::nanoseconds(i64::from(sub_ms));
    format_timestamp(&(floor + Duration::milliseconds(1)))
}

/// Parse an ISO-8601 / RFC 3339 timestamp with any offset into UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, RaidledgerError> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| RaidledgerError::InvalidInput(format!("invalid timestamp `{value}`: {e}")))
}
