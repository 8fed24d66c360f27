//! Shared utility functions

use chrono::{DateTime, Utc};

/// Parse an RFC3339 timestamp, falling back to the current time.
///
/// Timestamps are stored as text; a corrupt value degrades to "now"
/// instead of poisoning the whole row read.
pub fn parse_datetime_or_now(s: &str) -> DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
