//! Shared utilities.

pub mod fs;

use chrono::Utc;

/// Current UTC time as the RFC 3339 string stored in the database.
#[must_use]
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

/// Timestamp label for backup directory names, e.g. `20260807_142501`.
#[must_use]
pub fn timestamp_label() -> String {
    Utc::now().format("%Y%m%d_%H%M%S").to_string()
}
