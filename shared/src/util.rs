//! Small time helpers shared across crates.

use chrono::{NaiveDate, Utc};

/// Current Unix time in milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Today's date (UTC).
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Today's date as an ISO-8601 string, the storage format for date columns.
pub fn today_iso() -> String {
    today().format("%Y-%m-%d").to_string()
}
