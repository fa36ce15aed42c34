mod schema;

pub use schema::Database;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Book registered by the import command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookRecord {
    /// Row ID (0 before insertion).
    pub id: i64,
    /// Title derived from the file name.
    pub title: String,
    /// Original file name.
    pub filename: String,
    /// Storage-relative path, or the original absolute path when not copied.
    pub path: String,
    /// Public URL, when the storage can build one.
    pub url: Option<String>,
    /// MIME type.
    pub mime_type: Option<String>,
    /// File size in bytes.
    pub size: Option<i64>,
    /// Page count (PDF only).
    pub pages: Option<i64>,
    /// Author.
    pub author: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Creation timestamp.
    pub created_at: i64,
    /// Last update timestamp.
    pub updated_at: i64,
}

/// Get current Unix timestamp.
pub fn now_timestamp() -> i64 {
    Utc::now().timestamp()
}

/// Convert timestamp to DateTime.
pub fn timestamp_to_datetime(ts: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(ts, 0).unwrap_or_else(Utc::now)
}
