//! Core types for EmberKV

use serde::{Deserialize, Serialize};

/// Timestamp in milliseconds since the Unix epoch. A zero value means
/// "no expiry" wherever an expiry is expected.
pub type Timestamp = i64;

/// Current wall-clock time in epoch milliseconds
pub fn now_millis() -> Timestamp {
    chrono::Utc::now().timestamp_millis()
}

fn expired(expires_at: Timestamp, now: Timestamp) -> bool {
    expires_at != 0 && expires_at < now
}

/// A stored value together with its absolute expiry time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub value: String,
    /// Epoch milliseconds; zero means the entry never expires
    pub expires_at: Timestamp,
}

impl Entry {
    pub fn new(value: impl Into<String>, expires_at: Timestamp) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }

    /// An entry whose expiry is set and in the past is semantically absent,
    /// even while it still occupies the index.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        expired(self.expires_at, now)
    }
}

/// Mutation kind recorded in the append-only log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOp {
    Set,
    Delete,
}

/// One record in the append-only log, stored as one JSON object per line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(rename = "Op")]
    pub op: LogOp,
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Value")]
    pub value: String,
    #[serde(rename = "ExpiresAt")]
    pub expires_at: Timestamp,
}

impl LogRecord {
    /// Record for an insert or overwrite
    pub fn set(key: impl Into<String>, value: impl Into<String>, expires_at: Timestamp) -> Self {
        Self {
            op: LogOp::Set,
            key: key.into(),
            value: value.into(),
            expires_at,
        }
    }

    /// Record for a removal. Only the key is meaningful.
    pub fn delete(key: impl Into<String>) -> Self {
        Self {
            op: LogOp::Delete,
            key: key.into(),
            value: String::new(),
            expires_at: 0,
        }
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        expired(self.expires_at, now)
    }
}

/// One entry in a point-in-time snapshot of the full store contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub key: String,
    pub value: String,
    pub expires_at: Timestamp,
}

impl SnapshotEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>, expires_at: Timestamp) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            expires_at,
        }
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        expired(self.expires_at, now)
    }
}
