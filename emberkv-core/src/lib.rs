//! EmberKV Core - in-memory key-value storage engine
//!
//! Features:
//! - Concurrent in-memory index with per-key TTL expiry
//! - Append-only JSON log for durability, replayed on startup
//! - Periodic binary snapshots that bound log growth
//! - Background sweeper and snapshotter with clean shutdown

pub mod aof;
pub mod snapshot;
pub mod store;

mod error;
mod types;

pub use error::{EmberError, Result};
pub use types::{now_millis, Entry, LogOp, LogRecord, SnapshotEntry, Timestamp};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default settings shared by the engine and its front ends
pub mod defaults {
    /// Data directory when none is configured
    pub const DATA_DIR: &str = "./data";

    /// Append-only log file name inside the data directory
    pub const AOF_FILE: &str = "aof.log";

    /// Current snapshot file name inside the data directory
    pub const SNAPSHOT_FILE: &str = "current.snapshot";

    /// Seconds between periodic snapshot saves
    pub const SNAPSHOT_INTERVAL_SECS: u64 = 30;

    /// Seconds between expiry sweeps
    pub const SWEEP_INTERVAL_SECS: u64 = 1;

    /// Attempts made to append a record to the log before giving up on it
    pub const AOF_APPEND_RETRIES: usize = 5;
}
