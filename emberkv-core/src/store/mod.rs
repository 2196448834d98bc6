//! Storage engine - concurrent in-memory index with durable backing
//!
//! All reads take a shared lock on the index; every mutation takes the
//! exclusive lock and appends to the log before releasing it, so log
//! order matches the order in which mutations became visible.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tracing::{info, warn};

use crate::aof::{AofLog, FileAof};
use crate::defaults;
use crate::error::Result;
use crate::snapshot::{FileSnapshots, SnapshotStore};
use crate::types::{now_millis, Entry, LogOp, LogRecord, SnapshotEntry};

mod tasks;

pub use tasks::BackgroundTasks;

/// Configuration for a [`Store`]
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Append-only log location
    pub aof_path: PathBuf,
    /// Current snapshot location
    pub snapshot_path: PathBuf,
    /// How often the background snapshotter persists the full contents
    pub snapshot_interval: Duration,
    /// How often the background sweeper evicts expired entries
    pub sweep_interval: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(defaults::DATA_DIR)
    }
}

impl StoreConfig {
    /// Configuration with both files under `data_dir` and default intervals
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            aof_path: data_dir.join(defaults::AOF_FILE),
            snapshot_path: data_dir.join(defaults::SNAPSHOT_FILE),
            snapshot_interval: Duration::from_secs(defaults::SNAPSHOT_INTERVAL_SECS),
            sweep_interval: Duration::from_secs(defaults::SWEEP_INTERVAL_SECS),
        }
    }

    pub fn with_aof_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.aof_path = path.into();
        self
    }

    pub fn with_snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = path.into();
        self
    }

    pub fn with_snapshot_interval(mut self, interval: Duration) -> Self {
        self.snapshot_interval = interval;
        self
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }
}

/// Concurrent key-value store with TTL expiry, an append-only log, and
/// periodic snapshots
pub struct Store {
    config: StoreConfig,
    items: RwLock<HashMap<String, Entry>>,
    aof: Mutex<Box<dyn AofLog>>,
    snapshots: Box<dyn SnapshotStore>,
}

impl Store {
    /// Open the store with file-backed persistence, recovering any prior
    /// state before returning
    pub fn open(config: StoreConfig) -> Result<Self> {
        let aof = FileAof::open(&config.aof_path)?;
        let snapshots = FileSnapshots::open(&config.snapshot_path)?;
        Self::with_backends(config, Box::new(aof), Box::new(snapshots))
    }

    /// Open the store over explicit persistence backends.
    ///
    /// Recovery runs here, before the store serves any request: the
    /// snapshot is loaded first, then the log is replayed over it in
    /// append order. The log wins because it is only ever cleared after
    /// a successful snapshot save, so its records are never older than
    /// the snapshot. Any backend error aborts construction.
    pub fn with_backends(
        config: StoreConfig,
        mut aof: Box<dyn AofLog>,
        snapshots: Box<dyn SnapshotStore>,
    ) -> Result<Self> {
        let now = now_millis();
        let mut items = HashMap::new();

        let snapshot_entries = snapshots.load()?;
        let from_snapshot = snapshot_entries.len();
        for entry in snapshot_entries {
            if entry.is_expired(now) {
                continue;
            }
            items.insert(entry.key, Entry::new(entry.value, entry.expires_at));
        }

        let records = aof.load()?;
        let replayed = records.len();
        for record in records {
            match record.op {
                LogOp::Set => {
                    items.insert(record.key, Entry::new(record.value, record.expires_at));
                }
                LogOp::Delete => {
                    items.remove(&record.key);
                }
            }
        }

        info!(
            from_snapshot,
            replayed,
            entries = items.len(),
            "store recovered"
        );

        Ok(Self {
            config,
            items: RwLock::new(items),
            aof: Mutex::new(aof),
            snapshots,
        })
    }

    /// Insert or overwrite a key.
    ///
    /// A `ttl_seconds` of zero stores the value without an expiry. With
    /// `overwrite` false the call is a no-op when a live entry already
    /// exists; that liveness check goes through [`Store::get`] and so
    /// uses its own lock acquisition.
    pub fn set(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
        ttl_seconds: u64,
        overwrite: bool,
    ) {
        let key = key.into();
        let value = value.into();

        let expires_at = if ttl_seconds == 0 {
            0
        } else {
            let ttl_ms = i64::try_from(ttl_seconds)
                .unwrap_or(i64::MAX)
                .saturating_mul(1_000);
            now_millis().saturating_add(ttl_ms)
        };

        if !overwrite && self.get(&key).is_some() {
            return;
        }

        let record = LogRecord::set(key.clone(), value.clone(), expires_at);
        let mut items = self.items.write();
        items.insert(key, Entry::new(value, expires_at));
        self.append_with_retry(&record);
    }

    /// Fetch the live value for a key.
    ///
    /// An entry whose expiry has passed is removed here, on read, through
    /// the regular [`Store::delete`] path. The shared lock is released
    /// first; the delete then takes the exclusive lock on its own.
    pub fn get(&self, key: &str) -> Option<String> {
        {
            let items = self.items.read();
            match items.get(key) {
                None => return None,
                Some(entry) if entry.is_expired(now_millis()) => {}
                Some(entry) => return Some(entry.value.clone()),
            }
        }
        self.delete(key);
        None
    }

    /// Remove a key. The removal is logged whether or not the key was
    /// present.
    pub fn delete(&self, key: &str) {
        let record = LogRecord::delete(key);
        let mut items = self.items.write();
        items.remove(key);
        self.append_with_retry(&record);
    }

    /// Evict every expired entry, returning how many were removed.
    ///
    /// Evictions are not logged: a record that was swept here is dropped
    /// again by the expiry filter on the next replay, so recovery reaches
    /// the same state either way.
    pub fn sweep_expired(&self) -> usize {
        let now = now_millis();
        let mut items = self.items.write();
        let before = items.len();
        items.retain(|_, entry| !entry.is_expired(now));
        before - items.len()
    }

    /// Copy of the full contents, expired-but-unswept entries included
    pub fn snapshot_entries(&self) -> Vec<SnapshotEntry> {
        let items = self.items.read();
        items
            .iter()
            .map(|(key, entry)| SnapshotEntry::new(key.clone(), entry.value.clone(), entry.expires_at))
            .collect()
    }

    /// Persist the current contents and truncate the log, returning how
    /// many entries the snapshot holds.
    ///
    /// The log is only cleared after the save succeeded; a failed save
    /// leaves the previous snapshot and the full log in place. Records
    /// appended while the save is in flight are truncated with the rest
    /// of the log; those mutations stay in memory and reach the next
    /// snapshot.
    pub fn save_snapshot(&self) -> Result<usize> {
        let entries = self.snapshot_entries();
        self.snapshots.save(&entries)?;
        self.aof.lock().clear()?;
        Ok(entries.len())
    }

    /// Number of entries physically present, counting expired entries the
    /// sweeper has not reached yet
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Append to the log, retrying a bounded number of times.
    ///
    /// Called with the index write lock held. When every attempt fails
    /// the in-memory mutation still stands; the record is absent from the
    /// log until the next snapshot covers the mutation.
    fn append_with_retry(&self, record: &LogRecord) {
        let mut aof = self.aof.lock();
        for attempt in 1..=defaults::AOF_APPEND_RETRIES {
            match aof.append(record) {
                Ok(()) => return,
                Err(e) if attempt == defaults::AOF_APPEND_RETRIES => {
                    warn!(key = %record.key, error = %e, "log append failed, mutation is in memory only");
                }
                Err(_) => {}
            }
        }
    }

    /// Insert directly into the index, bypassing the log. Lets tests
    /// plant already-expired entries without waiting out a TTL.
    #[cfg(test)]
    pub(crate) fn insert_raw(&self, key: &str, value: &str, expires_at: i64) {
        self.items
            .write()
            .insert(key.to_string(), Entry::new(value, expires_at));
    }
}
