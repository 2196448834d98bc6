//! Point-in-time snapshots of the full store contents
//!
//! A snapshot bounds log replay: once a save succeeds the log can be
//! truncated, because everything the log recorded is already in the
//! snapshot. There is exactly one current snapshot file, and every save
//! replaces it atomically.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{EmberError, Result};
use crate::types::SnapshotEntry;

/// Snapshot persistence capability used by the store; tests substitute
/// an in-memory fake.
pub trait SnapshotStore: Send + Sync {
    /// Persist the full entry set, superseding any previous snapshot
    fn save(&self, entries: &[SnapshotEntry]) -> Result<()>;

    /// Read the current snapshot. A missing file is the first-run case
    /// and loads as empty, not as an error.
    fn load(&self) -> Result<Vec<SnapshotEntry>>;
}

/// Single-file snapshot store. Saves write a temporary sibling, sync it,
/// and rename it over the current file, so a reader never observes a
/// partially written snapshot.
pub struct FileSnapshots {
    path: PathBuf,
}

impl FileSnapshots {
    /// Prepare the snapshot location, creating parent directories if absent
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for FileSnapshots {
    fn save(&self, entries: &[SnapshotEntry]) -> Result<()> {
        let bytes = bincode::serialize(entries)
            .map_err(|e| EmberError::Serialization(e.to_string()))?;

        let tmp = self.path.with_extension("tmp");
        let mut file = File::create(&tmp)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&tmp, &self.path)?;

        info!(entries = entries.len(), path = %self.path.display(), "snapshot saved");
        Ok(())
    }

    fn load(&self) -> Result<Vec<SnapshotEntry>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no snapshot on disk, starting empty");
            return Ok(Vec::new());
        }

        let bytes = fs::read(&self.path)?;
        let entries = bincode::deserialize(&bytes)
            .map_err(|e| EmberError::Corruption(format!("undecodable snapshot: {e}")))?;
        Ok(entries)
    }
}
