//! Append-only durability log
//!
//! Every accepted mutation is appended as one JSON object per line, in
//! operation order. On startup the log is replayed on top of the latest
//! snapshot, so the log only ever needs to cover mutations since that
//! snapshot was taken.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{EmberError, Result};
use crate::types::{now_millis, LogRecord};

/// Durability log capability used by the store.
///
/// The store only needs to append records, load them back in order, and
/// truncate after a snapshot; tests substitute an in-memory fake.
pub trait AofLog: Send {
    /// Append one record to the end of the log
    fn append(&mut self, record: &LogRecord) -> Result<()>;

    /// Read every record from the start of the log, in append order.
    /// Records whose expiry has already passed are skipped entirely
    /// rather than replayed and re-expired later.
    fn load(&mut self) -> Result<Vec<LogRecord>>;

    /// Discard all records, so the next load starts from empty
    fn clear(&mut self) -> Result<()>;
}

/// File-backed log. The append handle stays open for the lifetime of the
/// value; loads open a fresh read handle so they always start at the top.
pub struct FileAof {
    path: PathBuf,
    file: File,
}

impl FileAof {
    /// Open or create the log file, creating parent directories if absent
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        debug!(path = %path.display(), "log opened");
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AofLog for FileAof {
    fn append(&mut self, record: &LogRecord) -> Result<()> {
        let mut line = serde_json::to_string(record)
            .map_err(|e| EmberError::Serialization(e.to_string()))?;
        line.push('\n');
        self.file.write_all(line.as_bytes())?;
        Ok(())
    }

    fn load(&mut self) -> Result<Vec<LogRecord>> {
        let now = now_millis();
        let reader = BufReader::new(File::open(&self.path)?);
        let mut records = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: LogRecord = serde_json::from_str(&line)
                .map_err(|e| EmberError::Corruption(format!("undecodable log record: {e}")))?;
            if record.is_expired(now) {
                continue;
            }
            records.push(record);
        }

        info!(records = records.len(), path = %self.path.display(), "log loaded");
        Ok(records)
    }

    fn clear(&mut self) -> Result<()> {
        // Truncate in place, then swap back to an append handle.
        self.file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        self.file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        debug!(path = %self.path.display(), "log cleared");
        Ok(())
    }
}
