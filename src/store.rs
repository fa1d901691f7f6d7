//! Durable response store
//!
//! Append-only collection of accepted records persisted as one JSON array
//! file. Each append rewrites the whole file (write to a temp file, then
//! rename into place so readers never observe a partial write). That
//! read-modify-write cycle is not safe under concurrent writers, so appends
//! are serialized behind an async mutex; reads take no lock and may observe
//! a store that is one write behind.

use crate::record::Record;
use crate::Result;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

/// Flat-file record store.
pub struct RecordStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the full record sequence, insertion-ordered.
    ///
    /// A missing backing file (or parent directory) is initialized to an
    /// empty store first, so the first read on a fresh deployment succeeds.
    pub async fn read_all(&self) -> Result<Vec<Record>> {
        self.ensure_store().await?;
        let raw = tokio::fs::read_to_string(&self.path).await?;
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    /// Append one record to the durable sequence.
    ///
    /// Returns the full record set including the new entry, so the caller
    /// can rebuild derived state without a second read.
    pub async fn append(&self, record: Record) -> Result<Vec<Record>> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.read_all().await?;
        records.push(record);
        self.write_all(&records).await?;
        debug!("Appended response, store now holds {}", records.len());
        Ok(records)
    }

    async fn ensure_store(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                tokio::fs::create_dir_all(dir).await?;
            }
        }
        if !tokio::fs::try_exists(&self.path).await? {
            tokio::fs::write(&self.path, "[]").await?;
        }
        Ok(())
    }

    async fn write_all(&self, records: &[Record]) -> Result<()> {
        let body = serde_json::to_string_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}
