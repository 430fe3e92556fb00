//! Cache stores
//!
//! - [`DiskStore`]: one `<key>.json` file per entry, written via a temp file
//!   and a no-clobber rename so a reader never sees a partial entry
//! - [`MemoryStore`]: `moka` backed, for tests and throwaway runs
//!
//! Both keep at most one entry per key; a second write for a key that is
//! already stored is a no-op.

use crate::error::CacheError;
use crate::key::CacheKey;
use async_trait::async_trait;
use moka::future::Cache;
use std::fmt::Debug;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Result of a store write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// Entry was written
    Written,
    /// An entry for the key already existed and was left alone
    AlreadyPresent,
}

/// Persistent storage for cached responses
#[async_trait]
pub trait CacheStore: Send + Sync + Debug {
    /// Read the entry for `key`, if any
    async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError>;

    /// Store `bytes` under `key` unless an entry already exists
    async fn put(&self, key: &CacheKey, bytes: &[u8]) -> Result<PutOutcome, CacheError>;
}

/// Directory-backed store
#[derive(Debug, Clone)]
pub struct DiskStore {
    dir: PathBuf,
}

impl DiskStore {
    /// Open (creating if needed) a cache directory
    ///
    /// # Errors
    /// Returns error if the directory cannot be created
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| CacheError::io_error(&dir, e))?;
        Ok(Self { dir })
    }

    /// Cache directory
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the entry for `key`
    #[inline]
    #[must_use]
    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// Number of stored entries
    ///
    /// # Errors
    /// Returns error if the directory cannot be listed
    pub async fn len(&self) -> Result<usize, CacheError> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| CacheError::io_error(&self.dir, e))?;
        let mut count = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CacheError::io_error(&self.dir, e))?
        {
            if entry.path().extension().is_some_and(|ext| ext == "json") {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Remove every entry, leaving an empty directory (cold cache)
    ///
    /// # Errors
    /// Returns error if the directory cannot be removed or recreated
    pub async fn wipe(&self) -> Result<(), CacheError> {
        match tokio::fs::remove_dir_all(&self.dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(CacheError::io_error(&self.dir, e)),
        }
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| CacheError::io_error(&self.dir, e))?;
        tracing::info!(dir = %self.dir.display(), "cache wiped");
        Ok(())
    }
}

#[async_trait]
impl CacheStore for DiskStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError> {
        let path = self.entry_path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::io_error(path, e)),
        }
    }

    async fn put(&self, key: &CacheKey, bytes: &[u8]) -> Result<PutOutcome, CacheError> {
        let dir = self.dir.clone();
        let path = self.entry_path(key);
        let bytes = bytes.to_vec();

        tokio::task::spawn_blocking(move || write_atomic(&dir, &path, &bytes))
            .await
            .map_err(|e| CacheError::Task(e.to_string()))?
    }
}

/// Write to a temp file in `dir`, then link it into place without clobbering
fn write_atomic(dir: &Path, path: &Path, bytes: &[u8]) -> Result<PutOutcome, CacheError> {
    if path.exists() {
        return Ok(PutOutcome::AlreadyPresent);
    }

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| CacheError::io_error(dir, e))?;
    tmp.write_all(bytes)
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| CacheError::io_error(tmp.path(), e))?;

    match tmp.persist_noclobber(path) {
        Ok(_) => Ok(PutOutcome::Written),
        // lost a race with another writer; the temp file is dropped here
        Err(e) if e.error.kind() == ErrorKind::AlreadyExists => Ok(PutOutcome::AlreadyPresent),
        Err(e) => Err(CacheError::io_error(path, e.error)),
    }
}

/// In-memory store
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Cache<CacheKey, Arc<Vec<u8>>>,
}

impl MemoryStore {
    /// Create store holding up to `max_capacity` entries
    #[inline]
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::new(max_capacity),
        }
    }

    /// Whether `key` has an entry
    #[inline]
    #[must_use]
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.inner.contains_key(key)
    }

    /// Drop every entry
    #[inline]
    pub fn wipe(&self) {
        self.inner.invalidate_all();
    }
}

impl Default for MemoryStore {
    /// Create store with default capacity (10,000 entries)
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self.inner.get(key).await.map(|bytes| bytes.as_ref().clone()))
    }

    async fn put(&self, key: &CacheKey, bytes: &[u8]) -> Result<PutOutcome, CacheError> {
        let entry = self
            .inner
            .entry(key.clone())
            .or_insert_with(async { Arc::new(bytes.to_vec()) })
            .await;
        Ok(if entry.is_fresh() {
            PutOutcome::Written
        } else {
            PutOutcome::AlreadyPresent
        })
    }
}
