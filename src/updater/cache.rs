//! Update-availability cache
//!
//! One entry per plugin slug holding the last [`UpdateDecision`] and the time
//! it was made. Entries older than the configured TTL are treated as absent.

use crate::core::sync::handle_mutex_poison;
use crate::updater::decision::UpdateDecision;
use crate::updater::error::{CacheError, CacheResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const DEFAULT_CACHE_TTL_SECS: i64 = 12 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedDecision {
    /// Unix seconds at which the decision was made
    pub checked_at: i64,
    pub decision: UpdateDecision,
}

impl CachedDecision {
    pub fn is_fresh(&self, now: i64, ttl_secs: i64) -> bool {
        now >= self.checked_at && now - self.checked_at < ttl_secs
    }
}

pub trait UpdateCache: Send + Sync {
    fn get(&self, key: &str) -> CacheResult<Option<CachedDecision>>;
    fn put(&self, key: &str, entry: &CachedDecision) -> CacheResult<()>;
    /// Drop the entry; removing a missing entry is not an error
    fn invalidate(&self, key: &str) -> CacheResult<()>;
}

/// JSON file per plugin under the cache directory
#[derive(Debug, Clone)]
pub struct FileUpdateCache {
    dir: PathBuf,
}

impl FileUpdateCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("update-{}.json", file_name))
    }
}

impl UpdateCache for FileUpdateCache {
    fn get(&self, key: &str) -> CacheResult<Option<CachedDecision>> {
        let path = self.entry_path(key);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(CacheError::Io { path, source }),
        };
        match serde_json::from_str(&text) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                // Unreadable entries are treated as a miss and overwritten later
                log::debug!("Ignoring corrupt cache entry {:?}: {}", path, e);
                Ok(None)
            }
        }
    }

    fn put(&self, key: &str, entry: &CachedDecision) -> CacheResult<()> {
        let path = self.entry_path(key);
        std::fs::create_dir_all(&self.dir).map_err(|source| CacheError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let text = serde_json::to_string_pretty(entry).map_err(|e| CacheError::Encode {
            path: path.clone(),
            cause: e.to_string(),
        })?;
        std::fs::write(&path, text).map_err(|source| CacheError::Io { path, source })
    }

    fn invalidate(&self, key: &str) -> CacheResult<()> {
        let path = self.entry_path(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(CacheError::Io { path, source }),
        }
    }
}

/// Process-local cache, used when caching to disk is disabled
#[derive(Debug, Default)]
pub struct MemoryUpdateCache {
    entries: Mutex<HashMap<String, CachedDecision>>,
}

impl MemoryUpdateCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UpdateCache for MemoryUpdateCache {
    fn get(&self, key: &str) -> CacheResult<Option<CachedDecision>> {
        let entries = handle_mutex_poison(self.entries.lock(), |message| CacheError::Lock {
            message,
        })?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, entry: &CachedDecision) -> CacheResult<()> {
        let mut entries = handle_mutex_poison(self.entries.lock(), |message| CacheError::Lock {
            message,
        })?;
        entries.insert(key.to_string(), entry.clone());
        Ok(())
    }

    fn invalidate(&self, key: &str) -> CacheResult<()> {
        let mut entries = handle_mutex_poison(self.entries.lock(), |message| CacheError::Lock {
            message,
        })?;
        entries.remove(key);
        Ok(())
    }
}
