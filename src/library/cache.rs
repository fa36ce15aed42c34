//! Metadata caching.
//!
//! Entries are keyed on the file's path, size and modification time, so any
//! change to a file makes its old entry unreachable; the entry itself then
//! lives until its TTL runs out and a purge drops it.

use crate::error::Result;
use crate::library::metadata::{Metadata, MetadataExtractor};
use crate::library::storage::Storage;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Key-value cache with per-entry expiry.
pub trait Cache<V>: Send + Sync {
    /// Live value stored under `key`.
    fn get(&self, key: &str) -> Option<V>;

    /// Store `value` under `key` for `ttl`.
    fn insert(&self, key: String, value: V, ttl: Duration);

    /// Cached value, or the result of `compute` stored for `ttl`.
    ///
    /// Concurrent misses on the same key may each compute; the last insert wins.
    fn get_or_insert_with(&self, key: &str, ttl: Duration, compute: &mut dyn FnMut() -> V) -> V
    where
        V: Clone,
    {
        if let Some(value) = self.get(key) {
            return value;
        }

        let value = compute();
        self.insert(key.to_string(), value.clone(), ttl);
        value
    }
}

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// In-process cache.
pub struct MemoryCache<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
}

impl<V> MemoryCache<V> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Drop expired entries. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }
}

impl<V> Default for MemoryCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + Send + Sync> Cache<V> for MemoryCache<V> {
    fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.read();
        entries
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.value.clone())
    }

    fn insert(&self, key: String, value: V, ttl: Duration) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().insert(key, entry);
    }
}

/// Memoized metadata lookups for library files.
pub struct MetadataCache {
    storage: Arc<dyn Storage>,
    cache: Arc<dyn Cache<Metadata>>,
    extractor: Arc<dyn MetadataExtractor>,
    ttl: Duration,
}

impl MetadataCache {
    /// Create a metadata cache.
    pub fn new(
        storage: Arc<dyn Storage>,
        cache: Arc<dyn Cache<Metadata>>,
        extractor: Arc<dyn MetadataExtractor>,
        ttl: Duration,
    ) -> Self {
        Self {
            storage,
            cache,
            extractor,
            ttl,
        }
    }

    /// Cache key for one version of a file.
    pub fn cache_key(path: &str, size: u64, modified: DateTime<Utc>) -> String {
        let path_id = Uuid::new_v5(&Uuid::NAMESPACE_URL, path.as_bytes());
        format!(
            "book_meta:{}:{}:{}",
            path_id,
            modified.timestamp_millis(),
            size
        )
    }

    /// Metadata for `path`, stat'ing the file for its current version.
    pub fn get(&self, path: &str) -> Result<Metadata> {
        let size = self.storage.size(path)?;
        let modified = self.storage.last_modified(path)?;
        Ok(self.get_versioned(path, size, modified))
    }

    /// Metadata for `path` at a known size and modification time.
    pub fn get_versioned(&self, path: &str, size: u64, modified: DateTime<Utc>) -> Metadata {
        let key = Self::cache_key(path, size, modified);
        self.cache
            .get_or_insert_with(&key, self.ttl, &mut || self.compute(path))
    }

    fn compute(&self, path: &str) -> Metadata {
        let defaults = Metadata::from_file_name(path);

        let Some(absolute) = self.storage.absolute_path(path) else {
            tracing::debug!(path, "No local path, using filename metadata");
            return defaults;
        };

        tracing::debug!(path, "Extracting metadata");
        match self.extractor.extract(&absolute) {
            Some(extracted) => defaults.merge(extracted),
            None => defaults,
        }
    }
}
