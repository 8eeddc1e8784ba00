//! Cache storage trait, in-memory backends, and the cache handle.

use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use super::key::QueryKey;

/// A single cached query result.
#[derive(Debug, Clone)]
pub struct CacheEntry {
  /// Name of the query, without its variables
  pub query: &'static str,
  /// Description of the query, for logs
  pub description: String,
  /// Last-known response payload
  pub payload: Value,
  /// When the entry was last written
  pub cached_at: DateTime<Utc>,
  /// Write counter, increases on every write to any entry
  pub version: u64,
}

/// Trait for cache storage backends.
pub trait CacheStore: Send {
  fn get(&self, hash: &str) -> Option<&CacheEntry>;

  fn put(&mut self, hash: String, entry: CacheEntry);

  fn remove(&mut self, hash: &str) -> Option<CacheEntry>;

  fn clear(&mut self);

  fn len(&self) -> usize;

  /// Hashes of every stored entry
  fn hashes(&self) -> Vec<String>;
}

/// In-memory storage, lives as long as the app.
#[derive(Debug, Default)]
pub struct MemoryStore {
  entries: HashMap<String, CacheEntry>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl CacheStore for MemoryStore {
  fn get(&self, hash: &str) -> Option<&CacheEntry> {
    self.entries.get(hash)
  }

  fn put(&mut self, hash: String, entry: CacheEntry) {
    self.entries.insert(hash, entry);
  }

  fn remove(&mut self, hash: &str) -> Option<CacheEntry> {
    self.entries.remove(hash)
  }

  fn clear(&mut self) {
    self.entries.clear();
  }

  fn len(&self) -> usize {
    self.entries.len()
  }

  fn hashes(&self) -> Vec<String> {
    self.entries.keys().cloned().collect()
  }
}

/// Storage implementation that doesn't cache anything.
/// Used when caching is disabled - all operations are no-ops.
#[derive(Debug, Default)]
pub struct NoopStore;

impl CacheStore for NoopStore {
  fn get(&self, _hash: &str) -> Option<&CacheEntry> {
    None // Always miss
  }

  fn put(&mut self, _hash: String, _entry: CacheEntry) {}

  fn remove(&mut self, _hash: &str) -> Option<CacheEntry> {
    None
  }

  fn clear(&mut self) {}

  fn len(&self) -> usize {
    0
  }

  fn hashes(&self) -> Vec<String> {
    Vec::new()
  }
}

/// The cache handle.
///
/// Owned by the app loop and passed by reference to every read and write,
/// so there is exactly one writer at a time.
pub struct QueryCache {
  store: Box<dyn CacheStore>,
  /// How long before cached data is considered stale
  stale_time: Duration,
  next_version: u64,
}

impl QueryCache {
  pub fn new(store: impl CacheStore + 'static) -> Self {
    Self {
      store: Box::new(store),
      stale_time: Duration::minutes(5),
      next_version: 1,
    }
  }

  /// A cache backed by [`MemoryStore`].
  pub fn in_memory() -> Self {
    Self::new(MemoryStore::new())
  }

  /// Set the stale time for cached data.
  pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
    self.stale_time = stale_time;
    self
  }

  fn is_stale(&self, cached_at: DateTime<Utc>) -> bool {
    Utc::now() - cached_at > self.stale_time
  }

  /// Read the cached payload of a query, if any.
  ///
  /// A payload that no longer deserializes as `T` is treated as absent.
  pub fn read<T: DeserializeOwned>(&self, key: &impl QueryKey) -> Option<T> {
    let entry = self.store.get(&key.cache_hash())?;
    match serde_json::from_value(entry.payload.clone()) {
      Ok(data) => Some(data),
      Err(e) => {
        tracing::warn!(query = %entry.description, error = %e, "discarding undecodable cache entry");
        None
      }
    }
  }

  /// Like [`read`](Self::read), but misses when the entry is stale.
  pub fn read_fresh<T: DeserializeOwned>(&self, key: &impl QueryKey) -> Option<T> {
    let entry = self.store.get(&key.cache_hash())?;
    if self.is_stale(entry.cached_at) {
      return None;
    }
    self.read(key)
  }

  /// Write a payload under the query's key, replacing any previous one.
  pub fn write<T: Serialize>(&mut self, key: &impl QueryKey, payload: &T) {
    let payload = match serde_json::to_value(payload) {
      Ok(v) => v,
      Err(e) => {
        tracing::error!(query = %key.description(), error = %e, "failed to serialize cache payload");
        return;
      }
    };
    self.put(key.cache_hash(), key.query_name(), key.description(), payload);
  }

  fn put(&mut self, hash: String, query: &'static str, description: String, payload: Value) {
    let version = self.next_version;
    self.next_version += 1;
    tracing::trace!(query = %description, version, "cache write");
    self.store.put(
      hash,
      CacheEntry {
        query,
        description,
        payload,
        cached_at: Utc::now(),
        version,
      },
    );
  }

  fn hashes_of(&self, query: &str) -> Vec<String> {
    self
      .store
      .hashes()
      .into_iter()
      .filter(|hash| self.store.get(hash).is_some_and(|e| e.query == query))
      .collect()
  }

  /// Rewrite every cached result of the named query, whatever its variables.
  ///
  /// `patch` returns whether it changed the payload, and only changed entries
  /// are written back. Returns how many were.
  pub fn update_where<T, F>(&mut self, query: &str, mut patch: F) -> usize
  where
    T: Serialize + DeserializeOwned,
    F: FnMut(&mut T) -> bool,
  {
    let mut updated = 0;
    for hash in self.hashes_of(query) {
      let Some(entry) = self.store.get(&hash) else {
        continue;
      };
      let Ok(mut data) = serde_json::from_value::<T>(entry.payload.clone()) else {
        continue;
      };
      let (name, description) = (entry.query, entry.description.clone());
      if !patch(&mut data) {
        continue;
      }
      match serde_json::to_value(&data) {
        Ok(payload) => {
          self.put(hash, name, description, payload);
          updated += 1;
        }
        Err(e) => tracing::error!(query = %description, error = %e, "failed to serialize cache payload"),
      }
    }
    updated
  }

  /// Evict every cached result of the named query whose payload matches.
  pub fn evict_where<T, F>(&mut self, query: &str, matches: F) -> usize
  where
    T: DeserializeOwned,
    F: Fn(&T) -> bool,
  {
    let doomed: Vec<String> = self
      .hashes_of(query)
      .into_iter()
      .filter(|hash| {
        self
          .store
          .get(hash)
          .and_then(|e| serde_json::from_value::<T>(e.payload.clone()).ok())
          .is_some_and(|data| matches(&data))
      })
      .collect();
    for hash in &doomed {
      if let Some(entry) = self.store.remove(hash) {
        tracing::debug!(query = %entry.description, "evicted");
      }
    }
    doomed.len()
  }

  /// Remove a single entry.
  pub fn evict(&mut self, key: &impl QueryKey) -> bool {
    self.store.remove(&key.cache_hash()).is_some()
  }

  /// Write version of an entry, `None` if it is not cached.
  pub fn version(&self, key: &impl QueryKey) -> Option<u64> {
    self.store.get(&key.cache_hash()).map(|e| e.version)
  }

  /// Whether the query has a cached result.
  pub fn contains(&self, key: &impl QueryKey) -> bool {
    self.store.get(&key.cache_hash()).is_some()
  }

  /// Drop everything.
  pub fn reset(&mut self) {
    tracing::info!(entries = self.store.len(), "cache reset");
    self.store.clear();
  }

  pub fn len(&self) -> usize {
    self.store.len()
  }
}

impl std::fmt::Debug for QueryCache {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("QueryCache")
      .field("entries", &self.store.len())
      .field("stale_time", &self.stale_time)
      .finish_non_exhaustive()
  }
}
