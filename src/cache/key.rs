//! Query key trait and hashing.

use sha2::{Digest, Sha256};

/// A query plus its variables, usable as a cache key.
pub trait QueryKey {
  /// Stable, fixed-length identifier for this query and its variables
  fn cache_hash(&self) -> String;

  /// Human-readable description for logs
  fn description(&self) -> String;

  /// Name shared by every variable set of the query
  fn query_name(&self) -> &'static str;
}

/// SHA256 hex digest of a canonical key string.
pub fn hash_key(input: &str) -> String {
  let mut hasher = Sha256::new();
  hasher.update(input.as_bytes());
  hex::encode(hasher.finalize())
}
