//! Client-side query cache.
//!
//! This module provides an API-agnostic cache of query results that:
//! - Stores the last-known payload of a query under a hash of its name and variables
//! - Serves fresh entries without a network round-trip
//! - Lets callers patch list and detail entries after a mutation, so views
//!   observe writes without refetching

mod key;
mod patch;
mod store;

pub use key::{hash_key, QueryKey};
pub use patch::{after_create, after_delete, after_update, Patchable};
pub use store::{CacheEntry, CacheStore, MemoryStore, NoopStore, QueryCache};
