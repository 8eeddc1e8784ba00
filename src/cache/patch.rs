//! Post-mutation cache patches.
//!
//! Given the entity echoed back by a create, update or delete, these rewrite
//! the cached list and detail results of that entity type. A list that was
//! never fetched is left alone: the next read will go to the server anyway.

use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeSet;

use super::key::QueryKey;
use super::store::QueryCache;

/// An entity whose list and detail queries can be patched in place.
pub trait Patchable: Clone + Serialize + DeserializeOwned {
  type Key: QueryKey;
  /// Cached payload of the unparameterized list query
  type List: Serialize + DeserializeOwned;
  /// Cached payload of the single-entity query
  type Detail: Serialize + DeserializeOwned;

  fn id(&self) -> i64;

  fn list_key() -> Self::Key;

  fn detail_key(id: i64) -> Self::Key;

  fn entries(list: &mut Self::List) -> &mut Vec<Self>;

  fn to_detail(&self) -> Self::Detail;
}

/// Insert a created entity at the head of the cached list.
///
/// Any stale copy with the same id is dropped first so the entity appears
/// exactly once. Returns false when the list is not cached.
pub fn after_create<E: Patchable>(cache: &mut QueryCache, created: &E) -> bool {
  let key = E::list_key();
  let Some(mut list) = cache.read::<E::List>(&key) else {
    tracing::debug!(query = %key.description(), "list not cached, skipping create patch");
    return false;
  };
  let entries = E::entries(&mut list);
  entries.retain(|e| e.id() != created.id());
  entries.insert(0, created.clone());
  cache.write(&key, &list);
  true
}

/// Replace an updated entity in the cached list and write its detail query.
///
/// The detail entry is written even when the list is not cached. Returns
/// whether the list was patched.
pub fn after_update<E: Patchable>(cache: &mut QueryCache, updated: &E) -> bool {
  let key = E::list_key();
  let patched = match cache.read::<E::List>(&key) {
    Some(mut list) => {
      for entry in E::entries(&mut list).iter_mut() {
        if entry.id() == updated.id() {
          *entry = updated.clone();
        }
      }
      cache.write(&key, &list);
      true
    }
    None => {
      tracing::debug!(query = %key.description(), "list not cached, skipping update patch");
      false
    }
  };
  cache.write(&E::detail_key(updated.id()), &updated.to_detail());
  patched
}

/// Build a patch that removes the given ids from the cached list and evicts
/// their detail queries.
pub fn after_delete<E: Patchable>(ids: BTreeSet<i64>) -> impl FnOnce(&mut QueryCache) {
  move |cache: &mut QueryCache| {
    for id in &ids {
      cache.evict(&E::detail_key(*id));
    }
    let key = E::list_key();
    let Some(mut list) = cache.read::<E::List>(&key) else {
      tracing::debug!(query = %key.description(), "list not cached, skipping delete patch");
      return;
    };
    E::entries(&mut list).retain(|e| !ids.contains(&e.id()));
    cache.write(&key, &list);
  }
}
