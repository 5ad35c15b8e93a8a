use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::traits::{CacheError, LocalStore};

/// Snapshot key for the companies collection.
pub const COMPANIES_KEY: &str = "website_companies";
/// Snapshot key for the products collection.
pub const PRODUCTS_KEY: &str = "website_products";
/// Snapshot key for the pending-operation queue.
pub const SYNC_QUEUE_KEY: &str = "sync_queue";
/// Transient marker consumed once at the next initialization.
pub const FORCE_REFRESH_KEY: &str = "force_refresh";

/// Typed snapshot access over a shared [`LocalStore`].
///
/// Collections are persisted as whole-collection JSON snapshots under fixed
/// keys, the same layout the original web storage used. A snapshot that fails
/// to deserialize is treated as absent, so a corrupt cache can never wedge
/// startup.
#[derive(Clone)]
pub struct SnapshotCache {
  store: Arc<dyn LocalStore>,
}

impl SnapshotCache {
  pub fn new(store: Arc<dyn LocalStore>) -> Self {
    Self { store }
  }

  /// Persist a whole collection under `key`, replacing any prior snapshot.
  pub fn save_collection<T: Serialize>(&self, key: &str, items: &[T]) -> Result<(), CacheError> {
    let json = serde_json::to_string(items)?;
    self.store.save(key, &json)?;
    debug!(key, count = items.len(), "snapshot persisted");
    Ok(())
  }

  /// Load a collection snapshot.
  ///
  /// Returns `None` when no snapshot exists or when the stored JSON does not
  /// deserialize; the decode failure is logged and swallowed.
  pub fn load_collection<T: DeserializeOwned>(&self, key: &str) -> Result<Option<Vec<T>>, CacheError> {
    let Some(raw) = self.store.load(key)? else {
      return Ok(None);
    };
    match serde_json::from_str(&raw) {
      Ok(items) => Ok(Some(items)),
      Err(e) => {
        warn!(key, error = %e, "discarding corrupt snapshot");
        Ok(None)
      }
    }
  }

  /// Remove a single key.
  pub fn remove(&self, key: &str) -> Result<(), CacheError> {
    self.store.remove(key)
  }

  /// Remove both collection snapshots.
  pub fn clear_collections(&self) -> Result<(), CacheError> {
    self.store.remove(COMPANIES_KEY)?;
    self.store.remove(PRODUCTS_KEY)
  }

  /// Set the force-refresh marker for the next initialization.
  pub fn set_force_refresh(&self) -> Result<(), CacheError> {
    self.store.save(FORCE_REFRESH_KEY, "1")
  }

  /// Consume the force-refresh marker, returning whether it was set.
  pub fn take_force_refresh(&self) -> Result<bool, CacheError> {
    if self.store.load(FORCE_REFRESH_KEY)?.is_some() {
      self.store.remove(FORCE_REFRESH_KEY)?;
      Ok(true)
    } else {
      Ok(false)
    }
  }
}

#[cfg(test)]
mod tests {
  use serde::{Deserialize, Serialize};

  use crate::cache::MemoryLocal;

  use super::*;

  #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
  struct Item {
    id: String,
    n: i64,
  }

  fn cache() -> SnapshotCache {
    SnapshotCache::new(Arc::new(MemoryLocal::new()))
  }

  #[test]
  fn test_collection_roundtrip() {
    let cache = cache();
    let items = vec![Item { id: "a".into(), n: 1 }, Item { id: "b".into(), n: 2 }];
    cache.save_collection(COMPANIES_KEY, &items).unwrap();
    let loaded: Vec<Item> = cache.load_collection(COMPANIES_KEY).unwrap().unwrap();
    assert_eq!(loaded, items);
  }

  #[test]
  fn test_missing_snapshot_is_none() {
    let cache = cache();
    let loaded: Option<Vec<Item>> = cache.load_collection(PRODUCTS_KEY).unwrap();
    assert!(loaded.is_none());
  }

  #[test]
  fn test_corrupt_snapshot_reads_as_absent() {
    let store = Arc::new(MemoryLocal::new());
    store.save(COMPANIES_KEY, "{not json").unwrap();
    let cache = SnapshotCache::new(store);
    let loaded: Option<Vec<Item>> = cache.load_collection(COMPANIES_KEY).unwrap();
    assert!(loaded.is_none());
  }

  #[test]
  fn test_force_refresh_marker_consumed_once() {
    let cache = cache();
    assert!(!cache.take_force_refresh().unwrap());
    cache.set_force_refresh().unwrap();
    assert!(cache.take_force_refresh().unwrap());
    assert!(!cache.take_force_refresh().unwrap());
  }

  #[test]
  fn test_clear_collections_leaves_queue_alone() {
    let store = Arc::new(MemoryLocal::new());
    store.save(SYNC_QUEUE_KEY, "[]").unwrap();
    let cache = SnapshotCache::new(store.clone());
    cache.save_collection(COMPANIES_KEY, &[Item { id: "a".into(), n: 1 }]).unwrap();

    cache.clear_collections().unwrap();

    assert_eq!(store.load(COMPANIES_KEY).unwrap(), None);
    assert_eq!(store.load(SYNC_QUEUE_KEY).unwrap().as_deref(), Some("[]"));
  }
}
