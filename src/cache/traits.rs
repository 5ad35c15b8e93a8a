use thiserror::Error;

/// Errors from the local persistence layer.
///
/// These are never fatal to a catalog operation: callers log them and carry
/// on with in-memory state, because the remote store remains the
/// reconciliation source of truth.
#[derive(Debug, Error)]
pub enum CacheError {
  #[error("local database error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("snapshot serialization failed: {0}")]
  Serde(#[from] serde_json::Error),

  #[error("local store i/o error: {0}")]
  Io(#[from] std::io::Error),

  #[error("could not determine a data directory")]
  NoDataDir,

  #[error("local store lock poisoned")]
  Poisoned,
}

/// Key-value persistence for collection snapshots and the sync queue.
///
/// Values are opaque strings; serialization is the snapshot layer's concern.
/// Implementations must be shareable across tasks.
pub trait LocalStore: Send + Sync {
  /// Persist `value` under `key`, replacing any previous value.
  fn save(&self, key: &str, value: &str) -> Result<(), CacheError>;

  /// Load the value stored under `key`, or `None` if absent.
  fn load(&self, key: &str) -> Result<Option<String>, CacheError>;

  /// Remove `key` if present. Removing an absent key is not an error.
  fn remove(&self, key: &str) -> Result<(), CacheError>;
}
