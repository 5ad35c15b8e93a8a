//! Remote store abstraction over the hosted catalog tables.
//!
//! Rows travel as raw JSON objects; the repository owns the typed view. That
//! keeps queue replay trivial (queued payloads go back out as-is) and lets
//! the hosted backend and the in-process test backend share one trait.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

mod memory;
mod supabase;

pub use memory::{MemoryRemote, RemoteCall};
pub use supabase::SupabaseRemote;

/// Errors from the remote store.
#[derive(Debug, Error)]
pub enum RemoteError {
  /// Transport-level failure: connect, TLS, timeout.
  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),

  /// The API answered with a non-success status.
  #[error("remote API error ({status}): {message}")]
  Api { status: u16, message: String },

  /// A body did not match the expected shape.
  #[error("unexpected remote payload: {0}")]
  Decode(#[from] serde_json::Error),

  /// A write reported success but returned no representation.
  #[error("remote returned no rows")]
  EmptyReply,

  /// The configured base URL does not parse.
  #[error("invalid remote url: {0}")]
  BadUrl(#[from] url::ParseError),

  /// The backend is not reachable (in-process backends only).
  #[error("remote store unreachable")]
  Unreachable,

  /// Internal state lock poisoned (in-process backends only).
  #[error("backend lock poisoned")]
  Poisoned,
}

/// A remote collection API over the catalog tables.
///
/// All four operations return the affected rows so callers can adopt the
/// stored representation, and report errors distinguishable from success.
#[async_trait]
pub trait RemoteStore: Send + Sync {
  /// All rows of `table`, ordered by creation timestamp ascending.
  async fn select(&self, table: &str) -> Result<Vec<Value>, RemoteError>;

  /// Insert one row, returning the stored representation.
  async fn insert(&self, table: &str, record: Value) -> Result<Vec<Value>, RemoteError>;

  /// Apply `fields` to the row with the given id, returning the rows that
  /// matched. An unknown id yields an empty vec, not an error.
  async fn update(&self, table: &str, id: &str, fields: Value) -> Result<Vec<Value>, RemoteError>;

  /// Delete the row with the given id, returning the rows removed. Deleting
  /// an absent id is not an error.
  async fn delete(&self, table: &str, id: &str) -> Result<Vec<Value>, RemoteError>;
}
