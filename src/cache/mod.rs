//! Durable local persistence for collection snapshots and the sync queue.
//!
//! The layout mirrors the original web storage: each collection is one JSON
//! snapshot under a fixed key, rewritten wholesale after every mutation. The
//! cache is a fallback source while the remote store is unreachable, never an
//! independent owner of the data.

mod snapshots;
mod storage;
mod traits;

pub use snapshots::{
  SnapshotCache, COMPANIES_KEY, FORCE_REFRESH_KEY, PRODUCTS_KEY, SYNC_QUEUE_KEY,
};
pub use storage::{MemoryLocal, SqliteLocal};
pub use traits::{CacheError, LocalStore};
