//! Durable queue of writes deferred while the remote store is unreachable.
//!
//! Every offline mutation appends one record; the store replays them in
//! enqueue order once connectivity returns. The queue lives in the local
//! store as a single JSON snapshot, so it survives restarts along with the
//! collection snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::cache::{SnapshotCache, SYNC_QUEUE_KEY};
use crate::catalog::EntityKind;

/// Kind of deferred write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
  Insert,
  Update,
  Delete,
}

/// A write operation waiting to be replayed against the remote store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingOp {
  pub entity: EntityKind,
  pub op: OpKind,
  /// Full record for inserts, `{id, ...changed fields}` for updates,
  /// `{id}` for deletes.
  pub payload: Value,
  pub queued_at: DateTime<Utc>,
}

/// Ordered, durable pending-operation log.
///
/// The whole queue is one snapshot; `enqueue` is a read-modify-write of that
/// snapshot. Persistence failures are logged and swallowed, matching the
/// cache policy: losing a queued record degrades sync, it must not fail the
/// mutation that already committed locally.
#[derive(Clone)]
pub struct SyncQueue {
  cache: SnapshotCache,
}

impl SyncQueue {
  pub fn new(cache: SnapshotCache) -> Self {
    Self { cache }
  }

  /// Append a record and persist the queue.
  pub fn enqueue(&self, entity: EntityKind, op: OpKind, payload: Value) {
    let mut ops = self.load();
    ops.push(PendingOp { entity, op, payload, queued_at: Utc::now() });
    if let Err(e) = self.cache.save_collection(SYNC_QUEUE_KEY, &ops) {
      warn!(error = %e, "failed to persist sync queue");
    }
  }

  /// All queued records in enqueue order.
  pub fn load(&self) -> Vec<PendingOp> {
    match self.cache.load_collection(SYNC_QUEUE_KEY) {
      Ok(Some(ops)) => ops,
      Ok(None) => Vec::new(),
      Err(e) => {
        warn!(error = %e, "failed to read sync queue");
        Vec::new()
      }
    }
  }

  pub fn len(&self) -> usize {
    self.load().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Drop all queued records.
  pub fn clear(&self) {
    if let Err(e) = self.cache.remove(SYNC_QUEUE_KEY) {
      warn!(error = %e, "failed to clear sync queue");
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use serde_json::json;

  use crate::cache::{LocalStore, MemoryLocal, SnapshotCache};

  use super::*;

  fn queue() -> SyncQueue {
    SyncQueue::new(SnapshotCache::new(Arc::new(MemoryLocal::new())))
  }

  #[test]
  fn test_enqueue_preserves_order() {
    let queue = queue();
    queue.enqueue(EntityKind::Companies, OpKind::Insert, json!({"id": "a"}));
    queue.enqueue(EntityKind::Products, OpKind::Update, json!({"id": "b", "stock": 2}));
    queue.enqueue(EntityKind::Products, OpKind::Delete, json!({"id": "c"}));

    let ops = queue.load();
    assert_eq!(ops.len(), 3);
    assert_eq!(ops[0].op, OpKind::Insert);
    assert_eq!(ops[1].op, OpKind::Update);
    assert_eq!(ops[2].op, OpKind::Delete);
    assert_eq!(ops[2].payload, json!({"id": "c"}));
  }

  #[test]
  fn test_queue_survives_reattach() {
    let store = Arc::new(MemoryLocal::new());
    let first = SyncQueue::new(SnapshotCache::new(store.clone()));
    first.enqueue(EntityKind::Companies, OpKind::Insert, json!({"id": "a"}));
    drop(first);

    let second = SyncQueue::new(SnapshotCache::new(store));
    assert_eq!(second.len(), 1);
  }

  #[test]
  fn test_clear_empties_queue() {
    let queue = queue();
    queue.enqueue(EntityKind::Companies, OpKind::Insert, json!({"id": "a"}));
    queue.clear();
    assert!(queue.is_empty());
  }

  #[test]
  fn test_corrupt_queue_reads_empty() {
    let store = Arc::new(MemoryLocal::new());
    store.save(crate::cache::SYNC_QUEUE_KEY, "oops").unwrap();
    let queue = SyncQueue::new(SnapshotCache::new(store));
    assert!(queue.load().is_empty());
  }

  #[test]
  fn test_records_carry_timestamps() {
    let queue = queue();
    let before = Utc::now();
    queue.enqueue(EntityKind::Products, OpKind::Insert, json!({"id": "x"}));
    let ops = queue.load();
    assert!(ops[0].queued_at >= before);
  }
}
