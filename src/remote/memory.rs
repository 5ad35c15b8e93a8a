use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{RemoteError, RemoteStore};

/// A call observed by [`MemoryRemote`], for assertions and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCall {
  pub op: &'static str,
  pub table: String,
  pub id: Option<String>,
}

/// In-memory table pair implementing [`RemoteStore`].
///
/// Behaves like the hosted backend where it matters: `select` orders by
/// `created_at`, inserting a duplicate id is a conflict, updates and deletes
/// of unknown ids match zero rows. `set_reachable(false)` makes every call
/// fail, which simulates an outage without touching the network.
pub struct MemoryRemote {
  tables: Mutex<HashMap<String, Vec<Value>>>,
  calls: Mutex<Vec<RemoteCall>>,
  reachable: AtomicBool,
}

impl MemoryRemote {
  pub fn new() -> Self {
    Self {
      tables: Mutex::new(HashMap::new()),
      calls: Mutex::new(Vec::new()),
      reachable: AtomicBool::new(true),
    }
  }

  /// Simulate the backend becoming reachable or unreachable.
  pub fn set_reachable(&self, reachable: bool) {
    self.reachable.store(reachable, Ordering::SeqCst);
  }

  /// Calls observed so far, in order.
  pub fn calls(&self) -> Vec<RemoteCall> {
    match self.calls.lock() {
      Ok(calls) => calls.clone(),
      Err(poisoned) => poisoned.into_inner().clone(),
    }
  }

  /// Rows currently stored in `table`, in insertion order.
  pub fn stored_rows(&self, table: &str) -> Vec<Value> {
    match self.tables.lock() {
      Ok(tables) => tables.get(table).cloned().unwrap_or_default(),
      Err(poisoned) => poisoned.into_inner().get(table).cloned().unwrap_or_default(),
    }
  }

  fn check_reachable(&self) -> Result<(), RemoteError> {
    if self.reachable.load(Ordering::SeqCst) {
      Ok(())
    } else {
      Err(RemoteError::Unreachable)
    }
  }

  fn lock_tables(&self) -> Result<MutexGuard<'_, HashMap<String, Vec<Value>>>, RemoteError> {
    self.tables.lock().map_err(|_| RemoteError::Poisoned)
  }

  fn record_call(&self, op: &'static str, table: &str, id: Option<&str>) {
    if let Ok(mut calls) = self.calls.lock() {
      calls.push(RemoteCall {
        op,
        table: table.to_string(),
        id: id.map(str::to_string),
      });
    }
  }
}

impl Default for MemoryRemote {
  fn default() -> Self {
    Self::new()
  }
}

fn row_id(row: &Value) -> Option<&str> {
  row.get("id").and_then(Value::as_str)
}

fn created_at(row: &Value) -> DateTime<Utc> {
  row
    .get("created_at")
    .and_then(Value::as_str)
    .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
    .map(|t| t.with_timezone(&Utc))
    .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[async_trait]
impl RemoteStore for MemoryRemote {
  async fn select(&self, table: &str) -> Result<Vec<Value>, RemoteError> {
    self.check_reachable()?;
    self.record_call("select", table, None);
    let mut rows = self.lock_tables()?.get(table).cloned().unwrap_or_default();
    rows.sort_by_key(created_at);
    Ok(rows)
  }

  async fn insert(&self, table: &str, record: Value) -> Result<Vec<Value>, RemoteError> {
    self.check_reachable()?;
    let id = row_id(&record).map(str::to_string);
    self.record_call("insert", table, id.as_deref());
    let Some(id) = id else {
      return Err(RemoteError::Api { status: 400, message: "row has no id".into() });
    };

    let mut tables = self.lock_tables()?;
    let rows = tables.entry(table.to_string()).or_default();
    if rows.iter().any(|row| row_id(row) == Some(id.as_str())) {
      return Err(RemoteError::Api {
        status: 409,
        message: format!("duplicate key value violates unique constraint: {id}"),
      });
    }
    rows.push(record.clone());
    Ok(vec![record])
  }

  async fn update(&self, table: &str, id: &str, fields: Value) -> Result<Vec<Value>, RemoteError> {
    self.check_reachable()?;
    self.record_call("update", table, Some(id));
    let Value::Object(fields) = fields else {
      return Err(RemoteError::Api { status: 400, message: "update body must be an object".into() });
    };

    let mut tables = self.lock_tables()?;
    let rows = tables.entry(table.to_string()).or_default();
    let mut updated = Vec::new();
    for row in rows.iter_mut() {
      if row_id(row) == Some(id) {
        if let Value::Object(map) = row {
          for (key, value) in &fields {
            map.insert(key.clone(), value.clone());
          }
        }
        updated.push(row.clone());
      }
    }
    Ok(updated)
  }

  async fn delete(&self, table: &str, id: &str) -> Result<Vec<Value>, RemoteError> {
    self.check_reachable()?;
    self.record_call("delete", table, Some(id));
    let mut tables = self.lock_tables()?;
    let rows = tables.entry(table.to_string()).or_default();
    let mut removed = Vec::new();
    rows.retain(|row| {
      if row_id(row) == Some(id) {
        removed.push(row.clone());
        false
      } else {
        true
      }
    });
    Ok(removed)
  }
}
