use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use super::traits::{CacheError, LocalStore};

/// Schema for the key-value table.
const LOCAL_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

/// SQLite-backed key-value store, the durable analog of the browser storage
/// the catalog originally lived in.
pub struct SqliteLocal {
  conn: Mutex<Connection>,
}

impl SqliteLocal {
  /// Open or create the store at the default platform location.
  pub fn open() -> Result<Self, CacheError> {
    Self::open_at(&Self::default_path()?)
  }

  /// Open or create the store at `path`, creating parent directories.
  pub fn open_at(path: &Path) -> Result<Self, CacheError> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(path)?;
    conn.execute_batch(LOCAL_SCHEMA)?;
    Ok(Self { conn: Mutex::new(conn) })
  }

  fn default_path() -> Result<PathBuf, CacheError> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
      .ok_or(CacheError::NoDataDir)?;
    Ok(data_dir.join("vitrina").join("local.db"))
  }
}

impl LocalStore for SqliteLocal {
  fn save(&self, key: &str, value: &str) -> Result<(), CacheError> {
    let conn = self.conn.lock().map_err(|_| CacheError::Poisoned)?;
    conn.execute(
      "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
       ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
      params![key, value],
    )?;
    Ok(())
  }

  fn load(&self, key: &str) -> Result<Option<String>, CacheError> {
    let conn = self.conn.lock().map_err(|_| CacheError::Poisoned)?;
    let value = conn
      .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get(0))
      .optional()?;
    Ok(value)
  }

  fn remove(&self, key: &str) -> Result<(), CacheError> {
    let conn = self.conn.lock().map_err(|_| CacheError::Poisoned)?;
    conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
    Ok(())
  }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryLocal {
  map: Mutex<HashMap<String, String>>,
}

impl MemoryLocal {
  pub fn new() -> Self {
    Self::default()
  }
}

impl LocalStore for MemoryLocal {
  fn save(&self, key: &str, value: &str) -> Result<(), CacheError> {
    let mut map = self.map.lock().map_err(|_| CacheError::Poisoned)?;
    map.insert(key.to_string(), value.to_string());
    Ok(())
  }

  fn load(&self, key: &str) -> Result<Option<String>, CacheError> {
    let map = self.map.lock().map_err(|_| CacheError::Poisoned)?;
    Ok(map.get(key).cloned())
  }

  fn remove(&self, key: &str) -> Result<(), CacheError> {
    let mut map = self.map.lock().map_err(|_| CacheError::Poisoned)?;
    map.remove(key);
    Ok(())
  }
}
