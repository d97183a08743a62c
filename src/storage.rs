//! Key-value persistence for the store's serialized collections.
//!
//! Each collection is written as one JSON blob under a fixed key. The SQLite
//! backend keeps them in a single `kv` table in the app data directory; the
//! in-memory backend is used by tests and when the database cannot be opened.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Lock error: {0}")]
    Lock(String),
}

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database file, creating parent directories.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            ",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn with_db<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Connection) -> Result<T, rusqlite::Error>,
    {
        let guard = self
            .conn
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        Ok(f(&guard)?)
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.with_db(|conn| {
            conn.query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
        })
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let now = Utc::now().to_rfc3339();
        self.with_db(|conn| {
            conn.execute(
                "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE
                 SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, value, now],
            )
            .map(|_| ())
        })
    }
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_set_overwrites() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.get("jarvis-tasks").unwrap(), None);

        store.set("jarvis-tasks", "[]").unwrap();
        store.set("jarvis-tasks", "[1]").unwrap();
        assert_eq!(store.get("jarvis-tasks").unwrap().as_deref(), Some("[1]"));
        assert_eq!(store.get("jarvis-events").unwrap(), None);
    }

    #[test]
    fn test_sqlite_file_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("jarvis.db");

        SqliteStore::open(&path).unwrap().set("k", "v").unwrap();
        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(reopened.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        store.set("a", "1").unwrap();
        store.set("a", "2").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("2"));
        assert!(store.get("b").unwrap().is_none());
    }
}
