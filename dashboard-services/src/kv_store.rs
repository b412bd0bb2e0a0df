//! Key-value storage backends
//!
//! Local persistent storage for serialized blobs under named keys. Both
//! backends can enforce a byte quota across all keys, mirroring the storage
//! limits of the client process the archive lives in.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::ArchiveError;

/// Named-blob storage
pub trait KeyValueStore: Send + Sync {
    /// Read the value under `key`, `None` when absent
    fn get(&self, key: &str) -> Result<Option<String>, ArchiveError>;

    /// Replace the value under `key`
    fn set(&self, key: &str, value: &str) -> Result<(), ArchiveError>;

    /// Delete `key`; deleting an absent key is not an error
    fn remove(&self, key: &str) -> Result<(), ArchiveError>;
}

fn check_quota(quota: Option<usize>, others: usize, value: &str) -> Result<(), ArchiveError> {
    match quota {
        Some(quota) if others + value.len() > quota => Err(ArchiveError::QuotaExceeded {
            size: others + value.len(),
            quota,
        }),
        _ => Ok(()),
    }
}

/// SQLite-backed store, one row per key
pub struct SqliteKvStore {
    conn: Mutex<Connection>,
    quota_bytes: Option<usize>,
}

impl SqliteKvStore {
    /// Open (or create) the store at `db_path`
    pub fn new<P: AsRef<Path>>(db_path: P, quota_bytes: Option<usize>) -> Result<Self, ArchiveError> {
        if let Some(parent) = db_path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ArchiveError::Io(format!("Failed to create database directory: {}", e))
            })?;
        }

        let conn = Connection::open(db_path.as_ref())?;
        let store = Self {
            conn: Mutex::new(conn),
            quota_bytes,
        };
        store.init_schema()?;

        info!("Opened key-value store at: {}", db_path.as_ref().display());
        Ok(store)
    }

    /// Create an in-memory store (useful for testing)
    pub fn new_in_memory(quota_bytes: Option<usize>) -> Result<Self, ArchiveError> {
        let store = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
            quota_bytes,
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), ArchiveError> {
        let conn = self.conn.lock().map_err(|_| ArchiveError::LockError)?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER DEFAULT (strftime('%s', 'now'))
            );
            "#,
        )?;

        Ok(())
    }
}

impl KeyValueStore for SqliteKvStore {
    fn get(&self, key: &str) -> Result<Option<String>, ArchiveError> {
        let conn = self.conn.lock().map_err(|_| ArchiveError::LockError)?;

        let value = conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ArchiveError> {
        let conn = self.conn.lock().map_err(|_| ArchiveError::LockError)?;

        if self.quota_bytes.is_some() {
            let others: i64 = conn.query_row(
                "SELECT COALESCE(SUM(LENGTH(CAST(value AS BLOB))), 0) FROM kv_store WHERE key != ?1",
                params![key],
                |row| row.get(0),
            )?;
            check_quota(self.quota_bytes, others.max(0) as usize, value)?;
        }

        conn.execute(
            r#"
            INSERT OR REPLACE INTO kv_store (key, value, updated_at)
            VALUES (?1, ?2, strftime('%s', 'now'))
            "#,
            params![key, value],
        )?;

        debug!("Stored {} bytes under key {}", value.len(), key);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ArchiveError> {
        let conn = self.conn.lock().map_err(|_| ArchiveError::LockError)?;
        conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(())
    }
}

/// In-process store
#[derive(Default)]
pub struct MemoryKvStore {
    entries: parking_lot::Mutex<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects writes pushing total size past `quota_bytes`
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: parking_lot::Mutex::new(HashMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }
}

impl KeyValueStore for MemoryKvStore {
    fn get(&self, key: &str) -> Result<Option<String>, ArchiveError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ArchiveError> {
        let mut entries = self.entries.lock();
        let others: usize = entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(_, v)| v.len())
            .sum();
        check_quota(self.quota_bytes, others, value)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ArchiveError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(store: &dyn KeyValueStore) {
        assert_eq!(store.get("missing").unwrap(), None);

        store.set("archive", "[1,2,3]").unwrap();
        assert_eq!(store.get("archive").unwrap().as_deref(), Some("[1,2,3]"));

        store.set("archive", "[]").unwrap();
        assert_eq!(store.get("archive").unwrap().as_deref(), Some("[]"));

        store.remove("archive").unwrap();
        store.remove("archive").unwrap();
        assert_eq!(store.get("archive").unwrap(), None);
    }

    #[test]
    fn test_sqlite_store() {
        let store = SqliteKvStore::new_in_memory(None).unwrap();
        exercise(&store);
    }

    #[test]
    fn test_memory_store() {
        exercise(&MemoryKvStore::new());
    }

    #[test]
    fn test_sqlite_quota() {
        let store = SqliteKvStore::new_in_memory(Some(10)).unwrap();
        store.set("a", "12345").unwrap();
        // replacing a key only counts the other keys
        store.set("a", "1234567890").unwrap();

        let err = store.set("b", "1").unwrap_err();
        assert!(err.is_capacity());
        assert!(matches!(err, ArchiveError::QuotaExceeded { size: 11, quota: 10 }));
        assert_eq!(store.get("b").unwrap(), None);
    }

    #[test]
    fn test_memory_quota() {
        let store = MemoryKvStore::with_quota(4);
        store.set("k", "abcd").unwrap();
        assert!(store.set("k", "abcde").unwrap_err().is_capacity());
        assert_eq!(store.get("k").unwrap().as_deref(), Some("abcd"));
    }
}
