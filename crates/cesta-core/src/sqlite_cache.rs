//! SQLite-backed local cache.
//!
//! One key-value table on a local file; values are the JSON payloads the
//! store writes. The connection sits behind a mutex, so the cache is
//! shareable across threads.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;

use crate::cache::LocalCache;
use crate::error::StoreError;

/// SQLite key-value cache.
pub struct SqliteCache {
    conn: Mutex<Connection>,
}

impl SqliteCache {
    /// Open (or create) a cache database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)
            .map_err(|e| StoreError::Storage(format!("open: {}", e)))?;
        Self::init_with_connection(conn)
    }

    /// Create an in-memory cache (for testing).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::Storage(format!("open_in_memory: {}", e)))?;
        Self::init_with_connection(conn)
    }

    fn init_with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;

            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            ",
        )
        .map_err(|e| StoreError::Storage(format!("init_schema: {}", e)))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl LocalCache for SqliteCache {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        let result = conn.query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
            row.get(0)
        });

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Storage(format!("get: {}", e))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        conn.execute(
            "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))",
            [key, value],
        )
        .map_err(|e| StoreError::Storage(format!("set: {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ITEMS_KEY;

    #[test]
    fn get_of_missing_key_is_none() {
        let cache = SqliteCache::open_in_memory().unwrap();
        assert_eq!(cache.get(ITEMS_KEY).unwrap(), None);
    }

    #[test]
    fn set_then_get_round_trips() {
        let cache = SqliteCache::open_in_memory().unwrap();
        cache.set(ITEMS_KEY, "[]").unwrap();
        assert_eq!(cache.get(ITEMS_KEY).unwrap().as_deref(), Some("[]"));

        cache.set(ITEMS_KEY, "[1,2]").unwrap();
        assert_eq!(cache.get(ITEMS_KEY).unwrap().as_deref(), Some("[1,2]"));
    }

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.db");

        {
            let cache = SqliteCache::open(&path).unwrap();
            cache.set("greeting", "hello").unwrap();
        }

        let cache = SqliteCache::open(&path).unwrap();
        assert_eq!(cache.get("greeting").unwrap().as_deref(), Some("hello"));
    }
}
