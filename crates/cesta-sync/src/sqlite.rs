//! SQLite-backed remote store.
//!
//! A single `shopping_items` table stands in for the hosted backend.
//! Writes go through the same commit-then-echo sequence a realtime server
//! uses: the row is committed, the connection lock is released, and the
//! change event goes out to every live feed.

use std::path::Path;
use std::sync::Mutex;

use chrono::{TimeZone, Utc};
use rusqlite::{params, Connection};
use tokio::sync::mpsc::UnboundedReceiver;
use uuid::Uuid;

use cesta_core::{ChangeEvent, ItemId, ItemMutation, ShoppingItem};

use crate::remote::{RemoteError, RemoteStore, Subscribers};

/// Remote store on a local SQLite file.
pub struct SqliteRemote {
    conn: Mutex<Connection>,
    subscribers: Subscribers,
}

impl SqliteRemote {
    /// Open (or create) the database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RemoteError> {
        let conn = Connection::open(path)
            .map_err(|e| RemoteError::Backend(format!("open: {}", e)))?;
        Self::init_with_connection(conn)
    }

    /// Create an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, RemoteError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| RemoteError::Backend(format!("open_in_memory: {}", e)))?;
        Self::init_with_connection(conn)
    }

    fn init_with_connection(conn: Connection) -> Result<Self, RemoteError> {
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;

            CREATE TABLE IF NOT EXISTS shopping_items (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                quantity INTEGER NOT NULL DEFAULT 1,
                category TEXT NOT NULL,
                completed INTEGER NOT NULL DEFAULT 0,
                emoji TEXT,
                created_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_shopping_items_created
                ON shopping_items(created_at);
            ",
        )
        .map_err(|e| RemoteError::Backend(format!("init_schema: {}", e)))?;

        Ok(Self {
            conn: Mutex::new(conn),
            subscribers: Subscribers::default(),
        })
    }

    fn row_to_item(row: &rusqlite::Row) -> Result<ShoppingItem, RemoteError> {
        let id_str: String = row
            .get(0)
            .map_err(|e| RemoteError::Backend(format!("row id: {}", e)))?;
        let id = Uuid::parse_str(&id_str)
            .map_err(|e| RemoteError::Backend(format!("parse id: {}", e)))?;
        let name: String = row
            .get(1)
            .map_err(|e| RemoteError::Backend(format!("row name: {}", e)))?;
        let quantity: u32 = row
            .get(2)
            .map_err(|e| RemoteError::Backend(format!("row quantity: {}", e)))?;
        let category: String = row
            .get(3)
            .map_err(|e| RemoteError::Backend(format!("row category: {}", e)))?;
        let completed: bool = row
            .get(4)
            .map_err(|e| RemoteError::Backend(format!("row completed: {}", e)))?;
        let emoji: Option<String> = row
            .get(5)
            .map_err(|e| RemoteError::Backend(format!("row emoji: {}", e)))?;
        let created_ms: i64 = row
            .get(6)
            .map_err(|e| RemoteError::Backend(format!("row created_at: {}", e)))?;

        let created_at = Utc
            .timestamp_millis_opt(created_ms)
            .single()
            .unwrap_or_else(Utc::now);

        Ok(ShoppingItem {
            id,
            name,
            quantity,
            category,
            completed,
            emoji,
            created_at,
        })
    }

    fn get_row(conn: &Connection, id: ItemId) -> Result<ShoppingItem, RemoteError> {
        let result = conn.query_row(
            "SELECT id, name, quantity, category, completed, emoji, created_at
             FROM shopping_items WHERE id = ?1",
            params![id.to_string()],
            |row| Ok(Self::row_to_item(row)),
        );

        match result {
            Ok(item) => item,
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(RemoteError::NotFound(id)),
            Err(e) => Err(RemoteError::Backend(format!("get row: {}", e))),
        }
    }
}

impl RemoteStore for SqliteRemote {
    async fn fetch_all(&self) -> Result<Vec<ShoppingItem>, RemoteError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RemoteError::Backend(e.to_string()))?;
        let mut stmt = conn
            .prepare(
                "SELECT id, name, quantity, category, completed, emoji, created_at
                 FROM shopping_items ORDER BY created_at ASC, rowid ASC",
            )
            .map_err(|e| RemoteError::Backend(format!("prepare fetch_all: {}", e)))?;
        let rows = stmt
            .query_map([], |row| Ok(Self::row_to_item(row)))
            .map_err(|e| RemoteError::Backend(format!("query fetch_all: {}", e)))?;

        let mut items = Vec::new();
        for row in rows {
            let item = row.map_err(|e| RemoteError::Backend(format!("row: {}", e)))?;
            items.push(item?);
        }
        Ok(items)
    }

    async fn insert(&self, item: &ShoppingItem) -> Result<(), RemoteError> {
        {
            let conn = self
                .conn
                .lock()
                .map_err(|e| RemoteError::Backend(e.to_string()))?;
            conn.execute(
                "INSERT INTO shopping_items (id, name, quantity, category, completed, emoji, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    item.id.to_string(),
                    item.name,
                    item.quantity,
                    item.category,
                    item.completed as i32,
                    item.emoji,
                    item.created_at.timestamp_millis(),
                ],
            )
            .map_err(|e| RemoteError::Backend(format!("insert: {}", e)))?;
        }
        self.subscribers.emit(&ChangeEvent::Inserted(item.clone()));
        Ok(())
    }

    async fn update(&self, id: ItemId, mutations: &[ItemMutation]) -> Result<(), RemoteError> {
        let updated = {
            let conn = self
                .conn
                .lock()
                .map_err(|e| RemoteError::Backend(e.to_string()))?;
            let id_str = id.to_string();

            // Check row exists
            let exists: bool = conn
                .query_row(
                    "SELECT COUNT(*) FROM shopping_items WHERE id = ?1",
                    params![&id_str],
                    |row| row.get::<_, i64>(0),
                )
                .map(|c| c > 0)
                .map_err(|e| RemoteError::Backend(format!("check exists: {}", e)))?;

            if !exists {
                return Err(RemoteError::NotFound(id));
            }

            for mutation in mutations {
                match mutation {
                    ItemMutation::SetName(name) => {
                        conn.execute(
                            "UPDATE shopping_items SET name = ?1 WHERE id = ?2",
                            params![name, &id_str],
                        )
                        .map_err(|e| RemoteError::Backend(format!("set name: {}", e)))?;
                    }
                    ItemMutation::SetQuantity(quantity) => {
                        conn.execute(
                            "UPDATE shopping_items SET quantity = ?1 WHERE id = ?2",
                            params![quantity, &id_str],
                        )
                        .map_err(|e| RemoteError::Backend(format!("set quantity: {}", e)))?;
                    }
                    ItemMutation::SetCategory(category) => {
                        conn.execute(
                            "UPDATE shopping_items SET category = ?1 WHERE id = ?2",
                            params![category, &id_str],
                        )
                        .map_err(|e| RemoteError::Backend(format!("set category: {}", e)))?;
                    }
                    ItemMutation::SetEmoji(emoji) => {
                        conn.execute(
                            "UPDATE shopping_items SET emoji = ?1 WHERE id = ?2",
                            params![emoji, &id_str],
                        )
                        .map_err(|e| RemoteError::Backend(format!("set emoji: {}", e)))?;
                    }
                    ItemMutation::SetCompleted(completed) => {
                        conn.execute(
                            "UPDATE shopping_items SET completed = ?1 WHERE id = ?2",
                            params![*completed as i32, &id_str],
                        )
                        .map_err(|e| RemoteError::Backend(format!("set completed: {}", e)))?;
                    }
                }
            }

            Self::get_row(&conn, id)?
        };
        self.subscribers.emit(&ChangeEvent::Updated(updated));
        Ok(())
    }

    async fn delete(&self, id: ItemId) -> Result<(), RemoteError> {
        {
            let conn = self
                .conn
                .lock()
                .map_err(|e| RemoteError::Backend(e.to_string()))?;
            let rows = conn
                .execute(
                    "DELETE FROM shopping_items WHERE id = ?1",
                    params![id.to_string()],
                )
                .map_err(|e| RemoteError::Backend(format!("delete: {}", e)))?;

            if rows == 0 {
                return Err(RemoteError::NotFound(id));
            }
        }
        self.subscribers.emit(&ChangeEvent::Deleted(id));
        Ok(())
    }

    fn subscribe(&self) -> UnboundedReceiver<ChangeEvent> {
        self.subscribers.subscribe()
    }
}
