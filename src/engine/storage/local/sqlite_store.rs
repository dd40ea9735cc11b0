use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, Result};
use futures::future::BoxFuture;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::rusqlite::{params, OpenFlags, OptionalExtension};
use r2d2_sqlite::SqliteConnectionManager;
use serde_json::Value;

use crate::engine::storage::area::PersistenceStore;

/// SQLite-based persistence store.
///
/// One row per key. `set` writes all of its entries in a single transaction, so
/// a multi-key write lands completely or not at all.
pub struct SqliteStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteStore {
    /// Creates a new SQLite store with the specified database file path.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path.as_ref())
            .with_flags(
                OpenFlags::SQLITE_OPEN_READ_WRITE |
                    OpenFlags::SQLITE_OPEN_CREATE |
                    OpenFlags::SQLITE_OPEN_URI
            )
            .with_init(|c| {
                c.busy_timeout(std::time::Duration::from_millis(500))?;
                c.pragma_update(None, "journal_mode", "WAL")?;
                c.execute_batch(
                    "CREATE TABLE IF NOT EXISTS kv_store (
                        key TEXT NOT NULL PRIMARY KEY,
                        value TEXT NOT NULL,
                        updated_at INTEGER NOT NULL DEFAULT (strftime('%s','now'))
                    );"
                )?;
                Ok(())
            });

        let pool = Pool::builder()
            .max_size(4)
            .connection_timeout(std::time::Duration::from_secs(5))
            .build(manager)?;

        Ok(Self { pool })
    }

    /// Runs `f` with a pooled connection on the blocking thread pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PooledConnection<SqliteConnectionManager>) -> Result<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            f(&mut conn)
        })
        .await
        .map_err(|e| anyhow!("sqlite task failed: {e}"))?
    }
}

impl PersistenceStore for SqliteStore {
    fn get(&self, keys: Vec<String>) -> BoxFuture<'_, Result<HashMap<String, Value>>> {
        Box::pin(self.with_conn(move |conn| {
            let mut stmt = conn.prepare("SELECT value FROM kv_store WHERE key = ?1")?;
            let mut out = HashMap::new();
            for key in keys {
                let raw: Option<String> = stmt
                    .query_row(params![key], |row| row.get(0))
                    .optional()?;
                if let Some(raw) = raw {
                    out.insert(key, serde_json::from_str(&raw)?);
                }
            }
            Ok(out)
        }))
    }

    fn set(&self, items: HashMap<String, Value>) -> BoxFuture<'_, Result<()>> {
        Box::pin(self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            for (key, value) in &items {
                tx.execute(
                    "INSERT INTO kv_store(key, value) VALUES (?1, ?2)
                     ON CONFLICT(key) DO UPDATE
                     SET value=excluded.value, updated_at=strftime('%s','now')",
                    params![key, serde_json::to_string(value)?],
                )?;
            }
            tx.commit()?;
            Ok(())
        }))
    }

    fn remove(&self, keys: Vec<String>) -> BoxFuture<'_, Result<()>> {
        Box::pin(self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            for key in &keys {
                tx.execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
            }
            tx.commit()?;
            Ok(())
        }))
    }
}
