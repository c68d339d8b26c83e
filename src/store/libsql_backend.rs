//! libSQL flag backend — durable lifetime.
//!
//! Supports local file and in-memory databases. Values are stored as JSON
//! text so the `FlagValue` shape survives a round trip.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};

use crate::error::StorageError;
use crate::store::migrations;
use crate::store::traits::{FlagBackend, FlagValue};

/// libSQL-backed flag storage.
///
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::Unavailable(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StorageError::Unavailable(format!("Failed to open libSQL database: {e}")))?;

        let backend = Self::from_database(db).await?;
        info!(path = %path.display(), "Durable flag store opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, StorageError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                StorageError::Unavailable(format!("Failed to create in-memory database: {e}"))
            })?;
        Self::from_database(db).await
    }

    async fn from_database(db: LibSqlDatabase) -> Result<Self, StorageError> {
        let conn = db
            .connect()
            .map_err(|e| StorageError::Unavailable(format!("Failed to create connection: {e}")))?;
        migrations::run_migrations(&conn).await?;
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

fn decode(key: &str, raw: &str) -> Option<FlagValue> {
    match serde_json::from_str::<FlagValue>(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(key, error = %e, "Dropping undecodable flag value");
            None
        }
    }
}

#[async_trait]
impl FlagBackend for LibSqlBackend {
    fn name(&self) -> &str {
        "libsql"
    }

    async fn get(&self, key: &str) -> Result<Option<FlagValue>, StorageError> {
        let mut rows = self
            .conn()
            .query("SELECT value FROM flags WHERE key = ?1", params![key])
            .await
            .map_err(|e| StorageError::Query(format!("get: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let raw: String = row
                    .get(0)
                    .map_err(|e| StorageError::Query(format!("get: {e}")))?;
                Ok(decode(key, &raw))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(StorageError::Query(format!("get: {e}"))),
        }
    }

    async fn set(&self, key: &str, value: &FlagValue) -> Result<(), StorageError> {
        let now = Utc::now().to_rfc3339();
        let raw =
            serde_json::to_string(value).map_err(|e| StorageError::Serialization(e.to_string()))?;

        self.conn()
            .execute(
                "INSERT INTO flags (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT (key) DO UPDATE SET value = ?2, updated_at = ?3",
                params![key, raw, now],
            )
            .await
            .map_err(|e| StorageError::Query(format!("set: {e}")))?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, StorageError> {
        let count = self
            .conn()
            .execute("DELETE FROM flags WHERE key = ?1", params![key])
            .await
            .map_err(|e| StorageError::Query(format!("remove: {e}")))?;
        Ok(count > 0)
    }

    async fn clear(&self) -> Result<usize, StorageError> {
        let count = self
            .conn()
            .execute("DELETE FROM flags", ())
            .await
            .map_err(|e| StorageError::Query(format!("clear: {e}")))?;
        Ok(count as usize)
    }

    async fn entries(&self) -> Result<BTreeMap<String, FlagValue>, StorageError> {
        let mut rows = self
            .conn()
            .query("SELECT key, value FROM flags ORDER BY key", ())
            .await
            .map_err(|e| StorageError::Query(format!("entries: {e}")))?;

        let mut out = BTreeMap::new();
        loop {
            match rows.next().await {
                Ok(Some(row)) => {
                    let key: String = row
                        .get(0)
                        .map_err(|e| StorageError::Query(format!("entries: {e}")))?;
                    let raw: String = row
                        .get(1)
                        .map_err(|e| StorageError::Query(format!("entries: {e}")))?;
                    if let Some(value) = decode(&key, &raw) {
                        out.insert(key, value);
                    }
                }
                Ok(None) => break,
                Err(e) => return Err(StorageError::Query(format!("entries: {e}"))),
            }
        }
        Ok(out)
    }
}
