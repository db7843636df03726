//! SQLite storage driver
//!
//! The relational backend. One row per identity key holds the JSON-encoded
//! record list; the scope is kept in its own column for inspection and
//! per-scope cleanup.
//!
//! # Usage
//!
//! ```no_run
//! use mneme_core::driver::SqliteDriver;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Default location: ~/.mneme/storage.db
//! let driver = SqliteDriver::new_default().await?;
//!
//! // Or specify a custom path
//! let driver = SqliteDriver::new("/path/to/storage.db").await?;
//! # Ok(())
//! # }
//! ```

use super::StorageDriver;
use crate::error::{Error, Result};
use crate::identity::Identity;
use crate::record::RawRecord;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// SQLite storage driver
pub struct SqliteDriver {
    pool: SqlitePool,
}

impl SqliteDriver {
    /// Open (or create) a database at the specified path
    ///
    /// # Errors
    ///
    /// Returns error if database creation or schema setup fails.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::Backend(format!("Failed to create database directory: {}", e))
            })?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
            .map_err(|e| Error::Configuration(format!("Invalid SQLite path: {}", e)))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| Error::Backend(format!("Failed to connect to SQLite: {}", e)))?;

        let driver = Self { pool };
        driver.init_schema().await?;

        info!(path = %path.display(), "SQLite storage driver initialized");
        Ok(driver)
    }

    /// Open a database at the default location (~/.mneme/storage.db)
    pub async fn new_default() -> Result<Self> {
        let path = Self::default_path()?;
        Self::new(&path).await
    }

    /// Get the default database path
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Configuration("Could not determine home directory".to_string()))?;
        Ok(home.join(".mneme").join("storage.db"))
    }

    /// Initialize the database schema
    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS storage (
                key TEXT PRIMARY KEY,
                scope TEXT NOT NULL,
                data TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Backend(format!("Failed to create storage table: {}", e)))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_storage_scope ON storage(scope)")
            .execute(&self.pool)
            .await
            .map_err(|e| Error::Backend(format!("Failed to create index: {}", e)))?;

        debug!("SQLite storage schema initialized");
        Ok(())
    }

    /// Check database health
    pub async fn health_check(&self) -> Result<bool> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Error::Backend(format!("Health check failed: {}", e)))?;
        Ok(true)
    }

    /// List the keys stored under a scope
    pub async fn keys_in_scope(&self, scope: &str) -> Result<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT key FROM storage WHERE scope = ? ORDER BY key")
                .bind(scope)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| Error::Backend(format!("Failed to list keys: {}", e)))?;
        Ok(rows.into_iter().map(|(k,)| k).collect())
    }

    async fn try_read(&self, key: &str) -> std::result::Result<Option<Vec<RawRecord>>, String> {
        let row: Option<(String,)> = sqlx::query_as("SELECT data FROM storage WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| format!("Failed to read records: {}", e))?;

        match row {
            Some((data,)) => serde_json::from_str(&data)
                .map(Some)
                .map_err(|e| format!("Failed to deserialize records: {}", e)),
            None => Ok(None),
        }
    }

    async fn try_write(
        &self,
        identity: &Identity,
        records: &[RawRecord],
    ) -> std::result::Result<(), String> {
        let data = serde_json::to_string(records)
            .map_err(|e| format!("Failed to serialize records: {}", e))?;
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO storage (key, scope, data, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                data = excluded.data,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(identity.key())
        .bind(&identity.scope)
        .bind(&data)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to save records: {}", e))?;
        Ok(())
    }
}

#[async_trait]
impl StorageDriver for SqliteDriver {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn read(&self, identity: &Identity) -> Option<Vec<RawRecord>> {
        let key = identity.key();
        match self.try_read(&key).await {
            Ok(records) => {
                debug!(key = %key, found = records.is_some(), "Records loaded from SQLite");
                records
            }
            Err(e) => {
                warn!(key = %key, error = %e, "SQLite read failed");
                None
            }
        }
    }

    async fn write(&self, identity: &Identity, records: &[RawRecord]) -> bool {
        match self.try_write(identity, records).await {
            Ok(()) => {
                debug!(key = %identity, count = records.len(), "Records saved to SQLite");
                true
            }
            Err(e) => {
                warn!(key = %identity, error = %e, "SQLite write failed");
                false
            }
        }
    }

    async fn remove(&self, identity: &Identity) -> bool {
        let result = sqlx::query("DELETE FROM storage WHERE key = ?")
            .bind(identity.key())
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) => {
                debug!(key = %identity, deleted = done.rows_affected() > 0, "Records deleted from SQLite");
                true
            }
            Err(e) => {
                warn!(key = %identity, error = %e, "SQLite remove failed");
                false
            }
        }
    }
}
