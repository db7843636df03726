//! Storage drivers
//!
//! A driver persists the raw records of one [`Identity`] in a single backend.
//! Drivers are chained by the [`StorageManager`](crate::StorageManager):
//! - [`MemoryDriver`]: instance-local map (tests, front cache)
//! - [`CacheDriver`]: process-wide cache shared by every instance
//! - [`FileDriver`]: one JSON file per key
//! - [`RedisDriver`]: Redis string per key
//! - [`SqliteDriver`]: relational table, the default durable backend
//!
//! # Failure contract
//!
//! Drivers never propagate backend errors. A failed read is reported as
//! `None` (the manager falls through to the next driver), a failed write or
//! remove as `false`. The error itself is logged at `warn` level.

mod cache;
mod file;
mod memory;
mod redis_store;
mod sqlite_store;

pub use cache::CacheDriver;
pub use file::FileDriver;
pub use memory::MemoryDriver;
pub use redis_store::RedisDriver;
pub use sqlite_store::SqliteDriver;

use crate::error::{Error, Result};
use crate::identity::Identity;
use crate::record::RawRecord;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Single-backend read/write/remove contract
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StorageDriver: Send + Sync {
    /// Backend name (for logging)
    fn name(&self) -> &'static str;

    /// Read the records stored for an identity
    ///
    /// `None` means nothing is stored; `Some(vec![])` means the collection
    /// was explicitly saved empty.
    async fn read(&self, identity: &Identity) -> Option<Vec<RawRecord>>;

    /// Replace the records stored for an identity
    async fn write(&self, identity: &Identity, records: &[RawRecord]) -> bool;

    /// Delete whatever is stored for an identity
    ///
    /// Returns `true` when the backend no longer holds the key, including
    /// when it never did.
    async fn remove(&self, identity: &Identity) -> bool;
}

/// Driver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Backend type: "memory", "cache", "file", "redis" or "sqlite"
    pub kind: String,

    /// Redis URL (redis only)
    #[serde(default)]
    pub url: Option<String>,

    /// File directory (file) or database path (sqlite)
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Key prefix (redis) or namespace (cache)
    #[serde(default)]
    pub prefix: Option<String>,

    /// Entry expiry in seconds (cache and redis)
    #[serde(default)]
    pub ttl_seconds: Option<u64>,
}

impl DriverConfig {
    /// Config for a backend kind with every option left at its default
    #[must_use]
    pub fn kind(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            url: None,
            path: None,
            prefix: None,
            ttl_seconds: None,
        }
    }
}

/// Build a driver from configuration
///
/// # Errors
///
/// Returns [`Error::Configuration`] for an unknown kind or missing options,
/// and [`Error::Backend`] when the backend cannot be opened.
pub async fn make_driver(config: &DriverConfig) -> Result<Arc<dyn StorageDriver>> {
    let driver: Arc<dyn StorageDriver> = match config.kind.as_str() {
        "memory" => Arc::new(MemoryDriver::new()),
        "cache" => {
            let namespace = config.prefix.as_deref().unwrap_or(cache::DEFAULT_NAMESPACE);
            Arc::new(CacheDriver::with_options(namespace, config.ttl_seconds))
        }
        "file" => {
            let directory = match &config.path {
                Some(path) => path.clone(),
                None => FileDriver::default_directory()?,
            };
            Arc::new(FileDriver::new(directory))
        }
        "redis" => {
            let url = config.url.as_deref().ok_or_else(|| {
                Error::Configuration("redis driver requires 'url'".to_string())
            })?;
            let prefix = config.prefix.as_deref().unwrap_or(redis_store::DEFAULT_PREFIX);
            Arc::new(RedisDriver::with_options(url, prefix, config.ttl_seconds)?)
        }
        "sqlite" => {
            let store = match &config.path {
                Some(path) => SqliteDriver::new(path).await?,
                None => SqliteDriver::new_default().await?,
            };
            Arc::new(store)
        }
        other => {
            return Err(Error::Configuration(format!(
                "Unknown storage driver: '{}'. Use 'memory', 'cache', 'file', 'redis' or 'sqlite'.",
                other
            )))
        }
    };
    Ok(driver)
}
