//! Driver chain orchestration
//!
//! [`StorageManager`] holds an ordered chain of drivers, primary first:
//! - **read** returns the first driver result that holds data. A successful
//!   fallback read is *not* copied back into the drivers that missed.
//! - **write** and **remove** are sent to every driver, even after one fails.
//!   This gives redundancy, not atomicity.
//!
//! # Consistency limitations
//!
//! There is no locking or transactional isolation across the drivers of one
//! chain, nor across managers in different processes that target the same
//! identity. Two concurrent saves of the same key race per backend and the
//! last write wins on each backend independently, so drivers can end up
//! holding different versions.

use crate::driver::{make_driver, DriverConfig, StorageDriver};
use crate::error::{Error, Result};
use crate::identity::Identity;
use crate::record::RawRecord;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Per-driver outcome of a fan-out write or remove
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanOutResult {
    /// Names of drivers that succeeded, in chain order
    pub succeeded: Vec<&'static str>,
    /// Names of drivers that failed, in chain order
    pub failed: Vec<&'static str>,
}

impl FanOutResult {
    /// Every driver succeeded
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    /// At least one driver succeeded
    #[must_use]
    pub fn any_succeeded(&self) -> bool {
        !self.succeeded.is_empty()
    }
}

/// Storage section of the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Driver chain, primary first
    pub drivers: Vec<DriverConfig>,
}

/// Ordered chain of storage drivers
#[derive(Clone)]
pub struct StorageManager {
    drivers: Vec<Arc<dyn StorageDriver>>,
}

impl std::fmt::Debug for StorageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageManager")
            .field("drivers", &self.driver_names())
            .finish()
    }
}

impl StorageManager {
    /// Create a manager over a driver chain
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the chain is empty.
    pub fn new(drivers: Vec<Arc<dyn StorageDriver>>) -> Result<Self> {
        if drivers.is_empty() {
            return Err(Error::Configuration(
                "storage manager requires at least one driver".to_string(),
            ));
        }
        Ok(Self { drivers })
    }

    /// Build the chain described by a configuration
    pub async fn from_config(config: &StorageConfig) -> Result<Self> {
        let mut drivers = Vec::with_capacity(config.drivers.len());
        for driver_config in &config.drivers {
            drivers.push(make_driver(driver_config).await?);
        }
        Self::new(drivers)
    }

    /// Driver names in chain order
    #[must_use]
    pub fn driver_names(&self) -> Vec<&'static str> {
        self.drivers.iter().map(|d| d.name()).collect()
    }

    /// Read from the first driver that holds data
    pub async fn read(&self, identity: &Identity) -> Option<Vec<RawRecord>> {
        for (position, driver) in self.drivers.iter().enumerate() {
            if let Some(records) = driver.read(identity).await {
                debug!(
                    key = %identity,
                    driver = driver.name(),
                    position,
                    count = records.len(),
                    "Storage read hit"
                );
                return Some(records);
            }
        }
        debug!(key = %identity, "Storage read missed every driver");
        None
    }

    /// Write to every driver; `true` only if all succeeded
    pub async fn write(&self, identity: &Identity, records: &[RawRecord]) -> bool {
        self.write_detailed(identity, records).await.all_succeeded()
    }

    /// Write to every driver and report each outcome
    pub async fn write_detailed(&self, identity: &Identity, records: &[RawRecord]) -> FanOutResult {
        let mut result = FanOutResult::default();
        for driver in &self.drivers {
            if driver.write(identity, records).await {
                result.succeeded.push(driver.name());
            } else {
                result.failed.push(driver.name());
            }
        }

        if !result.all_succeeded() {
            warn!(key = %identity, failed = ?result.failed, "Storage write failed on some drivers");
        }
        result
    }

    /// Remove from every driver; `true` only if all succeeded
    pub async fn remove(&self, identity: &Identity) -> bool {
        self.remove_detailed(identity).await.all_succeeded()
    }

    /// Remove from every driver and report each outcome
    pub async fn remove_detailed(&self, identity: &Identity) -> FanOutResult {
        let mut result = FanOutResult::default();
        for driver in &self.drivers {
            if driver.remove(identity).await {
                result.succeeded.push(driver.name());
            } else {
                result.failed.push(driver.name());
            }
        }

        if !result.all_succeeded() {
            warn!(key = %identity, failed = ?result.failed, "Storage remove failed on some drivers");
        }
        result
    }
}
