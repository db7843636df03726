//! Process-wide cache driver
//!
//! Every [`CacheDriver`] in the process shares one map, so storages created by
//! different contexts (or different managers) observe each other's writes.
//! Entries are namespaced and may expire.

use super::StorageDriver;
use crate::identity::Identity;
use crate::record::RawRecord;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::LazyLock;
use std::time::{Duration, Instant};
use tracing::debug;

/// Namespace used when none is configured
pub(crate) const DEFAULT_NAMESPACE: &str = "mneme";

/// Writes between sweeps of expired entries
pub(crate) const SWEEP_INTERVAL: usize = 64;

static PROCESS_CACHE: LazyLock<DashMap<String, CacheEntry>> = LazyLock::new(DashMap::new);
static WRITES_SINCE_SWEEP: AtomicUsize = AtomicUsize::new(0);

#[derive(Debug, Clone)]
struct CacheEntry {
    records: Vec<RawRecord>,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Process cache driver
#[derive(Debug, Clone)]
pub struct CacheDriver {
    namespace: String,
    ttl: Option<Duration>,
}

impl Default for CacheDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheDriver {
    /// Create a driver in the default namespace without expiry
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(DEFAULT_NAMESPACE, None)
    }

    /// Create a driver with a namespace and an optional TTL in seconds
    #[must_use]
    pub fn with_options(namespace: &str, ttl_seconds: Option<u64>) -> Self {
        Self {
            namespace: namespace.to_string(),
            ttl: ttl_seconds.map(Duration::from_secs),
        }
    }

    fn build_key(&self, identity: &Identity) -> String {
        format!("{}:{}", self.namespace, identity.key())
    }

    /// Drop every entry of this driver's namespace, returning how many were removed
    pub fn clear_namespace(&self) -> usize {
        let prefix = format!("{}:", self.namespace);
        let keys: Vec<String> = PROCESS_CACHE
            .iter()
            .filter(|entry| entry.key().starts_with(&prefix))
            .map(|entry| entry.key().clone())
            .collect();
        keys.iter()
            .filter(|key| PROCESS_CACHE.remove(key.as_str()).is_some())
            .count()
    }

    /// Drop every expired entry in the process cache, returning how many were removed
    pub fn purge_expired() -> usize {
        let now = Instant::now();
        let before = PROCESS_CACHE.len();
        PROCESS_CACHE.retain(|_, entry| !entry.is_expired(now));
        let removed = before.saturating_sub(PROCESS_CACHE.len());
        if removed > 0 {
            debug!(removed, "Expired cache entries swept");
        }
        removed
    }
}

#[async_trait]
impl StorageDriver for CacheDriver {
    fn name(&self) -> &'static str {
        "cache"
    }

    async fn read(&self, identity: &Identity) -> Option<Vec<RawRecord>> {
        let key = self.build_key(identity);
        let now = Instant::now();

        let expired = match PROCESS_CACHE.get(&key) {
            None => return None,
            Some(entry) if entry.is_expired(now) => true,
            Some(entry) => return Some(entry.records.clone()),
        };

        if expired {
            PROCESS_CACHE.remove_if(&key, |_, entry| entry.is_expired(now));
            debug!(key = %key, "Expired cache entry evicted");
        }
        None
    }

    async fn write(&self, identity: &Identity, records: &[RawRecord]) -> bool {
        let entry = CacheEntry {
            records: records.to_vec(),
            expires_at: self.ttl.map(|ttl| Instant::now() + ttl),
        };
        PROCESS_CACHE.insert(self.build_key(identity), entry);

        if WRITES_SINCE_SWEEP.fetch_add(1, Ordering::Relaxed) + 1 >= SWEEP_INTERVAL {
            WRITES_SINCE_SWEEP.store(0, Ordering::Relaxed);
            Self::purge_expired();
        }
        true
    }

    async fn remove(&self, identity: &Identity) -> bool {
        PROCESS_CACHE.remove(&self.build_key(identity));
        true
    }
}

#[cfg(test)]
mod tests;
