use super::StorageDriver;
use crate::identity::Identity;
use crate::record::RawRecord;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// In-memory driver
///
/// Data lives as long as the driver instance and is not shared with other
/// instances. Useful as a fast primary in front of a durable backend, and in
/// tests.
#[derive(Debug, Default)]
pub struct MemoryDriver {
    entries: RwLock<HashMap<String, Vec<RawRecord>>>,
}

impl MemoryDriver {
    /// Create an empty memory driver
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether no key is held
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Whether a key is held for the identity
    pub async fn contains(&self, identity: &Identity) -> bool {
        self.entries.read().await.contains_key(&identity.key())
    }
}

#[async_trait]
impl StorageDriver for MemoryDriver {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn read(&self, identity: &Identity) -> Option<Vec<RawRecord>> {
        self.entries.read().await.get(&identity.key()).cloned()
    }

    async fn write(&self, identity: &Identity, records: &[RawRecord]) -> bool {
        let key = identity.key();
        debug!(key = %key, count = records.len(), "Records written to memory");
        self.entries.write().await.insert(key, records.to_vec());
        true
    }

    async fn remove(&self, identity: &Identity) -> bool {
        self.entries.write().await.remove(&identity.key());
        true
    }
}

#[cfg(test)]
mod tests;
