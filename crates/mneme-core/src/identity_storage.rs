//! Tracking of the identities a context has touched
//!
//! The [`IdentityStorage`] is itself a storage (scope `"context"`) whose
//! records are identities. It lets a caller find and purge everything a
//! context ever persisted, across sessions.

use crate::error::Result;
use crate::identity::Identity;
use crate::manager::StorageManager;
use crate::storage::{Storage, StorageKind};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tracing::debug;

/// Persisted set of identities, deduplicated by key
#[derive(Debug)]
pub struct IdentityStorage(Storage<Identity>);

impl StorageKind for IdentityStorage {
    const SCOPE: &'static str = "context";
    type Record = Identity;

    fn from_storage(storage: Storage<Identity>) -> Self {
        Self(storage)
    }

    fn storage(&self) -> &Storage<Identity> {
        &self.0
    }

    fn storage_mut(&mut self) -> &mut Storage<Identity> {
        &mut self.0
    }
}

impl Deref for IdentityStorage {
    type Target = Storage<Identity>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for IdentityStorage {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl IdentityStorage {
    /// Tracking storage for the context owned by `identity`
    #[must_use]
    pub fn for_context(identity: &Identity, manager: Arc<StorageManager>) -> Self {
        Self::bind(identity, manager)
    }

    /// Track an identity
    ///
    /// Temporary identities are never tracked, and an identity whose key is
    /// already tracked is ignored. Returns whether the identity was added.
    pub async fn add_identity(&mut self, identity: Identity) -> Result<bool> {
        if identity.is_temporary() {
            debug!(key = %identity, "Skipping temporary identity");
            return Ok(false);
        }

        let key = identity.key();
        if self.0.items().await?.iter().any(|known| known.key() == key) {
            return Ok(false);
        }

        self.0.add(identity).await?;
        Ok(true)
    }

    /// Whether an identity with the same key is tracked
    pub async fn contains(&mut self, identity: &Identity) -> Result<bool> {
        let key = identity.key();
        Ok(self.0.items().await?.iter().any(|known| known.key() == key))
    }

    /// Every tracked identity, in insertion order
    pub async fn identities(&mut self) -> Result<Vec<Identity>> {
        Ok(self.0.items().await?.to_vec())
    }

    /// Tracked identities with a given scope
    pub async fn identities_by_scope(&mut self, scope: &str) -> Result<Vec<Identity>> {
        Ok(self
            .0
            .items()
            .await?
            .iter()
            .filter(|identity| identity.scope == scope)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests;
