//! Per-session bundle of storages
//!
//! A [`Context`] owns one storage per scope for a session, tracks every
//! identity it hands out in an [`IdentityStorage`], and fans bulk operations
//! out to all of them. A failure in one storage never stops the others; each
//! outcome is listed in the returned [`ContextReport`].

use crate::error::{Error, Result};
use crate::events::EventBus;
use crate::identity::Identity;
use crate::identity_storage::IdentityStorage;
use crate::manager::StorageManager;
use crate::storage::{ManagedStorage, StorageKind};
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of a bulk operation on one storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageOutcome {
    /// Scope of the storage
    pub scope: String,
    /// Identity key of the storage
    pub key: String,
    /// Whether the operation fully succeeded
    pub success: bool,
    /// Error raised by the operation, if any
    pub error: Option<String>,
}

impl StorageOutcome {
    fn from_result(identity: &Identity, result: Result<bool>) -> Self {
        let (success, error) = match result {
            Ok(success) => (success, None),
            Err(e) => (false, Some(e.to_string())),
        };
        Self {
            scope: identity.scope.clone(),
            key: identity.key(),
            success,
            error,
        }
    }
}

/// Per-storage outcomes of a bulk operation, in registration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextReport {
    /// One entry per storage touched
    pub outcomes: Vec<StorageOutcome>,
}

impl ContextReport {
    /// Every storage succeeded
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| o.success)
    }

    /// Outcomes that did not succeed
    pub fn failures(&self) -> impl Iterator<Item = &StorageOutcome> {
        self.outcomes.iter().filter(|o| !o.success)
    }

    fn push(&mut self, identity: &Identity, result: Result<bool>) {
        let outcome = StorageOutcome::from_result(identity, result);
        if !outcome.success {
            warn!(key = %outcome.key, error = ?outcome.error, "Context operation failed for storage");
        }
        self.outcomes.push(outcome);
    }
}

/// Session-scoped registry of storages
pub struct Context {
    identity: Identity,
    manager: Arc<StorageManager>,
    storages: IndexMap<String, Box<dyn ManagedStorage>>,
    identities: IdentityStorage,
    events: Option<EventBus>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("identity", &self.identity.key())
            .field("scopes", &self.scopes())
            .finish()
    }
}

impl Context {
    /// Create a context for a session identity
    #[must_use]
    pub fn new(identity: Identity, manager: Arc<StorageManager>) -> Self {
        let identities = IdentityStorage::for_context(&identity, manager.clone());
        Self {
            identity,
            manager,
            storages: IndexMap::new(),
            identities,
            events: None,
        }
    }

    /// Publish notifications of every storage on an event bus
    #[must_use]
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.identities.set_events(Some(events.clone()));
        for storage in self.storages.values_mut() {
            storage.set_events(Some(events.clone()));
        }
        self.events = Some(events);
        self
    }

    /// Session identity
    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Driver chain shared by every storage
    #[must_use]
    pub fn manager(&self) -> &Arc<StorageManager> {
        &self.manager
    }

    /// Registered scopes, in registration order
    #[must_use]
    pub fn scopes(&self) -> Vec<&str> {
        self.storages.keys().map(String::as_str).collect()
    }

    /// Identity tracking storage
    pub fn identities(&mut self) -> &mut IdentityStorage {
        &mut self.identities
    }

    /// Register a storage under [`StorageKind::SCOPE`] and track its identity
    ///
    /// A storage already registered under the same scope is replaced.
    pub async fn register<S: StorageKind>(&mut self, mut storage: S) -> Result<&mut S> {
        if let Some(events) = &self.events {
            ManagedStorage::set_events(&mut storage, Some(events.clone()));
        }
        let identity = ManagedStorage::identity(&storage).clone();
        self.identities.add_identity(identity.clone()).await?;
        debug!(scope = S::SCOPE, key = %identity, "Storage registered");

        let boxed: Box<dyn ManagedStorage> = Box::new(storage);
        // Replacing keeps the original registration position
        self.storages.insert(S::SCOPE.to_string(), boxed);
        self.typed_slot::<S>()
    }

    /// Get the storage of type `S`, binding and registering it on first use
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `S::SCOPE` is already held by a
    /// storage of another type. That storage is left registered untouched.
    pub async fn make<S: StorageKind>(&mut self) -> Result<&mut S> {
        if self.storages.contains_key(S::SCOPE) {
            return self.typed_slot::<S>();
        }
        let storage = S::bind(&self.identity, self.manager.clone());
        self.register(storage).await
    }

    fn typed_slot<S: StorageKind>(&mut self) -> Result<&mut S> {
        self.get_mut::<S>().ok_or_else(|| {
            Error::Configuration(format!(
                "scope '{}' is registered with a different storage type",
                S::SCOPE
            ))
        })
    }

    /// Registered storage of type `S`
    #[must_use]
    pub fn get<S: StorageKind>(&self) -> Option<&S> {
        self.storages
            .get(S::SCOPE)
            .and_then(|storage| storage.as_any().downcast_ref::<S>())
    }

    /// Registered storage of type `S`, mutably
    pub fn get_mut<S: StorageKind>(&mut self) -> Option<&mut S> {
        self.storages
            .get_mut(S::SCOPE)
            .and_then(|storage| storage.as_any_mut().downcast_mut::<S>())
    }

    /// Save every registered storage, then the identity tracking
    pub async fn save(&mut self) -> ContextReport {
        let mut report = ContextReport::default();
        for storage in self.storages.values_mut() {
            let result = storage.save().await;
            report.push(storage.identity(), result);
        }
        let result = self.identities.save().await;
        report.push(self.identities.identity(), result);
        report
    }

    /// Re-fetch every registered storage and the identity tracking
    pub async fn read(&mut self) -> ContextReport {
        let mut report = ContextReport::default();
        for storage in self.storages.values_mut() {
            // A miss is not a failure here: it just means nothing was saved yet
            let result = storage.read().await.map(|_| true);
            report.push(storage.identity(), result);
        }
        let result = self.identities.read().await.map(|_| true);
        report.push(self.identities.identity(), result);
        report
    }

    /// Clear every registered storage in memory
    ///
    /// Identity tracking is kept so a later `purge_tracked` still finds the
    /// persisted keys.
    pub fn clear(&mut self) {
        for storage in self.storages.values_mut() {
            storage.clear();
        }
    }

    /// Remove every registered storage and the identity tracking
    pub async fn remove(&mut self) -> ContextReport {
        let mut report = ContextReport::default();
        for storage in self.storages.values_mut() {
            let result = Ok(storage.remove().await);
            report.push(storage.identity(), result);
        }
        let result = Ok(self.identities.remove().await);
        report.push(self.identities.identity(), result);
        report
    }

    /// Remove every tracked identity from the driver chain, then the tracking itself
    ///
    /// Unlike [`remove`](Self::remove) this also reaches identities tracked by
    /// earlier sessions that were never registered in this one.
    pub async fn purge_tracked(&mut self) -> Result<ContextReport> {
        let tracked = self.identities.identities().await?;
        let mut report = ContextReport::default();

        for storage in self.storages.values_mut() {
            let result = Ok(storage.remove().await);
            report.push(storage.identity(), result);
        }

        for identity in tracked {
            if self.storages.get(&identity.scope).is_some_and(|s| s.identity() == &identity) {
                continue;
            }
            let result = Ok(self.manager.remove(&identity).await);
            report.push(&identity, result);
        }

        let result = Ok(self.identities.remove().await);
        report.push(self.identities.identity(), result);

        info!(
            key = %self.identity,
            removed = report.outcomes.len(),
            "Purged tracked identities"
        );
        Ok(report)
    }
}
