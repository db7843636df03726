//! Typed, lazily loaded storages
//!
//! A [`Storage`] binds one [`Identity`] to one [`StorageManager`] and keeps the
//! decoded records in memory:
//!
//! ```text
//! new ──► (first access) ensure_loaded ──► loaded
//!                                            │ add / remove_at / replace / clear
//!                                            ▼
//!                                          dirty ──► save ──► clean
//! remove ──► empty, unloaded, clean
//! ```
//!
//! `save` only writes when something changed, so calling it repeatedly is
//! cheap. Dirty tracking is in-process state: it says nothing about what
//! other processes did to the same key.

mod chat_history;
mod usage;

pub use chat_history::ChatHistory;
pub use usage::{Usage, UsageTotals};

use crate::error::{Error, Result};
use crate::events::{EventBus, StorageEvent};
use crate::identity::Identity;
use crate::manager::StorageManager;
use crate::record::{decode, encode, Record};
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;
use tracing::{debug, warn};

/// Lazy-loaded, dirty-tracked collection of typed records
pub struct Storage<T: Record> {
    identity: Identity,
    manager: Arc<StorageManager>,
    items: Vec<T>,
    loaded: bool,
    dirty: bool,
    events: Option<EventBus>,
}

impl<T: Record> std::fmt::Debug for Storage<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("key", &self.identity.key())
            .field("len", &self.items.len())
            .field("loaded", &self.loaded)
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl<T: Record> Storage<T> {
    /// Create an empty, unloaded storage
    #[must_use]
    pub fn new(identity: Identity, manager: Arc<StorageManager>) -> Self {
        Self {
            identity,
            manager,
            items: Vec::new(),
            loaded: false,
            dirty: false,
            events: None,
        }
    }

    /// Publish notifications on an event bus
    #[must_use]
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Replace the event bus
    pub fn set_events(&mut self, events: Option<EventBus>) {
        self.events = events;
    }

    /// Identity this storage is bound to
    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Driver chain this storage writes through
    #[must_use]
    pub fn manager(&self) -> &Arc<StorageManager> {
        &self.manager
    }

    /// Whether records were fetched (or set) since construction or `remove`
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Whether there are unsaved mutations
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn emit(&self, event: StorageEvent) {
        if let Some(events) = &self.events {
            events.publish(event);
        }
    }

    /// Fetch from the driver chain unless already loaded
    pub async fn ensure_loaded(&mut self) -> Result<()> {
        if !self.loaded {
            self.fetch().await?;
        }
        Ok(())
    }

    async fn fetch(&mut self) -> Result<bool> {
        let (items, found) = match self.manager.read(&self.identity).await {
            Some(raw) => (decode(raw)?, true),
            None => (Vec::new(), false),
        };

        self.items = items;
        self.loaded = true;
        debug!(key = %self.identity, found, count = self.items.len(), "Storage loaded");
        self.emit(StorageEvent::AfterLoad {
            key: self.identity.key(),
            found,
            len: self.items.len(),
        });
        Ok(found)
    }

    /// All records, loading them first if needed
    pub async fn items(&mut self) -> Result<&[T]> {
        self.ensure_loaded().await?;
        Ok(&self.items)
    }

    /// Number of records
    pub async fn len(&mut self) -> Result<usize> {
        self.ensure_loaded().await?;
        Ok(self.items.len())
    }

    /// Whether there are no records
    pub async fn is_empty(&mut self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Record at `index`
    pub async fn get(&mut self, index: usize) -> Result<Option<&T>> {
        self.ensure_loaded().await?;
        Ok(self.items.get(index))
    }

    /// Most recent record
    pub async fn last(&mut self) -> Result<Option<&T>> {
        self.ensure_loaded().await?;
        Ok(self.items.last())
    }

    /// Append a record
    pub async fn add(&mut self, record: T) -> Result<()> {
        self.ensure_loaded().await?;
        self.emit(StorageEvent::BeforeAdd {
            key: self.identity.key(),
            len: self.items.len(),
        });

        self.items.push(record);
        self.dirty = true;

        self.emit(StorageEvent::AfterAdd {
            key: self.identity.key(),
            len: self.items.len(),
        });
        Ok(())
    }

    /// Remove and return the record at `index`
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] if no record exists at `index`.
    pub async fn remove_at(&mut self, index: usize) -> Result<T> {
        self.ensure_loaded().await?;
        if index >= self.items.len() {
            return Err(Error::OutOfRange {
                index,
                len: self.items.len(),
            });
        }
        self.dirty = true;
        Ok(self.items.remove(index))
    }

    /// Replace every record
    ///
    /// Counts as a load: the previous persisted state is not fetched afterwards.
    pub fn replace(&mut self, records: Vec<T>) {
        self.items = records;
        self.loaded = true;
        self.dirty = true;
    }

    /// Drop every record in memory
    ///
    /// The persisted data is untouched until the next `save` (which writes an
    /// empty list) or `remove`.
    pub fn clear(&mut self) {
        self.items.clear();
        self.loaded = true;
        self.dirty = true;
    }

    /// Write pending changes through the driver chain
    ///
    /// Does nothing (and returns `true`) when there are no pending changes.
    /// Returns whether every driver accepted the write. The storage stays
    /// dirty only when no driver accepted it, so the next call retries.
    pub async fn save(&mut self) -> Result<bool> {
        if !self.dirty {
            return Ok(true);
        }

        let raw = encode(&self.items)?;
        self.emit(StorageEvent::BeforeSave {
            key: self.identity.key(),
            len: raw.len(),
        });

        let result = self.manager.write_detailed(&self.identity, &raw).await;
        if result.any_succeeded() {
            self.dirty = false;
        } else {
            warn!(key = %self.identity, "Every driver rejected the write; storage stays dirty");
        }

        let success = result.all_succeeded();
        self.emit(StorageEvent::AfterSave {
            key: self.identity.key(),
            success,
        });
        Ok(success)
    }

    /// Re-fetch from the driver chain, discarding in-memory state
    ///
    /// Returns whether any driver held data.
    pub async fn read(&mut self) -> Result<bool> {
        let found = self.fetch().await?;
        self.dirty = false;
        Ok(found)
    }

    /// Delete from every driver and reset to empty and unloaded
    ///
    /// Returns whether every driver removed the data.
    pub async fn remove(&mut self) -> bool {
        let removed = self.manager.remove(&self.identity).await;
        self.items.clear();
        self.loaded = false;
        self.dirty = false;
        removed
    }
}

/// A storage type with a fixed scope that a [`Context`](crate::Context) can create
///
/// ```
/// use mneme_core::{Storage, StorageKind};
///
/// #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
/// struct Note {
///     text: String,
/// }
///
/// struct Notes(Storage<Note>);
///
/// impl StorageKind for Notes {
///     const SCOPE: &'static str = "notes";
///     type Record = Note;
///
///     fn from_storage(storage: Storage<Note>) -> Self {
///         Self(storage)
///     }
///     fn storage(&self) -> &Storage<Note> {
///         &self.0
///     }
///     fn storage_mut(&mut self) -> &mut Storage<Note> {
///         &mut self.0
///     }
/// }
/// ```
pub trait StorageKind: Send + Sync + 'static {
    /// Scope assigned to identities of this storage
    const SCOPE: &'static str;

    /// Record type held by the storage
    type Record: Record;

    /// Wrap a bound storage
    fn from_storage(storage: Storage<Self::Record>) -> Self
    where
        Self: Sized;

    /// Underlying storage
    fn storage(&self) -> &Storage<Self::Record>;

    /// Underlying storage, mutably
    fn storage_mut(&mut self) -> &mut Storage<Self::Record>;

    /// Bind a new storage to `identity` rescoped to [`Self::SCOPE`]
    fn bind(identity: &Identity, manager: Arc<StorageManager>) -> Self
    where
        Self: Sized,
    {
        Self::from_storage(Storage::new(identity.with_scope(Self::SCOPE), manager))
    }
}

/// Type-erased view of a storage, used by [`Context`](crate::Context) fan-out
#[async_trait]
pub trait ManagedStorage: Send + Sync {
    /// Identity of the storage
    fn identity(&self) -> &Identity;

    /// Whether there are unsaved mutations
    fn is_dirty(&self) -> bool;

    /// Replace the event bus
    fn set_events(&mut self, events: Option<EventBus>);

    /// See [`Storage::save`]
    async fn save(&mut self) -> Result<bool>;

    /// See [`Storage::read`]
    async fn read(&mut self) -> Result<bool>;

    /// See [`Storage::clear`]
    fn clear(&mut self);

    /// See [`Storage::remove`]
    async fn remove(&mut self) -> bool;

    /// Downcast support
    fn as_any(&self) -> &dyn Any;

    /// Downcast support
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

#[async_trait]
impl<S: StorageKind> ManagedStorage for S {
    fn identity(&self) -> &Identity {
        self.storage().identity()
    }

    fn is_dirty(&self) -> bool {
        self.storage().is_dirty()
    }

    fn set_events(&mut self, events: Option<EventBus>) {
        self.storage_mut().set_events(events);
    }

    async fn save(&mut self) -> Result<bool> {
        self.storage_mut().save().await
    }

    async fn read(&mut self) -> Result<bool> {
        self.storage_mut().read().await
    }

    fn clear(&mut self) {
        self.storage_mut().clear();
    }

    async fn remove(&mut self) -> bool {
        self.storage_mut().remove().await
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
