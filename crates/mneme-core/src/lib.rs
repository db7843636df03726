//! Mneme Core - Session storage for agent memory
//!
//! This crate provides the persistence layer an agent runtime keeps its
//! per-session memory in, including:
//! - Identity: deterministic keys naming each persisted collection
//! - Drivers: memory, process cache, file, Redis and SQLite backends
//! - Manager: ordered driver chain with read fallback and write fan-out
//! - Storage: lazy-loaded, dirty-tracked typed collections
//! - Context: per-session registry with identity tracking and bulk operations
//! - Events: fire-and-forget storage notifications

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod context;
pub mod driver;
pub mod error;
pub mod events;
pub mod identity;
pub mod identity_storage;
pub mod manager;
pub mod record;
pub mod storage;

pub use self::config::{load_config, load_section, load_section_from_str, DEFAULT_CONFIG};
pub use context::{Context, ContextReport, StorageOutcome};
pub use driver::{
    make_driver, CacheDriver, DriverConfig, FileDriver, MemoryDriver, RedisDriver, SqliteDriver,
    StorageDriver,
};
pub use error::{Error, Result};
pub use events::{EventBus, StorageEvent};
pub use identity::{Identity, TEMPORARY_PREFIX};
pub use identity_storage::IdentityStorage;
pub use manager::{FanOutResult, StorageConfig, StorageManager};
pub use record::{decode, encode, Message, MessageRole, RawRecord, Record, UsageRecord};
pub use storage::{ChatHistory, ManagedStorage, Storage, StorageKind, Usage, UsageTotals};
