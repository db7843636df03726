use serde::Serialize;

/// Events emitted around storage operations.
///
/// Events carry keys and counts only, never record contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageEvent {
    /// A record is about to be appended
    BeforeAdd {
        /// Storage key
        key: String,
        /// Number of records before the append
        len: usize,
    },
    /// A record was appended
    AfterAdd {
        /// Storage key
        key: String,
        /// Number of records after the append
        len: usize,
    },
    /// A dirty storage is about to be written
    BeforeSave {
        /// Storage key
        key: String,
        /// Number of records being written
        len: usize,
    },
    /// A write went through the driver chain
    AfterSave {
        /// Storage key
        key: String,
        /// Whether every driver accepted the write
        success: bool,
    },
    /// Records were fetched from the driver chain
    AfterLoad {
        /// Storage key
        key: String,
        /// Whether any driver held data
        found: bool,
        /// Number of records loaded
        len: usize,
    },
    /// A truncation strategy rewrote a history
    AfterTruncation {
        /// Storage key
        key: String,
        /// Strategy name
        strategy: String,
        /// Number of records before truncation
        before: usize,
        /// Number of records after truncation
        after: usize,
    },
}

impl StorageEvent {
    /// Storage key the event refers to
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::BeforeAdd { key, .. }
            | Self::AfterAdd { key, .. }
            | Self::BeforeSave { key, .. }
            | Self::AfterSave { key, .. }
            | Self::AfterLoad { key, .. }
            | Self::AfterTruncation { key, .. } => key,
        }
    }
}
