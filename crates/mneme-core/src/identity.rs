//! Storage identities
//!
//! An [`Identity`] names one persisted collection. Its key is derived from the
//! owning storage scope, the agent (or group) and the user (or chat):
//!
//! ```text
//! {scope}_{group-or-agent_name}_{user_id-or-chat_name-or-default}
//! ```
//!
//! The key format is persisted by every driver and must stay stable.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Reserved prefix marking a chat as temporary (never tracked)
pub const TEMPORARY_PREFIX: &str = "temp_";

/// Fallback segment used when neither user nor chat is set
const DEFAULT_SEGMENT: &str = "default";

/// Immutable storage identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    /// Scope assigned by the owning storage type (e.g. `chatHistory`)
    pub scope: String,
    /// Agent name
    pub agent_name: String,
    /// Group shared by several agents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Chat name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_name: Option<String>,
    /// User ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Identity {
    /// Create an identity for an agent within a scope
    #[must_use]
    pub fn new(scope: impl Into<String>, agent_name: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            agent_name: agent_name.into(),
            group: None,
            chat_name: None,
            user_id: None,
        }
    }

    /// Create an identity with a freshly minted temporary chat name
    #[must_use]
    pub fn temporary(scope: impl Into<String>, agent_name: impl Into<String>) -> Self {
        Self::new(scope, agent_name)
            .with_chat_name(format!("{}{}", TEMPORARY_PREFIX, Uuid::new_v4().simple()))
    }

    /// Set the group
    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Set the chat name
    #[must_use]
    pub fn with_chat_name(mut self, chat_name: impl Into<String>) -> Self {
        self.chat_name = Some(chat_name.into());
        self
    }

    /// Set the user ID
    #[must_use]
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Return a copy of this identity bound to another scope
    #[must_use]
    pub fn with_scope(&self, scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            ..self.clone()
        }
    }

    /// Derive the storage key
    #[must_use]
    pub fn key(&self) -> String {
        let owner = self.group.as_deref().unwrap_or(&self.agent_name);
        let subject = self
            .user_id
            .as_deref()
            .or(self.chat_name.as_deref())
            .unwrap_or(DEFAULT_SEGMENT);
        format!("{}_{}_{}", self.scope, owner, subject)
    }

    /// Whether the chat name carries the reserved temporary prefix
    #[must_use]
    pub fn is_temporary(&self) -> bool {
        self.is_temporary_with(TEMPORARY_PREFIX)
    }

    /// Whether the chat name starts with `prefix`
    ///
    /// An empty prefix never matches.
    #[must_use]
    pub fn is_temporary_with(&self, prefix: &str) -> bool {
        !prefix.is_empty()
            && self
                .chat_name
                .as_deref()
                .is_some_and(|name| name.starts_with(prefix))
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}
