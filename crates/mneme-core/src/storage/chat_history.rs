use super::{Storage, StorageKind};
use crate::error::Result;
use crate::record::{Message, MessageRole};
use std::ops::{Deref, DerefMut};

/// Conversation messages of one identity
#[derive(Debug)]
pub struct ChatHistory(Storage<Message>);

impl StorageKind for ChatHistory {
    const SCOPE: &'static str = "chatHistory";
    type Record = Message;

    fn from_storage(storage: Storage<Message>) -> Self {
        Self(storage)
    }

    fn storage(&self) -> &Storage<Message> {
        &self.0
    }

    fn storage_mut(&mut self) -> &mut Storage<Message> {
        &mut self.0
    }
}

impl Deref for ChatHistory {
    type Target = Storage<Message>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for ChatHistory {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl ChatHistory {
    /// Append a message
    pub async fn add_message(&mut self, message: Message) -> Result<()> {
        self.0.add(message).await
    }

    /// Append a user message
    pub async fn add_user(&mut self, content: impl Into<String>) -> Result<()> {
        self.0.add(Message::user(content)).await
    }

    /// Append an assistant message
    pub async fn add_assistant(&mut self, content: impl Into<String>) -> Result<()> {
        self.0.add(Message::assistant(content)).await
    }

    /// Append a system message
    pub async fn add_system(&mut self, content: impl Into<String>) -> Result<()> {
        self.0.add(Message::system(content)).await
    }

    /// Every message in order
    pub async fn messages(&mut self) -> Result<Vec<Message>> {
        Ok(self.0.items().await?.to_vec())
    }

    /// Messages sent with a given role
    pub async fn messages_by_role(&mut self, role: MessageRole) -> Result<Vec<Message>> {
        Ok(self
            .0
            .items()
            .await?
            .iter()
            .filter(|m| m.role == role)
            .cloned()
            .collect())
    }
}
