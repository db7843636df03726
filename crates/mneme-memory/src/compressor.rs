//! Compression of evicted messages
//!
//! [`Compressor`] is what the summarizing strategies call. [`LlmCompressor`]
//! implements it on top of any [`CompletionBackend`], which is the only
//! point where a model provider is involved.

use crate::error::{Error, Result};
use async_trait::async_trait;
use mneme_core::{Message, MessageRole};
use std::sync::Arc;
use tracing::debug;

/// Instructions for a paragraph summary
pub const SUMMARY_PROMPT: &str = "You compress conversation history. Summarize the \
conversation below in one concise paragraph. Keep decisions, facts, names, open \
questions and anything the assistant promised to do. Do not add commentary.";

/// Instructions for symbol lines
pub const SYMBOLS_PROMPT: &str = "You compress conversation history. For each message \
below write one short line of the form `role: key point`. Use terse keywords, no full \
sentences. Output only the lines.";

/// Turns a run of messages into a single message
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Compressor: Send + Sync {
    /// Compress `messages`; failures are recovered by the caller
    async fn compress(&self, messages: &[Message]) -> Result<Message>;
}

/// Text completion provider
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Complete a conversation and return the generated text
    async fn complete(&self, messages: Vec<Message>) -> Result<String>;
}

/// Output shape requested from the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMode {
    /// One paragraph
    Summary,
    /// One line per message
    Symbols,
}

impl CompressionMode {
    fn prompt(self) -> &'static str {
        match self {
            Self::Summary => SUMMARY_PROMPT,
            Self::Symbols => SYMBOLS_PROMPT,
        }
    }

    fn record_name(self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Symbols => "symbols",
        }
    }
}

/// Compressor backed by a language model
#[derive(Clone)]
pub struct LlmCompressor {
    backend: Arc<dyn CompletionBackend>,
    mode: CompressionMode,
}

impl std::fmt::Debug for LlmCompressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmCompressor")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl LlmCompressor {
    /// Compressor producing summaries
    #[must_use]
    pub fn summary(backend: Arc<dyn CompletionBackend>) -> Self {
        Self {
            backend,
            mode: CompressionMode::Summary,
        }
    }

    /// Compressor producing symbol lines
    #[must_use]
    pub fn symbols(backend: Arc<dyn CompletionBackend>) -> Self {
        Self {
            backend,
            mode: CompressionMode::Symbols,
        }
    }

    /// Requested output shape
    #[must_use]
    pub fn mode(&self) -> CompressionMode {
        self.mode
    }
}

/// Render messages as a plain transcript
#[must_use]
pub fn format_transcript(messages: &[Message]) -> String {
    let mut output = String::new();
    for message in messages {
        match message.role {
            MessageRole::System => output.push_str("System"),
            MessageRole::User => output.push_str("User"),
            MessageRole::Assistant => output.push_str("Assistant"),
            MessageRole::Tool => {
                output.push_str("Tool result");
                if let Some(id) = &message.tool_call_id {
                    output.push_str(" (id: ");
                    output.push_str(id);
                    output.push(')');
                }
            }
        }
        output.push_str(": ");
        output.push_str(&message.content);
        output.push_str("\n\n");
    }
    output
}

#[async_trait]
impl Compressor for LlmCompressor {
    async fn compress(&self, messages: &[Message]) -> Result<Message> {
        if messages.is_empty() {
            return Err(Error::Compression("nothing to compress".to_string()));
        }

        let prompt = vec![
            Message::system(self.mode.prompt()),
            Message::user(format_transcript(messages)),
        ];
        let text = self.backend.complete(prompt).await?;
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::Compression("backend returned empty text".to_string()));
        }

        debug!(
            mode = ?self.mode,
            input = messages.len(),
            output_chars = text.len(),
            "Compressed messages"
        );
        Ok(Message::assistant(text).with_name(self.mode.record_name()))
    }
}

#[cfg(test)]
mod tests;
