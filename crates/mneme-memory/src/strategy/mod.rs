//! Truncation strategies
//!
//! Every strategy splits the buffer the same way:
//!
//! ```text
//! [ preserved ... ] [ dropped ... ] [ tail (last `keep` regular) ]
//! ```
//!
//! Preserved messages (system role by default) are never touched. The
//! strategies differ in what replaces `dropped`:
//! - [`SlidingWindow`]: nothing
//! - [`Summarization`]: one summary message
//! - [`Symbolization`]: one message of symbol lines, built batch by batch
//!
//! Strategies are stateless: the result depends only on the input, the
//! budget and their own settings.

mod sliding_window;
mod summarization;
mod symbolization;

pub use sliding_window::SlidingWindow;
pub use summarization::Summarization;
pub use symbolization::Symbolization;

use crate::budget::{BufferHealth, TokenBudget};
use async_trait::async_trait;
use mneme_core::{Message, MessageRole};
use std::sync::Arc;

/// Predicate marking messages that must never be evicted
pub type PreservePredicate = Arc<dyn Fn(&Message) -> bool + Send + Sync>;

/// Eviction policy over a message buffer
#[async_trait]
pub trait TruncationStrategy: Send + Sync {
    /// Strategy name (for logging and events)
    fn name(&self) -> &'static str;

    /// Shrink `messages` when `current_tokens` exceeds the budget
    ///
    /// Healthy input is returned unchanged. Never fails: compression errors
    /// are replaced by placeholder content.
    async fn truncate(
        &self,
        messages: Vec<Message>,
        budget: &TokenBudget,
        current_tokens: usize,
    ) -> Vec<Message>;
}

/// Preserve messages whose role is in `roles`
#[must_use]
pub fn preserve_roles(roles: Vec<MessageRole>) -> PreservePredicate {
    Arc::new(move |message: &Message| roles.contains(&message.role))
}

/// Keep count and preserve rule shared by every strategy
#[derive(Clone)]
pub struct Window {
    keep: usize,
    preserve: PreservePredicate,
}

impl std::fmt::Debug for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Window").field("keep", &self.keep).finish_non_exhaustive()
    }
}

impl Window {
    /// Keep the newest `keep` regular messages, preserving system messages
    #[must_use]
    pub fn new(keep: usize) -> Self {
        Self {
            keep,
            preserve: preserve_roles(vec![MessageRole::System]),
        }
    }

    /// Replace the preserve rule
    #[must_use]
    pub fn with_preserve(mut self, preserve: PreservePredicate) -> Self {
        self.preserve = preserve;
        self
    }

    /// Number of regular messages kept
    #[must_use]
    pub fn keep(&self) -> usize {
        self.keep
    }

    /// Split a buffer, or hand it back when nothing would be dropped
    pub(crate) fn split(&self, messages: Vec<Message>) -> std::result::Result<Split, Vec<Message>> {
        let regular_count = messages.iter().filter(|&m| !(self.preserve)(m)).count();
        if regular_count <= self.keep {
            return Err(messages);
        }

        let drop_count = regular_count - self.keep;
        let mut split = Split::default();
        for message in messages {
            if (self.preserve)(&message) {
                split.preserved.push(message);
            } else if split.dropped.len() < drop_count {
                split.dropped.push(message);
            } else {
                split.tail.push(message);
            }
        }
        Ok(split)
    }
}

/// A buffer split into preserved, dropped and retained messages
#[derive(Debug, Default)]
pub(crate) struct Split {
    pub preserved: Vec<Message>,
    pub dropped: Vec<Message>,
    pub tail: Vec<Message>,
}

impl Split {
    /// `preserved ++ [inserted] ++ tail`
    pub fn assemble(self, inserted: Option<Message>) -> Vec<Message> {
        let mut result = self.preserved;
        result.extend(inserted);
        result.extend(self.tail);
        result
    }
}

pub(crate) fn is_healthy(budget: &TokenBudget, current_tokens: usize) -> bool {
    budget.health(current_tokens) == BufferHealth::Healthy
}

#[cfg(test)]
mod tests;
