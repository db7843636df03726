use super::{is_healthy, PreservePredicate, TruncationStrategy, Window};
use crate::budget::TokenBudget;
use async_trait::async_trait;
use mneme_core::Message;
use tracing::debug;

/// Drops the oldest regular messages
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    window: Window,
}

impl SlidingWindow {
    /// Keep the newest `keep` regular messages
    #[must_use]
    pub fn new(keep: usize) -> Self {
        Self {
            window: Window::new(keep),
        }
    }

    /// Replace the preserve rule
    #[must_use]
    pub fn with_preserve(mut self, preserve: PreservePredicate) -> Self {
        self.window = self.window.with_preserve(preserve);
        self
    }
}

#[async_trait]
impl TruncationStrategy for SlidingWindow {
    fn name(&self) -> &'static str {
        "sliding_window"
    }

    async fn truncate(
        &self,
        messages: Vec<Message>,
        budget: &TokenBudget,
        current_tokens: usize,
    ) -> Vec<Message> {
        if is_healthy(budget, current_tokens) {
            return messages;
        }

        match self.window.split(messages) {
            Ok(split) => {
                debug!(
                    dropped = split.dropped.len(),
                    kept = split.tail.len(),
                    preserved = split.preserved.len(),
                    "Sliding window truncation"
                );
                split.assemble(None)
            }
            Err(unchanged) => unchanged,
        }
    }
}
