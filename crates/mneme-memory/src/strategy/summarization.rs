use super::{is_healthy, PreservePredicate, TruncationStrategy, Window};
use crate::budget::TokenBudget;
use crate::compressor::Compressor;
use async_trait::async_trait;
use mneme_core::Message;
use std::sync::Arc;
use tracing::{debug, warn};

/// Replaces the oldest regular messages with one summary
#[derive(Clone)]
pub struct Summarization {
    window: Window,
    compressor: Arc<dyn Compressor>,
}

impl std::fmt::Debug for Summarization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Summarization")
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

impl Summarization {
    /// Keep the newest `keep` regular messages and summarize the rest
    #[must_use]
    pub fn new(keep: usize, compressor: Arc<dyn Compressor>) -> Self {
        Self {
            window: Window::new(keep),
            compressor,
        }
    }

    /// Replace the preserve rule
    #[must_use]
    pub fn with_preserve(mut self, preserve: PreservePredicate) -> Self {
        self.window = self.window.with_preserve(preserve);
        self
    }
}

/// Stand-in for a summary the compressor could not produce
pub(crate) fn placeholder_summary(omitted: usize) -> Message {
    Message::assistant(format!(
        "[Summary unavailable: {} earlier messages were removed]",
        omitted
    ))
    .with_name("summary")
}

#[async_trait]
impl TruncationStrategy for Summarization {
    fn name(&self) -> &'static str {
        "summarization"
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

        let split = match self.window.split(messages) {
            Ok(split) => split,
            Err(unchanged) => return unchanged,
        };

        let summary = match self.compressor.compress(&split.dropped).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!(error = %e, dropped = split.dropped.len(), "Summarization failed, inserting placeholder");
                placeholder_summary(split.dropped.len())
            }
        };

        debug!(
            summarized = split.dropped.len(),
            kept = split.tail.len(),
            "Summarization truncation"
        );
        split.assemble(Some(summary))
    }
}
