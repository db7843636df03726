use super::{is_healthy, PreservePredicate, TruncationStrategy, Window};
use crate::budget::TokenBudget;
use crate::compressor::Compressor;
use crate::error::{Error, Result};
use async_trait::async_trait;
use mneme_core::Message;
use std::sync::Arc;
use tracing::{debug, warn};

/// Replaces the oldest regular messages with compact symbol lines
///
/// Dropped messages go to the compressor `batch_size` at a time, which
/// bounds both the prompt size and the number of calls.
#[derive(Clone)]
pub struct Symbolization {
    window: Window,
    compressor: Arc<dyn Compressor>,
    batch_size: usize,
}

impl std::fmt::Debug for Symbolization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Symbolization")
            .field("window", &self.window)
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

impl Symbolization {
    /// Keep the newest `keep` regular messages and symbolize the rest
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `batch_size` is zero.
    pub fn new(keep: usize, batch_size: usize, compressor: Arc<dyn Compressor>) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::Configuration(
                "symbolization batch_size must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            window: Window::new(keep),
            compressor,
            batch_size,
        })
    }

    /// Replace the preserve rule
    #[must_use]
    pub fn with_preserve(mut self, preserve: PreservePredicate) -> Self {
        self.window = self.window.with_preserve(preserve);
        self
    }

    /// Messages sent per compressor call
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

#[async_trait]
impl TruncationStrategy for Symbolization {
    fn name(&self) -> &'static str {
        "symbolization"
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

        let mut lines = Vec::new();
        let mut failed_batches = 0usize;
        for batch in split.dropped.chunks(self.batch_size) {
            match self.compressor.compress(batch).await {
                Ok(symbols) => {
                    let before = lines.len();
                    lines.extend(
                        symbols
                            .content
                            .lines()
                            .map(str::trim)
                            .filter(|line| !line.is_empty())
                            .map(str::to_string),
                    );
                    if lines.len() == before {
                        warn!(batch = batch.len(), "Symbolization batch produced no lines, inserting placeholder");
                        lines.push(format!("[{} messages removed]", batch.len()));
                    }
                }
                Err(e) => {
                    warn!(error = %e, batch = batch.len(), "Symbolization batch failed, inserting placeholder");
                    failed_batches += 1;
                    lines.push(format!("[{} messages removed]", batch.len()));
                }
            }
        }

        debug!(
            symbolized = split.dropped.len(),
            lines = lines.len(),
            failed_batches,
            "Symbolization truncation"
        );
        let symbols = Message::assistant(lines.join("\n")).with_name("symbols");
        split.assemble(Some(symbols))
    }
}
