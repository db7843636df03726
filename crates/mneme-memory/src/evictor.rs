//! Budget enforcement on a chat history
//!
//! The [`Evictor`] is what an agent loop calls after each turn with the token
//! count reported by the model. When the count is over budget it rewrites the
//! history in memory; persisting the result is left to the next `save`.

use crate::budget::{estimate_tokens, BufferHealth, TokenBudget};
use crate::compressor::Compressor;
use crate::config::{build_strategy, TruncationConfig};
use crate::error::Result;
use crate::strategy::TruncationStrategy;
use mneme_core::{ChatHistory, EventBus, StorageEvent};
use std::sync::Arc;
use tracing::{debug, info};

/// What an eviction pass did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruncationOutcome {
    /// Buffer health before the pass
    pub health: BufferHealth,
    /// Strategy that ran (or would have run)
    pub strategy: &'static str,
    /// Message count before the pass
    pub before: usize,
    /// Message count after the pass
    pub after: usize,
    /// Whether the history was rewritten
    pub changed: bool,
}

/// Applies a truncation strategy to chat histories over budget
pub struct Evictor {
    budget: TokenBudget,
    strategy: Box<dyn TruncationStrategy>,
    events: Option<EventBus>,
}

impl std::fmt::Debug for Evictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evictor")
            .field("budget", &self.budget)
            .field("strategy", &self.strategy.name())
            .finish()
    }
}

impl Evictor {
    /// Create an evictor
    #[must_use]
    pub fn new(budget: TokenBudget, strategy: Box<dyn TruncationStrategy>) -> Self {
        Self {
            budget,
            strategy,
            events: None,
        }
    }

    /// Build budget and strategy from configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`](crate::Error::Configuration) for an
    /// invalid budget, a zero batch size, or a compressing strategy without
    /// a compressor.
    pub fn from_config(
        config: &TruncationConfig,
        compressor: Option<Arc<dyn Compressor>>,
    ) -> Result<Self> {
        Ok(Self::new(config.budget()?, build_strategy(config, compressor)?))
    }

    /// Publish `AfterTruncation` events on a bus
    #[must_use]
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Budget in use
    #[must_use]
    pub fn budget(&self) -> &TokenBudget {
        &self.budget
    }

    /// Run the strategy on `history` if `current_tokens` is over budget
    pub async fn apply(
        &self,
        history: &mut ChatHistory,
        current_tokens: usize,
    ) -> Result<TruncationOutcome> {
        let health = self.budget.health(current_tokens);
        let messages = history.messages().await?;
        let before = messages.len();

        if health == BufferHealth::Healthy {
            debug!(key = %history.identity(), current_tokens, "Buffer healthy, no eviction");
            return Ok(TruncationOutcome {
                health,
                strategy: self.strategy.name(),
                before,
                after: before,
                changed: false,
            });
        }

        let truncated = self
            .strategy
            .truncate(messages.clone(), &self.budget, current_tokens)
            .await;
        let after = truncated.len();
        let changed = truncated != messages;
        if changed {
            history.replace(truncated);
        }

        info!(
            key = %history.identity(),
            strategy = self.strategy.name(),
            current_tokens,
            effective_threshold = self.budget.effective_threshold(),
            before,
            after,
            "Evicted chat history"
        );
        if let Some(events) = &self.events {
            events.publish(StorageEvent::AfterTruncation {
                key: history.identity().key(),
                strategy: self.strategy.name().to_string(),
                before,
                after,
            });
        }

        Ok(TruncationOutcome {
            health,
            strategy: self.strategy.name(),
            before,
            after,
            changed,
        })
    }

    /// Like [`apply`](Self::apply) with an estimated token count
    pub async fn apply_estimated(&self, history: &mut ChatHistory) -> Result<TruncationOutcome> {
        let current_tokens = estimate_tokens(history.items().await?);
        self.apply(history, current_tokens).await
    }
}
