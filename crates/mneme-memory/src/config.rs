//! Truncation configuration
//!
//! Read from the `[truncation]` table of the layered Mneme configuration:
//!
//! ```toml
//! [truncation]
//! strategy = "summarization"
//! threshold = 100000
//! buffer_fraction = 0.2
//! keep_count = 20
//! batch_size = 10
//! preserve_roles = ["system"]
//! ```

use crate::budget::TokenBudget;
use crate::compressor::Compressor;
use crate::error::{Error, Result};
use crate::strategy::{
    preserve_roles, SlidingWindow, Summarization, Symbolization, TruncationStrategy,
};
use mneme_core::MessageRole;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Which strategy to build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Drop the oldest messages
    #[default]
    SlidingWindow,
    /// Replace the oldest messages with one summary
    Summarization,
    /// Replace the oldest messages with symbol lines
    Symbolization,
}

/// Budget and strategy settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TruncationConfig {
    /// Strategy to build
    pub strategy: StrategyKind,
    /// Token threshold
    pub threshold: usize,
    /// Share of the threshold held back, in [0, 1)
    pub buffer_fraction: f64,
    /// Regular messages kept
    pub keep_count: usize,
    /// Messages per compressor call (symbolization)
    pub batch_size: usize,
    /// Roles never evicted
    pub preserve_roles: Vec<MessageRole>,
}

impl Default for TruncationConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::SlidingWindow,
            threshold: 100_000,
            buffer_fraction: 0.2,
            keep_count: 20,
            batch_size: 10,
            preserve_roles: vec![MessageRole::System],
        }
    }
}

impl TruncationConfig {
    /// Load the `[truncation]` table
    pub fn load() -> Result<Self> {
        Ok(mneme_core::load_section("truncation")?)
    }

    /// Budget described by this configuration
    pub fn budget(&self) -> Result<TokenBudget> {
        TokenBudget::new(self.threshold, self.buffer_fraction)
    }
}

/// Build the configured strategy
///
/// # Errors
///
/// Returns [`Error::Configuration`] when a compressing strategy is selected
/// without a compressor, or when the batch size is zero.
pub fn build_strategy(
    config: &TruncationConfig,
    compressor: Option<Arc<dyn Compressor>>,
) -> Result<Box<dyn TruncationStrategy>> {
    let preserve = preserve_roles(config.preserve_roles.clone());
    let require_compressor = || {
        compressor.clone().ok_or_else(|| {
            Error::Configuration(format!(
                "{:?} strategy requires a compressor",
                config.strategy
            ))
        })
    };

    let strategy: Box<dyn TruncationStrategy> = match config.strategy {
        StrategyKind::SlidingWindow => {
            Box::new(SlidingWindow::new(config.keep_count).with_preserve(preserve))
        }
        StrategyKind::Summarization => Box::new(
            Summarization::new(config.keep_count, require_compressor()?).with_preserve(preserve),
        ),
        StrategyKind::Symbolization => Box::new(
            Symbolization::new(config.keep_count, config.batch_size, require_compressor()?)?
                .with_preserve(preserve),
        ),
    };
    Ok(strategy)
}
