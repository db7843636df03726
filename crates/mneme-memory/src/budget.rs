//! Token budget and buffer health
//!
//! The budget reserves a share of the configured threshold as headroom:
//!
//! ```text
//! effective = round(threshold * (1 - buffer_fraction))
//!
//! current <= effective   Healthy   (no action)
//! current >  effective   Exceeded  (strategy runs)
//! ```

use crate::error::{Error, Result};
use mneme_core::Message;
use serde::{Deserialize, Serialize};

/// Health of a message buffer against its budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferHealth {
    /// At or under the effective threshold
    Healthy,
    /// Over the effective threshold
    Exceeded,
}

/// Configured token threshold with a safety buffer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenBudget {
    threshold: usize,
    buffer_fraction: f64,
}

impl TokenBudget {
    /// Create a budget
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] unless `0 <= buffer_fraction < 1`.
    pub fn new(threshold: usize, buffer_fraction: f64) -> Result<Self> {
        if !(0.0..1.0).contains(&buffer_fraction) {
            return Err(Error::Configuration(format!(
                "buffer_fraction must be in [0, 1), got {}",
                buffer_fraction
            )));
        }
        Ok(Self {
            threshold,
            buffer_fraction,
        })
    }

    /// Configured threshold
    #[must_use]
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Share of the threshold held back
    #[must_use]
    pub fn buffer_fraction(&self) -> f64 {
        self.buffer_fraction
    }

    /// Threshold after subtracting the buffer
    #[must_use]
    pub fn effective_threshold(&self) -> usize {
        // Rounded so 1000 * 0.8 is 800 and not 799
        (self.threshold as f64 * (1.0 - self.buffer_fraction)).round() as usize
    }

    /// Classify a token count
    #[must_use]
    pub fn health(&self, current_tokens: usize) -> BufferHealth {
        if current_tokens > self.effective_threshold() {
            BufferHealth::Exceeded
        } else {
            BufferHealth::Healthy
        }
    }
}

/// Rough token estimate for messages (about 4 characters per token)
///
/// For callers that have no model-reported count.
#[must_use]
pub fn estimate_tokens(messages: &[Message]) -> usize {
    messages
        .iter()
        // Role marker and separators cost a few tokens per message
        .map(|m| m.content.chars().count().div_ceil(4) + 4)
        .sum()
}
