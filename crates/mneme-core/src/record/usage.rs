use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Token usage reported for one model call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Model that served the call
    pub model: String,
    /// Prompt tokens
    pub input_tokens: u64,
    /// Completion tokens
    pub output_tokens: u64,
    /// When the usage was recorded
    pub recorded_at: DateTime<Utc>,
}

impl UsageRecord {
    /// Create a usage record stamped with the current time
    #[must_use]
    pub fn new(model: impl Into<String>, input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            model: model.into(),
            input_tokens,
            output_tokens,
            recorded_at: Utc::now(),
        }
    }

    /// Input plus output tokens
    #[must_use]
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}
