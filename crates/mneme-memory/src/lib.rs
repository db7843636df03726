//! Mneme Memory - Context eviction for chat histories
//!
//! This crate keeps a conversation under a model's token budget:
//! - Budget: effective threshold and buffer health
//! - Strategies: sliding window, summarization and symbolization
//! - Compressor: the boundary to a completion provider
//! - Evictor: applies a strategy to a stored chat history

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod budget;
pub mod compressor;
pub mod config;
pub mod error;
pub mod evictor;
pub mod strategy;

pub use budget::{estimate_tokens, BufferHealth, TokenBudget};
pub use compressor::{
    format_transcript, CompletionBackend, CompressionMode, Compressor, LlmCompressor,
};
pub use self::config::{build_strategy, StrategyKind, TruncationConfig};
pub use error::{Error, Result};
pub use evictor::{Evictor, TruncationOutcome};
pub use strategy::{
    preserve_roles, PreservePredicate, SlidingWindow, Summarization, Symbolization,
    TruncationStrategy, Window,
};
