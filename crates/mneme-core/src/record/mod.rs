//! Typed records and their raw codec
//!
//! Every storage holds an ordered list of typed records. Drivers never see the
//! typed form: they move [`RawRecord`] values (JSON objects) produced by
//! [`encode`] and consumed by [`decode`].

mod codec;
mod message;
mod usage;

pub use codec::{decode, encode, RawRecord};
pub use message::{Message, MessageRole};
pub use usage::UsageRecord;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// A value that can be held by a storage
///
/// Implemented for every serde type that is cheap to move between tasks.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

impl<T> Record for T where T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

#[cfg(test)]
mod tests;
