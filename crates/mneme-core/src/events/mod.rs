//! Storage notifications
//!
//! Storages and the evictor publish [`StorageEvent`]s on an optional
//! [`EventBus`]. Delivery is fire-and-forget: nothing in the core waits on a
//! subscriber or reads a reply, and a missing bus is equivalent to one with
//! no subscribers.

mod bus;
mod types;

pub use bus::EventBus;
pub use types::StorageEvent;
