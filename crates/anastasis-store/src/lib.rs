//! Persistent storage engine for the provider core (spec.md §4.1).
//!
//! A `sled`-backed database (`db`) wrapped by a typed facade
//! (`store::Store`) whose composite operations run as `sled`
//! transactions (`retry` maps their failures onto the store's error
//! type), plus an in-memory event bus (`events`) standing in for a
//! database notification channel.

pub mod db;
pub mod events;
pub mod records;
pub mod retry;
pub mod store;

pub use db::StateDb;
pub use events::{EventBus, EventSpec, ListenHandle, EVENT_TYPE_IBAN_TRANSFER};
pub use retry::map_transaction_error;
pub use store::Store;
