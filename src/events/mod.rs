//! Typed client event bus.
//!
//! Components never wire their own failure UI: the api layer publishes
//! classified failures, the change dispatcher publishes per-key hash
//! changes, and a single banner (or any other subscriber) reacts.
//!
//! - `types`: `ClientEvent`, `EventKind`, `EventFilter`, `ErrorResponse`
//! - `bus`: `EventBus` with synchronous handlers and bounded channel receivers

pub mod bus;
pub mod types;

pub use bus::{BusStats, EventBus, EventEnvelope, EventReceiver, SubscriptionId};
pub use types::{ClientEvent, ErrorResponse, EventFilter, EventKind};
