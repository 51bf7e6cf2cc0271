//! EMA client - view state, navigation and view loading
//!
//! This crate holds the client-side state layer of the EMA web application:
//!
//! - `hash_state`: the URL fragment as the single source of view parameters,
//!   plus per-key change dispatch
//! - `navigation`: the session-backed back-stack behind the "back" link
//! - `view`: one load/render/bind cycle per region, last start wins
//! - `api`: web api calls and HTTP failure classification
//! - `events`: the typed event bus shared by all of the above
//! - `notify`: error banner, field errors and transient notifications
//!
//! Browser primitives (session storage, location, render regions, the
//! network) sit behind traits in `host`, `view` and `api`, with in-memory
//! implementations for tests and headless hosts. [`AppContext`] wires the
//! pieces together for one page.

#![allow(clippy::new_without_default)]

pub mod api;
pub mod cancel;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod hash_state;
pub mod host;
pub mod logging;
pub mod navigation;
pub mod notify;
pub mod view;

pub use cancel::{CancellationSource, CancellationToken};
pub use config::ClientConfig;
pub use context::AppContext;
pub use error::{ApiError, ClientError};
pub use events::{ClientEvent, EventBus, EventKind};
pub use hash_state::{ChangeDispatcher, HashState, ViewParams};
pub use navigation::{BackLink, Navigation, NavigationEntry};
pub use view::{LoadCycle, LoadOutcome, ViewManager};

use std::sync::{Mutex, MutexGuard};

/// Lock a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
