//! Web api access.
//!
//! - `transport`: the `Transport` seam, the reqwest implementation and a
//!   scripted one for tests
//! - `client`: `ApiClient` for `<api_root>/<route>` JSON calls
//! - `classify`: status to event/redirect/notification mapping
//! - `cache`: memoized results for rarely changing lists
//! - `legacy`: the older pages' ajax wrapper
//!
//! Every failure is classified once, here, and announced on the
//! [`EventBus`](crate::events::EventBus); callers only see the `ApiError`.

pub mod cache;
pub mod classify;
pub mod client;
pub mod legacy;
pub mod transport;

pub use cache::ResponseCache;
pub use classify::{
    classify, classify_legacy, safe_redirect_url, Classification, Failure,
};
pub use client::{ApiClient, HASH_STATE_HEADER};
pub use legacy::LegacyAjax;
pub use transport::{
    ApiRequest, ApiResponse, Method, ReqwestTransport, ScriptedTransport, Transport,
};
