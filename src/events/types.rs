//! Client event types.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::api::{ApiResponse, Method};
use crate::notify::TransientNotification;

/// Everything the client announces on the bus.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// 400 - the body usually carries field-level validation errors.
    BadRequest(ErrorResponse),

    /// 401 or 302 - the session is gone or the user lacks access.
    NotAuthorized(ErrorResponse),

    /// 404 for the given url.
    NotFound { url: String },

    /// 405 for the given method and url.
    MethodNotAllowed { method: Method, url: String },

    /// 503 - maintenance.
    ServiceUnavailable(ErrorResponse),

    /// Any other failure with a response (or status 0).
    Error(ErrorResponse),

    /// A failure with nothing to show but a generic message.
    UnknownError,

    /// One hash state key changed; `value` is `None` when it was removed.
    HashChanged { key: String, value: Option<Value> },

    /// A transient notification should be shown.
    Notification(TransientNotification),
}

impl ClientEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ClientEvent::BadRequest(_) => EventKind::BadRequest,
            ClientEvent::NotAuthorized(_) => EventKind::NotAuthorized,
            ClientEvent::NotFound { .. } => EventKind::NotFound,
            ClientEvent::MethodNotAllowed { .. } => EventKind::MethodNotAllowed,
            ClientEvent::ServiceUnavailable(_) => EventKind::ServiceUnavailable,
            ClientEvent::Error(_) => EventKind::Error,
            ClientEvent::UnknownError => EventKind::UnknownError,
            ClientEvent::HashChanged { .. } => EventKind::HashChanged,
            ClientEvent::Notification(_) => EventKind::Notification,
        }
    }

    /// Wire-style name, e.g. `notFound` or `hashchange-scenario`.
    pub fn name(&self) -> Cow<'static, str> {
        match self {
            ClientEvent::HashChanged { key, .. } => Cow::Owned(format!("hashchange-{}", key)),
            other => Cow::Borrowed(other.kind().as_str()),
        }
    }
}

/// Fieldless mirror of [`ClientEvent`] for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum EventKind {
    BadRequest,
    NotAuthorized,
    NotFound,
    MethodNotAllowed,
    ServiceUnavailable,
    Error,
    UnknownError,
    HashChanged,
    Notification,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::BadRequest => "badRequest",
            EventKind::NotAuthorized => "notAuthorized",
            EventKind::NotFound => "notFound",
            EventKind::MethodNotAllowed => "methodNotAllowed",
            EventKind::ServiceUnavailable => "serviceUnavailable",
            EventKind::Error => "error",
            EventKind::UnknownError => "unknownError",
            EventKind::HashChanged => "hashchange",
            EventKind::Notification => "notification",
        }
    }

    /// Kinds produced by failed api calls.
    pub fn is_failure(&self) -> bool {
        !matches!(self, EventKind::HashChanged | EventKind::Notification)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which events a subscriber receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventFilter {
    All,
    Kinds(Vec<EventKind>),
    /// `HashChanged` events for one key only.
    HashKey(String),
}

impl EventFilter {
    pub fn kind(kind: EventKind) -> Self {
        EventFilter::Kinds(vec![kind])
    }

    pub fn hash_key(key: impl Into<String>) -> Self {
        EventFilter::HashKey(key.into())
    }

    /// Every classified api failure.
    pub fn failures() -> Self {
        EventFilter::Kinds(vec![
            EventKind::BadRequest,
            EventKind::NotAuthorized,
            EventKind::NotFound,
            EventKind::MethodNotAllowed,
            EventKind::ServiceUnavailable,
            EventKind::Error,
            EventKind::UnknownError,
        ])
    }

    pub fn matches(&self, event: &ClientEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Kinds(kinds) => kinds.contains(&event.kind()),
            EventFilter::HashKey(wanted) => {
                matches!(event, ClientEvent::HashChanged { key, .. } if key == wanted)
            }
        }
    }
}

/// A failed response as seen by failure subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    /// HTTP status; `0` when no response was received.
    pub status: u16,
    pub method: Method,
    pub url: String,
    /// Response headers with lowercase names.
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
}

impl ErrorResponse {
    pub fn from_response(method: Method, url: impl Into<String>, response: &ApiResponse) -> Self {
        Self {
            status: response.status,
            method,
            url: url.into(),
            headers: response.headers.clone(),
            body: if response.body.is_empty() {
                None
            } else {
                Some(response.body.clone())
            },
        }
    }

    /// A request that never got a response.
    pub fn network(method: Method, url: impl Into<String>) -> Self {
        Self {
            status: 0,
            method,
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    /// Case-insensitive header lookup; empty values count as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// The body parsed as JSON, when the response declares a JSON body.
    pub fn json_body(&self) -> Option<Value> {
        let content_type = self.header("content-type")?;
        if !content_type.starts_with("application/json") {
            return None;
        }
        serde_json::from_str(self.body.as_deref()?).ok()
    }
}
