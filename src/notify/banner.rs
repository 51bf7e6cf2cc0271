//! The page's error banner.
//!
//! One banner per page, fed from the event bus. Bad requests do not show a
//! banner; their field errors are kept for the form to highlight instead.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde_json::Value;

use super::model_state::model_state_errors;
use crate::events::{ClientEvent, ErrorResponse, EventBus, EventFilter, SubscriptionId};
use crate::lock;

pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error has occurred.";
pub const MAINTENANCE_MESSAGE: &str = "The system is currently undergoing maintenance.";

/// What the banner shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BannerMessage {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_log_url: Option<String>,
    /// The JSON error body, when the server sent one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl BannerMessage {
    pub fn text(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            trace_log_url: None,
            details: None,
        }
    }
}

#[derive(Debug, Default)]
struct BannerState {
    current: Option<BannerMessage>,
    field_errors: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct ErrorBanner {
    trace_log_header: String,
    state: Arc<Mutex<BannerState>>,
}

impl ErrorBanner {
    pub fn new(trace_log_header: impl Into<String>) -> Self {
        Self {
            trace_log_header: trace_log_header.into(),
            state: Arc::new(Mutex::new(BannerState::default())),
        }
    }

    /// Subscribe to every api failure on `bus`.
    pub fn attach(&self, bus: &EventBus) -> SubscriptionId {
        let banner = self.clone();
        bus.subscribe(EventFilter::failures(), move |event| banner.handle(event))
    }

    pub fn handle(&self, event: &ClientEvent) {
        match event {
            ClientEvent::BadRequest(response) => {
                let Some(body) = response.json_body() else {
                    return;
                };
                tracing::error!(body = %body, "Bad request");
                lock(&self.state).field_errors = model_state_errors(&body);
            }
            ClientEvent::NotAuthorized(_) => {
                tracing::error!("Not authorized");
            }
            ClientEvent::ServiceUnavailable(_) => {
                tracing::error!("Service unavailable");
                self.show(BannerMessage::text(MAINTENANCE_MESSAGE));
            }
            ClientEvent::MethodNotAllowed { method, url } => {
                tracing::warn!(method = %method, url = %url, "Method not allowed");
                self.show(BannerMessage::text(format!(
                    "The method {} is not allowed for the route {}.",
                    method, url
                )));
            }
            ClientEvent::NotFound { url } => {
                tracing::warn!(url = %url, "Not found");
                self.show(BannerMessage::text(format!(
                    "The route {} does not exist.",
                    url
                )));
            }
            ClientEvent::Error(response) => self.show(self.error_message(response)),
            ClientEvent::UnknownError => self.show(BannerMessage::text(UNKNOWN_ERROR_MESSAGE)),
            ClientEvent::HashChanged { .. } | ClientEvent::Notification(_) => {}
        }
    }

    fn error_message(&self, response: &ErrorResponse) -> BannerMessage {
        let Some(body) = response.json_body() else {
            return BannerMessage::text(UNKNOWN_ERROR_MESSAGE);
        };
        tracing::error!(body = %body, "Error response");

        let message = body
            .get("Message")
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN_ERROR_MESSAGE)
            .to_string();
        BannerMessage {
            message,
            trace_log_url: response.header(&self.trace_log_header).map(str::to_string),
            details: Some(body),
        }
    }

    fn show(&self, message: BannerMessage) {
        lock(&self.state).current = Some(message);
    }

    pub fn current(&self) -> Option<BannerMessage> {
        lock(&self.state).current.clone()
    }

    pub fn is_visible(&self) -> bool {
        lock(&self.state).current.is_some()
    }

    /// Hide the banner (the close button).
    pub fn dismiss(&self) {
        lock(&self.state).current = None;
    }

    /// Field errors from the last bad request.
    pub fn field_errors(&self) -> BTreeMap<String, String> {
        lock(&self.state).field_errors.clone()
    }
}
