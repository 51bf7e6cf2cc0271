//! HTTP failure classification.
//!
//! Maps a failed call to the event subscribers should see, an optional
//! server-suggested redirect and an optional transient notification. Pure:
//! publishing and navigating are left to the caller.

use crate::config::ApiConfig;
use crate::events::{ClientEvent, ErrorResponse};
use crate::notify::TransientNotification;

/// How long the "Method Not Allowed" notification stays up.
const METHOD_NOT_ALLOWED_MS: u64 = 3500;

/// A call that did not produce a usable response.
#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    /// Deliberately cancelled by the client. Never reported.
    Aborted,
    /// A non-success status, or status `0` for a network failure.
    Response(ErrorResponse),
}

/// What to do about a failure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    pub event: Option<ClientEvent>,
    /// Already wrapped in the safe redirect endpoint
    pub redirect: Option<String>,
    pub notification: Option<TransientNotification>,
}

impl Classification {
    /// Nothing to report.
    pub fn suppressed() -> Self {
        Self::default()
    }

    pub fn is_suppressed(&self) -> bool {
        self.event.is_none() && self.redirect.is_none() && self.notification.is_none()
    }
}

/// Wrap a server-suggested url in the same-origin redirect endpoint.
pub fn safe_redirect_url(application_path: &str, url: &str) -> String {
    format!(
        "{}Redirect/Safe?redirectUrl={}",
        application_path,
        urlencoding::encode(url)
    )
}

fn header_redirect(response: &ErrorResponse, config: &ApiConfig) -> Option<String> {
    response
        .header(&config.redirect_header)
        .map(|url| safe_redirect_url(&config.application_path, url))
}

fn method_not_allowed(response: &ErrorResponse) -> TransientNotification {
    TransientNotification::failure(
        "Method Not Allowed",
        format!(
            "Verify that the {} verb is allowed by the server configuration.",
            response.method
        ),
    )
    .with_duration_ms(METHOD_NOT_ALLOWED_MS)
}

/// Classify a failed web api call.
pub fn classify(failure: &Failure, config: &ApiConfig) -> Classification {
    let response = match failure {
        Failure::Aborted => return Classification::suppressed(),
        Failure::Response(response) => response,
    };

    match response.status {
        400 => Classification {
            event: Some(ClientEvent::BadRequest(response.clone())),
            ..Classification::default()
        },
        401 | 302 => Classification {
            event: Some(ClientEvent::NotAuthorized(response.clone())),
            redirect: header_redirect(response, config),
            notification: None,
        },
        404 => Classification {
            event: Some(ClientEvent::NotFound {
                url: response.url.clone(),
            }),
            ..Classification::default()
        },
        405 => Classification {
            event: Some(ClientEvent::MethodNotAllowed {
                method: response.method,
                url: response.url.clone(),
            }),
            ..Classification::default()
        },
        503 => Classification {
            event: Some(ClientEvent::ServiceUnavailable(response.clone())),
            ..Classification::default()
        },
        500 | 0 => match header_redirect(response, config) {
            Some(redirect) => Classification {
                redirect: Some(redirect),
                ..Classification::default()
            },
            None => Classification {
                event: Some(ClientEvent::Error(response.clone())),
                ..Classification::default()
            },
        },
        _ => Classification {
            event: Some(ClientEvent::Error(response.clone())),
            ..Classification::default()
        },
    }
}

/// Classify a failed call made through the legacy ajax wrapper.
///
/// Only 500/0 redirects, 405 notifications and 400 events are produced;
/// every other failure is left to the caller.
pub fn classify_legacy(failure: &Failure, config: &ApiConfig) -> Classification {
    let response = match failure {
        Failure::Aborted => return Classification::suppressed(),
        Failure::Response(response) => response,
    };

    let redirect = match response.status {
        500 | 0 => header_redirect(response, config),
        _ => None,
    };

    match response.status {
        405 => Classification {
            redirect,
            notification: Some(method_not_allowed(response)),
            event: None,
        },
        400 => Classification {
            redirect,
            event: Some(ClientEvent::BadRequest(response.clone())),
            notification: None,
        },
        _ => Classification {
            redirect,
            ..Classification::default()
        },
    }
}
