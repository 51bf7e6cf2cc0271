//! Web api client.

use std::sync::Arc;

use serde_json::Value;

use super::classify::{classify, Classification, Failure};
use super::transport::{ApiRequest, ApiResponse, Method, Transport};
use crate::cancel::CancellationToken;
use crate::config::ApiConfig;
use crate::error::{ApiError, TransportError};
use crate::events::{ClientEvent, ErrorResponse, EventBus};
use crate::hash_state::HashState;
use crate::host::PageLocation;

/// Header carrying the decoded hash state on every web api call.
pub const HASH_STATE_HEADER: &str = "X-Hash-State";

/// Calls `<api_root>/<route>` and reports failures on the bus.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    config: ApiConfig,
    bus: EventBus,
    location: Arc<dyn PageLocation>,
    hash_state: HashState,
}

impl ApiClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        config: ApiConfig,
        bus: EventBus,
        location: Arc<dyn PageLocation>,
    ) -> Self {
        let hash_state = HashState::new(Arc::clone(&location));
        Self {
            transport,
            config,
            bus,
            location,
            hash_state,
        }
    }

    pub fn url_for(&self, route: &str) -> String {
        format!(
            "{}/{}",
            self.config.api_root.trim_end_matches('/'),
            route.trim_start_matches('/')
        )
    }

    pub async fn get(&self, route: &str, token: CancellationToken) -> Result<Value, ApiError> {
        self.send(Method::Get, route, None, token).await
    }

    pub async fn post(
        &self,
        route: &str,
        body: Value,
        token: CancellationToken,
    ) -> Result<Value, ApiError> {
        self.send(Method::Post, route, Some(body), token).await
    }

    pub async fn put(
        &self,
        route: &str,
        body: Value,
        token: CancellationToken,
    ) -> Result<Value, ApiError> {
        self.send(Method::Put, route, Some(body), token).await
    }

    pub async fn delete(&self, route: &str, token: CancellationToken) -> Result<Value, ApiError> {
        self.send(Method::Delete, route, None, token).await
    }

    /// Send one call and decode its JSON result.
    ///
    /// Failures are classified and reported before the error is returned;
    /// cancellation is returned as `ApiError::Cancelled` and never reported.
    pub async fn send(
        &self,
        method: Method,
        route: &str,
        body: Option<Value>,
        token: CancellationToken,
    ) -> Result<Value, ApiError> {
        let url = self.url_for(route);
        let mut request = ApiRequest::new(method, url.clone())
            .with_header("Content-Type", "application/json; charset=utf-8")
            .with_header("X-Requested-With", "XMLHttpRequest")
            .with_header("Cache-Control", "no-cache")
            .with_header(HASH_STATE_HEADER, self.hash_state.header_value());
        request.body = body;

        let response = match self.transport.send(request, token).await {
            Ok(response) => response,
            Err(TransportError::Aborted) => {
                tracing::debug!(method = %method, url = %url, "Request aborted");
                return Err(ApiError::Cancelled);
            }
            Err(e @ TransportError::Network(_)) => {
                let failure = Failure::Response(ErrorResponse::network(method, &url));
                report(&self.bus, self.location.as_ref(), classify(&failure, &self.config));
                return Err(e.into());
            }
            Err(e @ TransportError::InvalidRequest(_)) => {
                tracing::error!(method = %method, url = %url, error = %e, "Request could not be sent");
                self.bus.publish(ClientEvent::UnknownError);
                return Err(e.into());
            }
        };

        if !response.is_success() {
            let error = ErrorResponse::from_response(method, url, &response);
            let failure = Failure::Response(error.clone());
            report(&self.bus, self.location.as_ref(), classify(&failure, &self.config));
            return Err(ApiError::Http(Box::new(error)));
        }

        decode_body(&response)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("api_root", &self.config.api_root)
            .finish_non_exhaustive()
    }
}

/// Success bodies are JSON; an empty body is `null`.
fn decode_body(response: &ApiResponse) -> Result<Value, ApiError> {
    if response.body.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&response.body)?)
}

/// Publish a classification's event and notification, then follow its
/// redirect.
pub(crate) fn report(bus: &EventBus, location: &dyn PageLocation, classification: Classification) {
    if let Some(event) = classification.event {
        tracing::warn!(event = %event.name(), "Api call failed");
        bus.publish(event);
    }
    if let Some(notification) = classification.notification {
        bus.publish(ClientEvent::Notification(notification));
    }
    if let Some(redirect) = classification.redirect {
        tracing::info!(url = %redirect, "Following server-suggested redirect");
        location.assign(&redirect);
    }
}
