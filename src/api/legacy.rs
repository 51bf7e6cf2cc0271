//! Ajax wrapper used by the older, non web-api pages.
//!
//! Calls arbitrary urls and hands back the raw response. Failure handling is
//! narrower than the web api client's: see [`classify_legacy`].

use std::sync::Arc;

use serde_json::Value;

use super::classify::{classify_legacy, Failure};
use super::client::report;
use super::transport::{ApiRequest, ApiResponse, Method, Transport};
use crate::cancel::CancellationToken;
use crate::config::ApiConfig;
use crate::error::{ApiError, TransportError};
use crate::events::{ErrorResponse, EventBus};
use crate::host::PageLocation;

#[derive(Clone)]
pub struct LegacyAjax {
    transport: Arc<dyn Transport>,
    config: ApiConfig,
    bus: EventBus,
    location: Arc<dyn PageLocation>,
}

impl LegacyAjax {
    pub fn new(
        transport: Arc<dyn Transport>,
        config: ApiConfig,
        bus: EventBus,
        location: Arc<dyn PageLocation>,
    ) -> Self {
        Self {
            transport,
            config,
            bus,
            location,
        }
    }

    pub async fn get(&self, url: &str, token: CancellationToken) -> Result<ApiResponse, ApiError> {
        self.call(Method::Get, url, None, token).await
    }

    pub async fn post(
        &self,
        url: &str,
        data: Value,
        token: CancellationToken,
    ) -> Result<ApiResponse, ApiError> {
        self.call(Method::Post, url, Some(data), token).await
    }

    pub async fn put(
        &self,
        url: &str,
        data: Value,
        token: CancellationToken,
    ) -> Result<ApiResponse, ApiError> {
        self.call(Method::Put, url, Some(data), token).await
    }

    pub async fn delete(
        &self,
        url: &str,
        token: CancellationToken,
    ) -> Result<ApiResponse, ApiError> {
        self.call(Method::Delete, url, None, token).await
    }

    async fn call(
        &self,
        method: Method,
        url: &str,
        data: Option<Value>,
        token: CancellationToken,
    ) -> Result<ApiResponse, ApiError> {
        let mut request = ApiRequest::new(method, url)
            .with_header("X-Requested-With", "XMLHttpRequest")
            .with_header("Cache-Control", "no-cache");
        request.body = data;

        let result = self.transport.send(request, token).await;
        let (failure, error) = match result {
            Ok(response) if response.is_success() => return Ok(response),
            Ok(response) => {
                let error = ErrorResponse::from_response(method, url, &response);
                (
                    Failure::Response(error.clone()),
                    ApiError::Http(Box::new(error)),
                )
            }
            Err(TransportError::Aborted) => return Err(ApiError::Cancelled),
            Err(e @ TransportError::Network(_)) => (
                Failure::Response(ErrorResponse::network(method, url)),
                e.into(),
            ),
            Err(e @ TransportError::InvalidRequest(_)) => return Err(e.into()),
        };

        tracing::warn!(method = %method, url = %url, error = %error, "Legacy ajax call failed");
        report(
            &self.bus,
            self.location.as_ref(),
            classify_legacy(&failure, &self.config),
        );
        Err(error)
    }
}
