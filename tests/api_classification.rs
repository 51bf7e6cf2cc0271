//! Api failure classification integration tests
//!
//! These tests verify that:
//! 1. Every failure status reaches subscribers as its semantic event
//! 2. Server-suggested redirects always go through the safe redirect endpoint
//! 3. Cancelled calls are never reported
//! 4. Banner, field errors and notifications react to the published events,
//!    with the method-not-allowed notification reserved for legacy calls
//! 5. Successful results are cached and failures are not
//!
//! Run with: cargo test --test api_classification

use std::sync::Arc;

use serde_json::json;

use ema_client::api::{ApiClient, ApiResponse, ResponseCache, ScriptedTransport};
use ema_client::error::TransportError;
use ema_client::events::{EventFilter, EventKind};
use ema_client::host::{MemoryLocation, MemoryStorage};
use ema_client::notify::{NotificationKind, UNKNOWN_ERROR_MESSAGE};
use ema_client::{AppContext, CancellationSource, CancellationToken, ClientConfig};

fn context() -> (AppContext, MemoryLocation) {
    let location = MemoryLocation::new("https://ema.test/ema/plan", "Plan");
    let config = ClientConfig::from_json(
        r#"{ "Api": { "ApiRoot": "/ema/api", "ApplicationPath": "/ema/" } }"#,
    )
    .unwrap();
    let context = AppContext::new(
        config,
        Arc::new(MemoryStorage::new()),
        Arc::new(location.clone()),
    );
    (context, location)
}

fn client_with(context: &AppContext, response: ApiResponse) -> ApiClient {
    let transport = ScriptedTransport::new();
    transport.respond(response);
    context.api_client(Arc::new(transport))
}

// =============================================================================
// STATUS TO EVENT
// =============================================================================

#[tokio::test]
async fn test_each_status_publishes_its_event() {
    let cases = [
        (400, EventKind::BadRequest),
        (401, EventKind::NotAuthorized),
        (302, EventKind::NotAuthorized),
        (404, EventKind::NotFound),
        (405, EventKind::MethodNotAllowed),
        (503, EventKind::ServiceUnavailable),
        (500, EventKind::Error),
        (409, EventKind::Error),
    ];

    for (status, expected) in cases {
        let (context, _) = context();
        let failures = context.bus().channel(EventFilter::failures(), 8);
        let client = client_with(&context, ApiResponse::new(status));

        let err = client
            .get("Goals", CancellationToken::never())
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(status));
        let kinds: Vec<EventKind> = failures.drain_events().iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, vec![expected], "status {}", status);
    }
}

#[tokio::test]
async fn test_network_failure_is_status_zero_error() {
    let (context, _) = context();
    let failures = context.bus().channel(EventFilter::failures(), 8);
    let transport = ScriptedTransport::new();
    transport.fail(TransportError::Network("connection refused".into()));
    let client = context.api_client(Arc::new(transport));

    let err = client
        .get("Goals", CancellationToken::never())
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(0));
    assert_eq!(failures.drain_events()[0].kind(), EventKind::Error);
}

#[tokio::test]
async fn test_cancelled_call_is_silent() {
    let (context, location) = context();
    let all = context.bus().channel(EventFilter::All, 8);
    let banner = context.error_banner();
    let client = client_with(&context, ApiResponse::new(500));

    let source = CancellationSource::new();
    source.cancel();
    let err = client.get("Goals", source.token()).await.unwrap_err();

    assert!(err.is_cancelled());
    assert!(all.is_empty());
    assert!(banner.current().is_none());
    assert!(location.assigned().is_empty());
}

// =============================================================================
// REDIRECTS
// =============================================================================

#[tokio::test]
async fn test_redirects_use_safe_endpoint() {
    for status in [401, 302, 500] {
        let (context, location) = context();
        let client = client_with(
            &context,
            ApiResponse::new(status)
                .with_header("X-Error-Redirect-Location", "https://login.test/?next=/ema"),
        );

        let _ = client.get("Goals", CancellationToken::never()).await;

        assert_eq!(
            location.assigned(),
            vec!["/ema/Redirect/Safe?redirectUrl=https%3A%2F%2Flogin.test%2F%3Fnext%3D%2Fema"
                .to_string()],
            "status {}",
            status
        );
    }
}

#[tokio::test]
async fn test_no_redirect_without_header() {
    let (context, location) = context();
    let client = client_with(&context, ApiResponse::new(401));

    let _ = client.get("Goals", CancellationToken::never()).await;

    assert!(location.assigned().is_empty());
}

// =============================================================================
// FEEDBACK
// =============================================================================

#[tokio::test]
async fn test_banner_and_field_errors() {
    let (context, _) = context();
    let banner = context.error_banner();

    let client = client_with(
        &context,
        ApiResponse::json(
            400,
            &json!({"Message": "Invalid", "ModelState": {"model.Amount": ["Required"]}}),
        ),
    );
    let _ = client.post("Goals", json!({}), CancellationToken::never()).await;
    assert!(banner.current().is_none());
    assert_eq!(banner.field_errors()["Amount"], "Required");

    let client = client_with(
        &context,
        ApiResponse::json(500, &json!({"Message": "Projection failed"}))
            .with_header("X-TraceLog-Location", "/ema/trace/9"),
    );
    let _ = client.get("Projection", CancellationToken::never()).await;
    let current = banner.current().unwrap();
    assert_eq!(current.message, "Projection failed");
    assert_eq!(current.trace_log_url.as_deref(), Some("/ema/trace/9"));

    banner.dismiss();
    let client = client_with(&context, ApiResponse::new(502).with_body("Bad Gateway"));
    let _ = client.get("Projection", CancellationToken::never()).await;
    assert_eq!(banner.current().unwrap().message, UNKNOWN_ERROR_MESSAGE);
}

#[tokio::test]
async fn test_method_not_allowed_shows_banner_without_notification() {
    let (context, _) = context();
    let all = context.bus().channel(EventFilter::All, 8);
    let banner = context.error_banner();
    let notifications = context.notification_center();
    let client = client_with(&context, ApiResponse::new(405));

    let _ = client.delete("Goals/3", CancellationToken::never()).await;

    let names: Vec<String> = all
        .drain_events()
        .iter()
        .map(|event| event.name().into_owned())
        .collect();
    assert_eq!(names, vec!["methodNotAllowed"]);
    assert_eq!(
        banner.current().unwrap().message,
        "The method DELETE is not allowed for the route /ema/api/Goals/3."
    );
    assert!(notifications.visible().is_empty());
}

#[tokio::test]
async fn test_legacy_method_not_allowed_notifies() {
    let (context, _) = context();
    let notifications = context.notification_center();
    let transport = ScriptedTransport::new();
    transport.respond(ApiResponse::new(405));
    let ajax = context.legacy_ajax(Arc::new(transport));

    let _ = ajax.delete("/ema/Plan/Remove/3", CancellationToken::never()).await;

    let visible = notifications.visible();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].kind, NotificationKind::Failure);
    assert_eq!(visible[0].title, "Method Not Allowed");
    assert_eq!(visible[0].duration_ms, Some(3500));
}

// =============================================================================
// CACHING
// =============================================================================

#[tokio::test]
async fn test_section_list_cached_after_success_only() {
    let (context, _) = context();
    let transport = ScriptedTransport::new();
    transport
        .respond(ApiResponse::new(500))
        .respond(ApiResponse::json(200, &json!(["goals", "income"])));
    let client = context.api_client(Arc::new(transport.clone()));
    let cache = ResponseCache::new();

    let fetch = || client.get("SectionList", CancellationToken::never());

    assert!(cache.get_or_fetch("SectionList", fetch).await.is_err());
    let sections = cache.get_or_fetch("SectionList", fetch).await.unwrap();
    let again = cache.get_or_fetch("SectionList", fetch).await.unwrap();

    assert_eq!(sections, json!(["goals", "income"]));
    assert_eq!(again, sections);
    assert_eq!(transport.requests().len(), 2);
}
