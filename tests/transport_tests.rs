use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};

use engage::services::transport::{AnonymousIdentity, Identity, IdentityProvider, StaticIdentity};
use engage::{AnalyticsEvent, BatchPayload, HttpTransport, SendOutcome, TelemetryConfig, Transport, TransportError};

#[derive(Clone)]
struct Stub {
    status: StatusCode,
    delay: Duration,
    seen: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

async fn ingest(State(stub): State<Stub>, headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let count = body["events"].as_array().map(|e| e.len()).unwrap_or(0);
    stub.seen.lock().push((auth, body));
    tokio::time::sleep(stub.delay).await;

    if stub.status.is_success() {
        (stub.status, Json(json!({ "message": "Events recorded", "count": count })))
    } else {
        (stub.status, Json(json!({ "error": "rejected" })))
    }
}

async fn spawn_stub(status: StatusCode) -> (SocketAddr, Stub) {
    spawn_slow_stub(status, Duration::ZERO).await
}

async fn spawn_slow_stub(status: StatusCode, delay: Duration) -> (SocketAddr, Stub) {
    let stub = Stub { status, delay, seen: Arc::new(Mutex::new(Vec::new())) };
    let app = Router::new().route("/events", post(ingest)).with_state(stub.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, stub)
}

fn transport(addr: SocketAddr, identity: Arc<dyn IdentityProvider>) -> HttpTransport {
    transport_with_timeouts(addr, identity, 2_000, 1_000)
}

fn transport_with_timeouts(
    addr: SocketAddr,
    identity: Arc<dyn IdentityProvider>,
    request_timeout_ms: u64,
    teardown_timeout_ms: u64,
) -> HttpTransport {
    let config = TelemetryConfig {
        ingest_url: format!("http://{}/events", addr),
        request_timeout_ms,
        teardown_timeout_ms,
        ..TelemetryConfig::default()
    };
    HttpTransport::new(&config, identity).unwrap()
}

fn payload() -> BatchPayload {
    let view = AnalyticsEvent {
        action: "page_view".into(),
        page: "/promo".into(),
        zone: None,
        component: None,
        metadata: None,
        ts: 1_700_000_000,
    };
    let dwell = AnalyticsEvent {
        action: "zone_dwell".into(),
        zone: Some("hero".into()),
        metadata: json!({ "duration": 3 }).as_object().cloned(),
        ..view.clone()
    };
    BatchPayload { session_id: "s1".into(), events: vec![view, dwell] }
}

#[tokio::test]
async fn test_accepted_batch_reports_count() {
    let (addr, stub) = spawn_stub(StatusCode::CREATED).await;
    let transport = transport(addr, Arc::new(AnonymousIdentity));

    assert_eq!(transport.send(&payload()).await, SendOutcome::Accepted(2));

    let seen = stub.seen.lock();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, None, "Anonymous batches carry no credential");
    assert_eq!(seen[0].1["sessionId"], "s1");
    assert_eq!(seen[0].1["events"][1]["zone"], "hero");
}

#[tokio::test]
async fn test_credential_attached_when_signed_in() {
    let (addr, stub) = spawn_stub(StatusCode::OK).await;
    let identity = Arc::new(StaticIdentity::new(Some(Identity {
        credential: "tok-123".into(),
        user_id: "user-42".into(),
    })));
    let transport = transport(addr, identity.clone());

    transport.send(&payload()).await;
    identity.clear();
    transport.send(&payload()).await;

    let seen = stub.seen.lock();
    assert_eq!(seen[0].0.as_deref(), Some("Bearer tok-123"));
    assert!(!seen[0].1.to_string().contains("user-42"));
    assert_eq!(seen[1].0, None);
}

#[tokio::test]
async fn test_bad_request_is_client_error() {
    let (addr, _) = spawn_stub(StatusCode::BAD_REQUEST).await;
    let transport = transport(addr, Arc::new(AnonymousIdentity));

    assert!(matches!(transport.send(&payload()).await, SendOutcome::ClientError(_)));
}

#[tokio::test]
async fn test_server_fault_is_transient() {
    let (addr, _) = spawn_stub(StatusCode::SERVICE_UNAVAILABLE).await;
    let transport = transport(addr, Arc::new(AnonymousIdentity));

    assert!(matches!(transport.send(&payload()).await, SendOutcome::Transient(_)));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_transient() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let transport = transport(addr, Arc::new(AnonymousIdentity));

    assert!(matches!(transport.send(&payload()).await, SendOutcome::Transient(_)));
}

#[tokio::test]
async fn test_reliable_send_carries_credential() {
    let (addr, stub) = spawn_stub(StatusCode::OK).await;
    let identity = Arc::new(StaticIdentity::new(Some(Identity {
        credential: "tok-9".into(),
        user_id: "u".into(),
    })));
    let transport = transport(addr, identity);

    transport.send_reliable(&payload()).await.unwrap();
    assert_eq!(stub.seen.lock()[0].0.as_deref(), Some("Bearer tok-9"));
}

#[tokio::test]
async fn test_reliable_send_reports_status() {
    let (addr, _) = spawn_stub(StatusCode::INTERNAL_SERVER_ERROR).await;
    let transport = transport(addr, Arc::new(AnonymousIdentity));

    let err = transport.send_reliable(&payload()).await.unwrap_err();
    assert!(matches!(err, TransportError::Status(500)));
}

#[tokio::test]
async fn test_slow_endpoint_is_transient() {
    let (addr, _) = spawn_slow_stub(StatusCode::OK, Duration::from_secs(2)).await;
    let transport = transport_with_timeouts(addr, Arc::new(AnonymousIdentity), 100, 1_000);

    assert!(matches!(transport.send(&payload()).await, SendOutcome::Transient(_)));
}

#[tokio::test]
async fn test_reliable_send_reports_timeout() {
    let (addr, stub) = spawn_slow_stub(StatusCode::OK, Duration::from_secs(2)).await;
    let transport = transport_with_timeouts(addr, Arc::new(AnonymousIdentity), 2_000, 100);

    let err = transport.send_reliable(&payload()).await.unwrap_err();
    assert!(
        matches!(err, TransportError::Timeout(limit) if limit == Duration::from_millis(100)),
        "Teardown deadline should surface as a timeout, got {:?}",
        err
    );
    assert_eq!(stub.seen.lock().len(), 1, "Request reached the endpoint before the deadline");
}
