use axum::Router;
use axum::body::{Body, to_bytes};
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use axum::routing::get;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};
use tollgate::{AdmissionStore, BucketConfig, ManualClock, MemoryStore, StoreError};
use tollgate_server::{AppState, app};
use tower::ServiceExt;

fn clock() -> ManualClock {
    ManualClock::starting_at(UNIX_EPOCH + Duration::from_secs(1_700_000_000))
}

fn state(clock: &ManualClock, burst: u32, trust_proxy_headers: bool) -> AppState {
    let config = BucketConfig::builder()
        .refill_rate(1.0)
        .burst_capacity(burst)
        .idle_expiry(Duration::from_secs(60))
        .build();
    let store = MemoryStore::with_clock(config, clock.clone());
    AppState::new(Arc::new(store), trust_proxy_headers)
}

fn forwarded(path: &str, ip: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .header("x-forwarded-for", ip)
        .body(Body::empty())
        .unwrap()
}

fn from_peer(path: &str, peer: &str) -> Request<Body> {
    let mut request = Request::builder().uri(path).body(Body::empty()).unwrap();
    let addr: SocketAddr = peer.parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(addr));
    request
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_burst_then_rate_limited() {
    let clock = clock();
    let app = app::router(state(&clock, 3, true));

    for i in 0..3 {
        let response = app
            .clone()
            .oneshot(forwarded("/", "203.0.113.9"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "request {}", i + 1);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    let response = app
        .clone()
        .oneshot(forwarded("/", "203.0.113.9"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body_json(response).await["error"], "Rate limit exceeded");
}

#[tokio::test]
async fn test_refill_after_wait() {
    let clock = clock();
    let app = app::router(state(&clock, 1, true));

    let response = app.clone().oneshot(forwarded("/a", "198.51.100.7")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let response = app.clone().oneshot(forwarded("/b", "198.51.100.7")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    clock.advance(Duration::from_secs(1));

    let response = app.clone().oneshot(forwarded("/c", "198.51.100.7")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_clients_are_isolated() {
    let clock = clock();
    let app = app::router(state(&clock, 1, true));

    let first = app.clone().oneshot(forwarded("/", "192.0.2.1")).await.unwrap();
    let denied = app.clone().oneshot(forwarded("/", "192.0.2.1")).await.unwrap();
    let other = app.clone().oneshot(forwarded("/", "192.0.2.2")).await.unwrap();

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(denied.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(other.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_peer_address_used_when_proxy_headers_untrusted() {
    let clock = clock();
    let app = app::router(state(&clock, 1, false));

    let response = app
        .clone()
        .oneshot(from_peer("/", "192.0.2.10:40000"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Same host, different source port: same client
    let response = app
        .clone()
        .oneshot(from_peer("/", "192.0.2.10:40001"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    // A spoofed header does not buy a fresh bucket
    let mut spoofed = from_peer("/", "192.0.2.10:40002");
    spoofed
        .headers_mut()
        .insert("x-forwarded-for", "203.0.113.50".parse().unwrap());
    let response = app.clone().oneshot(spoofed).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_unidentified_client_is_forbidden() {
    let clock = clock();
    let app = app::router(state(&clock, 5, false));

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["error"], "Unable to identify client");
}

struct UnavailableStore;

impl AdmissionStore for UnavailableStore {
    fn allow(&self, _identifier: &str) -> Result<bool, StoreError> {
        Err(StoreError::Timeout(Duration::from_millis(50)))
    }
}

#[tokio::test]
async fn test_store_failure_is_internal_error() {
    let app = app::router(AppState::new(Arc::new(UnavailableStore), true));

    let response = app.oneshot(forwarded("/", "192.0.2.1")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"], "Rate limiter error");
}

#[tokio::test]
async fn test_operational_routes_are_not_rate_limited() {
    let clock = clock();
    let app = app::router(state(&clock, 1, true));

    for _ in 0..5 {
        let response = app
            .clone()
            .oneshot(forwarded("/health", "192.0.2.1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "OK");
    }

    for _ in 0..5 {
        let response = app
            .clone()
            .oneshot(forwarded("/metrics", "192.0.2.1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    // The client's bucket is still full
    let response = app.oneshot(forwarded("/", "192.0.2.1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_metrics_reflect_decisions() {
    let clock = clock();
    let app = app::router(state(&clock, 1, true));

    app.clone().oneshot(forwarded("/", "192.0.2.1")).await.unwrap();
    app.clone().oneshot(forwarded("/", "192.0.2.1")).await.unwrap();
    app.clone().oneshot(forwarded("/", "192.0.2.2")).await.unwrap();

    let response = app.oneshot(forwarded("/metrics", "192.0.2.1")).await.unwrap();
    let text = body_text(response).await;

    assert!(text.contains("tollgate_requests_total 3\n"));
    assert!(text.contains("tollgate_decisions_total{outcome=\"allowed\"} 2\n"));
    assert!(text.contains("tollgate_decisions_total{outcome=\"denied\"} 1\n"));
    assert!(text.contains("tollgate_tracked_clients 2\n"));
}

#[tokio::test]
async fn test_idle_clients_are_reclaimed() {
    let clock = clock();
    let state = state(&clock, 1, true);
    let app = app::router(state.clone());

    app.clone().oneshot(forwarded("/", "192.0.2.1")).await.unwrap();
    let response = app.clone().oneshot(forwarded("/", "192.0.2.1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    clock.advance(Duration::from_secs(61));
    app.clone().oneshot(forwarded("/", "192.0.2.99")).await.unwrap();

    let snapshot = state.store.snapshot().unwrap();
    assert_eq!(snapshot.identifiers, 1);
    assert_eq!(snapshot.sweeps.total_evicted, 1);
}

#[tokio::test]
async fn test_embedded_routes_are_protected() {
    let clock = clock();
    let routes = Router::new().route("/api/items", get(|| async { "items" }));
    let app = app::protect(routes, state(&clock, 1, true));

    let response = app
        .clone()
        .oneshot(forwarded("/api/items", "192.0.2.1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "items");

    let response = app
        .clone()
        .oneshot(forwarded("/api/items", "192.0.2.1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<std::sync::Mutex<Vec<u8>>>);

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_request_log_levels_and_fields() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .finish();
    // Current-thread runtime: every event below is emitted on this thread
    let _guard = tracing::subscriber::set_default(subscriber);

    let clock = clock();
    let app = app::router(state(&clock, 1, true));
    app.clone().oneshot(forwarded("/", "192.0.2.1")).await.unwrap();
    app.clone().oneshot(forwarded("/", "192.0.2.1")).await.unwrap();

    let failing = app::router(AppState::new(Arc::new(UnavailableStore), true));
    failing.oneshot(forwarded("/", "192.0.2.1")).await.unwrap();

    let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
    let line = |needle: &str| {
        output
            .lines()
            .find(|line| line.contains(needle))
            .unwrap_or_else(|| panic!("no log line containing {needle:?} in:\n{output}"))
            .to_owned()
    };

    let processed = line("Request processed");
    assert!(processed.contains("INFO"));
    assert!(processed.contains("status=200"));
    assert!(processed.contains("duration_ms="));
    assert!(processed.contains("ip=192.0.2.1"));

    let rejected = line("Request rejected");
    assert!(rejected.contains("WARN"));
    assert!(rejected.contains("status=429"));

    let failed = line("Request failed");
    assert!(failed.contains("ERROR"));
    assert!(failed.contains("status=500"));
}
