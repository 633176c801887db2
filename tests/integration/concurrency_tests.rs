//! Concurrency integration tests.
//!
//! Tests verify:
//! - Concurrent requests for one path share a single render
//! - Requests for different paths render in parallel without bleeding into
//!   each other
//! - Serialized mode still answers every request correctly
//! - The in-flight limit sheds load when configured to reject
//! - A panicking render fails only its own request

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::Router;

use huecache::animation::{AnimationCache, AnimationService, LockMode, DEFAULT_CACHE_TTL};
use huecache::{create_router_with_shared_service, RouterConfig};

use super::test_utils::{fixture_dir, get, PanicOnceEncoder, TestResponse, TrackingEncoder};

fn spawn_get(router: &Router, uri: &'static str) -> tokio::task::JoinHandle<TestResponse> {
    let router = router.clone();
    tokio::spawn(async move { get(&router, uri).await })
}

fn service_with_mode(
    root: &std::path::Path,
    mode: LockMode,
    encoder: Arc<TrackingEncoder>,
) -> AnimationService {
    let cache = AnimationCache::with_options(DEFAULT_CACHE_TTL, 16 * 1024 * 1024, mode);
    AnimationService::with_cache(root, cache).with_encoder(encoder)
}

// =============================================================================
// Single-Flight
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_for_one_path_render_once() {
    let dir = fixture_dir();
    let encoder = Arc::new(TrackingEncoder::with_delay(Duration::from_millis(200)));
    let service = Arc::new(service_with_mode(dir.path(), LockMode::PerKey, encoder.clone()));
    let router = create_router_with_shared_service(service.clone(), RouterConfig::default());

    let handles: Vec<_> = (0..6).map(|_| spawn_get(&router, "/?f=photo.png")).collect();

    let mut responses = Vec::new();
    for handle in handles {
        responses.push(handle.await.unwrap());
    }

    assert_eq!(encoder.calls(), 1);
    assert_eq!(service.render_count(), 1);

    let first = &responses[0].body;
    for response in &responses {
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(&response.body, first);
    }

    let misses = responses
        .iter()
        .filter(|r| r.cache_hit() == Some("false"))
        .count();
    assert_eq!(misses, 1, "Exactly one request should have rendered");
}

// =============================================================================
// Path Isolation
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_different_paths_render_in_parallel() {
    let dir = fixture_dir();
    let encoder = Arc::new(TrackingEncoder::with_delay(Duration::from_millis(300)));
    let service = Arc::new(service_with_mode(dir.path(), LockMode::PerKey, encoder.clone()));
    let router = create_router_with_shared_service(service.clone(), RouterConfig::default());

    let a = spawn_get(&router, "/?f=photo.png");
    let b = spawn_get(&router, "/?f=other.png");
    let a = a.await.unwrap();
    let b = b.await.unwrap();

    assert_eq!(a.status, StatusCode::OK);
    assert_eq!(b.status, StatusCode::OK);
    assert_eq!(encoder.calls(), 2);
    assert_eq!(encoder.peak_concurrency(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_paths_do_not_bleed() {
    let dir = fixture_dir();
    let seed = 42;

    // Reference renders, one path at a time
    let reference = AnimationService::new(dir.path()).with_color_seed(seed);
    let expected_a = reference.render("photo.png").await.unwrap();
    let expected_b = reference.render("other.png").await.unwrap();
    assert_ne!(expected_a, expected_b);

    let service = Arc::new(AnimationService::new(dir.path()).with_color_seed(seed));
    let router = create_router_with_shared_service(service.clone(), RouterConfig::default());

    let a = spawn_get(&router, "/?f=photo.png");
    let b = spawn_get(&router, "/?f=other.png");
    let a = a.await.unwrap();
    let b = b.await.unwrap();

    assert_eq!(a.body, expected_a);
    assert_eq!(b.body, expected_b);

    // Cached entries hold the matching payloads
    assert_eq!(get(&router, "/?f=photo.png").await.body, expected_a);
    assert_eq!(get(&router, "/?f=other.png").await.body, expected_b);
}

// =============================================================================
// Serialized Mode
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_serialized_mode_renders_one_at_a_time() {
    let dir = fixture_dir();
    let encoder = Arc::new(TrackingEncoder::with_delay(Duration::from_millis(100)));
    let service = Arc::new(service_with_mode(dir.path(), LockMode::Global, encoder.clone()));
    let router = create_router_with_shared_service(service.clone(), RouterConfig::default());

    let handles = vec![
        spawn_get(&router, "/?f=photo.png"),
        spawn_get(&router, "/?f=other.png"),
        spawn_get(&router, "/?f=photo.jpg"),
        spawn_get(&router, "/?f=photo.png"),
    ];

    for handle in handles {
        assert_eq!(handle.await.unwrap().status, StatusCode::OK);
    }

    assert_eq!(encoder.peak_concurrency(), 1);
    assert_eq!(encoder.calls(), 3);
}

// =============================================================================
// In-Flight Limit
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_reject_when_busy_returns_503() {
    let dir = fixture_dir();
    let encoder = Arc::new(TrackingEncoder::with_delay(Duration::from_millis(500)));
    let service = Arc::new(service_with_mode(dir.path(), LockMode::PerKey, encoder));
    let config = RouterConfig::new()
        .with_max_in_flight(1)
        .with_reject_when_busy(true);
    let router = create_router_with_shared_service(service.clone(), config);

    let slow = spawn_get(&router, "/?f=photo.png");
    tokio::time::sleep(Duration::from_millis(100)).await;

    let rejected = get(&router, "/?f=other.png").await;
    assert_eq!(rejected.status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(rejected.body.is_empty());

    assert_eq!(slow.await.unwrap().status, StatusCode::OK);

    // Capacity is released once the slow request finishes
    assert_eq!(get(&router, "/?f=other.png").await.status, StatusCode::OK);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_queue_when_busy_serves_everyone() {
    let dir = fixture_dir();
    let encoder = Arc::new(TrackingEncoder::with_delay(Duration::from_millis(100)));
    let service = Arc::new(service_with_mode(dir.path(), LockMode::PerKey, encoder.clone()));
    let config = RouterConfig::new().with_max_in_flight(1);
    let router = create_router_with_shared_service(service.clone(), config);

    let handles = vec![
        spawn_get(&router, "/?f=photo.png"),
        spawn_get(&router, "/?f=other.png"),
        spawn_get(&router, "/?f=photo.jpg"),
    ];

    for handle in handles {
        assert_eq!(handle.await.unwrap().status, StatusCode::OK);
    }
    assert_eq!(encoder.peak_concurrency(), 1);
}

// =============================================================================
// Fault Isolation
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_panicking_render_fails_only_its_request() {
    let dir = fixture_dir();
    let service = Arc::new(
        AnimationService::new(dir.path()).with_encoder(Arc::new(PanicOnceEncoder::new())),
    );
    let router = create_router_with_shared_service(service.clone(), RouterConfig::default());

    let failed = get(&router, "/?f=photo.png").await;
    assert_eq!(failed.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(failed.body.is_empty());
    assert!(service.cache().is_empty().await);

    // The server keeps serving, and the failure was not cached
    let retried = get(&router, "/?f=photo.png").await;
    assert_eq!(retried.status, StatusCode::OK);
    assert!(!retried.body.is_empty());
}
