//! Cache integration tests.
//!
//! Tests verify:
//! - Entries expire after the sliding window elapses without access
//! - Each hit restarts the window
//! - Entries are keyed by the raw requested path string

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;

use huecache::animation::{AnimationCache, AnimationService, LockMode};
use huecache::{create_router_with_shared_service, RouterConfig};

use super::test_utils::{fixture_dir, get, TrackingEncoder};

fn service_with_ttl(root: &std::path::Path, ttl: Duration) -> AnimationService {
    let cache = AnimationCache::with_options(ttl, 16 * 1024 * 1024, LockMode::PerKey);
    AnimationService::with_cache(root, cache)
}

// =============================================================================
// Expiration
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_entry_expires_after_idle_window() {
    let dir = fixture_dir();
    let service = Arc::new(service_with_ttl(dir.path(), Duration::from_secs(300)));
    let router = create_router_with_shared_service(service.clone(), RouterConfig::default());

    let first = get(&router, "/?f=photo.png").await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(service.render_count(), 1);

    tokio::time::advance(Duration::from_secs(301)).await;

    let second = get(&router, "/?f=photo.png").await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.cache_hit(), Some("false"));
    assert_eq!(service.render_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_hits_slide_the_window() {
    let dir = fixture_dir();
    let service = Arc::new(service_with_ttl(dir.path(), Duration::from_secs(300)));
    let router = create_router_with_shared_service(service.clone(), RouterConfig::default());

    let first = get(&router, "/?f=photo.png").await;
    assert_eq!(first.status, StatusCode::OK);

    // Two hits 200s apart: 400s since the render, but never 300s idle
    tokio::time::advance(Duration::from_secs(200)).await;
    let second = get(&router, "/?f=photo.png").await;
    assert_eq!(second.cache_hit(), Some("true"));

    tokio::time::advance(Duration::from_secs(200)).await;
    let third = get(&router, "/?f=photo.png").await;
    assert_eq!(third.cache_hit(), Some("true"));
    assert_eq!(third.body, first.body);

    assert_eq!(service.render_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_expired_payload_is_replaced() {
    let dir = fixture_dir();
    let service = Arc::new(service_with_ttl(dir.path(), Duration::from_secs(60)));
    let router = create_router_with_shared_service(service.clone(), RouterConfig::default());

    get(&router, "/?f=photo.png").await;
    tokio::time::advance(Duration::from_secs(61)).await;
    let fresh = get(&router, "/?f=photo.png").await;
    assert_eq!(fresh.cache_hit(), Some("false"));

    // The refreshed entry serves the new payload
    let cached = get(&router, "/?f=photo.png").await;
    assert_eq!(cached.cache_hit(), Some("true"));
    assert_eq!(cached.body, fresh.body);
    assert_eq!(service.cache().len().await, 1);
}

// =============================================================================
// Keying
// =============================================================================

#[tokio::test]
async fn test_distinct_path_strings_are_distinct_entries() {
    let dir = fixture_dir();
    let encoder = Arc::new(TrackingEncoder::new());
    let service = Arc::new(AnimationService::new(dir.path()).with_encoder(encoder.clone()));
    let router = create_router_with_shared_service(service.clone(), RouterConfig::default());

    // Same file, different strings: no normalization
    assert_eq!(get(&router, "/?f=photo.png").await.status, StatusCode::OK);
    assert_eq!(get(&router, "/?f=./photo.png").await.status, StatusCode::OK);

    assert_eq!(encoder.calls(), 2);
    assert_eq!(service.cache().len().await, 2);
    assert!(service.cache().contains("photo.png").await);
    assert!(service.cache().contains("./photo.png").await);
}

#[tokio::test]
async fn test_only_successes_are_cached() {
    let dir = fixture_dir();
    let service = Arc::new(AnimationService::new(dir.path()));
    let router = create_router_with_shared_service(service.clone(), RouterConfig::default());

    get(&router, "/?f=broken.png").await;
    get(&router, "/?f=missing.png").await;
    get(&router, "/?f=photo.png").await;

    assert_eq!(service.cache().len().await, 1);
    assert!(service.cache().contains("photo.png").await);
    assert!(!service.cache().contains("broken.png").await);
}

#[tokio::test]
async fn test_cache_stats_track_payloads() {
    let dir = fixture_dir();
    let service = Arc::new(AnimationService::new(dir.path()));
    let router = create_router_with_shared_service(service.clone(), RouterConfig::default());

    let a = get(&router, "/?f=photo.png").await;
    let b = get(&router, "/?f=other.png").await;

    let (size, capacity, count) = service.cache_stats().await;
    assert_eq!(count, 2);
    assert_eq!(size, a.body.len() + b.body.len());
    assert!(capacity >= size);
}
