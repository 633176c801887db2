//! Router configuration for Hue Cache.
//!
//! This module builds the HTTP router and applies middleware for request
//! limiting, panic isolation and tracing.
//!
//! # Route Structure
//!
//! ```text
//! /*?<key>=<path>    - Animation endpoint (every path, every method)
//! ```
//!
//! # Layers (outermost first)
//!
//! ```text
//! TraceLayer (optional) → CatchPanicLayer → in-flight limit → handler
//! ```
//!
//! # Example
//!
//! ```ignore
//! use huecache::animation::AnimationService;
//! use huecache::server::{create_router, RouterConfig};
//!
//! let service = AnimationService::new("./images");
//! let router = create_router(service, RouterConfig::default().with_max_in_flight(32));
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:5050").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::any::Any;
use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use super::handlers::{animation_handler, AppState};
use super::limit::{in_flight_middleware, InFlightLimit, DEFAULT_MAX_IN_FLIGHT};
use crate::animation::AnimationService;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Clone, Debug)]
pub struct RouterConfig {
    /// Maximum number of requests handled at once
    pub max_in_flight: usize,

    /// Answer 503 instead of queueing when the limit is reached
    pub reject_when_busy: bool,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a router configuration with the defaults:
    ///
    /// - 64 requests in flight, excess requests queue
    /// - Tracing is enabled
    pub fn new() -> Self {
        Self {
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            reject_when_busy: false,
            enable_tracing: true,
        }
    }

    /// Set the in-flight request ceiling.
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight;
        self
    }

    /// Reject (503) rather than queue requests over the ceiling.
    pub fn with_reject_when_busy(mut self, reject: bool) -> Self {
        self.reject_when_busy = reject;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the application router around a service.
pub fn create_router(service: AnimationService, config: RouterConfig) -> Router {
    create_router_with_shared_service(Arc::new(service), config)
}

/// Create the application router around a service the caller keeps a handle to.
///
/// Useful when the caller wants to inspect the cache or render counters
/// while the router is serving.
pub fn create_router_with_shared_service(
    service: Arc<AnimationService>,
    config: RouterConfig,
) -> Router {
    let app_state = AppState::with_shared_service(service);
    let limit = InFlightLimit::new(config.max_in_flight, config.reject_when_busy);

    let router = Router::new()
        .fallback(animation_handler)
        .with_state(app_state)
        .layer(middleware::from_fn_with_state(limit, in_flight_middleware))
        .layer(CatchPanicLayer::custom(handle_panic));

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Turn a handler panic into a bare 500 so the connection and server survive.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    error!(status = 500, "Request handler panicked: {}", detail);
    StatusCode::INTERNAL_SERVER_ERROR.into_response()
}

// =============================================================================
// Tests
// =============================================================================
