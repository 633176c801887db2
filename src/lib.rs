//! # Hue Cache
//!
//! An HTTP server that turns local images into colorized GIF animations and
//! caches the result.
//!
//! A client asks for `GET /?f=photo.png`; the server checks the request,
//! decodes the image, blends ten random colors into it one after another
//! (each frame builds on the previous one), encodes the frames as a looping
//! GIF and returns it. The GIF is cached by the requested path with a sliding
//! five-minute expiration.
//!
//! ## Features
//!
//! - **Sliding expiration**: Every hit restarts an entry's idle timer
//! - **Single-flight rendering**: Concurrent requests for one path share one render
//! - **Bounded concurrency**: Configurable in-flight ceiling that queues or sheds load
//! - **Panic isolation**: A failing request never takes the server down
//!
//! ## Architecture
//!
//! - [`animation`] - Cache, frame synthesis, GIF encoding and the service tying them together
//! - [`server`] - Axum-based HTTP layer: validation, handler, limits, router
//! - [`config`] - CLI and environment configuration
//! - [`error`] - Request and render error types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use huecache::{create_router, AnimationCache, AnimationService, LockMode, RouterConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let cache = AnimationCache::with_options(
//!         Duration::from_secs(300),
//!         64 * 1024 * 1024,
//!         LockMode::PerKey,
//!     );
//!     let service = AnimationService::with_cache("./images", cache);
//!     let router = create_router(service, RouterConfig::default());
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:5050").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod animation;
pub mod config;
pub mod error;
pub mod server;

// Re-export commonly used types
pub use animation::{
    colorize, AnimationCache, AnimationEncoder, AnimationResponse, AnimationService,
    CacheLookup, Frame, FrameSynthesizer, GifAnimationEncoder, LockMode, DEFAULT_CACHE_CAPACITY,
    DEFAULT_CACHE_TTL, FRAME_COUNT,
};
pub use config::Config;
pub use error::{RenderError, RequestError};
pub use server::{
    animation_handler, create_router, create_router_with_shared_service, validate, AppState,
    HandlerError, InFlightLimit, RouterConfig,
};
