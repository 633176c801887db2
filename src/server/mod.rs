//! HTTP server layer for Hue Cache.
//!
//! This module provides the HTTP API that serves colorized GIF animations.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │                    GET /?<key>=<path>                           │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐  ┌────────┐  │
//! │  │  validate   │  │  handlers   │  │    limit    │  │ routes │  │
//! │  │ (accept or  │  │ (responses) │  │ (in-flight  │  │        │  │
//! │  │  reject)    │  │             │  │  ceiling)   │  │        │  │
//! │  └─────────────┘  └─────────────┘  └─────────────┘  └────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod limit;
pub mod routes;
pub mod validate;

pub use handlers::{animation_handler, AppState, HandlerError, CACHE_HIT_HEADER, GIF_CONTENT_TYPE};
pub use limit::{in_flight_middleware, InFlightLimit, DEFAULT_MAX_IN_FLIGHT};
pub use routes::{create_router, create_router_with_shared_service, RouterConfig};
pub use validate::{first_query_value, has_allowed_extension, validate, ALLOWED_EXTENSIONS};
