//! HTTP request handler for the animation endpoint.
//!
//! # Endpoint
//!
//! - `GET /?<any-key>=<path>` - Serve a colorized GIF animation of `path`
//!
//! Every path under `/` is served by the same handler; only the method and
//! the first query value matter.

use std::sync::Arc;

use axum::{
    extract::{RawQuery, State},
    http::{header, HeaderName, Method, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{debug, error, warn};

use crate::animation::AnimationService;
use crate::error::{RenderError, RequestError};

use super::validate::validate;

/// Content type of every successful response.
pub const GIF_CONTENT_TYPE: &str = "image/gif";

/// Response header reporting whether the payload came from cache.
pub const CACHE_HIT_HEADER: HeaderName = HeaderName::from_static("x-cache-hit");

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the animation service.
///
/// This is passed to the handler via Axum's State extractor.
#[derive(Clone)]
pub struct AppState {
    /// The animation service for processing accepted requests
    pub service: Arc<AnimationService>,
}

impl AppState {
    /// Create application state around an already shared service.
    pub fn with_shared_service(service: Arc<AnimationService>) -> Self {
        Self { service }
    }
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Failure of a single request, with enough context to log it.
#[derive(Debug)]
pub enum HandlerError {
    /// The request was rejected by validation
    Rejected(RequestError),

    /// The request was accepted but rendering failed
    Render { path: String, error: RenderError },
}

impl From<RequestError> for HandlerError {
    fn from(err: RequestError) -> Self {
        HandlerError::Rejected(err)
    }
}

/// Map a failure to an empty-bodied status response.
///
/// Input problems are client errors and log at WARN; only server faults log
/// at ERROR.
impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let status = match &self {
            HandlerError::Rejected(RequestError::MethodNotAllowed(method)) => {
                debug!(method = %method, "Method not allowed");
                StatusCode::METHOD_NOT_ALLOWED
            }
            HandlerError::Rejected(err) => {
                warn!(status = 400, "Invalid request: {}", err);
                StatusCode::BAD_REQUEST
            }
            HandlerError::Render { path, error } if error.is_client_error() => {
                warn!(status = 400, path = %path, "Error processing request: {}", error);
                StatusCode::BAD_REQUEST
            }
            HandlerError::Render { path, error } => {
                error!(status = 500, path = %path, "Error processing request: {}", error);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        status.into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle animation requests.
///
/// # Response
///
/// - `200 OK`: GIF animation with `Content-Type: image/gif` and `Content-Length`
/// - `400 Bad Request`: Missing path, missing file, disallowed extension, or
///   the image could not be processed
/// - `405 Method Not Allowed`: Any method other than GET
/// - `500 Internal Server Error`: The render task itself failed
///
/// # Headers
///
/// - `X-Cache-Hit: true|false`
pub async fn animation_handler(
    State(state): State<AppState>,
    method: Method,
    RawQuery(query): RawQuery,
) -> Result<Response, HandlerError> {
    let path = validate(&method, query.as_deref(), state.service.root()).await?;

    let response = state
        .service
        .get_animation(&path)
        .await
        .map_err(|error| HandlerError::Render {
            path: path.clone(),
            error,
        })?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, GIF_CONTENT_TYPE.to_string()),
            (header::CONTENT_LENGTH, response.data.len().to_string()),
            (CACHE_HIT_HEADER, response.cache_hit.to_string()),
        ],
        response.data,
    )
        .into_response())
}

// =============================================================================
// Tests
// =============================================================================
