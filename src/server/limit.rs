//! In-flight request limiting.
//!
//! Every request holds a semaphore permit while it is handled. When all
//! permits are taken, new requests either wait for one (default) or are
//! turned away with `503 Service Unavailable`.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::Semaphore;
use tracing::warn;

/// Default ceiling on concurrently handled requests.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 64;

/// Shared permit pool for [`in_flight_middleware`].
#[derive(Clone, Debug)]
pub struct InFlightLimit {
    permits: Arc<Semaphore>,
    max_in_flight: usize,
    reject_when_busy: bool,
}

impl InFlightLimit {
    /// Create a limit of `max_in_flight` concurrent requests.
    pub fn new(max_in_flight: usize, reject_when_busy: bool) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_in_flight)),
            max_in_flight,
            reject_when_busy,
        }
    }

    /// Configured ceiling.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    /// Permits currently free.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

/// Axum middleware enforcing an [`InFlightLimit`].
pub async fn in_flight_middleware(
    State(limit): State<InFlightLimit>,
    request: Request,
    next: Next,
) -> Response {
    let permit = if limit.reject_when_busy {
        Arc::clone(&limit.permits).try_acquire_owned().ok()
    } else {
        Arc::clone(&limit.permits).acquire_owned().await.ok()
    };

    let Some(_permit) = permit else {
        warn!(
            max_in_flight = limit.max_in_flight,
            "Rejecting request: server busy"
        );
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    };

    next.run(request).await
}
