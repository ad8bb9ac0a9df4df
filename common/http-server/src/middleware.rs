use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use common_metrics::MetricsRegistry;
use futures::FutureExt;
use tracing::{error, info};

use crate::error::ApiError;

/// Path label for requests that matched no route.
pub const UNMATCHED_ROUTE: &str = "unmatched";

/// Record every request in the service's metrics and log it, converting handler
/// panics into a 500 along the way.
///
/// The path label is the route template (`/users/:id`), never the concrete path,
/// so label cardinality stays bounded by the number of routes.
pub async fn track_requests(
    State(metrics): State<Arc<MetricsRegistry>>,
    req: Request,
    next: Next,
) -> Response {
    let start = Instant::now();

    let route = match req.extensions().get::<MatchedPath>() {
        Some(matched) => matched.as_str().to_owned(),
        None => UNMATCHED_ROUTE.to_owned(),
    };
    let method = req.method().clone();

    let response = match AssertUnwindSafe(next.run(req)).catch_unwind().await {
        Ok(response) => response,
        Err(panic) => {
            error!(
                method = %method,
                route = %route,
                panic = panic_message(panic.as_ref()),
                "handler panicked"
            );
            ApiError::Unhandled.into_response()
        }
    };

    let latency = start.elapsed();
    let status = response.status().as_u16();

    metrics.increment_request(method.as_str(), &route, status);
    metrics.observe_duration(method.as_str(), &route, latency.as_secs_f64());

    info!(
        method = %method,
        route = %route,
        status,
        latency_ms = latency.as_secs_f64() * 1000.0,
        "request"
    );

    response
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
