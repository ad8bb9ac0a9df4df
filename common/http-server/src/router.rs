use std::{future::ready, sync::Arc};

use axum::{routing::get, Json, Router};
use common_metrics::MetricsRegistry;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::middleware::track_requests;

async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// The full service router: `resources` plus `/healthz` and `/metrics`, every
/// route passing through [`track_requests`].
pub fn router(resources: Router, metrics: Arc<MetricsRegistry>) -> Router {
    let exposition = metrics.clone();

    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(move || ready(exposition.render())))
        .merge(resources)
        .layer(axum::middleware::from_fn_with_state(metrics, track_requests))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use common_metrics::find_sample;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;

    #[tokio::test]
    async fn healthz_reports_ok() {
        let metrics = Arc::new(MetricsRegistry::new("testsvc").unwrap());
        let app = router(Router::new(), metrics);

        let response = app
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], br#"{"status":"ok"}"#);
    }

    #[tokio::test]
    async fn metrics_endpoint_renders_the_registry() {
        let metrics = Arc::new(MetricsRegistry::new("testsvc").unwrap());
        let app = router(Router::new(), metrics);

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert_eq!(
            find_sample(
                &text,
                "testsvc_http_requests_total",
                &[("method", "GET"), ("path", "/healthz"), ("status", "200")],
            ),
            Some(1.0)
        );
    }
}
