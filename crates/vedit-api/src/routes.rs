//! API routes.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::{
    convert_video, crop_video, cut_video, delete_video, download_video, get_video_url, health,
    list_videos, merge_videos, ready, resize_video, root, upload_video,
};
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, rate_limit_middleware, request_id, request_logging, security_headers,
    RateLimiterCache,
};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let editor_routes = Router::new()
        .route("/editor/cut", post(cut_video))
        .route("/editor/convert", post(convert_video))
        .route("/editor/resize", post(resize_video))
        .route("/editor/crop", post(crop_video))
        .route("/editor/merge", post(merge_videos));

    let video_routes = Router::new()
        // Only uploads may exceed axum's 2MB default; JSON routes keep it
        .route(
            "/videos/upload",
            post(upload_video).layer(DefaultBodyLimit::max(state.config.max_body_size)),
        )
        .route("/videos/list", get(list_videos))
        .route("/videos/download/:video_id", get(download_video))
        .route("/videos/video/:video_id", get(get_video_url).delete(delete_video));

    let rate_limiter = Arc::new(RateLimiterCache::new(state.config.rate_limit_rps));

    let api_routes = Router::new()
        .merge(editor_routes)
        .merge(video_routes)
        .layer(middleware::from_fn_with_state(
            rate_limiter,
            rate_limit_middleware,
        ));

    let health_routes = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .merge(api_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
