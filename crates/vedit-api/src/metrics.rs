//! Prometheus metrics for the API server.
//!
//! Editor metrics (operations, FFmpeg and transfer durations) are recorded by
//! `vedit-editor`; this module owns the HTTP-level series and the recorder.

use std::sync::OnceLock;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use regex_lite::Regex;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
}

/// Metric names as constants for consistency.
pub mod names {
    pub const HTTP_REQUESTS_TOTAL: &str = "vedit_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "vedit_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "vedit_http_requests_in_flight";

    pub const RATE_LIMIT_HITS_TOTAL: &str = "vedit_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", sanitize_path(endpoint))];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Collapse object keys in paths so label cardinality stays bounded.
fn sanitize_path(path: &str) -> String {
    static OBJECT_PATH: OnceLock<Regex> = OnceLock::new();
    let re = OBJECT_PATH.get_or_init(|| {
        Regex::new(r"^/videos/(download|video)/[^/]+$").expect("valid path regex")
    });
    re.replace(path, "/videos/$1/:video_id").to_string()
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path() {
        assert_eq!(
            sanitize_path("/videos/download/3f2a_clip.mp4"),
            "/videos/download/:video_id"
        );
        assert_eq!(
            sanitize_path("/videos/video/a%20b.mov"),
            "/videos/video/:video_id"
        );
        assert_eq!(sanitize_path("/videos/list"), "/videos/list");
        assert_eq!(sanitize_path("/editor/cut"), "/editor/cut");
    }
}
