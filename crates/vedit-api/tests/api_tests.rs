//! Router tests: real handlers and middleware over a directory-backed store
//! and a fake FFmpeg.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use vedit_api::{create_router, ApiConfig, AppState};
use vedit_editor::{Editor, EditorConfig};
use vedit_media::{FfmpegCommand, MediaCapabilities, MediaError, MediaResult, MediaTool, VideoInfo};
use vedit_storage::{LocalStore, ObjectStore};

const BOUNDARY: &str = "vedit-test-boundary";

/// Every source probes as 1920x1080; `run` either writes the output or fails.
struct FakeTool {
    fail: bool,
}

#[async_trait]
impl MediaTool for FakeTool {
    async fn probe(&self, _path: &Path) -> MediaResult<VideoInfo> {
        Ok(VideoInfo {
            duration: 12.0,
            width: 1920,
            height: 1080,
            fps: 30.0,
            codec: "h264".to_string(),
            has_audio: true,
        })
    }

    async fn capabilities(&self) -> MediaCapabilities {
        MediaCapabilities::software()
    }

    async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        if self.fail {
            return Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                Some("Conversion failed!".to_string()),
                Some(1),
            ));
        }
        tokio::fs::write(cmd.output(), b"encoded video").await?;
        Ok(())
    }
}

struct TestApp {
    dir: TempDir,
    store: Arc<LocalStore>,
    router: Router,
}

impl TestApp {
    async fn new() -> Self {
        Self::build(false, ApiConfig::default()).await
    }

    async fn build(fail: bool, config: ApiConfig) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(
            LocalStore::new(dir.path().join("bucket"), "http://localhost:9000", "videos")
                .await
                .unwrap(),
        );
        let editor_config = EditorConfig {
            work_dir: dir.path().join("work"),
            hwaccel: false,
            ..EditorConfig::default()
        };
        let editor = Editor::new(store.clone(), Arc::new(FakeTool { fail }), editor_config);
        let router = create_router(AppState::new(config, editor), None);

        Self {
            dir,
            store,
            router,
        }
    }

    async fn put(&self, key: &str, data: &[u8]) {
        let src = self.dir.path().join("fixture.tmp");
        tokio::fs::write(&src, data).await.unwrap();
        self.store.upload_from(&src, key, "video/mp4").await.unwrap();
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = self
            .send(
                Request::post(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await;
        let status = response.status();
        (status, body_json(response).await)
    }

    async fn get(&self, uri: &str) -> Response {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }
}

async fn body_bytes(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn multipart_request(field: &str, filename: &str, data: &[u8]) -> Request<Body> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
         Content-Type: video/mp4\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::post("/videos/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_root_banner() {
    let app = TestApp::new().await;
    let response = app.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["message"], "Video editing API is running");
}

#[tokio::test]
async fn test_health_and_security_headers() {
    let app = TestApp::new().await;
    let response = app.get("/healthz").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(body_json(response).await["status"], "healthy");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = TestApp::new().await;
    let response = app
        .send(
            Request::get("/health")
                .header("x-request-id", "req-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.headers()["x-request-id"], "req-42");
}

#[tokio::test]
async fn test_ready_reports_storage() {
    let app = TestApp::new().await;
    let response = app.get("/ready").await;

    // FFmpeg may be absent on the test host; storage must still be reported ok
    assert!(
        response.status() == StatusCode::OK
            || response.status() == StatusCode::SERVICE_UNAVAILABLE
    );
    let body = body_json(response).await;
    assert_eq!(body["checks"]["storage"]["status"], "ok");
    assert!(body["checks"]["ffmpeg"]["status"].is_string());
}

#[tokio::test]
async fn test_cut_reversed_range_is_400() {
    let app = TestApp::new().await;
    app.put("a.mp4", b"source").await;

    let (status, body) = app
        .post_json(
            "/editor/cut",
            json!({"video_id": "a.mp4", "start_time": 2.0, "end_time": 1.0}),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["detail"].as_str().unwrap().contains("end_time"),
        "{body}"
    );
}

#[tokio::test]
async fn test_convert_missing_source_is_404() {
    let app = TestApp::new().await;
    let (status, body) = app
        .post_json(
            "/editor/convert",
            json!({"video_id": "missing.mp4", "target_format": "mp4"}),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["detail"].as_str().unwrap().contains("missing.mp4"));
}

#[tokio::test]
async fn test_convert_rejects_unlisted_format() {
    let app = TestApp::new().await;
    app.put("a.mp4", b"source").await;

    let (status, _) = app
        .post_json(
            "/editor/convert",
            json!({"video_id": "a.mp4", "target_format": "flv"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_crop_out_of_bounds_is_400() {
    let app = TestApp::new().await;
    app.put("b.mp4", b"source").await;

    let (status, body) = app
        .post_json(
            "/editor/crop",
            json!({"video_id": "b.mp4", "x": 1800, "y": 0, "width": 300, "height": 200}),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let app = TestApp::new().await;
    let response = app
        .send(
            Request::post("/editor/resize")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"video_id": "c.mp4""#))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["detail"].is_string());

    let (status, _) = app
        .post_json("/editor/resize", json!({"video_id": "c.mp4"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_resize_stores_result() {
    let app = TestApp::new().await;
    app.put("c.mp4", b"source").await;

    let (status, body) = app
        .post_json(
            "/editor/resize",
            json!({"video_id": "c.mp4", "resolution": "1280x720", "format": "mp4"}),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Video resized successfully");
    let url = body["url"].as_str().unwrap();
    assert!(url.starts_with("http://localhost:9000/videos/"), "{url}");
    assert!(url.ends_with(".mp4"));

    let key = url.rsplit('/').next().unwrap();
    assert_ne!(key, "c.mp4");
    assert!(app.store.exists(key).await.unwrap());
}

#[tokio::test]
async fn test_merge_returns_message_and_url() {
    let app = TestApp::new().await;
    app.put("main.mp4", b"main").await;
    app.put("bg.mp4", b"background").await;

    let (status, body) = app
        .post_json(
            "/editor/merge",
            json!({"main_video_id": "main.mp4", "background_video_id": "bg.mp4"}),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Videos merged successfully");
    assert!(body["url"].as_str().unwrap().ends_with(".mp4"));
}

#[tokio::test]
async fn test_tool_failure_is_500_and_nothing_stored() {
    let app = TestApp::build(true, ApiConfig::default()).await;
    app.put("a.mp4", b"source").await;

    let (status, body) = app
        .post_json(
            "/editor/cut",
            json!({"video_id": "a.mp4", "start_time": 0.0, "end_time": 1.0}),
        )
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], "FFmpeg failed with exit code 1");
    assert_eq!(app.store.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_upload_list_download_delete() {
    let app = TestApp::new().await;

    let response = app.send(multipart_request("file", "my clip.mp4", b"0123456789")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Video uploaded");
    let key = body["key"].as_str().unwrap().to_string();
    assert!(key.ends_with("_my_clip.mp4"), "{key}");
    assert!(body["url"].as_str().unwrap().ends_with(&key));

    let listing = body_json(app.get("/videos/list").await).await;
    let entries = listing.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["Key"], key.as_str());
    assert_eq!(entries[0]["Size"], 10);

    let response = app.get(&format!("/videos/download/{}", key)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "video/mp4");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        format!("attachment; filename=\"{}\"", key).as_str()
    );
    assert_eq!(body_bytes(response).await, b"0123456789");

    let response = app
        .send(
            Request::get(format!("/videos/download/{}", key))
                .header(header::RANGE, "bytes=2-5")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(response.headers()[header::CONTENT_RANGE], "bytes 2-5/10");
    assert_eq!(body_bytes(response).await, b"2345");

    let url = body_json(app.get(&format!("/videos/video/{}", key)).await).await;
    assert_eq!(
        url["url"],
        format!("http://localhost:9000/videos/{}", key).as_str()
    );

    let response = app
        .send(
            Request::delete(format!("/videos/video/{}", key))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["message"],
        format!("Video {} deleted", key).as_str()
    );

    let response = app.get(&format!("/videos/download/{}", key)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_download_streams_large_object() {
    let app = TestApp::new().await;
    let data: Vec<u8> = (0..3_000_000u32).map(|i| (i % 253) as u8).collect();

    // Larger than axum's default body limit, which only the JSON routes keep
    let response = app.send(multipart_request("file", "big.mp4", &data)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let key = body_json(response).await["key"].as_str().unwrap().to_string();

    let response = app.get(&format!("/videos/download/{}", key)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_LENGTH],
        data.len().to_string().as_str()
    );
    assert_eq!(body_bytes(response).await, data);

    let response = app
        .send(
            Request::get(format!("/videos/download/{}", key))
                .header(header::RANGE, "bytes=-4")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(response.headers()[header::CONTENT_LENGTH], "4");
    assert_eq!(body_bytes(response).await, &data[data.len() - 4..]);
}

#[tokio::test]
async fn test_oversized_json_body_is_413() {
    let app = TestApp::new().await;
    let padding = "x".repeat(3 * 1024 * 1024);

    let (status, body) = app
        .post_json(
            "/editor/cut",
            json!({"video_id": padding, "start_time": 0.0, "end_time": 1.0}),
        )
        .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_upload_over_configured_limit_is_rejected() {
    let config = ApiConfig {
        max_body_size: 1024,
        ..ApiConfig::default()
    };
    let app = TestApp::build(false, config).await;

    let response = app.send(multipart_request("file", "big.mp4", &[7u8; 4096])).await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(app.store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_without_file_field_is_400() {
    let app = TestApp::new().await;
    let response = app.send(multipart_request("video", "clip.mp4", b"data")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(app.store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_empty_bucket() {
    let app = TestApp::new().await;
    let listing = body_json(app.get("/videos/list").await).await;
    assert_eq!(listing, json!([]));
}

#[tokio::test]
async fn test_rate_limit_per_client_ip() {
    let config = ApiConfig {
        rate_limit_rps: 1,
        ..ApiConfig::default()
    };
    let app = TestApp::build(false, config).await;

    let request = |ip: &str| {
        Request::get("/videos/list")
            .header("x-forwarded-for", ip)
            .body(Body::empty())
            .unwrap()
    };

    assert_eq!(app.send(request("203.0.113.9")).await.status(), StatusCode::OK);
    assert_eq!(
        app.send(request("203.0.113.9")).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
    assert_eq!(app.send(request("203.0.113.10")).await.status(), StatusCode::OK);

    // Probes are outside the limited routes
    let response = app
        .send(
            Request::get("/health")
                .header("x-forwarded-for", "203.0.113.9")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}
