//! Object endpoints: upload, list, download, URL, delete.

use std::path::Path as FsPath;

use axum::body::Body;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Response;
use axum::Json;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use uuid::Uuid;
use vedit_editor::ScratchSpace;
use vedit_models::{MessageResponse, ObjectListing, OutputFormat, UploadResponse, UrlResponse};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Multipart field carrying the uploaded file.
const UPLOAD_FIELD: &str = "file";

/// POST /videos/upload
///
/// Streams the `file` field to a scratch file, then stores it under
/// `<uuid>_<sanitized filename>`.
pub async fn upload_video(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<UploadResponse>> {
    let mut multipart = multipart?;

    let upload_id = Uuid::new_v4().simple().to_string();
    let mut scratch = ScratchSpace::create(&state.editor.config().work_dir, &upload_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to prepare upload: {}", e)))?;

    let mut received = None;
    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload").to_string();
        let ext = FsPath::new(&filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_string();
        let path = scratch.file("upload", &ext);

        let mut file = tokio::fs::File::create(&path)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to create upload file: {}", e)))?;
        let mut size: u64 = 0;
        while let Some(chunk) = field.chunk().await? {
            file.write_all(&chunk)
                .await
                .map_err(|e| ApiError::internal(format!("Failed to write upload: {}", e)))?;
            size += chunk.len() as u64;
        }
        file.flush()
            .await
            .map_err(|e| ApiError::internal(format!("Failed to write upload: {}", e)))?;

        received = Some((path, filename, size));
        break;
    }

    let Some((path, filename, size)) = received else {
        scratch.cleanup().await;
        return Err(ApiError::bad_request("Missing multipart field 'file'"));
    };

    let stored = state.editor.import_file(&path, &filename).await;
    scratch.cleanup().await;
    let stored = stored?;

    info!(key = %stored.key, size, "Video uploaded");
    Ok(Json(UploadResponse {
        message: "Video uploaded".to_string(),
        url: stored.url,
        key: stored.key,
    }))
}

/// GET /videos/list
///
/// Store failures are logged and answered with an empty listing.
pub async fn list_videos(State(state): State<AppState>) -> Json<Vec<ObjectListing>> {
    match state.store().list().await {
        Ok(objects) => Json(
            objects
                .into_iter()
                .map(|o| ObjectListing {
                    key: o.key,
                    last_modified: o.last_modified.map(|t| t.to_rfc3339()),
                    size: o.size,
                })
                .collect(),
        ),
        Err(e) => {
            warn!("Failed to list videos: {}", e);
            Json(Vec::new())
        }
    }
}

/// GET /videos/download/:video_id
///
/// Streams the object from the store; supports a single `Range: bytes=` header.
pub async fn download_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let range = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let object = state
        .store()
        .get_object(&video_id, range.as_deref())
        .await
        .map_err(|e| match e {
            vedit_storage::StorageError::NotFound(_) => {
                ApiError::not_found(format!("Video {} not found", video_id))
            }
            other => ApiError::Storage(other),
        })?;

    let content_type = object.content_type.unwrap_or_else(|| {
        OutputFormat::from_key(&video_id)
            .map(|f| f.content_type())
            .unwrap_or("application/octet-stream")
            .to_string()
    });

    let mut builder = Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(header::ACCEPT_RANGES, "bytes")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", disposition_filename(&video_id)),
        )
        .header("cross-origin-resource-policy", "cross-origin");

    if let Some(len) = object.content_length {
        builder = builder.header(header::CONTENT_LENGTH, len);
    }

    builder = match object.content_range {
        Some(content_range) => builder
            .status(StatusCode::PARTIAL_CONTENT)
            .header(header::CONTENT_RANGE, content_range),
        None => builder.status(StatusCode::OK),
    };

    builder
        .body(Body::from_stream(object.stream))
        .map_err(|e| ApiError::internal(format!("Failed to build response: {}", e)))
}

/// GET /videos/video/:video_id
pub async fn get_video_url(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> Json<UrlResponse> {
    Json(UrlResponse {
        url: state.store().public_url(&video_id),
    })
}

/// DELETE /videos/video/:video_id
pub async fn delete_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    state.store().delete(&video_id).await?;
    info!(key = %video_id, "Video deleted");

    Ok(Json(MessageResponse {
        message: format!("Video {} deleted", video_id),
    }))
}

/// Filename safe to place inside a quoted `Content-Disposition` parameter.
fn disposition_filename(key: &str) -> String {
    key.chars()
        .map(|c| {
            if !c.is_ascii() || c.is_ascii_control() || c == '"' || c == '\\' {
                '_'
            } else {
                c
            }
        })
        .collect()
}
