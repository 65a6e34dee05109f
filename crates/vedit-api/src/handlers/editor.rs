//! Editor endpoints.
//!
//! Each handler hands its body to the shared [`vedit_editor::Editor`]
//! pipeline. Dropping the request future (client disconnect) drops the
//! pipeline too, which kills FFmpeg and removes scratch files.

use axum::extract::State;
use axum::Json;
use vedit_models::{
    ConvertRequest, CropRequest, CutRequest, EditResponse, MergeRequest, ResizeRequest,
};

use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::state::AppState;

/// POST /editor/cut
pub async fn cut_video(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CutRequest>,
) -> ApiResult<Json<EditResponse>> {
    let outcome = state.editor.cut(request).await?;
    Ok(Json(outcome.into()))
}

/// POST /editor/convert
pub async fn convert_video(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ConvertRequest>,
) -> ApiResult<Json<EditResponse>> {
    let outcome = state.editor.convert(request).await?;
    Ok(Json(outcome.into()))
}

/// POST /editor/resize
pub async fn resize_video(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ResizeRequest>,
) -> ApiResult<Json<EditResponse>> {
    let outcome = state.editor.resize(request).await?;
    Ok(Json(outcome.into()))
}

/// POST /editor/crop
pub async fn crop_video(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CropRequest>,
) -> ApiResult<Json<EditResponse>> {
    let outcome = state.editor.crop(request).await?;
    Ok(Json(outcome.into()))
}

/// POST /editor/merge
pub async fn merge_videos(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<MergeRequest>,
) -> ApiResult<Json<EditResponse>> {
    let outcome = state.editor.merge(request).await?;
    Ok(Json(outcome.into()))
}
