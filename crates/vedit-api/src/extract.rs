//! Request extractors.

use axum::extract::FromRequest;

use crate::error::ApiError;

/// `Json` whose rejections answer 400 with the usual `{"detail"}` body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
