//! HTTP response bodies.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Result of a successful editor operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EditResponse {
    pub message: String,
    /// Public URL of the uploaded result
    pub url: String,
}

/// Result of a direct upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct UploadResponse {
    pub message: String,
    pub url: String,
    /// Object key the file was stored under
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct UrlResponse {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// One entry of the bucket listing.
///
/// Field names keep the S3 `ListObjectsV2` casing clients already consume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ObjectListing {
    #[serde(rename = "Key")]
    pub key: String,
    /// RFC 3339 timestamp
    #[serde(rename = "LastModified")]
    pub last_modified: Option<String>,
    #[serde(rename = "Size")]
    pub size: u64,
}
