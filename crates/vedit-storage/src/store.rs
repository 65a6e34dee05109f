//! Storage abstraction.

use std::fmt;
use std::path::Path;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures_util::Stream;
use serde::Serialize;

use crate::error::{StorageError, StorageResult};

/// Information about a stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectInfo {
    /// Object key
    pub key: String,
    /// Size in bytes
    pub size: u64,
    /// Last modified timestamp
    pub last_modified: Option<DateTime<Utc>>,
}

/// Chunked object contents.
pub type ByteChunkStream = Pin<Box<dyn Stream<Item = StorageResult<Bytes>> + Send>>;

/// An object (or a byte range of it) being read from the store.
pub struct ObjectBody {
    pub stream: ByteChunkStream,
    /// Number of bytes the stream yields, when the backend reports it
    pub content_length: Option<u64>,
    /// Content type recorded by the store, if any
    pub content_type: Option<String>,
    /// `Content-Range` value when a range was served (`bytes a-b/total`)
    pub content_range: Option<String>,
}

impl fmt::Debug for ObjectBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectBody")
            .field("content_length", &self.content_length)
            .field("content_type", &self.content_type)
            .field("content_range", &self.content_range)
            .finish_non_exhaustive()
    }
}

/// Flat-bucket object store.
///
/// Keys are opaque strings; a store never interprets them as paths beyond
/// rejecting ones that could escape its namespace.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Backend name for logs and readiness reports.
    fn backend_name(&self) -> &'static str;

    /// Metadata of an object. Missing keys yield [`StorageError::NotFound`].
    async fn head(&self, key: &str) -> StorageResult<ObjectInfo>;

    /// Stream an object into a local file, returning the number of bytes written.
    async fn download_to(&self, key: &str, path: &Path) -> StorageResult<u64>;

    /// Upload a local file under `key`.
    async fn upload_from(&self, path: &Path, key: &str, content_type: &str) -> StorageResult<()>;

    /// Open an object for streaming, optionally restricted by an HTTP `Range`
    /// header value. The body is read lazily as the stream is polled.
    async fn get_object(&self, key: &str, range: Option<&str>) -> StorageResult<ObjectBody>;

    /// Every object in the bucket.
    async fn list(&self) -> StorageResult<Vec<ObjectInfo>>;

    /// Delete an object. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Public URL clients can fetch `key` from.
    fn public_url(&self, key: &str) -> String;

    /// Cheap round trip proving the backend is reachable.
    async fn check_connectivity(&self) -> StorageResult<()>;

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        match self.head(key).await {
            Ok(_) => Ok(true),
            Err(StorageError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// `<endpoint>/<bucket>/<url-encoded key>`.
pub fn public_object_url(endpoint: &str, bucket: &str, key: &str) -> String {
    format!(
        "{}/{}/{}",
        endpoint.trim_end_matches('/'),
        bucket,
        urlencoding::encode(key)
    )
}

/// A single `bytes=` range from an HTTP `Range` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRange {
    /// `bytes=start-` or `bytes=start-end` (end inclusive)
    From { start: u64, end: Option<u64> },
    /// `bytes=-n`, the last n bytes
    Suffix(u64),
}

impl ByteRange {
    /// Parse a header value. Multi-range requests are not supported.
    pub fn parse(header: &str) -> StorageResult<Self> {
        let invalid = || StorageError::InvalidRange(header.to_string());

        let spec = header.trim().strip_prefix("bytes=").ok_or_else(invalid)?;
        if spec.contains(',') {
            return Err(invalid());
        }
        let (start, end) = spec.split_once('-').ok_or_else(invalid)?;
        let (start, end) = (start.trim(), end.trim());

        if start.is_empty() {
            let n: u64 = end.parse().map_err(|_| invalid())?;
            if n == 0 {
                return Err(invalid());
            }
            return Ok(ByteRange::Suffix(n));
        }

        let start: u64 = start.parse().map_err(|_| invalid())?;
        let end = if end.is_empty() {
            None
        } else {
            let end: u64 = end.parse().map_err(|_| invalid())?;
            if end < start {
                return Err(invalid());
            }
            Some(end)
        };
        Ok(ByteRange::From { start, end })
    }

    /// Resolve against an object of `total` bytes into an inclusive `(start, end)`.
    pub fn resolve(&self, total: u64) -> StorageResult<(u64, u64)> {
        if total == 0 {
            return Err(StorageError::InvalidRange("object is empty".to_string()));
        }
        match *self {
            ByteRange::From { start, .. } if start >= total => Err(StorageError::InvalidRange(
                format!("range starts at {} but object has {} bytes", start, total),
            )),
            ByteRange::From { start, end } => {
                Ok((start, end.map_or(total - 1, |e| e.min(total - 1))))
            }
            ByteRange::Suffix(n) => Ok((total.saturating_sub(n), total - 1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_url() {
        assert_eq!(
            public_object_url("http://localhost:9000/", "videos", "abc.mp4"),
            "http://localhost:9000/videos/abc.mp4"
        );
        assert_eq!(
            public_object_url("http://minio:9000", "videos", "id_my clip.mp4"),
            "http://minio:9000/videos/id_my%20clip.mp4"
        );
    }

    #[test]
    fn test_range_parse() {
        assert_eq!(
            ByteRange::parse("bytes=0-99").unwrap(),
            ByteRange::From { start: 0, end: Some(99) }
        );
        assert_eq!(
            ByteRange::parse("bytes=100-").unwrap(),
            ByteRange::From { start: 100, end: None }
        );
        assert_eq!(ByteRange::parse("bytes=-50").unwrap(), ByteRange::Suffix(50));

        for bad in ["0-99", "bytes=abc", "bytes=9-1", "bytes=0-1,5-6", "bytes=-0", "bytes=-"] {
            assert!(ByteRange::parse(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_range_resolve() {
        let total = 1000;
        assert_eq!(ByteRange::parse("bytes=0-99").unwrap().resolve(total).unwrap(), (0, 99));
        assert_eq!(ByteRange::parse("bytes=900-").unwrap().resolve(total).unwrap(), (900, 999));
        assert_eq!(ByteRange::parse("bytes=990-5000").unwrap().resolve(total).unwrap(), (990, 999));
        assert_eq!(ByteRange::parse("bytes=-10").unwrap().resolve(total).unwrap(), (990, 999));
        assert_eq!(ByteRange::parse("bytes=-5000").unwrap().resolve(total).unwrap(), (0, 999));
        assert!(ByteRange::parse("bytes=1000-").unwrap().resolve(total).is_err());
    }
}
