//! Directory-backed object store.
//!
//! Each key is one file directly under the root directory. Used for local
//! development without MinIO and as the store behind editor tests.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;
use futures_util::StreamExt;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};
use crate::store::{public_object_url, ByteRange, ObjectBody, ObjectInfo, ObjectStore};

/// Suffix of in-flight uploads; such files are never listed.
const PARTIAL_SUFFIX: &str = ".partial";

#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
    public_endpoint: String,
    bucket: String,
}

impl LocalStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub async fn new(
        root: impl Into<PathBuf>,
        public_endpoint: impl Into<String>,
        bucket: impl Into<String>,
    ) -> StorageResult<Self> {
        let root = root.into();

        fs::create_dir_all(&root).await.map_err(|e| {
            StorageError::config_error(format!(
                "Failed to create storage directory {}: {}",
                root.display(),
                e
            ))
        })?;

        Ok(Self {
            root,
            public_endpoint: public_endpoint.into(),
            bucket: bucket.into(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a key to its file, rejecting anything that is not a plain file name.
    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        let invalid = key.is_empty()
            || key == "."
            || key == ".."
            || key.contains(['/', '\\', '\0'])
            || key.ends_with(PARTIAL_SUFFIX);
        if invalid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(key))
    }

    async fn metadata(&self, key: &str) -> StorageResult<(PathBuf, std::fs::Metadata)> {
        let path = self.key_to_path(key)?;
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok((path, meta)),
            Ok(_) => Err(StorageError::not_found(key)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::not_found(key))
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn modified(meta: &std::fs::Metadata) -> Option<DateTime<Utc>> {
    meta.modified().ok().map(DateTime::<Utc>::from)
}

#[async_trait]
impl ObjectStore for LocalStore {
    fn backend_name(&self) -> &'static str {
        "local"
    }

    async fn head(&self, key: &str) -> StorageResult<ObjectInfo> {
        let (_, meta) = self.metadata(key).await?;
        Ok(ObjectInfo {
            key: key.to_string(),
            size: meta.len(),
            last_modified: modified(&meta),
        })
    }

    async fn download_to(&self, key: &str, path: &Path) -> StorageResult<u64> {
        let (src, _) = self.metadata(key).await?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let written = fs::copy(&src, path).await.map_err(|e| {
            StorageError::download_failed(format!("Failed to copy {}: {}", src.display(), e))
        })?;

        debug!("Copied {} ({} bytes) to {}", key, written, path.display());
        Ok(written)
    }

    async fn upload_from(&self, path: &Path, key: &str, _content_type: &str) -> StorageResult<()> {
        let dest = self.key_to_path(key)?;
        let partial = self.root.join(format!("{}{}", key, PARTIAL_SUFFIX));

        // Readers never observe a half-written object
        if let Err(e) = fs::copy(path, &partial).await {
            let _ = fs::remove_file(&partial).await;
            return Err(StorageError::upload_failed(format!(
                "Failed to copy {}: {}",
                path.display(),
                e
            )));
        }
        fs::rename(&partial, &dest)
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        info!("Stored {} as {}", path.display(), key);
        Ok(())
    }

    async fn get_object(&self, key: &str, range: Option<&str>) -> StorageResult<ObjectBody> {
        let (path, meta) = self.metadata(key).await?;
        let total = meta.len();

        let (start, end, content_range) = match range {
            Some(header) => {
                let (start, end) = ByteRange::parse(header)?.resolve(total)?;
                (start, end, Some(format!("bytes {}-{}/{}", start, end, total)))
            }
            None => (0, total.saturating_sub(1), None),
        };
        let len = if total == 0 { 0 } else { end - start + 1 };

        let mut file = fs::File::open(&path).await?;
        if start > 0 {
            file.seek(std::io::SeekFrom::Start(start)).await?;
        }
        let stream =
            ReaderStream::new(file.take(len)).map(|chunk| chunk.map_err(StorageError::from));

        Ok(ObjectBody {
            stream: Box::pin(stream),
            content_length: Some(len),
            content_type: None,
            content_range,
        })
    }

    async fn list(&self) -> StorageResult<Vec<ObjectInfo>> {
        let mut entries = fs::read_dir(&self.root)
            .await
            .map_err(|e| StorageError::ListFailed(e.to_string()))?;

        let mut objects = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::ListFailed(e.to_string()))?
        {
            let meta = entry.metadata().await?;
            let name = entry.file_name().to_string_lossy().to_string();
            if !meta.is_file() || name.ends_with(PARTIAL_SUFFIX) {
                continue;
            }
            objects.push(ObjectInfo {
                key: name,
                size: meta.len(),
                last_modified: modified(&meta),
            });
        }

        // S3 lists keys in lexicographic order
        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.key_to_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::delete_failed(e.to_string())),
        }
    }

    fn public_url(&self, key: &str) -> String {
        public_object_url(&self.public_endpoint, &self.bucket, key)
    }

    async fn check_connectivity(&self) -> StorageResult<()> {
        let meta = fs::metadata(&self.root).await?;
        if !meta.is_dir() {
            return Err(StorageError::config_error(format!(
                "{} is not a directory",
                self.root.display()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures_util::TryStreamExt;
    use tempfile::TempDir;

    async fn store() -> (TempDir, LocalStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("bucket"), "http://localhost:9000", "videos")
            .await
            .unwrap();
        (dir, store)
    }

    async fn put(store: &LocalStore, dir: &TempDir, key: &str, data: &[u8]) {
        let src = dir.path().join("upload.tmp");
        fs::write(&src, data).await.unwrap();
        store.upload_from(&src, key, "video/mp4").await.unwrap();
    }

    async fn collect(body: ObjectBody) -> Vec<u8> {
        body.stream
            .try_fold(Vec::new(), |mut acc, chunk| async move {
                acc.extend_from_slice(&chunk);
                Ok(acc)
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_large_object_streams_in_chunks() {
        let (dir, store) = store().await;
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        put(&store, &dir, "big.mp4", &data).await;

        let body = store.get_object("big.mp4", None).await.unwrap();
        assert_eq!(body.content_length, Some(data.len() as u64));

        let chunks: Vec<Bytes> = body.stream.try_collect().await.unwrap();
        assert!(chunks.len() > 1, "body is not read in one piece");
        assert_eq!(chunks.concat(), data);
    }

    #[tokio::test]
    async fn test_empty_object_streams_nothing() {
        let (dir, store) = store().await;
        put(&store, &dir, "empty.mp4", b"").await;

        let body = store.get_object("empty.mp4", None).await.unwrap();
        assert_eq!(body.content_length, Some(0));
        assert!(collect(body).await.is_empty());
    }

    #[tokio::test]
    async fn test_upload_head_download() {
        let (dir, store) = store().await;
        put(&store, &dir, "a.mp4", b"0123456789").await;

        let info = store.head("a.mp4").await.unwrap();
        assert_eq!(info.size, 10);
        assert!(info.last_modified.is_some());

        let dst = dir.path().join("scratch").join("in.mp4");
        assert_eq!(store.download_to("a.mp4", &dst).await.unwrap(), 10);
        assert_eq!(fs::read(&dst).await.unwrap(), b"0123456789");
    }

    #[tokio::test]
    async fn test_missing_key_is_not_found() {
        let (dir, store) = store().await;
        assert!(store.head("missing.mp4").await.unwrap_err().is_not_found());
        assert!(!store.exists("missing.mp4").await.unwrap());

        let err = store
            .download_to("missing.mp4", &dir.path().join("x"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_traversal_keys_rejected() {
        let (_dir, store) = store().await;
        for key in ["../etc/passwd", "a/b.mp4", "", ".."] {
            assert!(
                matches!(store.head(key).await, Err(StorageError::InvalidKey(_))),
                "{key}"
            );
        }
    }

    #[tokio::test]
    async fn test_range_read() {
        let (dir, store) = store().await;
        put(&store, &dir, "r.mp4", b"0123456789").await;

        let body = store.get_object("r.mp4", Some("bytes=2-4")).await.unwrap();
        assert_eq!(body.content_length, Some(3));
        assert_eq!(body.content_range.as_deref(), Some("bytes 2-4/10"));
        assert_eq!(collect(body).await, b"234");

        let tail = store.get_object("r.mp4", Some("bytes=-3")).await.unwrap();
        assert_eq!(collect(tail).await, b"789");

        let whole = store.get_object("r.mp4", None).await.unwrap();
        assert_eq!(whole.content_length, Some(10));
        assert!(whole.content_range.is_none());
        assert_eq!(collect(whole).await, b"0123456789");

        assert!(matches!(
            store.get_object("r.mp4", Some("bytes=50-")).await,
            Err(StorageError::InvalidRange(_))
        ));
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let (dir, store) = store().await;
        put(&store, &dir, "b.mp4", b"bb").await;
        put(&store, &dir, "a.mp4", b"a").await;

        let keys: Vec<String> = store.list().await.unwrap().into_iter().map(|o| o.key).collect();
        assert_eq!(keys, vec!["a.mp4", "b.mp4"]);

        store.delete("a.mp4").await.unwrap();
        store.delete("a.mp4").await.unwrap();
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_public_url_and_connectivity() {
        let (_dir, store) = store().await;
        assert_eq!(store.public_url("x.mp4"), "http://localhost:9000/videos/x.mp4");
        store.check_connectivity().await.unwrap();
    }
}
