//! Backend selection.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{StorageError, StorageResult};
use crate::local::LocalStore;
use crate::s3::{S3Config, S3Store};
use crate::store::ObjectStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    S3,
    Local,
}

impl FromStr for StorageBackend {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s3" | "minio" => Ok(StorageBackend::S3),
            "local" | "fs" => Ok(StorageBackend::Local),
            other => Err(StorageError::config_error(format!(
                "Unknown STORAGE_BACKEND '{}': expected s3 or local",
                other
            ))),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Bucket, endpoints and credentials (the local backend reuses bucket and public endpoint)
    pub s3: S3Config,
    /// Root directory of the local backend
    pub local_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::S3,
            s3: S3Config::default(),
            local_dir: PathBuf::from("./data/objects"),
        }
    }
}

impl StorageConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        let backend = match std::env::var("STORAGE_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => StorageBackend::default(),
        };

        Ok(Self {
            backend,
            s3: S3Config::from_env(),
            local_dir: std::env::var("LOCAL_STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| Self::default().local_dir),
        })
    }
}

/// Build the configured store.
pub async fn create_store(config: &StorageConfig) -> StorageResult<Arc<dyn ObjectStore>> {
    match config.backend {
        StorageBackend::S3 => {
            let store = S3Store::new(config.s3.clone())?;
            info!(
                endpoint = %config.s3.endpoint_url,
                bucket = %config.s3.bucket_name,
                "Using S3 object store"
            );
            Ok(Arc::new(store))
        }
        StorageBackend::Local => {
            let store = LocalStore::new(
                &config.local_dir,
                config.s3.public_endpoint.clone(),
                config.s3.bucket_name.clone(),
            )
            .await?;
            info!(dir = %config.local_dir.display(), "Using local object store");
            Ok(Arc::new(store))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_parse() {
        assert_eq!("S3".parse::<StorageBackend>().unwrap(), StorageBackend::S3);
        assert_eq!(" local ".parse::<StorageBackend>().unwrap(), StorageBackend::Local);
        assert!("gcs".parse::<StorageBackend>().is_err());
    }

    #[tokio::test]
    async fn test_create_local_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            backend: StorageBackend::Local,
            local_dir: dir.path().join("objects"),
            ..StorageConfig::default()
        };
        let store = create_store(&config).await.unwrap();
        assert_eq!(store.backend_name(), "local");
        assert_eq!(store.public_url("k.mp4"), "http://localhost:9000/videos/k.mp4");
    }
}
