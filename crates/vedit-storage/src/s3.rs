//! S3-compatible client (AWS S3, MinIO).

use std::path::Path;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::Builder;
use aws_sdk_s3::primitives::{ByteStream, DateTime as SmithyDateTime};
use aws_sdk_s3::Client;
use aws_types::region::Region;
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};

use crate::error::{StorageError, StorageResult};
use crate::store::{public_object_url, ObjectBody, ObjectInfo, ObjectStore};

/// Configuration for the S3 client.
#[derive(Debug, Clone)]
pub struct S3Config {
    /// S3 API endpoint URL
    pub endpoint_url: String,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Bucket name
    pub bucket_name: String,
    pub region: String,
    /// Endpoint used in URLs handed to clients; usually equal to `endpoint_url`
    pub public_endpoint: String,
}

impl Default for S3Config {
    fn default() -> Self {
        let endpoint = "http://localhost:9000".to_string();
        Self {
            endpoint_url: endpoint.clone(),
            access_key_id: "minioadmin".to_string(),
            secret_access_key: "minioadmin".to_string(),
            bucket_name: "videos".to_string(),
            region: "us-east-1".to_string(),
            public_endpoint: endpoint,
        }
    }
}

impl S3Config {
    /// Create config from environment variables, falling back to a local MinIO setup.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let endpoint_url = std::env::var("S3_ENDPOINT").unwrap_or(defaults.endpoint_url);

        Self {
            public_endpoint: std::env::var("S3_PUBLIC_ENDPOINT")
                .unwrap_or_else(|_| endpoint_url.clone()),
            endpoint_url,
            access_key_id: std::env::var("S3_ACCESS_KEY").unwrap_or(defaults.access_key_id),
            secret_access_key: std::env::var("S3_SECRET_KEY")
                .unwrap_or(defaults.secret_access_key),
            bucket_name: std::env::var("S3_BUCKET_NAME").unwrap_or(defaults.bucket_name),
            region: std::env::var("S3_REGION").unwrap_or(defaults.region),
        }
    }

    /// Reject configurations the SDK would only fail on at request time.
    pub fn validate(&self) -> StorageResult<()> {
        if self.bucket_name.trim().is_empty() {
            return Err(StorageError::config_error("S3_BUCKET_NAME must not be empty"));
        }
        if !self.endpoint_url.starts_with("http://") && !self.endpoint_url.starts_with("https://")
        {
            return Err(StorageError::config_error(format!(
                "S3_ENDPOINT must be an http(s) URL, got '{}'",
                self.endpoint_url
            )));
        }
        Ok(())
    }
}

/// S3 object store.
#[derive(Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
    public_endpoint: String,
}

impl S3Store {
    /// Create a new client from configuration.
    pub fn new(config: S3Config) -> StorageResult<Self> {
        config.validate()?;

        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "vedit",
        );

        // Path-style addressing: MinIO does not serve virtual-hosted buckets by default
        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint_url)
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(sdk_config),
            bucket: config.bucket_name,
            public_endpoint: config.public_endpoint,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Self::new(S3Config::from_env())
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

fn to_utc(t: Option<&SmithyDateTime>) -> Option<DateTime<Utc>> {
    t.and_then(|t| t.to_millis().ok())
        .and_then(DateTime::<Utc>::from_timestamp_millis)
}

#[async_trait]
impl ObjectStore for S3Store {
    fn backend_name(&self) -> &'static str {
        "s3"
    }

    async fn head(&self, key: &str) -> StorageResult<ObjectInfo> {
        let response = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().map(|se| se.is_not_found()) == Some(true) {
                    StorageError::not_found(key)
                } else {
                    StorageError::AwsSdk(e.to_string())
                }
            })?;

        Ok(ObjectInfo {
            key: key.to_string(),
            size: response.content_length().unwrap_or(0).max(0) as u64,
            last_modified: to_utc(response.last_modified()),
        })
    }

    async fn download_to(&self, key: &str, path: &Path) -> StorageResult<u64> {
        debug!("Downloading {} to {}", key, path.display());

        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().map(|se| se.is_no_such_key()) == Some(true) {
                    StorageError::not_found(key)
                } else {
                    StorageError::download_failed(e.to_string())
                }
            })?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::download_failed(format!("Failed to create directory: {}", e))
            })?;
        }

        let mut file = tokio::fs::File::create(path)
            .await
            .map_err(|e| StorageError::download_failed(format!("Failed to create file: {}", e)))?;
        let mut reader = response.body.into_async_read();
        let written = tokio::io::copy(&mut reader, &mut file)
            .await
            .map_err(|e| StorageError::download_failed(format!("Failed to write file: {}", e)))?;
        file.flush().await?;

        info!("Downloaded {} ({} bytes) to {}", key, written, path.display());
        Ok(written)
    }

    async fn upload_from(&self, path: &Path, key: &str, content_type: &str) -> StorageResult<()> {
        debug!("Uploading {} to {}", path.display(), key);

        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        info!("Uploaded {} to {}", path.display(), key);
        Ok(())
    }

    async fn get_object(&self, key: &str, range: Option<&str>) -> StorageResult<ObjectBody> {
        let mut request = self.client.get_object().bucket(&self.bucket).key(key);

        if let Some(r) = range {
            request = request.range(r);
        }

        let response = request.send().await.map_err(|e| {
            if e.as_service_error().map(|se| se.is_no_such_key()) == Some(true) {
                StorageError::not_found(key)
            } else if e.raw_response().map(|r| r.status().as_u16()) == Some(416) {
                StorageError::InvalidRange(range.unwrap_or_default().to_string())
            } else {
                StorageError::download_failed(e.to_string())
            }
        })?;

        let content_type = response.content_type().map(str::to_string);
        let content_range = response.content_range().map(str::to_string);
        let content_length = response.content_length().and_then(|n| u64::try_from(n).ok());

        let key = key.to_string();
        let stream = ReaderStream::new(response.body.into_async_read()).map(move |chunk| {
            chunk.map_err(|e| {
                warn!(key = %key, "S3 stream read failed: {}", e);
                StorageError::download_failed(e.to_string())
            })
        });

        Ok(ObjectBody {
            stream: Box::pin(stream),
            content_length,
            content_type,
            content_range,
        })
    }

    async fn list(&self) -> StorageResult<Vec<ObjectInfo>> {
        debug!("Listing objects in bucket {}", self.bucket);

        let mut objects = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self.client.list_objects_v2().bucket(&self.bucket);

            if let Some(token) = continuation_token {
                request = request.continuation_token(token);
            }

            let response = request
                .send()
                .await
                .map_err(|e| StorageError::ListFailed(e.to_string()))?;

            for obj in response.contents() {
                objects.push(ObjectInfo {
                    key: obj.key().unwrap_or_default().to_string(),
                    size: obj.size().unwrap_or(0).max(0) as u64,
                    last_modified: to_utc(obj.last_modified()),
                });
            }

            if response.is_truncated() == Some(true) {
                continuation_token = response.next_continuation_token;
            } else {
                break;
            }
        }

        Ok(objects)
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        debug!("Deleting {}", key);

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::delete_failed(e.to_string()))?;

        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        public_object_url(&self.public_endpoint, &self.bucket, key)
    }

    async fn check_connectivity(&self) -> StorageResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| StorageError::AwsSdk(format!("S3 connectivity check failed: {}", e)))?;
        Ok(())
    }
}
