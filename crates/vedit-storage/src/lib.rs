//! Object storage for source and edited videos.
//!
//! This crate provides:
//! - The [`ObjectStore`] trait the editor and HTTP layer program against
//! - An S3/MinIO implementation ([`S3Store`])
//! - A directory-backed implementation for development and tests ([`LocalStore`])
//! - Public URL derivation (`<endpoint>/<bucket>/<key>`)

pub mod config;
pub mod error;
pub mod local;
pub mod s3;
pub mod store;

pub use config::{create_store, StorageBackend, StorageConfig};
pub use error::{StorageError, StorageResult};
pub use local::LocalStore;
pub use s3::{S3Config, S3Store};
pub use store::{
    public_object_url, ByteChunkStream, ByteRange, ObjectBody, ObjectInfo, ObjectStore,
};
