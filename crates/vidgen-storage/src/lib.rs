//! Object storage abstraction
//!
//! The workflow needs four operations against the object store: write a blob
//! under an explicit key, read it back, delete it, and derive its public URL.
//! Backends: S3 (and S3-compatible endpoints) for deployment, in-memory for
//! tests.

mod memory;
mod s3;

pub use memory::MemoryStorage;
pub use s3::S3Storage;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Object store client.
///
/// Keys are caller-derived (see `vidgen_core::keys`); the backend never
/// invents its own.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write `data` under `key` and return the object's public URL.
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<String>;

    /// Read the object stored under `key`.
    async fn download(&self, key: &str) -> StorageResult<Bytes>;

    /// Delete the object stored under `key`.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Public URL the object at `key` is (or would be) retrievable at.
    fn public_url(&self, key: &str) -> String;
}
