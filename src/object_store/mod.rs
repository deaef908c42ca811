mod azure;
mod local;

pub use azure::AzureBlobStore;
pub use local::LocalStore;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("Object already exists: {0}")]
    AlreadyExists(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Object not found: {0}")]
    NotFound(String),
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Abstraction over the bronze object-storage backends.
/// Keys are container-relative paths (`<folder>/<file>`). Submission
/// objects are write-once: there is no update or delete operation, and
/// `put_if_absent` is the backend's atomic conditional create.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn exists(&self, key: &str) -> Result<bool, ObjectStoreError>;
    async fn get(&self, key: &str) -> Result<Bytes, ObjectStoreError>;
    /// Create a new object at `key`. Fails with [`ObjectStoreError::AlreadyExists`]
    /// when an object is already present; never overwrites.
    async fn put_if_absent(&self, key: &str, data: Bytes) -> Result<(), ObjectStoreError>;
}
