//! Byte storage collaborator for document content.

use async_trait::async_trait;
use bytes::Bytes;

use crate::result::AppResult;

/// Trait for document byte storage backends.
///
/// The version chain never touches bytes directly: it records a
/// `storage_path` and size, and the upload workflow talks to this trait.
/// A local filesystem implementation lives in `dochub-storage`.
#[async_trait]
pub trait StorageProvider: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "local", "s3").
    fn provider_type(&self) -> &str;

    /// Check whether the provider is healthy and reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Store bytes at the given path, returning the number of bytes written.
    async fn upload(&self, path: &str, data: Bytes) -> AppResult<u64>;

    /// Read the complete object at the given path.
    async fn download(&self, path: &str) -> AppResult<Bytes>;

    /// Delete the object at the given path. Deleting a missing object succeeds.
    async fn delete(&self, path: &str) -> AppResult<()>;

    /// Check whether an object exists at the given path.
    async fn exists(&self, path: &str) -> AppResult<bool>;

    /// Public URL under which the object is served.
    fn url_for(&self, path: &str) -> String;
}
