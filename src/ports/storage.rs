use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("storage error: {0}")]
pub struct StorageError(pub String);

/// Blob store for source uploads and derived artifacts.
///
/// Keys follow `<ownerId>/originals/...` for sources and
/// `<ownerId>/derived/<videoId>/...` for transcoder outputs.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    async fn get_object(&self, key: &str) -> Result<Bytes, StorageError>;

    /// Stores the object and returns its locator (`s3://bucket/key`).
    async fn put_object(
        &self,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<String, StorageError>;
}
