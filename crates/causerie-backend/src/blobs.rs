//! Contract of the blob storage service.

use async_trait::async_trait;
use bytes::Bytes;

use causerie_shared::BackendError;

/// Opaque reference to an uploaded blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobHandle {
    pub path: String,
}

#[async_trait]
pub trait BlobStore: Send + Sync + 'static {
    /// Store `data` at `path` (a `/`-separated key), overwriting any
    /// previous blob there.
    async fn upload(&self, path: &str, data: Bytes) -> Result<BlobHandle, BackendError>;

    /// Resolve a handle to a URL the UI can load the blob from.
    async fn retrieval_url(&self, handle: &BlobHandle) -> Result<String, BackendError>;
}
