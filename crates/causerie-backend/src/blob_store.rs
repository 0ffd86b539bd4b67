use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::{debug, info};

use causerie_shared::BackendError;

use crate::blobs::{BlobHandle, BlobStore};

/// Verify that a resolved path stays within the expected base directory.
/// Prevents path traversal attacks.
fn ensure_within(base: &Path, target: &Path) -> Result<PathBuf, BackendError> {
    // Canonicalize base; target may not exist yet so normalize manually
    let canonical_base = base.canonicalize().unwrap_or_else(|_| base.to_path_buf());
    let mut resolved = canonical_base.clone();
    for component in target
        .strip_prefix(&canonical_base)
        .unwrap_or(target)
        .components()
    {
        match component {
            std::path::Component::Normal(c) => resolved.push(c),
            std::path::Component::ParentDir => {
                return Err(BackendError::InvalidPath(
                    "path traversal detected".to_string(),
                ));
            }
            _ => {} // RootDir, CurDir, Prefix — skip
        }
    }
    if !resolved.starts_with(&canonical_base) {
        return Err(BackendError::InvalidPath(
            "path traversal detected".to_string(),
        ));
    }
    Ok(resolved)
}

/// Filesystem-backed blob store.
///
/// Blobs are addressed by `/`-separated keys mapped onto a directory tree
/// under `base_path`; retrieval URLs are `file://` URLs into that tree.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    base_path: PathBuf,
    max_size: usize,
}

impl LocalBlobStore {
    pub async fn new(base_path: PathBuf, max_size: usize) -> Result<Self, BackendError> {
        fs::create_dir_all(&base_path).await?;
        info!(path = %base_path.display(), "blob store initialized");
        Ok(Self {
            base_path,
            max_size,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Map a blob key onto a filesystem path, rejecting separators that
    /// would escape the base directory.
    fn safe_blob_path(&self, key: &str) -> Result<PathBuf, BackendError> {
        if key.is_empty()
            || key.contains('\\')
            || key.contains("..")
            || key.split('/').any(|seg| seg.is_empty())
        {
            return Err(BackendError::InvalidPath(key.to_string()));
        }
        let mut raw = self.base_path.clone();
        for segment in key.split('/') {
            raw.push(segment);
        }
        ensure_within(&self.base_path, &raw)
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn upload(&self, path: &str, data: Bytes) -> Result<BlobHandle, BackendError> {
        if data.len() > self.max_size {
            return Err(BackendError::BlobTooLarge {
                size: data.len(),
                max: self.max_size,
            });
        }

        let target = self.safe_blob_path(path)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&target, &data).await?;

        debug!(path, size = data.len(), "stored blob");
        Ok(BlobHandle {
            path: path.to_string(),
        })
    }

    async fn retrieval_url(&self, handle: &BlobHandle) -> Result<String, BackendError> {
        let target = self.safe_blob_path(&handle.path)?;
        if !target.exists() {
            return Err(BackendError::NotFound);
        }
        Ok(format!("file://{}", target.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn test_store() -> (LocalBlobStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(dir.path().to_path_buf(), 1024 * 1024)
            .await
            .unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn test_upload_and_resolve() {
        let (store, _dir) = test_store().await;

        let handle = store
            .upload("chat_images/c1/m1", Bytes::from_static(b"png-bytes"))
            .await
            .unwrap();
        let url = store.retrieval_url(&handle).await.unwrap();
        assert!(url.starts_with("file://"));
        assert!(url.ends_with("chat_images/c1/m1"));
    }

    #[tokio::test]
    async fn test_too_large_rejected() {
        let (store, _dir) = test_store().await;
        let oversized = Bytes::from(vec![0u8; 2 * 1024 * 1024]);

        let err = store.upload("chat_images/c1/m1", oversized).await;
        assert!(matches!(err, Err(BackendError::BlobTooLarge { .. })));
    }

    #[tokio::test]
    async fn test_traversal_rejected() {
        let (store, _dir) = test_store().await;

        let err = store
            .upload("../escape", Bytes::from_static(b"x"))
            .await;
        assert!(matches!(err, Err(BackendError::InvalidPath(_))));
    }

    #[tokio::test]
    async fn test_missing_blob_not_found() {
        let (store, _dir) = test_store().await;
        let handle = BlobHandle {
            path: "chat_images/c1/none".to_string(),
        };
        assert!(matches!(
            store.retrieval_url(&handle).await,
            Err(BackendError::NotFound)
        ));
    }
}
