//! Media file collaborator.
//!
//! Rows are the source of truth; files are removed only after the
//! write that detached them has committed.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{ServiceError, ServiceResult};

/// Storage path of a product image.
pub fn product_image_path(filename: &str) -> String {
    format!("images/products/{}", filename)
}

/// Removes stored files by relative path.
#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn delete_files(&self, paths: &[String]) -> ServiceResult<()>;
}

/// Files under a local root directory.
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalFileStorage { root: root.into() }
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    /// Missing files are skipped; any other failure stops the batch.
    async fn delete_files(&self, paths: &[String]) -> ServiceResult<()> {
        for path in paths {
            if path.split('/').any(|part| part == "..") {
                return Err(ServiceError::Storage(format!("path escapes root: {}", path)));
            }

            let full = self.root.join(path);
            match tokio::fs::remove_file(&full).await {
                Ok(()) => debug!(path = %full.display(), "File removed"),
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    warn!(path = %full.display(), "File already gone");
                }
                Err(e) => {
                    return Err(ServiceError::Storage(format!("{}: {}", full.display(), e)));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_storage_removes_files() {
        let dir = tempfile::tempdir().unwrap();
        let images = dir.path().join("images/products");
        tokio::fs::create_dir_all(&images).await.unwrap();
        tokio::fs::write(images.join("zaku.jpg"), b"jpg").await.unwrap();

        let storage = LocalFileStorage::new(dir.path());
        storage
            .delete_files(&[product_image_path("zaku.jpg"), product_image_path("gone.jpg")])
            .await
            .unwrap();

        assert!(!images.join("zaku.jpg").exists());
    }

    #[tokio::test]
    async fn test_local_storage_rejects_parent_paths() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path());

        let err = storage
            .delete_files(&["../etc/passwd".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Storage(_)));
    }
}
