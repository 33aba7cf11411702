//! Blob storage for filevault.
//!
//! Blobs are flat files named by a fresh UUID v4 under the storage root:
//! ```text
//! {root}/
//! ├── 0f8fad5b-d9cb-469f-a165-70867728950e
//! ├── 0f8fad5b-d9cb-469f-a165-70867728950e_500   (derivative, written by the worker)
//! └── 7c9e6679-7425-40de-944b-e07fc1f90ae7
//! ```

use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;
use uuid::Uuid;

use crate::artifact;
use crate::{Result, VaultError};

/// On-disk blob store.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    /// Create a store rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `content` to a new blob and return its full path.
    ///
    /// Bytes land in `<uuid>.tmp` first and are renamed into place, so a
    /// returned path always names a complete file.
    pub async fn put(&self, content: &[u8]) -> Result<String> {
        tokio::fs::create_dir_all(&self.root).await?;

        let name = Uuid::new_v4().to_string();
        let final_path = self.root.join(&name);
        let tmp_path = self.root.join(format!("{name}.tmp"));

        if let Err(e) = tokio::fs::write(&tmp_path, content).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }
        tokio::fs::rename(&tmp_path, &final_path).await?;

        debug!(path = %final_path.display(), bytes = content.len(), "Blob stored");
        Ok(final_path.to_string_lossy().into_owned())
    }

    /// Read a blob by path.
    pub async fn get(&self, path: &str) -> Result<Vec<u8>> {
        match tokio::fs::read(path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(VaultError::NotFound("file content".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Path of the derivative of `path` at `size` (0 = the original).
    pub fn variant_path(path: &str, size: u32) -> String {
        artifact::variant_path(path, size)
    }
}
