//! Filesystem-based blob storage implementation.
//!
//! This backend stores file contents in a content-addressable filesystem structure,
//! organized by content hash for automatic deduplication.

use crate::{BlobReference, BlobStorage};
use provena_error::{ProvenaResult, StorageError, StorageErrorKind};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Filesystem storage backend.
///
/// Stores blobs in a content-addressable structure:
/// `{base_path}/{hash[0:2]}/{hash[2:4]}/{hash}`
///
/// # Example Structure
///
/// ```text
/// /var/provena/blobs/
/// ├── ab/
/// │   └── cd/
/// │       └── abcdef123456...
/// └── 12/
///     └── 34/
///         └── 123456abcdef...
/// ```
///
/// Writes go to a temporary file that is then renamed into place, and two-level
/// subdirectories keep any single directory small.
#[derive(Debug, Clone)]
pub struct FileSystemStorage {
    base_path: PathBuf,
}

impl FileSystemStorage {
    /// Create a new filesystem storage backend.
    ///
    /// Creates the base directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created or accessed.
    #[tracing::instrument(skip(base_path))]
    pub fn new(base_path: impl Into<PathBuf>) -> ProvenaResult<Self> {
        let base_path = base_path.into();

        std::fs::create_dir_all(&base_path).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                base_path.display(),
                e
            )))
        })?;

        tracing::debug!(path = %base_path.display(), "Opened filesystem storage");
        Ok(Self { base_path })
    }

    /// Compute SHA-256 hash of data.
    pub fn compute_hash(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        format!("{:x}", hasher.finalize())
    }

    /// Structure: `{base}/{hash[0:2]}/{hash[2:4]}/{hash}`
    fn get_path(&self, hash: &str) -> PathBuf {
        self.base_path
            .join(&hash[0..2])
            .join(&hash[2..4])
            .join(hash)
    }

    fn verify_hash(data: &[u8], expected_hash: &str) -> ProvenaResult<()> {
        let actual_hash = Self::compute_hash(data);
        if actual_hash != expected_hash {
            return Err(StorageError::new(StorageErrorKind::Corrupted(format!(
                "Hash mismatch: expected {}, got {}",
                expected_hash, actual_hash
            )))
            .into());
        }
        Ok(())
    }

    fn reference(&self, hash: String, path: &Path, size: usize) -> BlobReference {
        BlobReference {
            content_hash: hash,
            storage_path: path.to_string_lossy().to_string(),
            size_bytes: size as u64,
        }
    }
}

#[async_trait::async_trait]
impl BlobStorage for FileSystemStorage {
    #[tracing::instrument(skip(self, data), fields(size = data.len()))]
    async fn store(&self, data: &[u8]) -> ProvenaResult<BlobReference> {
        let hash = Self::compute_hash(data);
        let path = self.get_path(&hash);

        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::debug!(
                hash = %hash,
                path = %path.display(),
                "Blob already exists, returning existing reference"
            );
            return Ok(self.reference(hash, &path, data.len()));
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                    "{}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }

        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, data).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "{}: {}",
                temp_path.display(),
                e
            )))
        })?;

        tokio::fs::rename(&temp_path, &path).await.map_err(|e| {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "rename {} to {}: {}",
                temp_path.display(),
                path.display(),
                e
            )))
        })?;

        tracing::debug!(
            hash = %hash,
            path = %path.display(),
            size = data.len(),
            "Stored blob"
        );

        Ok(self.reference(hash, &path, data.len()))
    }

    #[tracing::instrument(skip(self, reference), fields(hash = %reference.content_hash))]
    async fn retrieve(&self, reference: &BlobReference) -> ProvenaResult<Vec<u8>> {
        let path = Path::new(&reference.storage_path);

        let data = tokio::fs::read(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::new(StorageErrorKind::NotFound(reference.storage_path.clone()))
            } else {
                StorageError::new(StorageErrorKind::FileRead(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            }
        })?;

        Self::verify_hash(&data, &reference.content_hash)?;
        Ok(data)
    }
}
