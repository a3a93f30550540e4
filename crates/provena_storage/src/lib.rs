//! Unique naming, content-addressable storage and a local repository for provena.
//!
//! # Features
//!
//! - **Unique names**: [`NameGenerator`] picks random names no existing entry in a
//!   directory starts with
//! - **Content-addressable storage**: blobs stored by SHA-256 hash for automatic deduplication
//! - **Local repository**: [`LocalRepository`] implements the `Repository` collaborator
//!   on top of a blob store and a JSON catalog
//!
//! # Example
//!
//! ```rust
//! use provena_storage::{BlobStorage, FileSystemStorage};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = FileSystemStorage::new("/tmp/provena-blobs")?;
//!
//! let reference = storage.store(b"ACGT").await?;
//! let retrieved = storage.retrieve(&reference).await?;
//! assert_eq!(retrieved, b"ACGT");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use provena_error::ProvenaResult;
use serde::{Deserialize, Serialize};

mod filesystem;
mod local;
mod names;

pub use filesystem::FileSystemStorage;
pub use local::LocalRepository;
pub use names::{DEFAULT_NAME_LENGTH, NameGenerator, unique_name_in};
pub use provena_error::{StorageError, StorageErrorKind};

/// Trait for pluggable blob storage backends.
#[async_trait::async_trait]
pub trait BlobStorage: Send + Sync {
    /// Store content and return a reference to it.
    ///
    /// Storing identical content twice yields references to the same location.
    async fn store(&self, data: &[u8]) -> ProvenaResult<BlobReference>;

    /// Retrieve content by reference, verifying its hash.
    async fn retrieve(&self, reference: &BlobReference) -> ProvenaResult<Vec<u8>>;
}

/// Reference to stored content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobReference {
    /// SHA-256 hash of the content
    pub content_hash: String,
    /// Backend-specific path to the content
    pub storage_path: String,
    /// Size of the content in bytes
    pub size_bytes: u64,
}
