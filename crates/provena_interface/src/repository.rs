//! Repository trait for execution and file persistence.
//!
//! Implementations can use databases, filesystems, or in-memory structures.
//! The execution core only records executions through [`Repository::write_execution`]
//! and fetches files through the resolve/export/association methods.

use crate::{AssociatedFile, ExecutionEntry, ExecutionRecord, FileInfo, IdOrAlias};
use async_trait::async_trait;
use provena_core::{ExecutionId, FileId};
use provena_error::ProvenaResult;
use std::path::{Path, PathBuf};

/// Persistent store for execution records and files.
///
/// All methods are async to support async database drivers and network I/O.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Durably record a finished execution and return its identifier.
    ///
    /// Staged files are imported in staging order. `failure` carries the
    /// failure trace when the execution body did not complete normally.
    async fn write_execution(
        &self,
        record: &ExecutionRecord,
        description: &str,
        failure: Option<&str>,
    ) -> ProvenaResult<ExecutionId>;

    /// Load a previously recorded execution.
    async fn load_execution(&self, id: ExecutionId) -> ProvenaResult<ExecutionEntry>;

    /// Resolve an id or alias to a file id.
    ///
    /// Fails with `RepositoryErrorKind::FileNotFound` if nothing matches.
    async fn resolve_alias(&self, id_or_alias: &IdOrAlias) -> ProvenaResult<FileId>;

    /// Copy a stored file into `destination_dir` under a fresh unique name.
    ///
    /// Returns the name the file was written under.
    async fn export_file(&self, id: FileId, destination_dir: &Path) -> ProvenaResult<String>;

    /// Copy a stored file to an exact path.
    async fn export_file_to(&self, id: FileId, destination: &Path) -> ProvenaResult<()>;

    /// Files associated with `id`, each with the name template to export it under.
    async fn associated_files_of(&self, id: FileId) -> ProvenaResult<Vec<AssociatedFile>>;

    /// Location of the stored content of a file.
    async fn path_to_file(&self, id_or_alias: &IdOrAlias) -> ProvenaResult<PathBuf>;

    /// Metadata of a stored file.
    async fn file_info(&self, id: FileId) -> ProvenaResult<FileInfo>;

    /// Files imported by a given execution, in import order.
    async fn files_from_execution(&self, id: ExecutionId) -> ProvenaResult<Vec<FileInfo>>;
}
