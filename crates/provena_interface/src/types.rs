//! Records exchanged between the execution core and a repository.

use chrono::{DateTime, Utc};
use provena_core::{ExecutionId, FileId, ProgramOutcome};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A file reference given either as a numeric id or as an alias.
///
/// # Examples
///
/// ```
/// use provena_core::FileId;
/// use provena_interface::IdOrAlias;
///
/// assert_eq!(IdOrAlias::from(FileId::from(3)), IdOrAlias::Id(FileId::from(3)));
/// assert_eq!(IdOrAlias::from("genome"), IdOrAlias::Alias("genome".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdOrAlias {
    /// Numeric file id
    Id(FileId),
    /// Alias bound to a file
    Alias(String),
}

impl From<FileId> for IdOrAlias {
    fn from(id: FileId) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for IdOrAlias {
    fn from(alias: &str) -> Self {
        Self::Alias(alias.to_string())
    }
}

impl From<String> for IdOrAlias {
    fn from(alias: String) -> Self {
        Self::Alias(alias)
    }
}

impl std::fmt::Display for IdOrAlias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdOrAlias::Id(id) => write!(f, "{}", id),
            IdOrAlias::Alias(alias) => write!(f, "{}", alias),
        }
    }
}

/// A file staged for import when its execution is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedFile {
    /// Absolute path of the file inside the working directory
    pub path: PathBuf,
    /// Free-form description stored with the file
    pub description: String,
    /// Existing repository file this one belongs to
    pub associate_to_id: Option<FileId>,
    /// Another file staged in the same execution this one belongs to
    pub associate_to_filename: Option<PathBuf>,
    /// Name template used when exporting alongside the associated file
    pub template: Option<String>,
    /// Alias to bind to the imported file
    pub alias: Option<String>,
}

/// Everything an execution accumulated, handed to the repository at finalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// Local working directory the programs ran in
    pub working_directory: PathBuf,
    /// Same directory as seen from batch worker nodes
    pub remote_working_directory: PathBuf,
    /// When the scope was entered
    pub started_at: DateTime<Utc>,
    /// When the scope was left
    pub finished_at: Option<DateTime<Utc>>,
    /// Program outcomes in the order they were recorded
    pub programs: Vec<ProgramOutcome>,
    /// Files staged for import, in staging order
    pub staged_files: Vec<StagedFile>,
    /// Repository files fetched into the working directory
    pub used_files: Vec<FileId>,
}

/// A recorded execution as read back from a repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionEntry {
    /// Identifier assigned at recording time
    pub id: ExecutionId,
    /// Description supplied when the execution was opened
    pub description: String,
    /// Failure trace when the execution body did not complete normally
    pub failure: Option<String>,
    /// The recorded state
    pub record: ExecutionRecord,
}

/// A file associated with another, exported next to it.
///
/// # Examples
///
/// ```
/// use provena_core::FileId;
/// use provena_interface::AssociatedFile;
///
/// let index = AssociatedFile { id: FileId::from(9), template: "{}.bai".to_string() };
/// assert_eq!(index.name_for("reads"), "reads.bai");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssociatedFile {
    /// Id of the associated file
    pub id: FileId,
    /// Name template; `{}` stands for the primary file's exported name
    pub template: String,
}

impl AssociatedFile {
    /// Export name for this file next to a primary file named `primary`.
    pub fn name_for(&self, primary: &str) -> String {
        self.template.replace("{}", primary)
    }
}

/// Metadata of a stored file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// File id
    pub id: FileId,
    /// Description given at staging time
    pub description: String,
    /// Name of the file in the working directory it was imported from
    pub original_name: String,
    /// Execution that imported the file
    pub execution: Option<ExecutionId>,
    /// Alias bound to the file
    pub alias: Option<String>,
    /// File this one is associated with
    pub associated_to: Option<FileId>,
    /// Export name template relative to the associated file
    pub template: Option<String>,
    /// SHA-256 of the content
    pub content_hash: String,
    /// Content size in bytes
    pub size_bytes: u64,
}
