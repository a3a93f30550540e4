//! Filesystem-backed implementation of the `Repository` collaborator.
//!
//! File contents live in a [`FileSystemStorage`] under `<root>/blobs`. Metadata
//! (executions, files, aliases, associations) lives in a catalog held in memory
//! behind an `RwLock` and written to `<root>/catalog.json` after every mutation.

use crate::{BlobReference, BlobStorage, FileSystemStorage, unique_name_in};
use async_trait::async_trait;
use provena_core::{ExecutionId, FileId};
use provena_error::{JsonError, ProvenaResult, RepositoryError, RepositoryErrorKind};
use provena_interface::{
    AssociatedFile, ExecutionEntry, ExecutionRecord, FileInfo, IdOrAlias, Repository, StagedFile,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

const CATALOG_FILE: &str = "catalog.json";
const BLOB_DIR: &str = "blobs";

/// Everything the repository knows besides file contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Catalog {
    executions: BTreeMap<i64, ExecutionEntry>,
    files: BTreeMap<i64, StoredFile>,
    aliases: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredFile {
    info: FileInfo,
    blob: BlobReference,
}

impl Catalog {
    fn next_execution_id(&self) -> i64 {
        self.executions.keys().next_back().map_or(1, |id| id + 1)
    }

    fn next_file_id(&self) -> i64 {
        self.files.keys().next_back().map_or(1, |id| id + 1)
    }

    fn resolve(&self, id_or_alias: &IdOrAlias) -> ProvenaResult<FileId> {
        let id = match id_or_alias {
            IdOrAlias::Id(id) => Some(*id).filter(|id| self.files.contains_key(&id.value())),
            IdOrAlias::Alias(alias) => self.aliases.get(alias).copied().map(FileId::from),
        };
        id.ok_or_else(|| {
            RepositoryError::new(RepositoryErrorKind::FileNotFound(id_or_alias.to_string())).into()
        })
    }

    fn stored(&self, id: FileId) -> ProvenaResult<&StoredFile> {
        self.files.get(&id.value()).ok_or_else(|| {
            RepositoryError::new(RepositoryErrorKind::FileNotFound(id.to_string())).into()
        })
    }
}

/// Repository persisting executions and files under a local directory.
///
/// Cloning shares the same catalog.
///
/// # Example
///
/// ```no_run
/// use provena_interface::{IdOrAlias, Repository};
/// use provena_storage::LocalRepository;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let repo = LocalRepository::open("/var/provena")?;
/// let id = repo.resolve_alias(&IdOrAlias::from("reference-genome")).await?;
/// println!("stored at {}", repo.path_to_file(&id.into()).await?.display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct LocalRepository {
    root: PathBuf,
    storage: FileSystemStorage,
    catalog: Arc<RwLock<Catalog>>,
}

impl LocalRepository {
    /// Open (or create) a repository rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directories cannot be created or an existing
    /// catalog cannot be parsed.
    #[tracing::instrument(skip(root), fields(root = %root.as_ref().display()))]
    pub fn open(root: impl AsRef<Path>) -> ProvenaResult<Self> {
        let root = root.as_ref().to_path_buf();
        let storage = FileSystemStorage::new(root.join(BLOB_DIR))?;

        let catalog_path = root.join(CATALOG_FILE);
        let catalog = if catalog_path.exists() {
            let text = std::fs::read_to_string(&catalog_path).map_err(|e| {
                RepositoryError::new(RepositoryErrorKind::Catalog(format!(
                    "{}: {}",
                    catalog_path.display(),
                    e
                )))
            })?;
            serde_json::from_str(&text).map_err(JsonError::from)?
        } else {
            Catalog::default()
        };

        tracing::info!(
            executions = catalog.executions.len(),
            files = catalog.files.len(),
            "Opened local repository"
        );
        Ok(Self {
            root,
            storage,
            catalog: Arc::new(RwLock::new(catalog)),
        })
    }

    /// Root directory of the repository.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of recorded executions.
    pub async fn execution_count(&self) -> usize {
        self.catalog.read().await.executions.len()
    }

    async fn persist(&self, catalog: &Catalog) -> ProvenaResult<()> {
        let bytes = serde_json::to_vec_pretty(catalog).map_err(JsonError::from)?;
        let path = self.root.join(CATALOG_FILE);
        let temp_path = path.with_extension("tmp");

        tokio::fs::write(&temp_path, &bytes).await.map_err(|e| {
            RepositoryError::new(RepositoryErrorKind::Catalog(format!(
                "{}: {}",
                temp_path.display(),
                e
            )))
        })?;
        tokio::fs::rename(&temp_path, &path).await.map_err(|e| {
            RepositoryError::new(RepositoryErrorKind::Catalog(format!(
                "rename {} to {}: {}",
                temp_path.display(),
                path.display(),
                e
            )))
        })?;
        Ok(())
    }

    async fn import(
        &self,
        catalog: &mut Catalog,
        file: &StagedFile,
        execution: ExecutionId,
    ) -> ProvenaResult<i64> {
        let data = tokio::fs::read(&file.path).await.map_err(|e| {
            RepositoryError::new(RepositoryErrorKind::Import(format!(
                "{}: {}",
                file.path.display(),
                e
            )))
        })?;
        let blob = self.storage.store(&data).await?;
        let id = catalog.next_file_id();

        if let Some(alias) = &file.alias {
            if catalog.aliases.contains_key(alias) {
                return Err(RepositoryError::new(RepositoryErrorKind::AliasTaken(alias.clone())).into());
            }
            catalog.aliases.insert(alias.clone(), id);
        }

        let original_name = file
            .path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        tracing::debug!(file_id = id, name = %original_name, "Imported staged file");

        catalog.files.insert(
            id,
            StoredFile {
                info: FileInfo {
                    id: FileId::from(id),
                    description: file.description.clone(),
                    original_name,
                    execution: Some(execution),
                    alias: file.alias.clone(),
                    associated_to: None,
                    template: None,
                    content_hash: blob.content_hash.clone(),
                    size_bytes: blob.size_bytes,
                },
                blob,
            },
        );
        Ok(id)
    }
}

#[async_trait]
impl Repository for LocalRepository {
    #[tracing::instrument(skip(self, record, failure), fields(programs = record.programs.len(), files = record.staged_files.len()))]
    async fn write_execution(
        &self,
        record: &ExecutionRecord,
        description: &str,
        failure: Option<&str>,
    ) -> ProvenaResult<ExecutionId> {
        let mut catalog = self.catalog.write().await;
        // Mutations go to a copy so a failed import leaves the catalog untouched
        let mut staged = catalog.clone();
        let execution_id = ExecutionId::from(staged.next_execution_id());

        let mut imported = Vec::with_capacity(record.staged_files.len());
        for file in &record.staged_files {
            let id = self.import(&mut staged, file, execution_id).await?;
            imported.push((file.path.clone(), id));
        }

        for (file, (_, id)) in record.staged_files.iter().zip(&imported) {
            let target = match (&file.associate_to_id, &file.associate_to_filename) {
                (Some(target), _) => {
                    staged.stored(*target).map_err(|_| {
                        RepositoryError::new(RepositoryErrorKind::AssociationTarget(format!(
                            "no file with id {}",
                            target
                        )))
                    })?;
                    Some(*target)
                }
                (None, Some(name)) => {
                    let target = imported
                        .iter()
                        .find(|(path, _)| path == name)
                        .map(|(_, target)| FileId::from(*target))
                        .ok_or_else(|| {
                            RepositoryError::new(RepositoryErrorKind::AssociationTarget(format!(
                                "{} was not staged in this execution",
                                name.display()
                            )))
                        })?;
                    Some(target)
                }
                (None, None) => None,
            };

            if let Some(target) = target
                && let Some(stored) = staged.files.get_mut(id)
            {
                let template = file
                    .template
                    .clone()
                    .unwrap_or_else(|| format!("{{}}.{}", stored.info.original_name));
                stored.info.associated_to = Some(target);
                stored.info.template = Some(template);
            }
        }

        staged.executions.insert(
            execution_id.value(),
            ExecutionEntry {
                id: execution_id,
                description: description.to_string(),
                failure: failure.map(str::to_string),
                record: record.clone(),
            },
        );

        self.persist(&staged).await?;
        *catalog = staged;

        tracing::info!(
            execution = %execution_id,
            failed = failure.is_some(),
            "Recorded execution"
        );
        Ok(execution_id)
    }

    async fn load_execution(&self, id: ExecutionId) -> ProvenaResult<ExecutionEntry> {
        let catalog = self.catalog.read().await;
        catalog.executions.get(&id.value()).cloned().ok_or_else(|| {
            RepositoryError::new(RepositoryErrorKind::ExecutionNotFound(id.to_string())).into()
        })
    }

    async fn resolve_alias(&self, id_or_alias: &IdOrAlias) -> ProvenaResult<FileId> {
        self.catalog.read().await.resolve(id_or_alias)
    }

    #[tracing::instrument(skip(self, destination_dir), fields(dir = %destination_dir.display()))]
    async fn export_file(&self, id: FileId, destination_dir: &Path) -> ProvenaResult<String> {
        let name = unique_name_in(destination_dir)?;
        self.export_file_to(id, &destination_dir.join(&name)).await?;
        Ok(name)
    }

    #[tracing::instrument(skip(self, destination), fields(destination = %destination.display()))]
    async fn export_file_to(&self, id: FileId, destination: &Path) -> ProvenaResult<()> {
        let blob = self.catalog.read().await.stored(id)?.blob.clone();
        let data = self.storage.retrieve(&blob).await?;

        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                RepositoryError::new(RepositoryErrorKind::Export(format!(
                    "{}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }
        tokio::fs::write(destination, &data).await.map_err(|e| {
            RepositoryError::new(RepositoryErrorKind::Export(format!(
                "{}: {}",
                destination.display(),
                e
            )))
        })?;

        tracing::debug!(file_id = %id, size = data.len(), "Exported file");
        Ok(())
    }

    async fn associated_files_of(&self, id: FileId) -> ProvenaResult<Vec<AssociatedFile>> {
        let catalog = self.catalog.read().await;
        catalog.stored(id)?;
        Ok(catalog
            .files
            .values()
            .filter(|stored| stored.info.associated_to == Some(id))
            .map(|stored| AssociatedFile {
                id: stored.info.id,
                template: stored.info.template.clone().unwrap_or_else(|| "{}".to_string()),
            })
            .collect())
    }

    async fn path_to_file(&self, id_or_alias: &IdOrAlias) -> ProvenaResult<PathBuf> {
        let catalog = self.catalog.read().await;
        let id = catalog.resolve(id_or_alias)?;
        Ok(PathBuf::from(&catalog.stored(id)?.blob.storage_path))
    }

    async fn file_info(&self, id: FileId) -> ProvenaResult<FileInfo> {
        Ok(self.catalog.read().await.stored(id)?.info.clone())
    }

    async fn files_from_execution(&self, id: ExecutionId) -> ProvenaResult<Vec<FileInfo>> {
        let catalog = self.catalog.read().await;
        if !catalog.executions.contains_key(&id.value()) {
            return Err(
                RepositoryError::new(RepositoryErrorKind::ExecutionNotFound(id.to_string())).into(),
            );
        }
        Ok(catalog
            .files
            .values()
            .filter(|stored| stored.info.execution == Some(id))
            .map(|stored| stored.info.clone())
            .collect())
    }
}
