//! The execution scope.
//!
//! An [`Execution`] is opened by [`execution`], lives for the duration of an
//! async body, and is recorded by the repository when the body ends, however
//! it ends. Its working directory is removed afterwards.

use crate::ExecConfig;
use chrono::{DateTime, Utc};
use futures::FutureExt;
use provena_core::{ExecutionId, FileId, ProgramOutcome};
use provena_error::{ExecutionError, ExecutionErrorKind, ProvenaError, ProvenaResult};
use provena_interface::{ExecutionRecord, IdOrAlias, Repository, StagedFile};
use provena_storage::unique_name_in;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// How to open an execution.
///
/// # Examples
///
/// ```
/// use provena_exec::ExecutionOptions;
///
/// let options = ExecutionOptions::new("/scratch")
///     .with_description("align sample 12")
///     .with_remote_parent("/cluster/scratch");
/// assert_eq!(options.description(), "align sample 12");
/// ```
#[derive(Debug, Clone, derive_getters::Getters)]
pub struct ExecutionOptions {
    /// Stored with the execution record
    description: String,
    /// Directory the working directory is created in
    parent: PathBuf,
    /// The parent as seen by batch worker nodes, if it differs
    remote_parent: Option<PathBuf>,
    /// Dispatch settings
    config: ExecConfig,
}

impl ExecutionOptions {
    /// Create working directories under `parent`.
    pub fn new(parent: impl Into<PathBuf>) -> Self {
        Self {
            description: String::new(),
            parent: parent.into(),
            remote_parent: None,
            config: ExecConfig::default(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the remote view of the parent directory.
    pub fn with_remote_parent(mut self, remote_parent: impl Into<PathBuf>) -> Self {
        self.remote_parent = Some(remote_parent.into());
        self
    }

    /// Set the dispatch settings.
    pub fn with_config(mut self, config: ExecConfig) -> Self {
        self.config = config;
        self
    }
}

/// How a file should be imported when its execution is recorded.
///
/// # Examples
///
/// ```
/// use provena_exec::StageOptions;
///
/// let index = StageOptions::new("BAM index")
///     .with_associate_to_filename("sorted.bam")
///     .with_template("{}.bai");
/// assert_eq!(index.template().as_deref(), Some("{}.bai"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, derive_getters::Getters)]
pub struct StageOptions {
    /// Description stored with the file
    description: String,
    /// Existing repository file to associate with
    associate_to_id: Option<FileId>,
    /// File staged in the same execution to associate with
    associate_to_filename: Option<PathBuf>,
    /// Export name template relative to the associated file
    template: Option<String>,
    /// Alias to bind
    alias: Option<String>,
}

impl StageOptions {
    /// Options carrying only a description.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    /// Associate with an existing repository file.
    pub fn with_associate_to_id(mut self, id: FileId) -> Self {
        self.associate_to_id = Some(id);
        self
    }

    /// Associate with another file staged in the same execution.
    pub fn with_associate_to_filename(mut self, path: impl Into<PathBuf>) -> Self {
        self.associate_to_filename = Some(path.into());
        self
    }

    /// Export name template; `{}` is replaced by the associated file's name.
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Bind an alias to the imported file.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

/// Directory owned by an execution, removed when dropped.
#[derive(Debug)]
struct WorkingDirectory {
    path: PathBuf,
}

impl WorkingDirectory {
    fn create(parent: &Path) -> ProvenaResult<Self> {
        let working_directory_error = |e: std::io::Error, path: &Path| {
            ExecutionError::new(ExecutionErrorKind::WorkingDirectory(format!(
                "{}: {}",
                path.display(),
                e
            )))
        };

        std::fs::create_dir_all(parent).map_err(|e| working_directory_error(e, parent))?;
        let path = parent.join(unique_name_in(parent)?);
        std::fs::create_dir(&path).map_err(|e| working_directory_error(e, &path))?;
        Ok(Self { path })
    }
}

impl Drop for WorkingDirectory {
    fn drop(&mut self) {
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Removed working directory"),
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove working directory"
            ),
        }
    }
}

/// One provenance-tracked unit of work.
///
/// Programs run inside the working directory, and every outcome is appended
/// to [`programs`](Self::programs) in the order the runs were observed to
/// finish. Files staged with [`add`](Self::add) are imported only when the
/// execution is recorded.
pub struct Execution {
    token: Uuid,
    id: Option<ExecutionId>,
    repository: Arc<dyn Repository>,
    config: ExecConfig,
    description: String,
    working_directory: PathBuf,
    remote_working_directory: PathBuf,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    programs: Vec<ProgramOutcome>,
    staged_files: Vec<StagedFile>,
    used_files: Vec<FileId>,
}

impl std::fmt::Debug for Execution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Execution")
            .field("id", &self.id)
            .field("description", &self.description)
            .field("working_directory", &self.working_directory)
            .field("programs", &self.programs.len())
            .field("staged_files", &self.staged_files.len())
            .field("used_files", &self.used_files)
            .finish_non_exhaustive()
    }
}

impl Execution {
    /// Identifier assigned by the repository; unset until recorded.
    pub fn id(&self) -> Option<ExecutionId> {
        self.id
    }

    /// Whether the execution has been recorded.
    pub fn is_terminated(&self) -> bool {
        self.id.is_some()
    }

    /// Description given when the execution was opened.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Directory programs run in.
    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    /// The working directory as seen by batch worker nodes.
    pub fn remote_working_directory(&self) -> &Path {
        &self.remote_working_directory
    }

    /// When the scope was entered.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// When the scope was left.
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Outcomes recorded so far.
    pub fn programs(&self) -> &[ProgramOutcome] {
        &self.programs
    }

    /// Files staged for import.
    pub fn staged_files(&self) -> &[StagedFile] {
        &self.staged_files
    }

    /// Repository files fetched into the working directory.
    pub fn used_files(&self) -> &[FileId] {
        &self.used_files
    }

    /// Dispatch settings.
    pub fn config(&self) -> &ExecConfig {
        &self.config
    }

    /// Fail if the execution has already been recorded.
    pub fn ensure_open(&self) -> ProvenaResult<()> {
        match self.id {
            Some(id) => {
                Err(ExecutionError::new(ExecutionErrorKind::Terminated(id.to_string())).into())
            }
            None => Ok(()),
        }
    }

    pub(crate) fn token(&self) -> Uuid {
        self.token
    }

    pub(crate) fn record_outcome(&mut self, outcome: ProgramOutcome) {
        tracing::debug!(
            arguments = ?outcome.arguments(),
            exit_status = *outcome.exit_status(),
            position = self.programs.len(),
            "Recorded program outcome"
        );
        self.programs.push(outcome);
    }

    /// Stage a file for import when the execution is recorded.
    ///
    /// Relative paths are taken relative to the working directory. Nothing is
    /// imported yet; staged files go to the repository in staging order.
    ///
    /// # Errors
    ///
    /// Fails with `StagedFileMissing` if the path is empty or does not exist,
    /// and with `Terminated` if the execution has been recorded.
    pub fn add(&mut self, path: impl AsRef<Path>, options: StageOptions) -> ProvenaResult<()> {
        self.ensure_open()?;
        let path = path.as_ref();
        if path.as_os_str().is_empty() || !self.working_directory.join(path).exists() {
            return Err(ExecutionError::new(ExecutionErrorKind::StagedFileMissing(
                path.display().to_string(),
            ))
            .into());
        }

        let StageOptions {
            description,
            associate_to_id,
            associate_to_filename,
            template,
            alias,
        } = options;
        let staged = StagedFile {
            path: self.working_directory.join(path),
            description,
            associate_to_id,
            associate_to_filename: associate_to_filename
                .map(|name| self.working_directory.join(name)),
            template,
            alias,
        };
        tracing::debug!(path = %staged.path.display(), "Staged file");
        self.staged_files.push(staged);
        Ok(())
    }

    /// Fetch a repository file, and every file associated with it, into the
    /// working directory.
    ///
    /// The primary file gets a fresh unique name, which is returned. Associated
    /// files are named from their templates. The file id is added to
    /// [`used_files`](Self::used_files).
    ///
    /// # Errors
    ///
    /// Fails with `FileNotFound` if `id_or_alias` does not resolve.
    #[tracing::instrument(skip_all, fields(execution = %self.description))]
    pub async fn use_file(&mut self, id_or_alias: impl Into<IdOrAlias>) -> ProvenaResult<String> {
        self.ensure_open()?;
        let id_or_alias = id_or_alias.into();
        let id = self.repository.resolve_alias(&id_or_alias).await?;
        let name = self
            .repository
            .export_file(id, &self.working_directory)
            .await?;

        for associated in self.repository.associated_files_of(id).await? {
            let target = self.working_directory.join(associated.name_for(&name));
            self.repository
                .export_file_to(associated.id, &target)
                .await?;
        }

        tracing::info!(file = %id_or_alias, id = %id, name = %name, "Fetched file");
        self.used_files.push(id);
        Ok(name)
    }

    /// Where the repository keeps a stored file.
    pub async fn path_to_file(&self, id_or_alias: impl Into<IdOrAlias>) -> ProvenaResult<PathBuf> {
        self.repository.path_to_file(&id_or_alias.into()).await
    }

    /// Snapshot of everything accumulated so far.
    pub fn to_record(&self) -> ExecutionRecord {
        ExecutionRecord {
            working_directory: self.working_directory.clone(),
            remote_working_directory: self.remote_working_directory.clone(),
            started_at: self.started_at,
            finished_at: self.finished_at,
            programs: self.programs.clone(),
            staged_files: self.staged_files.clone(),
            used_files: self.used_files.clone(),
        }
    }
}

/// A recorded execution together with the value its body produced.
#[derive(Debug)]
pub struct Completed<T> {
    value: T,
    id: ExecutionId,
    execution: Execution,
}

impl<T> Completed<T> {
    /// The body's value.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Identifier the repository assigned.
    pub fn id(&self) -> ExecutionId {
        self.id
    }

    /// The final state of the execution.
    pub fn execution(&self) -> &Execution {
        &self.execution
    }

    /// Take the body's value.
    pub fn into_value(self) -> T {
        self.value
    }

    /// Split into value and execution.
    pub fn into_parts(self) -> (T, Execution) {
        (self.value, self.execution)
    }
}

/// Run `body` inside a fresh execution and record it.
///
/// A working directory is created under the options' parent directory. When
/// the body finishes, the execution is written to the repository and the
/// working directory is removed. This happens on every exit path:
///
/// - body returns `Ok`: the record is written, the directory removed, and the
///   value returned together with the recorded execution.
/// - body returns `Err`: the record is written with the error text as failure
///   trace, the directory removed, and the body's error returned.
/// - body panics: as above with the panic message as trace, then the panic resumes.
///
/// A repository failure is returned after the directory is removed. If the
/// body had already failed, both errors come back together as `RecordFailed`.
///
/// # Example
///
/// ```no_run
/// use provena_exec::{ExecutionOptions, Invocation, Program, execution};
/// use provena_storage::LocalRepository;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let repo = Arc::new(LocalRepository::open("/var/provena")?);
/// let touch = Program::new(|name: &str| Invocation::fixed(["touch", name], name.to_string()));
///
/// let done = execution(repo, ExecutionOptions::new("/scratch"), async |ex| {
///     touch.invoke(ex, "f.txt").await
/// })
/// .await?;
/// assert_eq!(done.value(), "f.txt");
/// # Ok(())
/// # }
/// ```
#[tracing::instrument(skip_all, fields(description = %options.description()))]
pub async fn execution<T, F>(
    repository: Arc<dyn Repository>,
    options: ExecutionOptions,
    body: F,
) -> ProvenaResult<Completed<T>>
where
    F: AsyncFnOnce(&mut Execution) -> ProvenaResult<T>,
{
    let ExecutionOptions {
        description,
        parent,
        remote_parent,
        config,
    } = options;

    let directory = WorkingDirectory::create(&parent)?;
    let remote_working_directory = match (&remote_parent, directory.path.file_name()) {
        (Some(remote), Some(name)) => remote.join(name),
        _ => directory.path.clone(),
    };

    let mut execution = Execution {
        token: Uuid::new_v4(),
        id: None,
        repository,
        config,
        description,
        working_directory: directory.path.clone(),
        remote_working_directory,
        started_at: Utc::now(),
        finished_at: None,
        programs: Vec::new(),
        staged_files: Vec::new(),
        used_files: Vec::new(),
    };
    tracing::info!(
        working_directory = %execution.working_directory.display(),
        "Opened execution"
    );

    let ended = AssertUnwindSafe(body(&mut execution)).catch_unwind().await;
    execution.finished_at = Some(Utc::now());

    let (value, trace) = match ended {
        Ok(Ok(value)) => (Ok(value), None),
        Ok(Err(e)) => {
            let trace = e.to_string();
            (Err(Ended::Failed(e)), Some(trace))
        }
        Err(payload) => {
            let trace = panic_message(payload.as_ref());
            (Err(Ended::Panicked(payload)), Some(trace))
        }
    };

    let written = execution
        .repository
        .write_execution(&execution.to_record(), &execution.description, trace.as_deref())
        .await;
    drop(directory);

    if let Ok(id) = &written {
        execution.id = Some(*id);
        tracing::info!(id = %id, programs = execution.programs.len(), failed = trace.is_some(), "Execution recorded");
    }

    match (value, written) {
        (Ok(value), Ok(id)) => Ok(Completed {
            value,
            id,
            execution,
        }),
        (Ok(_), Err(repository)) => Err(repository),
        (Err(Ended::Failed(body)), Ok(_)) => Err(body),
        (Err(Ended::Failed(body)), Err(repository)) => {
            tracing::warn!(error = %repository, "Failed to record execution after its body failed");
            Err(ExecutionError::new(ExecutionErrorKind::RecordFailed {
                body: Box::new(body),
                repository: Box::new(repository),
            })
            .into())
        }
        (Err(Ended::Panicked(payload)), written) => {
            if let Err(e) = written {
                tracing::error!(error = %e, "Failed to record execution after its body panicked");
            }
            std::panic::resume_unwind(payload)
        }
    }
}

/// How a body ended, other than with a value.
enum Ended {
    Failed(ProvenaError),
    Panicked(Box<dyn Any + Send>),
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}
