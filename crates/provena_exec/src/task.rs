//! Running a body as a task and reporting what it stored.

use crate::{Execution, ExecutionOptions, execution};
use provena_core::{ExecutionId, FileId};
use provena_error::ProvenaResult;
use provena_interface::Repository;
use std::collections::BTreeMap;
use std::sync::Arc;

/// What a task produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskReport<T> {
    /// The body's value
    pub value: T,
    /// Files the execution imported, keyed by description
    pub files: BTreeMap<String, FileId>,
    /// The recorded execution
    pub execution: ExecutionId,
}

/// Run `body` inside an execution and report the files it imported.
///
/// Files are keyed by the description they were staged with; when two share
/// a description the later one wins.
///
/// # Example
///
/// ```no_run
/// use provena_exec::{ExecutionOptions, Invocation, Program, StageOptions, run_task};
/// use provena_storage::LocalRepository;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let repo = Arc::new(LocalRepository::open("/var/provena")?);
/// let touch = Program::new(|name: &str| Invocation::fixed(["touch", name], ()));
///
/// let report = run_task(repo, ExecutionOptions::new("/scratch"), async |ex| {
///     touch.invoke(ex, "marker").await?;
///     ex.add("marker", StageOptions::new("marker file"))
/// })
/// .await?;
/// println!("marker stored as {}", report.files["marker file"]);
/// # Ok(())
/// # }
/// ```
#[tracing::instrument(skip_all, fields(description = %options.description()))]
pub async fn run_task<T, F>(
    repository: Arc<dyn Repository>,
    options: ExecutionOptions,
    body: F,
) -> ProvenaResult<TaskReport<T>>
where
    F: AsyncFnOnce(&mut Execution) -> ProvenaResult<T>,
{
    let completed = execution(Arc::clone(&repository), options, body).await?;
    let id = completed.id();

    let files = repository
        .files_from_execution(id)
        .await?
        .into_iter()
        .map(|file| (file.description, file.id))
        .collect();

    Ok(TaskReport {
        value: completed.into_value(),
        files,
        execution: id,
    })
}
