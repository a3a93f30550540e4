//! Tests for the execution scope lifecycle, file staging and fetching.

use async_trait::async_trait;
use futures::FutureExt;
use provena_core::{ExecutionId, FileId};
use provena_error::{
    ExecutionErrorKind, ProvenaError, ProvenaErrorKind, ProvenaResult, RepositoryError,
    RepositoryErrorKind,
};
use provena_exec::{
    ExecutionOptions, Invocation, Program, StageOptions, execution, run_task,
};
use provena_interface::{
    AssociatedFile, ExecutionEntry, ExecutionRecord, FileInfo, IdOrAlias, Repository,
};
use provena_storage::LocalRepository;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

fn setup() -> (TempDir, TempDir, Arc<LocalRepository>) {
    let root = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let repo = Arc::new(LocalRepository::open(root.path()).unwrap());
    (root, scratch, repo)
}

fn execution_kind(err: &ProvenaError) -> Option<&ExecutionErrorKind> {
    match err.kind() {
        ProvenaErrorKind::Execution(e) => Some(&e.kind),
        _ => None,
    }
}

fn write_file(dir: &Path, name: &str, contents: &str) {
    std::fs::write(dir.join(name), contents).unwrap();
}

/// Repository whose every operation fails.
struct UnavailableRepository;

fn unavailable<T>() -> ProvenaResult<T> {
    Err(RepositoryError::new(RepositoryErrorKind::Catalog("unavailable".to_string())).into())
}

#[async_trait]
impl Repository for UnavailableRepository {
    async fn write_execution(
        &self,
        _record: &ExecutionRecord,
        _description: &str,
        _failure: Option<&str>,
    ) -> ProvenaResult<ExecutionId> {
        unavailable()
    }

    async fn load_execution(&self, _id: ExecutionId) -> ProvenaResult<ExecutionEntry> {
        unavailable()
    }

    async fn resolve_alias(&self, _id_or_alias: &IdOrAlias) -> ProvenaResult<FileId> {
        unavailable()
    }

    async fn export_file(&self, _id: FileId, _destination_dir: &Path) -> ProvenaResult<String> {
        unavailable()
    }

    async fn export_file_to(&self, _id: FileId, _destination: &Path) -> ProvenaResult<()> {
        unavailable()
    }

    async fn associated_files_of(&self, _id: FileId) -> ProvenaResult<Vec<AssociatedFile>> {
        unavailable()
    }

    async fn path_to_file(&self, _id_or_alias: &IdOrAlias) -> ProvenaResult<PathBuf> {
        unavailable()
    }

    async fn file_info(&self, _id: FileId) -> ProvenaResult<FileInfo> {
        unavailable()
    }

    async fn files_from_execution(&self, _id: ExecutionId) -> ProvenaResult<Vec<FileInfo>> {
        unavailable()
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_directory_lives_exactly_as_long_as_the_body() {
    let (_root, scratch, repo) = setup();
    let mut seen = None;

    let done = execution(
        repo,
        ExecutionOptions::new(scratch.path()).with_description("lifecycle"),
        async |ex| {
            assert!(ex.working_directory().is_dir());
            assert_eq!(ex.working_directory().parent(), Some(scratch.path()));
            assert_eq!(ex.id(), None);
            assert_eq!(ex.finished_at(), None);
            seen = Some(ex.working_directory().to_path_buf());
            Ok(())
        },
    )
    .await
    .unwrap();

    let seen = seen.unwrap();
    assert!(!seen.exists());
    assert_eq!(done.execution().id(), Some(done.id()));
    assert!(done.execution().finished_at().is_some());
    assert_eq!(done.execution().description(), "lifecycle");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_remote_working_directory_mirrors_local_name() {
    let (_root, scratch, repo) = setup();

    execution(
        repo,
        ExecutionOptions::new(scratch.path()).with_remote_parent("/cluster/scratch"),
        async |ex| {
            let name = ex.working_directory().file_name().unwrap();
            assert_eq!(
                ex.remote_working_directory(),
                Path::new("/cluster/scratch").join(name)
            );
            Ok(())
        },
    )
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failing_body_is_recorded_with_trace_and_cleaned_up() {
    let (_root, scratch, repo) = setup();
    let touch = Program::new(|name: &'static str| Invocation::fixed(["touch", name], ()));
    let mut seen = None;

    let err = execution(repo.clone(), ExecutionOptions::new(scratch.path()), async |ex| {
        seen = Some(ex.working_directory().to_path_buf());
        touch.invoke(ex, "partial.txt").await?;
        ex.add("missing.txt", StageOptions::new("never written"))
    })
    .await
    .unwrap_err();

    assert!(matches!(
        execution_kind(&err),
        Some(ExecutionErrorKind::StagedFileMissing(_))
    ));
    assert!(!seen.unwrap().exists());

    let entry = repo.load_execution(ExecutionId::from(1)).await.unwrap();
    assert!(entry.failure.unwrap().contains("missing.txt"));
    assert_eq!(entry.record.programs.len(), 1);
    assert!(entry.record.finished_at.is_some());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_panicking_body_is_recorded_and_panic_resumes() {
    let (_root, scratch, repo) = setup();
    let mut seen = None;

    let caught = AssertUnwindSafe(execution(
        repo.clone(),
        ExecutionOptions::new(scratch.path()),
        async |ex| -> ProvenaResult<()> {
            seen = Some(ex.working_directory().to_path_buf());
            panic!("boom");
        },
    ))
    .catch_unwind()
    .await;

    assert!(caught.is_err());
    assert!(!seen.unwrap().exists());
    let entry = repo.load_execution(ExecutionId::from(1)).await.unwrap();
    assert_eq!(entry.failure.as_deref(), Some("panicked: boom"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_repository_failure_propagates_after_cleanup() {
    let scratch = TempDir::new().unwrap();
    let mut seen = None;

    let err = execution(
        Arc::new(UnavailableRepository),
        ExecutionOptions::new(scratch.path()),
        async |ex| {
            seen = Some(ex.working_directory().to_path_buf());
            Ok(())
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err.kind(),
        ProvenaErrorKind::Repository(e) if matches!(e.kind, RepositoryErrorKind::Catalog(_))
    ));
    assert!(!seen.unwrap().exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_body_and_repository_failures_surface_together() {
    let scratch = TempDir::new().unwrap();
    let falsy = Program::new(|()| Invocation::fixed(["false"], ()));

    let err = execution(
        Arc::new(UnavailableRepository),
        ExecutionOptions::new(scratch.path()),
        async |ex| falsy.invoke(ex, ()).await,
    )
    .await
    .unwrap_err();

    match execution_kind(&err) {
        Some(ExecutionErrorKind::RecordFailed { body, repository }) => {
            assert!(matches!(body.kind(), ProvenaErrorKind::Program(_)));
            assert!(matches!(
                repository.kind(),
                ProvenaErrorKind::Repository(e) if matches!(e.kind, RepositoryErrorKind::Catalog(_))
            ));
        }
        other => panic!("expected RecordFailed, got {other:?}"),
    }
    assert!(err.to_string().contains("unavailable"));
    assert!(err.program_outcome().is_some());
    assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_add_rejects_missing_and_empty_paths() {
    let (_root, scratch, repo) = setup();

    execution(repo, ExecutionOptions::new(scratch.path()), async |ex| {
        let missing = ex.add("nope.txt", StageOptions::new("missing")).unwrap_err();
        assert!(matches!(
            execution_kind(&missing),
            Some(ExecutionErrorKind::StagedFileMissing(name)) if name == "nope.txt"
        ));
        let empty = ex.add("", StageOptions::new("empty")).unwrap_err();
        assert!(matches!(
            execution_kind(&empty),
            Some(ExecutionErrorKind::StagedFileMissing(_))
        ));
        assert!(ex.staged_files().is_empty());
        Ok(())
    })
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_add_after_recording_is_rejected() {
    let (_root, scratch, repo) = setup();
    let done = execution(repo, ExecutionOptions::new(scratch.path()), async |_| {
        ProvenaResult::Ok(())
    })
    .await
    .unwrap();
    let ((), mut recorded) = done.into_parts();

    let err = recorded.add("late.txt", StageOptions::new("late")).unwrap_err();
    assert!(matches!(
        execution_kind(&err),
        Some(ExecutionErrorKind::Terminated(_))
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_run_task_reports_imported_files_in_staging_order() {
    let (_root, scratch, repo) = setup();
    let touch = Program::new(|name: &'static str| Invocation::fixed(["touch", name], name));

    let report = run_task(repo.clone(), ExecutionOptions::new(scratch.path()), async |ex| {
        let first = touch.invoke(ex, "first.txt").await?;
        let second = touch.invoke(ex, "second.txt").await?;
        ex.add(first, StageOptions::new("first output").with_alias("first"))?;
        ex.add(second, StageOptions::new("second output"))?;
        assert_eq!(ex.staged_files()[0].path, ex.working_directory().join("first.txt"));
        Ok(2)
    })
    .await
    .unwrap();

    assert_eq!(report.value, 2);
    assert_eq!(report.files.len(), 2);
    let first = report.files["first output"];
    assert!(first < report.files["second output"]);
    assert_eq!(
        repo.resolve_alias(&IdOrAlias::from("first")).await.unwrap(),
        first
    );
    assert_eq!(
        repo.file_info(first).await.unwrap().execution,
        Some(report.execution)
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_use_file_fetches_primary_and_associated_files() {
    let (_root, scratch, repo) = setup();

    let stored = run_task(repo.clone(), ExecutionOptions::new(scratch.path()), async |ex| {
        write_file(ex.working_directory(), "reads.bam", "alignments");
        write_file(ex.working_directory(), "reads.bam.bai", "index");
        ex.add("reads.bam", StageOptions::new("reads").with_alias("reads"))?;
        ex.add(
            "reads.bam.bai",
            StageOptions::new("index")
                .with_associate_to_filename("reads.bam")
                .with_template("{}.bai"),
        )?;
        Ok(())
    })
    .await
    .unwrap();

    let done = execution(repo.clone(), ExecutionOptions::new(scratch.path()), async |ex| {
        let name = ex.use_file("reads").await?;
        let dir = ex.working_directory();
        assert_eq!(std::fs::read_to_string(dir.join(&name)).unwrap(), "alignments");
        assert_eq!(
            std::fs::read_to_string(dir.join(format!("{name}.bai"))).unwrap(),
            "index"
        );
        let location = ex.path_to_file("reads").await?;
        assert_eq!(std::fs::read_to_string(location).unwrap(), "alignments");
        Ok(name)
    })
    .await
    .unwrap();

    assert_eq!(done.execution().used_files(), &[stored.files["reads"]]);
    let entry = repo.load_execution(done.id()).await.unwrap();
    assert_eq!(entry.record.used_files, vec![stored.files["reads"]]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_use_file_with_unknown_alias_is_file_not_found() {
    let (_root, scratch, repo) = setup();

    execution(repo, ExecutionOptions::new(scratch.path()), async |ex| {
        let err = ex.use_file("nothing-here").await.unwrap_err();
        assert!(matches!(
            err.kind(),
            ProvenaErrorKind::Repository(e) if matches!(e.kind, RepositoryErrorKind::FileNotFound(_))
        ));
        assert!(ex.used_files().is_empty());
        Ok(())
    })
    .await
    .unwrap();
}
