//! Tests for synchronous program invocation.

use provena_core::{ExecutionId, OutputRedirects};
use provena_error::{
    ExecutionErrorKind, ProgramError, ProgramErrorKind, ProvenaError, ProvenaErrorKind,
    ProvenaResult,
};
use provena_exec::{ExecutionOptions, Invocation, Program, execution};
use provena_interface::Repository;
use provena_storage::LocalRepository;
use std::sync::Arc;
use tempfile::TempDir;

fn setup() -> (TempDir, TempDir, Arc<LocalRepository>) {
    let root = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let repo = Arc::new(LocalRepository::open(root.path()).unwrap());
    (root, scratch, repo)
}

fn program_kind(err: &ProvenaError) -> Option<&ProgramErrorKind> {
    match err.kind() {
        ProvenaErrorKind::Program(e) => Some(&e.kind),
        _ => None,
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_touch_returns_fixed_value() {
    let (_root, scratch, repo) = setup();
    let touch = Program::new(|name: &'static str| Invocation::fixed(["touch", name], name));

    let done = execution(repo, ExecutionOptions::new(scratch.path()), async |ex| {
        let value = touch.invoke(ex, "f.txt").await?;
        assert!(ex.working_directory().join("f.txt").exists());
        Ok(value)
    })
    .await
    .unwrap();

    assert_eq!(*done.value(), "f.txt");
    let programs = done.execution().programs();
    assert_eq!(programs.len(), 1);
    assert_eq!(*programs[0].exit_status(), 0);
    assert_eq!(programs[0].arguments(), &["touch", "f.txt"]);
    assert!(!done.execution().working_directory().exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_outcomes_recorded_in_call_order() {
    let (_root, scratch, repo) = setup();
    let echo = Program::new(|word: &'static str| Invocation::fixed(["echo", word], ()));

    let done = execution(repo, ExecutionOptions::new(scratch.path()), async |ex| {
        echo.invoke(ex, "one").await?;
        echo.invoke(ex, "two").await?;
        echo.invoke(ex, "three").await
    })
    .await
    .unwrap();

    let words: Vec<_> = done
        .execution()
        .programs()
        .iter()
        .map(|outcome| outcome.arguments()[1].clone())
        .collect();
    assert_eq!(words, vec!["one", "two", "three"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_nonzero_exit_is_recorded_before_failing() {
    let (_root, scratch, repo) = setup();
    let falsy = Program::new(|()| Invocation::fixed(["false"], ()));

    let err = execution(repo.clone(), ExecutionOptions::new(scratch.path()), async |ex| {
        let err = falsy.invoke(ex, ()).await.unwrap_err();
        assert_eq!(ex.programs().len(), 1);
        assert_ne!(*ex.programs()[0].exit_status(), 0);
        Err::<(), _>(err)
    })
    .await
    .unwrap_err();

    assert!(matches!(program_kind(&err), Some(ProgramErrorKind::Failed(_))));
    let outcome = err.program_outcome().unwrap();
    assert_ne!(*outcome.exit_status(), 0);
    assert_eq!(outcome.stdout().as_deref(), Some(&[][..]));

    let entry = repo.load_execution(ExecutionId::from(1)).await.unwrap();
    assert_eq!(entry.record.programs.len(), 1);
    assert!(entry.failure.unwrap().contains("Running 'false'"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_executable_records_nothing() {
    let (_root, scratch, repo) = setup();
    let missing = Program::new(|()| Invocation::fixed(["provena-test-no-such-program"], ()));

    execution(repo, ExecutionOptions::new(scratch.path()), async |ex| {
        let err = missing.invoke(ex, ()).await.unwrap_err();
        assert!(matches!(
            program_kind(&err),
            Some(ProgramErrorKind::ExecutableNotFound(name)) if name == "provena-test-no-such-program"
        ));
        assert!(err.program_outcome().is_none());
        assert!(ex.programs().is_empty());
        Ok(())
    })
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_transform_computes_from_outcome() {
    let (_root, scratch, repo) = setup();
    let count = Program::new(|script: &'static str| {
        Invocation::transform(["sh", "-c", script], |outcome| {
            Ok(outcome.stdout().as_ref().map_or(0, |lines| lines.len()))
        })
    });

    let done = execution(repo, ExecutionOptions::new(scratch.path()), async |ex| {
        count.invoke(ex, "printf 'a\\nb\\nc\\n'").await
    })
    .await
    .unwrap();

    assert_eq!(*done.value(), 3);
    assert_eq!(
        done.execution().programs()[0].stdout().as_deref(),
        Some(&["a".to_string(), "b".to_string(), "c".to_string()][..])
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_transform_failure_surfaces_after_recording() {
    let (_root, scratch, repo) = setup();
    let parse = Program::new(|()| {
        Invocation::transform(["echo", "not-a-number"], |outcome| {
            let line = outcome
                .stdout()
                .as_ref()
                .and_then(|lines| lines.first().cloned())
                .unwrap_or_default();
            line.parse::<i64>().map_err(|e| {
                ProvenaError::from(ProgramError::new(ProgramErrorKind::TransformFailed {
                    program: "echo".to_string(),
                    message: e.to_string(),
                }))
            })
        })
    });

    execution(repo, ExecutionOptions::new(scratch.path()), async |ex| {
        let err = parse.invoke(ex, ()).await.unwrap_err();
        assert!(matches!(
            program_kind(&err),
            Some(ProgramErrorKind::TransformFailed { .. })
        ));
        assert_eq!(ex.programs().len(), 1);
        Ok(())
    })
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_redirected_stream_is_absent_from_outcome() {
    let (_root, scratch, repo) = setup();
    let echo = Program::new(|()| Invocation::fixed(["sh", "-c", "echo out; echo err >&2"], ()));

    let done = execution(repo, ExecutionOptions::new(scratch.path()), async |ex| {
        echo.invoke_redirected(ex, (), OutputRedirects::new().with_stdout("out.txt"))
            .await?;
        let written = std::fs::read_to_string(ex.working_directory().join("out.txt")).unwrap();
        assert_eq!(written, "out\n");
        Ok(())
    })
    .await
    .unwrap();

    let outcome = &done.execution().programs()[0];
    assert_eq!(*outcome.stdout(), None);
    assert_eq!(outcome.stderr().as_deref(), Some(&["err".to_string()][..]));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_signal_exit_status_follows_shell_convention() {
    let (_root, scratch, repo) = setup();
    let killed = Program::new(|()| Invocation::fixed(["sh", "-c", "kill -9 $$"], ()));

    execution(repo, ExecutionOptions::new(scratch.path()), async |ex| {
        let err = killed.invoke(ex, ()).await.unwrap_err();
        assert_eq!(*err.program_outcome().unwrap().exit_status(), 128 + 9);
        Ok(())
    })
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_invoking_on_recorded_execution_is_rejected() {
    let (_root, scratch, repo) = setup();
    let touch = Program::new(|name: &'static str| Invocation::fixed(["touch", name], ()));

    let done = execution(repo, ExecutionOptions::new(scratch.path()), async |_| {
        ProvenaResult::Ok(())
    })
    .await
    .unwrap();
    let ((), mut recorded) = done.into_parts();
    assert!(recorded.is_terminated());

    let err = touch.invoke(&mut recorded, "late.txt").await.unwrap_err();
    assert!(matches!(
        err.kind(),
        ProvenaErrorKind::Execution(e) if matches!(e.kind, ExecutionErrorKind::Terminated(_))
    ));
    assert!(recorded.programs().is_empty());
}
