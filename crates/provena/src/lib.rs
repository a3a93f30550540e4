//! Provena - provenance-tracking execution manager
//!
//! Provena runs external programs as recorded units of work. Every run inside
//! an execution scope is captured as a [`ProgramOutcome`], and the whole scope
//! (outcomes, files it produced, files it fetched) is written to a
//! [`Repository`] when the scope ends.
//!
//! # Features
//!
//! - **Execution scopes**: a fresh working directory per scope, always recorded
//!   and always cleaned up
//! - **Program bindings**: pure command builders run synchronously or dispatched
//! - **Three dispatch strategies**: synchronous, a local task, or a batch scheduler
//! - **Local repository**: content-addressed file storage with a JSON catalog
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use provena::{ExecutionOptions, Invocation, LocalRepository, Program, StageOptions, run_task};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let repo = Arc::new(LocalRepository::open("/var/provena")?);
//!     let sort = Program::new(|input: String| {
//!         Invocation::fixed(["sort", "-o", "sorted.txt", input.as_str()], "sorted.txt")
//!     });
//!
//!     let report = run_task(repo, ExecutionOptions::new("/scratch"), async |ex| {
//!         let input = ex.use_file("word-list").await?;
//!         let output = sort.invoke(ex, input).await?;
//!         ex.add(output, StageOptions::new("sorted words").with_alias("sorted-words"))
//!     })
//!     .await?;
//!
//!     println!("stored as {}", report.files["sorted words"]);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! Provena is organized as a workspace with focused crates:
//!
//! - `provena_error` - Error types
//! - `provena_core` - Outcome records, redirects and identifiers
//! - `provena_interface` - The `Repository` trait
//! - `provena_storage` - Unique names, blob storage and `LocalRepository`
//! - `provena_exec` - Execution scopes, program bindings and dispatch backends
//!
//! This crate (`provena`) re-exports everything for convenience.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub use provena_core::{ExecutionId, FileId, OutputRedirects, ProgramOutcome};
pub use provena_error::{
    ConfigError, DispatchError, DispatchErrorKind, ExecutionError, ExecutionErrorKind, JsonError,
    ProgramError, ProgramErrorKind, ProvenaError, ProvenaErrorKind, ProvenaResult,
    RepositoryError, RepositoryErrorKind, StorageError, StorageErrorKind,
};
pub use provena_exec::{
    Backend, BatchConfig, BatchFailurePolicy, BatchSubmission, Completed, DispatchBackend,
    ExecConfig, Execution, ExecutionOptions, Invocation, Job, LocalProcess, Pending, Program,
    ResultPolicy, Settled, StageOptions, TaskReport, Transform, execution, run_task, shell_join,
    shell_quote,
};
pub use provena_interface::{
    AssociatedFile, ExecutionEntry, ExecutionRecord, FileInfo, IdOrAlias, Repository, StagedFile,
};
pub use provena_storage::{
    BlobReference, BlobStorage, DEFAULT_NAME_LENGTH, FileSystemStorage, LocalRepository,
    NameGenerator, unique_name_in,
};
