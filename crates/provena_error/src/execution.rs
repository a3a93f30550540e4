//! Execution scope error types.

use crate::ProvenaError;

/// Kinds of execution errors.
#[derive(Debug, Clone, derive_more::Display)]
pub enum ExecutionErrorKind {
    /// Program invoked on an execution that has already been recorded
    #[display("Program being called on execution {} which has already terminated", _0)]
    Terminated(String),
    /// Pending result waited on against a different execution than it was dispatched from
    #[display("Pending result belongs to a different execution")]
    ForeignPending,
    /// Working directory could not be created
    #[display("Working directory failure: {}", _0)]
    WorkingDirectory(String),
    /// Tried to stage a file that does not exist
    #[display("No such file or directory: '{}'", _0)]
    StagedFileMissing(String),
    /// Worker task ended without reporting a result
    #[display("Worker for '{}' ended without reporting a result", _0)]
    WorkerLost(String),
    /// Body failed and its record could not be written either
    #[display("{} (recording the execution also failed: {})", body, repository)]
    RecordFailed {
        /// Error the body ended with
        body: Box<ProvenaError>,
        /// Error from writing the record
        repository: Box<ProvenaError>,
    },
}

/// Execution error with location tracking.
///
/// # Examples
///
/// ```
/// use provena_error::{ExecutionError, ExecutionErrorKind};
///
/// let err = ExecutionError::new(ExecutionErrorKind::StagedFileMissing("out.bam".to_string()));
/// assert!(format!("{}", err).contains("out.bam"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Execution Error: {} at line {} in {}", kind, line, file)]
pub struct ExecutionError {
    /// The kind of error that occurred
    pub kind: ExecutionErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ExecutionError {
    /// Create a new execution error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ExecutionErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
