//! Errors raised by running external programs.

use provena_core::ProgramOutcome;

/// Specific program error conditions.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum ProgramErrorKind {
    /// The executable could not be found; no outcome exists
    #[display("Program '{}' does not seem to exist in your $PATH", _0)]
    ExecutableNotFound(String),
    /// The process ran and exited nonzero
    #[display("Running {}", _0)]
    Failed(ProgramOutcome),
    /// The result transform rejected a successful outcome
    #[display("Could not compute result of '{}': {}", program, message)]
    TransformFailed {
        /// Program whose outcome was transformed
        program: String,
        /// Reason given by the transform
        message: String,
    },
    /// The process could not be started or its output could not be collected
    #[display("I/O failure running '{}': {}", program, message)]
    Io {
        /// Program being run
        program: String,
        /// Underlying error message
        message: String,
    },
}

/// Program error with location tracking.
///
/// # Examples
///
/// ```
/// use provena_core::ProgramOutcome;
/// use provena_error::{ProgramError, ProgramErrorKind};
///
/// let outcome = ProgramOutcome::new(1, 99, vec!["false".to_string()], Some(vec![]), Some(vec![]));
/// let err = ProgramError::new(ProgramErrorKind::Failed(outcome));
/// assert_eq!(*err.outcome().unwrap().exit_status(), 1);
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Program Error: {} at line {} in {}", kind, line, file)]
pub struct ProgramError {
    /// The kind of error that occurred
    pub kind: ProgramErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ProgramError {
    /// Create a new program error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ProgramErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// The recorded outcome, present only for nonzero exits.
    pub fn outcome(&self) -> Option<&ProgramOutcome> {
        match &self.kind {
            ProgramErrorKind::Failed(outcome) => Some(outcome),
            _ => None,
        }
    }
}
