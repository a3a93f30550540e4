//! Top-level error wrapper types.

use crate::{
    ConfigError, DispatchError, ExecutionError, ExecutionErrorKind, JsonError, ProgramError,
    RepositoryError, StorageError,
};
use provena_core::ProgramOutcome;

/// Union of every error domain in provena.
///
/// # Examples
///
/// ```
/// use provena_error::{ConfigError, ProvenaError};
///
/// let err: ProvenaError = ConfigError::new("poll interval must be positive").into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, Clone, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum ProvenaErrorKind {
    /// External program could not be started or exited nonzero
    #[from(ProgramError)]
    Program(ProgramError),
    /// Execution scope misuse or lifecycle failure
    #[from(ExecutionError)]
    Execution(ExecutionError),
    /// Asynchronous or batch dispatch failure
    #[from(DispatchError)]
    Dispatch(DispatchError),
    /// Repository collaborator failure
    #[from(RepositoryError)]
    Repository(RepositoryError),
    /// Blob storage failure
    #[from(StorageError)]
    Storage(StorageError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
}

/// Provena error with kind discrimination.
///
/// # Examples
///
/// ```
/// use provena_error::{ExecutionError, ExecutionErrorKind, ProvenaErrorKind, ProvenaResult};
///
/// fn run() -> ProvenaResult<()> {
///     Err(ExecutionError::new(ExecutionErrorKind::Terminated("7".to_string())))?
/// }
///
/// let err = run().unwrap_err();
/// assert!(matches!(err.kind(), ProvenaErrorKind::Execution(_)));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Provena Error: {}", _0)]
pub struct ProvenaError(Box<ProvenaErrorKind>);

impl ProvenaError {
    /// Create a new error from a kind.
    pub fn new(kind: ProvenaErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ProvenaErrorKind {
        &self.0
    }

    /// The outcome of the program whose failure this is, if any.
    pub fn program_outcome(&self) -> Option<&ProgramOutcome> {
        match self.kind() {
            ProvenaErrorKind::Program(err) => err.outcome(),
            ProvenaErrorKind::Execution(err) => match &err.kind {
                ExecutionErrorKind::RecordFailed { body, .. } => body.program_outcome(),
                _ => None,
            },
            _ => None,
        }
    }
}

// Generic From implementation for any type that converts to ProvenaErrorKind
impl<T> From<T> for ProvenaError
where
    T: Into<ProvenaErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for provena operations.
pub type ProvenaResult<T> = std::result::Result<T, ProvenaError>;
