//! Repository collaborator error types.

/// Kinds of repository errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum RepositoryErrorKind {
    /// File id or alias does not resolve
    #[display("No file with id or alias '{}'", _0)]
    FileNotFound(String),
    /// Execution id is unknown
    #[display("No execution with id {}", _0)]
    ExecutionNotFound(String),
    /// Alias is already bound to another file
    #[display("Alias '{}' is already in use", _0)]
    AliasTaken(String),
    /// Association target could not be resolved
    #[display("Cannot associate file: {}", _0)]
    AssociationTarget(String),
    /// Staged file could not be imported
    #[display("Failed to import file: {}", _0)]
    Import(String),
    /// Stored file could not be exported
    #[display("Failed to export file: {}", _0)]
    Export(String),
    /// Catalog could not be loaded or saved
    #[display("Catalog failure: {}", _0)]
    Catalog(String),
}

/// Repository error with location tracking.
///
/// # Examples
///
/// ```
/// use provena_error::{RepositoryError, RepositoryErrorKind};
///
/// let err = RepositoryError::new(RepositoryErrorKind::FileNotFound("reads".to_string()));
/// assert!(format!("{}", err).contains("reads"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Repository Error: {} at line {} in {}", kind, line, file)]
pub struct RepositoryError {
    /// The kind of error that occurred
    pub kind: RepositoryErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl RepositoryError {
    /// Create a new repository error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: RepositoryErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
