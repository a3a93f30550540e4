//! Dispatch backend error types.

/// Kinds of dispatch errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum DispatchErrorKind {
    /// The batch submission command could not be run
    #[display("Batch submission failed: {}", _0)]
    Submission(String),
    /// A job's output file never became visible within the configured bound
    #[display("Output file {} not visible after {} seconds", path, waited_secs)]
    OutputTimeout {
        /// File being waited for
        path: String,
        /// Seconds spent polling
        waited_secs: u64,
    },
    /// A job's output file was visible but unreadable
    #[display("Failed to read job output: {}", _0)]
    OutputRead(String),
}

/// Dispatch error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Dispatch Error: {} at line {} in {}", kind, line, file)]
pub struct DispatchError {
    /// The kind of error that occurred
    pub kind: DispatchErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl DispatchError {
    /// Create a new dispatch error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: DispatchErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
