//! Output stream redirection for program runs.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where a program's standard streams should go.
///
/// A stream without a path is captured into memory. Relative paths are
/// resolved against the execution's working directory.
///
/// # Examples
///
/// ```
/// use provena_core::OutputRedirects;
///
/// let redirects = OutputRedirects::new().with_stdout("listing.txt");
/// assert!(redirects.stdout().is_some());
/// assert!(redirects.stderr().is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputRedirects {
    stdout: Option<PathBuf>,
    stderr: Option<PathBuf>,
}

impl OutputRedirects {
    /// Captures both streams into memory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sends standard output to a file.
    pub fn with_stdout(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdout = Some(path.into());
        self
    }

    /// Sends standard error to a file.
    pub fn with_stderr(mut self, path: impl Into<PathBuf>) -> Self {
        self.stderr = Some(path.into());
        self
    }

    /// Standard output target, if redirected.
    pub fn stdout(&self) -> Option<&Path> {
        self.stdout.as_deref()
    }

    /// Standard error target, if redirected.
    pub fn stderr(&self) -> Option<&Path> {
        self.stderr.as_deref()
    }

    /// Resolves both targets against a working directory.
    pub fn resolved_in(&self, working_directory: &Path) -> Self {
        Self {
            stdout: self.stdout.as_ref().map(|p| working_directory.join(p)),
            stderr: self.stderr.as_ref().map(|p| working_directory.join(p)),
        }
    }
}
