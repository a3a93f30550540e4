//! Record of a single external process run.

use serde::{Deserialize, Serialize};

/// Immutable record of one external process run.
///
/// Captured streams are stored line by line without terminators. A stream that
/// was redirected to a file is recorded as `None`.
///
/// # Examples
///
/// ```
/// use provena_core::ProgramOutcome;
///
/// let outcome = ProgramOutcome::new(
///     0,
///     4242,
///     vec!["echo".to_string(), "hi".to_string()],
///     Some(vec!["hi".to_string()]),
///     Some(vec![]),
/// );
///
/// assert!(outcome.succeeded());
/// assert_eq!(outcome.command_line(), "echo hi");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, derive_getters::Getters)]
pub struct ProgramOutcome {
    /// Exit status (`128 + signal` when the process was killed by a signal).
    exit_status: i32,
    /// Operating system process identifier.
    pid: u32,
    /// The exact argument vector that was executed.
    arguments: Vec<String>,
    /// Captured standard output, absent when redirected.
    stdout: Option<Vec<String>>,
    /// Captured standard error, absent when redirected.
    stderr: Option<Vec<String>>,
}

impl ProgramOutcome {
    /// Creates a new outcome record.
    pub fn new(
        exit_status: i32,
        pid: u32,
        arguments: Vec<String>,
        stdout: Option<Vec<String>>,
        stderr: Option<Vec<String>>,
    ) -> Self {
        Self {
            exit_status,
            pid,
            arguments,
            stdout,
            stderr,
        }
    }

    /// Whether the process exited with status zero.
    pub fn succeeded(&self) -> bool {
        self.exit_status == 0
    }

    /// The argument vector joined with spaces, for messages.
    pub fn command_line(&self) -> String {
        self.arguments.join(" ")
    }
}

impl std::fmt::Display for ProgramOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "'{}' exited with status {}",
            self.command_line(),
            self.exit_status
        )?;
        if let Some(stdout) = self.stdout.as_ref().filter(|lines| !lines.is_empty()) {
            write!(f, "\nstdout:\n{}", stdout.join("\n"))?;
        }
        if let Some(stderr) = self.stderr.as_ref().filter(|lines| !lines.is_empty()) {
            write!(f, "\nstderr:\n{}", stderr.join("\n"))?;
        }
        Ok(())
    }
}
