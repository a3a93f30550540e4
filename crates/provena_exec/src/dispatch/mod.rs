//! Backends that actually run a program and report its outcome.
//!
//! [`LocalProcess`] runs the argument vector directly in the working directory.
//! [`BatchSubmission`] hands it to an external scheduler as one shell line and
//! collects the streams from files the job leaves behind.

mod batch;
mod local;

pub use batch::{BatchSubmission, shell_join, shell_quote};
pub use local::LocalProcess;

use async_trait::async_trait;
use provena_core::{OutputRedirects, ProgramOutcome};
use provena_error::ProvenaResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where an asynchronous dispatch runs.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Backend {
    /// A local process awaited on its own task
    #[default]
    Threaded,
    /// A job submitted to the configured batch scheduler
    Batch,
}

/// One program run, fully described.
///
/// Redirect paths are kept as given; each backend resolves relative ones
/// against the working directory it runs in.
#[derive(Debug, Clone, PartialEq, Eq, derive_getters::Getters)]
pub struct Job {
    /// Argument vector, program first
    arguments: Vec<String>,
    /// Local working directory
    working_directory: PathBuf,
    /// The same directory as seen by batch worker nodes
    remote_working_directory: PathBuf,
    /// Stream redirects requested by the caller
    redirects: OutputRedirects,
}

impl Job {
    /// Describe a run of `arguments` in `working_directory`.
    pub fn new(
        arguments: Vec<String>,
        working_directory: impl Into<PathBuf>,
        remote_working_directory: impl Into<PathBuf>,
        redirects: OutputRedirects,
    ) -> Self {
        Self {
            arguments,
            working_directory: working_directory.into(),
            remote_working_directory: remote_working_directory.into(),
            redirects,
        }
    }

    /// A job whose local and remote directories coincide.
    pub fn local(arguments: Vec<String>, working_directory: &Path) -> Self {
        Self::new(
            arguments,
            working_directory,
            working_directory,
            OutputRedirects::new(),
        )
    }

    /// Program name, for messages.
    pub fn program(&self) -> &str {
        self.arguments.first().map_or("", String::as_str)
    }
}

/// Something that can run a [`Job`] to completion.
#[async_trait]
pub trait DispatchBackend: Send + Sync {
    /// Run the job and report how it ended.
    ///
    /// A nonzero exit is not an error here; it is reported in the outcome.
    async fn run(&self, job: &Job) -> ProvenaResult<ProgramOutcome>;
}
