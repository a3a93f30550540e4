//! Remote batch scheduler backend.

use super::local::lines;
use super::{DispatchBackend, Job, LocalProcess};
use crate::ExecConfig;
use async_trait::async_trait;
use provena_core::ProgramOutcome;
use provena_error::{DispatchError, DispatchErrorKind, ProvenaResult};
use provena_storage::unique_name_in;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Submits a job to an external batch scheduler.
///
/// The job's argument vector becomes a single shell line whose streams go to
/// files in the remote working directory:
///
/// ```text
/// ( 'samtools' 'sort' 'in.bam' > /remote/wd/Xy3.out ) >& /remote/wd/Xy3.err
/// ```
///
/// That line is substituted into the configured submission command, which must
/// block until the job is done. The submitter returning does not mean the
/// output files are visible here yet, so both are polled for in the local
/// working directory before the job counts as finished. Redirected files are
/// waited on the same way but not read.
///
/// The recorded outcome is the submitter's: its argument vector, pid and exit
/// status, with the job's streams as collected from the files.
#[derive(Debug, Clone)]
pub struct BatchSubmission {
    config: ExecConfig,
}

/// One of the job's output streams.
struct Capture {
    /// Target as written in the job line
    remote: PathBuf,
    /// Where the file shows up locally
    local: PathBuf,
    /// Whether the file's lines go into the outcome; false when the caller redirected it
    read: bool,
}

impl BatchSubmission {
    /// Backend using the given scheduler settings.
    pub fn new(config: ExecConfig) -> Self {
        Self { config }
    }

    fn capture(job: &Job, redirect: Option<&Path>, generated: &str) -> Capture {
        let (path, read) = match redirect {
            Some(path) => (path, false),
            None => (Path::new(generated), true),
        };
        Capture {
            remote: job.remote_working_directory().join(path),
            local: job.working_directory().join(path),
            read,
        }
    }

    /// Substitute `{cwd}` and `{command}` into the submission command.
    fn submission(&self, job: &Job, line: &str) -> Vec<String> {
        let cwd = job.remote_working_directory().to_string_lossy();
        self.config
            .batch()
            .submit_command()
            .iter()
            .map(|arg| arg.replace("{cwd}", &cwd).replace("{command}", line))
            .collect()
    }

    /// Wait until `path` exists locally.
    async fn await_visible(&self, path: &Path) -> ProvenaResult<()> {
        let started = Instant::now();
        loop {
            if tokio::fs::try_exists(path).await.unwrap_or(false) {
                return Ok(());
            }
            if let Some(timeout) = self.config.poll_timeout()
                && started.elapsed() >= timeout
            {
                return Err(DispatchError::new(DispatchErrorKind::OutputTimeout {
                    path: path.display().to_string(),
                    waited_secs: started.elapsed().as_secs(),
                })
                .into());
            }
            tracing::trace!(path = %path.display(), "Output not visible yet");
            tokio::time::sleep(self.config.poll_interval()).await;
        }
    }

    async fn collect(&self, capture: &Capture) -> ProvenaResult<Option<Vec<String>>> {
        let path = &capture.local;
        self.await_visible(path).await?;
        if !capture.read {
            return Ok(None);
        }
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            DispatchError::new(DispatchErrorKind::OutputRead(format!(
                "{}: {}",
                path.display(),
                e
            )))
        })?;
        Ok(Some(lines(&bytes)))
    }
}

#[async_trait]
impl DispatchBackend for BatchSubmission {
    #[tracing::instrument(skip(self, job), fields(arguments = ?job.arguments(), remote_cwd = %job.remote_working_directory().display()))]
    async fn run(&self, job: &Job) -> ProvenaResult<ProgramOutcome> {
        // No entry starts with `name`, so both suffixed names are free as well
        let name = unique_name_in(job.working_directory())?;
        let stdout = Self::capture(job, job.redirects().stdout(), &format!("{name}.out"));
        let stderr = Self::capture(job, job.redirects().stderr(), &format!("{name}.err"));

        let line = format!(
            "( {} > {} ) >& {}",
            shell_join(job.arguments()),
            shell_quote(&stdout.remote.to_string_lossy()),
            shell_quote(&stderr.remote.to_string_lossy()),
        );
        let submission = Job::local(self.submission(job, &line), job.working_directory());
        tracing::debug!(command = %line, "Submitting batch job");

        let submitted = LocalProcess.run(&submission).await.map_err(|e| {
            DispatchError::new(DispatchErrorKind::Submission(format!(
                "{}: {}",
                submission.program(),
                e
            )))
        })?;

        // A nonzero submitter status may still mean the job ran and wrote its streams
        let job_stdout = self.collect(&stdout).await?;
        let job_stderr = self.collect(&stderr).await?;

        tracing::debug!(
            pid = *submitted.pid(),
            exit_status = *submitted.exit_status(),
            "Batch job finished"
        );
        Ok(ProgramOutcome::new(
            *submitted.exit_status(),
            *submitted.pid(),
            submitted.arguments().clone(),
            job_stdout,
            job_stderr,
        ))
    }
}

/// Quote one word for a POSIX shell.
///
/// Words made only of safe characters are returned unchanged.
///
/// # Examples
///
/// ```
/// use provena_exec::shell_quote;
///
/// assert_eq!(shell_quote("reads.bam"), "reads.bam");
/// assert_eq!(shell_quote("two words"), "'two words'");
/// assert_eq!(shell_quote("it's"), "'it'\\''s'");
/// ```
pub fn shell_quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c));
    if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', "'\\''"))
    }
}

/// Join an argument vector into one shell command line.
pub fn shell_join(arguments: &[String]) -> String {
    arguments
        .iter()
        .map(|arg| shell_quote(arg))
        .collect::<Vec<_>>()
        .join(" ")
}
