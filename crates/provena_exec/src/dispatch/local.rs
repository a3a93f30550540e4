//! Local process backend.

use super::{DispatchBackend, Job};
use async_trait::async_trait;
use provena_core::ProgramOutcome;
use provena_error::{ProgramError, ProgramErrorKind, ProvenaResult};
use std::path::Path;
use std::process::{ExitStatus, Stdio};

/// Runs a job as a child process of this one.
///
/// Streams without a redirect are captured into memory and split into lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalProcess;

impl LocalProcess {
    fn stream(program: &str, target: Option<&Path>) -> ProvenaResult<Stdio> {
        match target {
            Some(path) => {
                let file = std::fs::File::create(path).map_err(|e| {
                    ProgramError::new(ProgramErrorKind::Io {
                        program: program.to_string(),
                        message: format!("cannot create {}: {}", path.display(), e),
                    })
                })?;
                Ok(Stdio::from(file))
            }
            None => Ok(Stdio::piped()),
        }
    }
}

#[async_trait]
impl DispatchBackend for LocalProcess {
    #[tracing::instrument(skip(self, job), fields(arguments = ?job.arguments(), cwd = %job.working_directory().display()))]
    async fn run(&self, job: &Job) -> ProvenaResult<ProgramOutcome> {
        let (program, rest) = job.arguments().split_first().ok_or_else(|| {
            ProgramError::new(ProgramErrorKind::Io {
                program: String::new(),
                message: "empty argument vector".to_string(),
            })
        })?;

        let redirects = job.redirects().resolved_in(job.working_directory());
        let mut command = tokio::process::Command::new(program);
        command
            .args(rest)
            .current_dir(job.working_directory())
            .stdin(Stdio::null())
            .stdout(Self::stream(program, redirects.stdout())?)
            .stderr(Self::stream(program, redirects.stderr())?);

        let child = command.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ProgramError::new(ProgramErrorKind::ExecutableNotFound(program.clone()))
            } else {
                ProgramError::new(ProgramErrorKind::Io {
                    program: program.clone(),
                    message: e.to_string(),
                })
            }
        })?;
        let pid = child.id().unwrap_or_default();

        let output = child.wait_with_output().await.map_err(|e| {
            ProgramError::new(ProgramErrorKind::Io {
                program: program.clone(),
                message: e.to_string(),
            })
        })?;

        let exit_status = exit_code(output.status);
        tracing::debug!(pid, exit_status, "Process exited");

        Ok(ProgramOutcome::new(
            exit_status,
            pid,
            job.arguments().clone(),
            redirects.stdout().is_none().then(|| lines(&output.stdout)),
            redirects.stderr().is_none().then(|| lines(&output.stderr)),
        ))
    }
}

/// Captured bytes as lines without terminators.
pub(crate) fn lines(bytes: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(str::to_string)
        .collect()
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(-1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}
