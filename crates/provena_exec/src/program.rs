//! Program bindings.
//!
//! A [`Program`] is built from a pure function turning caller arguments into
//! an [`Invocation`]: the argument vector to run and how to compute the
//! result once it has run. The same binding can then be run synchronously
//! with [`Program::invoke`] or dispatched with [`Program::dispatch`].

use crate::dispatch::{Backend, BatchSubmission, DispatchBackend, Job, LocalProcess};
use crate::execution::panic_message;
use crate::pending::{Pending, Settlement, settle};
use crate::{BatchFailurePolicy, Execution};
use provena_core::{OutputRedirects, ProgramOutcome};
use provena_error::{ProgramError, ProgramErrorKind, ProvenaResult};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Transform computing a result from a successful outcome.
pub type Transform<T> = Box<dyn FnOnce(&ProgramOutcome) -> ProvenaResult<T> + Send>;

/// How a program's result is computed.
pub enum ResultPolicy<T> {
    /// Return this value
    Fixed(T),
    /// Compute the value from the outcome
    Transform(Transform<T>),
}

impl<T> ResultPolicy<T> {
    /// Produce the result for a successful outcome.
    pub fn resolve(self, outcome: &ProgramOutcome) -> ProvenaResult<T> {
        match self {
            Self::Fixed(value) => Ok(value),
            Self::Transform(transform) => transform(outcome),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ResultPolicy<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed(value) => f.debug_tuple("Fixed").field(value).finish(),
            Self::Transform(_) => f.write_str("Transform(..)"),
        }
    }
}

/// A command to run and the policy for its result.
///
/// # Examples
///
/// ```
/// use provena_exec::Invocation;
///
/// let touch = Invocation::fixed(["touch", "f.txt"], "f.txt");
/// assert_eq!(touch.arguments(), ["touch", "f.txt"]);
///
/// let count = Invocation::transform(["wc", "-l", "reads.fq"], |outcome| {
///     Ok(outcome.stdout().as_ref().map_or(0, |lines| lines.len()))
/// });
/// assert_eq!(count.arguments()[0], "wc");
/// ```
#[derive(Debug)]
pub struct Invocation<T> {
    arguments: Vec<String>,
    result: ResultPolicy<T>,
}

impl<T> Invocation<T> {
    /// Run `arguments` and return `value` on success.
    pub fn fixed<I, S>(arguments: I, value: T) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            arguments: arguments.into_iter().map(Into::into).collect(),
            result: ResultPolicy::Fixed(value),
        }
    }

    /// Run `arguments` and compute the result from the outcome on success.
    pub fn transform<I, S, F>(arguments: I, transform: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: FnOnce(&ProgramOutcome) -> ProvenaResult<T> + Send + 'static,
    {
        Self {
            arguments: arguments.into_iter().map(Into::into).collect(),
            result: ResultPolicy::Transform(Box::new(transform)),
        }
    }

    /// The argument vector, program first.
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// Split into argument vector and result policy.
    pub fn into_parts(self) -> (Vec<String>, ResultPolicy<T>) {
        (self.arguments, self.result)
    }
}

/// A reusable binding from caller arguments to a runnable command.
///
/// Cloning is cheap; clones share the builder.
///
/// # Example
///
/// ```no_run
/// use provena_exec::{Backend, ExecutionOptions, Invocation, Program, execution};
/// use provena_storage::LocalRepository;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let sort = Program::new(|(input, output): (String, String)| {
///     Invocation::fixed(["samtools", "sort", "-o", output.as_str(), input.as_str()], output.clone())
/// });
///
/// let repo = Arc::new(LocalRepository::open("/var/provena")?);
/// execution(repo, ExecutionOptions::new("/scratch"), async |ex| {
///     let mut sorted = sort.dispatch(ex, ("in.bam".into(), "out.bam".into()), Backend::Batch)?;
///     sorted.wait(ex).await
/// })
/// .await?;
/// # Ok(())
/// # }
/// ```
pub struct Program<A, T> {
    builder: Arc<dyn Fn(A) -> Invocation<T> + Send + Sync>,
}

impl<A, T> Clone for Program<A, T> {
    fn clone(&self) -> Self {
        Self {
            builder: Arc::clone(&self.builder),
        }
    }
}

impl<A, T> std::fmt::Debug for Program<A, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Program").finish_non_exhaustive()
    }
}

impl<A, T> Program<A, T> {
    /// Bind a command builder.
    pub fn new<F>(builder: F) -> Self
    where
        F: Fn(A) -> Invocation<T> + Send + Sync + 'static,
    {
        Self {
            builder: Arc::new(builder),
        }
    }

    /// Build the invocation for `args` without running anything.
    pub fn describe(&self, args: A) -> Invocation<T> {
        (self.builder)(args)
    }

    /// Run the program in the execution's working directory and wait for it.
    ///
    /// Both streams are captured. See [`invoke_redirected`](Self::invoke_redirected).
    pub async fn invoke(&self, execution: &mut Execution, args: A) -> ProvenaResult<T> {
        self.invoke_redirected(execution, args, OutputRedirects::new())
            .await
    }

    /// Run the program with the given stream redirects and wait for it.
    ///
    /// The outcome is appended to the execution before the result is
    /// computed, so it is in the log even when this fails.
    ///
    /// # Errors
    ///
    /// - `Terminated` if the execution has been recorded
    /// - `ExecutableNotFound` if the program could not be started; nothing is recorded
    /// - `ProgramFailed` carrying the outcome if the exit status is nonzero
    /// - whatever the result transform returns
    #[tracing::instrument(skip_all, fields(cwd = %execution.working_directory().display()))]
    pub async fn invoke_redirected(
        &self,
        execution: &mut Execution,
        args: A,
        redirects: OutputRedirects,
    ) -> ProvenaResult<T> {
        execution.ensure_open()?;
        let (arguments, policy) = self.describe(args).into_parts();
        let job = Job::new(
            arguments,
            execution.working_directory(),
            execution.remote_working_directory(),
            redirects,
        );

        let outcome = LocalProcess.run(&job).await?;
        execution.record_outcome(outcome.clone());
        settle(&outcome, policy)
    }
}

impl<A, T: Send + 'static> Program<A, T> {
    /// Start the program on its own task and return immediately.
    ///
    /// Both streams are captured. See [`dispatch_redirected`](Self::dispatch_redirected).
    pub fn dispatch(
        &self,
        execution: &Execution,
        args: A,
        backend: Backend,
    ) -> ProvenaResult<Pending<T>> {
        self.dispatch_redirected(execution, args, backend, OutputRedirects::new())
    }

    /// Start the program on its own task with the given stream redirects.
    ///
    /// The result transform runs on the worker; a panic there settles as
    /// `TransformFailed`. The outcome is appended to the execution only when
    /// the returned [`Pending`] is waited on. Must be
    /// called from within a tokio runtime.
    ///
    /// With [`Backend::Batch`], redirect paths are relative to the remote
    /// working directory and a failure is discarded or propagated according
    /// to `batch.on_failure`.
    ///
    /// # Errors
    ///
    /// Fails with `Terminated` if the execution has been recorded.
    #[tracing::instrument(skip_all, fields(backend = %backend))]
    pub fn dispatch_redirected(
        &self,
        execution: &Execution,
        args: A,
        backend: Backend,
        redirects: OutputRedirects,
    ) -> ProvenaResult<Pending<T>> {
        execution.ensure_open()?;
        let (arguments, policy) = self.describe(args).into_parts();
        let job = Job::new(
            arguments,
            execution.working_directory(),
            execution.remote_working_directory(),
            redirects,
        );
        let program = job.program().to_string();

        let (runner, discard): (Box<dyn DispatchBackend>, bool) = match backend {
            Backend::Threaded => (Box::new(LocalProcess), false),
            Backend::Batch => (
                Box::new(BatchSubmission::new(execution.config().clone())),
                *execution.config().batch().on_failure() == BatchFailurePolicy::Discard,
            ),
        };

        let (sender, receiver) = oneshot::channel();
        tracing::debug!(arguments = ?job.arguments(), "Dispatching program");
        tokio::spawn(async move {
            let settlement = match runner.run(&job).await {
                Ok(outcome) => {
                    let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
                        settle(&outcome, policy)
                    }))
                    .unwrap_or_else(|payload| {
                        Err(ProgramError::new(ProgramErrorKind::TransformFailed {
                            program: job.program().to_string(),
                            message: panic_message(payload.as_ref()),
                        })
                        .into())
                    });
                    Settlement::new(Some(outcome), result)
                }
                Err(e) => Settlement::new(None, Err(e)),
            };
            let settlement = if discard {
                settlement.discarding_failure()
            } else {
                settlement
            };
            if sender.send(settlement).is_err() {
                tracing::debug!(program = %job.program(), "Pending dropped before the program finished");
            }
        });

        Ok(Pending::new(execution.token(), program, receiver))
    }
}
