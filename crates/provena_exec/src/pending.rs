//! Handles to asynchronously dispatched programs.

use crate::Execution;
use provena_core::ProgramOutcome;
use provena_error::{
    ExecutionError, ExecutionErrorKind, ProgramError, ProgramErrorKind, ProvenaError,
    ProvenaResult,
};
use tokio::sync::oneshot;
use uuid::Uuid;

/// How a dispatched program ended.
#[derive(Debug, Clone)]
pub enum Settled<T> {
    /// The program succeeded and its result was computed
    Value(T),
    /// The program or its result transform failed; waiting re-raises this
    Failed(ProvenaError),
    /// The program failed but the backend's policy is to yield no value
    Discarded(ProvenaError),
}

/// What a worker hands back: the outcome to record, if the program ran, and
/// the result.
#[derive(Debug)]
pub(crate) struct Settlement<T> {
    pub(crate) outcome: Option<ProgramOutcome>,
    pub(crate) result: Settled<T>,
}

impl<T> Settlement<T> {
    pub(crate) fn new(outcome: Option<ProgramOutcome>, result: ProvenaResult<T>) -> Self {
        let result = match result {
            Ok(value) => Settled::Value(value),
            Err(e) => Settled::Failed(e),
        };
        Self { outcome, result }
    }

    /// Turn a failure into a discarded one.
    pub(crate) fn discarding_failure(self) -> Self {
        let result = match self.result {
            Settled::Failed(e) => Settled::Discarded(e),
            other => other,
        };
        Self { result, ..self }
    }
}

/// Result of a program dispatched with `Program::dispatch`.
///
/// The program runs on its own task. [`wait`](Self::wait) suspends until it is
/// done, appends its outcome to the execution it was dispatched from, and
/// yields the result. Waiting again replays the same result without appending
/// the outcome a second time.
///
/// Outcomes are appended in the order `wait` calls complete, so wait in the
/// order the provenance log should show. A `Pending` that is never waited on
/// leaves no trace in the log.
#[derive(Debug)]
pub struct Pending<T> {
    execution: Uuid,
    program: String,
    receiver: oneshot::Receiver<Settlement<T>>,
    settled: Option<Settled<T>>,
}

impl<T> Pending<T> {
    pub(crate) fn new(
        execution: Uuid,
        program: String,
        receiver: oneshot::Receiver<Settlement<T>>,
    ) -> Self {
        Self {
            execution,
            program,
            receiver,
            settled: None,
        }
    }

    /// Name of the dispatched program.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Whether a previous `wait` already collected the result.
    pub fn is_settled(&self) -> bool {
        self.settled.is_some()
    }

    /// Wait for the program and yield its result.
    ///
    /// Returns `Ok(None)` when a failure was discarded by the batch failure
    /// policy.
    ///
    /// # Errors
    ///
    /// Re-raises the program's failure (`ProgramFailed`, `ExecutableNotFound`,
    /// a transform or dispatch error). Fails with `ForeignPending` if
    /// `execution` is not the one the program was dispatched from, with
    /// `Terminated` if that execution has already been recorded, and with
    /// `WorkerLost` if the worker ended without reporting.
    pub async fn wait(&mut self, execution: &mut Execution) -> ProvenaResult<Option<T>>
    where
        T: Clone,
    {
        if execution.token() != self.execution {
            return Err(ExecutionError::new(ExecutionErrorKind::ForeignPending).into());
        }
        execution.ensure_open()?;

        let settled = match self.settled.take() {
            Some(settled) => settled,
            None => {
                let settlement = (&mut self.receiver).await.map_err(|_| {
                    ExecutionError::new(ExecutionErrorKind::WorkerLost(self.program.clone()))
                })?;
                if let Some(outcome) = settlement.outcome {
                    execution.record_outcome(outcome);
                }
                settlement.result
            }
        };

        let result = match &settled {
            Settled::Value(value) => Ok(Some(value.clone())),
            Settled::Failed(e) => Err(e.clone()),
            Settled::Discarded(e) => {
                tracing::warn!(program = %self.program, error = %e, "Discarding failed batch job");
                Ok(None)
            }
        };
        self.settled = Some(settled);
        result
    }
}

/// Compute a program's result from its outcome.
///
/// A nonzero exit is `ProgramFailed`; otherwise the result policy decides.
pub(crate) fn settle<T>(
    outcome: &ProgramOutcome,
    policy: crate::ResultPolicy<T>,
) -> ProvenaResult<T> {
    if !outcome.succeeded() {
        return Err(ProgramError::new(ProgramErrorKind::Failed(outcome.clone())).into());
    }
    policy.resolve(outcome)
}
