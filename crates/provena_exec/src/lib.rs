//! Execution scopes, program bindings and dispatch backends for provena.
//!
//! # Overview
//!
//! - [`execution`] opens an [`Execution`] with a fresh working directory, runs
//!   an async body in it and records the result in a `Repository`
//! - [`Program`] binds a pure command builder; [`Program::invoke`] runs it and
//!   waits, [`Program::dispatch`] starts it on its own task and returns a
//!   [`Pending`]
//! - [`Backend`] picks where dispatched programs run: a local process
//!   ([`LocalProcess`]) or a batch scheduler ([`BatchSubmission`])
//! - [`ExecConfig`] holds the batch submission command and polling settings
//!
//! Every run, successful or not, is appended to the execution's log as a
//! `ProgramOutcome`, and the log is written to the repository when the scope
//! ends.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod dispatch;
mod execution;
mod pending;
mod program;
mod task;

pub use config::{BatchConfig, BatchFailurePolicy, ExecConfig};
pub use dispatch::{
    Backend, BatchSubmission, DispatchBackend, Job, LocalProcess, shell_join, shell_quote,
};
pub use execution::{Completed, Execution, ExecutionOptions, StageOptions, execution};
pub use pending::{Pending, Settled};
pub use program::{Invocation, Program, ResultPolicy, Transform};
pub use task::{TaskReport, run_task};
