//! Error types for the provena execution manager.
//!
//! # Error Hierarchy
//!
//! Errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! Every type here is `Clone`, so a settled asynchronous dispatch can hand the
//! same failure back as many times as it is asked.
//!
//! # Examples
//!
//! ```
//! use provena_error::{ProvenaResult, RepositoryError, RepositoryErrorKind};
//!
//! fn resolve(alias: &str) -> ProvenaResult<i64> {
//!     Err(RepositoryError::new(RepositoryErrorKind::FileNotFound(alias.to_string())))?
//! }
//!
//! assert!(resolve("genome").is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod dispatch;
mod error;
mod execution;
mod json;
mod program;
mod repository;
mod storage;

pub use config::ConfigError;
pub use dispatch::{DispatchError, DispatchErrorKind};
pub use error::{ProvenaError, ProvenaErrorKind, ProvenaResult};
pub use execution::{ExecutionError, ExecutionErrorKind};
pub use json::JsonError;
pub use program::{ProgramError, ProgramErrorKind};
pub use repository::{RepositoryError, RepositoryErrorKind};
pub use storage::{StorageError, StorageErrorKind};
