//! Core data types for the provena execution manager.
//!
//! This crate provides the plain records shared by every other provena crate:
//! what a program run looked like, where its streams went, and the opaque
//! identifiers handed out by a repository.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod ids;
mod outcome;
mod redirect;

pub use ids::{ExecutionId, FileId};
pub use outcome::ProgramOutcome;
pub use redirect::OutputRedirects;
