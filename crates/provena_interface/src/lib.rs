//! Trait definitions for the provena execution manager.
//!
//! This crate defines the boundary between the execution core and the
//! persistent repository: the [`Repository`] trait and the records that cross
//! it.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod repository;
mod types;

pub use repository::Repository;
pub use types::{
    AssociatedFile, ExecutionEntry, ExecutionRecord, FileInfo, IdOrAlias, StagedFile,
};
