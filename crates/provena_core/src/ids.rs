//! Opaque identifiers assigned by a repository.

use serde::{Deserialize, Serialize};

/// Identifier of a recorded execution.
///
/// # Examples
///
/// ```
/// use provena_core::ExecutionId;
///
/// let id = ExecutionId::from(7);
/// assert_eq!(id.to_string(), "7");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct ExecutionId(i64);

impl ExecutionId {
    /// Raw numeric value.
    pub fn value(&self) -> i64 {
        self.0
    }
}

/// Identifier of a file stored in a repository.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct FileId(i64);

impl FileId {
    /// Raw numeric value.
    pub fn value(&self) -> i64 {
        self.0
    }
}
