//! Filesystem-unique random names.

use provena_error::{ProvenaResult, StorageError, StorageErrorKind};
use rand::Rng;
use rand::distributions::Alphanumeric;
use std::path::Path;

/// Length of names produced by [`NameGenerator::default`].
pub const DEFAULT_NAME_LENGTH: usize = 20;

/// Produces random alphanumeric names unique within a directory.
///
/// A candidate is accepted only if no existing entry in the directory starts
/// with it, so derived names (`name.bai`, `name_sorted`) cannot collide either.
/// The check is re-done for every candidate; it is not atomic against
/// concurrent external writers.
///
/// # Examples
///
/// ```
/// use provena_storage::NameGenerator;
///
/// let dir = tempfile::tempdir().unwrap();
/// let name = NameGenerator::default().unique_in(dir.path()).unwrap();
/// assert_eq!(name.len(), 20);
/// assert!(name.chars().all(|c| c.is_ascii_alphanumeric()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameGenerator {
    length: usize,
}

impl Default for NameGenerator {
    fn default() -> Self {
        Self {
            length: DEFAULT_NAME_LENGTH,
        }
    }
}

impl NameGenerator {
    /// Generator producing names of `length` characters.
    pub fn new(length: usize) -> Self {
        Self { length }
    }

    /// Length of the generated names.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Return a name that no entry of `dir` starts with.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` cannot be listed.
    pub fn unique_in(&self, dir: &Path) -> ProvenaResult<String> {
        loop {
            let candidate = self.random_name();
            if !Self::prefixes_existing(dir, &candidate)? {
                return Ok(candidate);
            }
            tracing::trace!(candidate = %candidate, dir = %dir.display(), "Name taken, retrying");
        }
    }

    fn random_name(&self) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(self.length)
            .map(char::from)
            .collect()
    }

    fn prefixes_existing(dir: &Path, candidate: &str) -> ProvenaResult<bool> {
        let entries = std::fs::read_dir(dir).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryRead(format!(
                "{}: {}",
                dir.display(),
                e
            )))
        })?;
        for entry in entries {
            let entry = entry.map_err(|e| {
                StorageError::new(StorageErrorKind::DirectoryRead(format!(
                    "{}: {}",
                    dir.display(),
                    e
                )))
            })?;
            if entry.file_name().to_string_lossy().starts_with(candidate) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Return a default-length name that no entry of `dir` starts with.
pub fn unique_name_in(dir: &Path) -> ProvenaResult<String> {
    NameGenerator::default().unique_in(dir)
}
