//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the provena binary.

mod commands;
mod run;
mod show;

pub use commands::{Cli, Commands, RunArgs};
pub use run::run_program;
pub use show::show_execution;

use provena::{ConfigError, LocalRepository, ProvenaResult};
use std::path::PathBuf;

/// Open the repository at `dir`, or at the per-user default location.
fn open_repository(dir: Option<PathBuf>) -> ProvenaResult<LocalRepository> {
    let dir = match dir {
        Some(dir) => dir,
        None => dirs::data_dir()
            .map(|data| data.join("provena"))
            .ok_or_else(|| ConfigError::new("No --repo given and no data directory found"))?,
    };
    LocalRepository::open(dir)
}
