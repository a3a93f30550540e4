//! CLI command definitions.

use clap::{Args, Parser, Subcommand};
use provena::Backend;
use std::path::PathBuf;

/// Provena - run external programs and record their provenance
#[derive(Parser, Debug)]
#[command(name = "provena")]
#[command(about = "Run external programs and record their provenance", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one program inside a recorded execution
    Run(RunArgs),

    /// Print a recorded execution as JSON
    Show {
        /// Repository directory
        #[arg(long)]
        repo: Option<PathBuf>,

        /// Execution id
        id: i64,
    },
}

/// Arguments of `provena run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Repository directory (defaults to the user data directory)
    #[arg(long)]
    pub repo: Option<PathBuf>,

    /// Directory to create the working directory in
    #[arg(long)]
    pub workdir: Option<PathBuf>,

    /// The working directory parent as seen by batch nodes
    #[arg(long)]
    pub remote_workdir: Option<PathBuf>,

    /// Dispatch backend; runs synchronously when omitted
    #[arg(long)]
    pub via: Option<Backend>,

    /// Description stored with the execution
    #[arg(long, default_value = "")]
    pub description: String,

    /// Send standard output to this file
    #[arg(long)]
    pub stdout: Option<PathBuf>,

    /// Send standard error to this file
    #[arg(long)]
    pub stderr: Option<PathBuf>,

    /// Import this file from the working directory when done (repeatable)
    #[arg(long)]
    pub stage: Vec<PathBuf>,

    /// Configuration file to use instead of the default lookup
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Program and its arguments
    #[arg(last = true, required = true)]
    pub command: Vec<String>,
}
