//! Provena CLI binary.
//!
//! This binary provides command-line access to provena:
//! - Run a program inside a recorded execution
//! - Show a recorded execution

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, Commands, run_program, show_execution};

    // Parse command-line arguments
    let cli = Cli::parse();

    // Initialize tracing; RUST_LOG overrides the verbosity flag
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Execute the requested command
    match cli.command {
        Commands::Run(args) => {
            run_program(args).await?;
        }

        Commands::Show { repo, id } => {
            show_execution(repo, id).await?;
        }
    }

    Ok(())
}
