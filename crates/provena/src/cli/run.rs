//! `provena run` handler.

use super::{RunArgs, open_repository};
use provena::{
    Backend, ExecConfig, ExecutionId, ExecutionOptions, Invocation, JsonError, OutputRedirects,
    Program, ProgramOutcome, ProvenaResult, StageOptions, execution,
};
use serde::Serialize;
use std::sync::Arc;

/// What `provena run` prints.
#[derive(Debug, Serialize)]
struct RunSummary<'a> {
    execution: ExecutionId,
    outcome: Option<&'a ProgramOutcome>,
}

/// Run one program inside a recorded execution and print the result as JSON.
#[tracing::instrument(skip(args), fields(command = ?args.command))]
pub async fn run_program(args: RunArgs) -> ProvenaResult<()> {
    let repository = Arc::new(open_repository(args.repo)?);
    let config = match &args.config {
        Some(path) => ExecConfig::from_file(path)?,
        None => ExecConfig::load()?,
    };

    let mut options = ExecutionOptions::new(args.workdir.unwrap_or_else(std::env::temp_dir))
        .with_description(args.description)
        .with_config(config);
    if let Some(remote) = args.remote_workdir {
        options = options.with_remote_parent(remote);
    }

    let mut redirects = OutputRedirects::new();
    if let Some(path) = args.stdout {
        redirects = redirects.with_stdout(path);
    }
    if let Some(path) = args.stderr {
        redirects = redirects.with_stderr(path);
    }

    let program = Program::new(|arguments: Vec<String>| Invocation::fixed(arguments, ()));
    let command = args.command;
    let staged = args.stage;
    let via = args.via;

    let done = execution(repository, options, async move |ex| {
        match via {
            None => program.invoke_redirected(ex, command, redirects).await?,
            Some(backend) => {
                let mut pending = program.dispatch_redirected(ex, command, backend, redirects)?;
                if pending.wait(ex).await?.is_none() && backend == Backend::Batch {
                    tracing::warn!("Batch job failed; its outcome is recorded");
                }
            }
        }
        for path in &staged {
            let description = path.display().to_string();
            ex.add(path, StageOptions::new(description))?;
        }
        Ok(())
    })
    .await?;

    let summary = RunSummary {
        execution: done.id(),
        outcome: done.execution().programs().last(),
    };
    let json = serde_json::to_string_pretty(&summary).map_err(JsonError::from)?;
    println!("{}", json);
    Ok(())
}
