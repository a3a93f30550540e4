//! `provena show` handler.

use super::open_repository;
use provena::{ExecutionId, JsonError, ProvenaResult, Repository};
use std::path::PathBuf;

/// Print a recorded execution as JSON.
#[tracing::instrument]
pub async fn show_execution(repo: Option<PathBuf>, id: i64) -> ProvenaResult<()> {
    let repository = open_repository(repo)?;
    let entry = repository.load_execution(ExecutionId::from(id)).await?;
    let json = serde_json::to_string_pretty(&entry).map_err(JsonError::from)?;
    println!("{}", json);
    Ok(())
}
