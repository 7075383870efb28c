//! Terminal client for the task API.

pub mod api;
pub mod form;
pub mod pagination;
pub mod state;

use api::TaskApi;
use state::{Command, Outcome};

/// Runs one command against the API and reports its outcome.
pub async fn execute(api: &TaskApi, command: Command) -> Outcome {
    let describe = |e: anyhow::Error| format!("{e:#}");
    match command {
        Command::Fetch { generation, query } => Outcome::Fetched { generation, result: api.list(&query).await.map_err(describe) },
        Command::Create(input) => Outcome::Created(api.create(&input).await.map_err(describe)),
        Command::Update { id, input, kind } => Outcome::Updated { kind, result: api.update(id, &input).await.map_err(describe) },
        Command::Delete(id) => Outcome::Deleted(api.delete(id).await.map_err(describe)),
    }
}
