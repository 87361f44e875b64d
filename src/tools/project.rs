use anyhow::{anyhow, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::parse_input;
use crate::project::ProjectStore;
use crate::providers::types::tool::Tool;

#[derive(Debug, Deserialize)]
struct SaveFileInput {
    path: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct CreateCheckpointInput {
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct RestoreCheckpointInput {
    checkpoint_id: u64,
}

/// Tools backed by the project store. Each one captures its own handle.
pub fn project_tools(store: Option<Arc<dyn ProjectStore>>) -> Vec<Tool> {
    vec![
        project_tool(
            "save_project_file",
            "Save a file into the project store, creating a new version if the path already exists.",
            json!({
                "type": "object",
                "required": ["path", "content"],
                "properties": {
                    "path": {"type": "string", "description": "Project-relative file path."},
                    "content": {"type": "string", "description": "Full file content."}
                }
            }),
            store.clone(),
            |store, input| {
                let input: SaveFileInput = parse_input("save_project_file", input)?;
                let file = store.save_file(&input.path, &input.content)?;
                Ok(format!("Saved {} (version {})", file.path, file.version))
            },
        ),
        project_tool(
            "list_project_files",
            "List the files stored in the project.",
            json!({"type": "object", "properties": {}}),
            store.clone(),
            |store, _| {
                let files: Vec<Value> = store
                    .list_files()?
                    .into_iter()
                    .map(|file| {
                        json!({
                            "path": file.path,
                            "version": file.version,
                            "hash": file.hash,
                            "modified_at": file.modified_at,
                        })
                    })
                    .collect();
                Ok(serde_json::to_string(&files)?)
            },
        ),
        project_tool(
            "create_checkpoint",
            "Snapshot every project file under a named checkpoint.",
            json!({
                "type": "object",
                "required": ["name"],
                "properties": {
                    "name": {"type": "string", "description": "Checkpoint name."},
                    "description": {"type": "string", "description": "What the checkpoint captures."}
                }
            }),
            store.clone(),
            |store, input| {
                let input: CreateCheckpointInput = parse_input("create_checkpoint", input)?;
                let checkpoint = store.create_checkpoint(&input.name, &input.description)?;
                Ok(format!(
                    "Created checkpoint {}: {} ({} files)",
                    checkpoint.id, checkpoint.name, checkpoint.file_count
                ))
            },
        ),
        project_tool(
            "restore_checkpoint",
            "Restore the project files to the state captured by a checkpoint.",
            json!({
                "type": "object",
                "required": ["checkpoint_id"],
                "properties": {
                    "checkpoint_id": {"type": "integer", "description": "Id returned by create_checkpoint."}
                }
            }),
            store.clone(),
            |store, input| {
                let input: RestoreCheckpointInput = parse_input("restore_checkpoint", input)?;
                let checkpoint = store.restore_checkpoint(input.checkpoint_id)?;
                Ok(format!(
                    "Restored checkpoint {}: {}",
                    checkpoint.id, checkpoint.name
                ))
            },
        ),
        project_tool(
            "list_checkpoints",
            "List project checkpoints, newest first.",
            json!({"type": "object", "properties": {}}),
            store,
            |store, _| Ok(serde_json::to_string(&store.list_checkpoints()?)?),
        ),
    ]
}

fn project_tool<F>(
    name: &str,
    description: &str,
    input_schema: Value,
    store: Option<Arc<dyn ProjectStore>>,
    run: F,
) -> Tool
where
    F: Fn(&dyn ProjectStore, &Value) -> Result<String> + Send + Sync + 'static,
{
    Tool::new(name, description, input_schema, move |input| match &store {
        Some(store) => run(store.as_ref(), input),
        None => Err(anyhow!("project store not initialized")),
    })
}
