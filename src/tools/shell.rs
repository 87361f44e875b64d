use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use std::process::Command;
use tracing::debug;

use super::parse_input;
use crate::providers::types::tool::Tool;

#[derive(Debug, Deserialize)]
struct BashInput {
    command: String,
}

pub fn bash_tool() -> Tool {
    Tool::new(
        "bash",
        "Execute a bash command. Use this when you need to run shell commands. \
        Returns the combined stdout and stderr of the command.",
        json!({
            "type": "object",
            "required": ["command"],
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The bash command to execute."
                }
            }
        }),
        bash,
    )
}

fn bash(input: &Value) -> Result<String> {
    let input: BashInput = parse_input("bash", input)?;
    if input.command.trim().is_empty() {
        bail!("command must not be empty");
    }

    debug!(command = %input.command, "running bash");
    // stderr is folded into stdout so output keeps its interleaving
    let output = Command::new("bash")
        .arg("-c")
        .arg(format!("exec 2>&1\n{}", input.command))
        .output()
        .context("Failed to execute bash")?;

    let combined = String::from_utf8_lossy(&output.stdout).to_string();
    if !output.status.success() {
        bail!("Command failed with {}: {}", output.status, combined);
    }
    Ok(combined)
}
