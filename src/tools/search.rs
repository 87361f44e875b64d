use anyhow::{bail, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

use super::files::walk;
use super::parse_input;
use crate::providers::types::tool::Tool;

#[derive(Debug, Deserialize)]
struct CodeSearchInput {
    query: String,
    #[serde(default)]
    path: Option<String>,
}

pub fn code_search_tool() -> Tool {
    Tool::new(
        "code_search",
        "Search for code patterns in the codebase. Use this when you need to find specific code or patterns. \
        Returns the relative paths of text files containing the query.",
        json!({
            "type": "object",
            "required": ["query"],
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The exact text to search for."
                },
                "path": {
                    "type": "string",
                    "description": "Optional directory to search in. Defaults to the current directory."
                }
            }
        }),
        code_search,
    )
}

fn code_search(input: &Value) -> Result<String> {
    let input: CodeSearchInput = parse_input("code_search", input)?;
    if input.query.is_empty() {
        bail!("query must not be empty");
    }
    let dir = input
        .path
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| ".".to_string());

    let mut matches: Vec<String> = walk(Path::new(&dir))?
        .into_iter()
        .filter(|entry| !entry.is_dir)
        // binary and unreadable files are not text, skip them
        .filter(|entry| {
            fs::read_to_string(&entry.path)
                .map(|content| content.contains(&input.query))
                .unwrap_or(false)
        })
        .map(|entry| entry.relative)
        .collect();
    matches.sort();

    Ok(serde_json::to_string(&matches)?)
}
