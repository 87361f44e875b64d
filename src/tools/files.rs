use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::parse_input;
use crate::providers::types::tool::Tool;

/// Directory names never descended into.
pub(crate) const SKIPPED_DIRS: &[&str] = &[".git", ".devenv"];

#[derive(Debug, Deserialize)]
struct ReadFileInput {
    path: String,
}

#[derive(Debug, Deserialize)]
struct ListFilesInput {
    #[serde(default)]
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EditFileInput {
    path: String,
    old_string: String,
    new_string: String,
}

pub fn read_file_tool() -> Tool {
    Tool::new(
        "read_file",
        "Read the contents of a given relative file path. Use this when you want to see what's inside a file. Do not use this with directory names.",
        json!({
            "type": "object",
            "required": ["path"],
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The relative path of a file in the working directory."
                }
            }
        }),
        read_file,
    )
}

pub fn list_files_tool() -> Tool {
    Tool::new(
        "list_files",
        "List files and directories at a given path. If no path is provided, lists files in the current directory.",
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Optional relative path to list files from. Defaults to current directory if not provided."
                }
            }
        }),
        list_files,
    )
}

pub fn edit_file_tool() -> Tool {
    Tool::new(
        "edit_file",
        "Make edits to a text file. Replaces every occurrence of 'old_string' with 'new_string' in the given file. \
        If the file does not exist and 'old_string' is empty, the file is created with 'new_string' as its content.",
        json!({
            "type": "object",
            "required": ["path", "old_string", "new_string"],
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The path to the file"
                },
                "old_string": {
                    "type": "string",
                    "description": "Text to search for, it must match exactly"
                },
                "new_string": {
                    "type": "string",
                    "description": "Text to replace old_string with"
                }
            }
        }),
        edit_file,
    )
}

fn read_file(input: &Value) -> Result<String> {
    let input: ReadFileInput = parse_input("read_file", input)?;
    fs::read_to_string(&input.path).with_context(|| format!("Failed to read {}", input.path))
}

fn list_files(input: &Value) -> Result<String> {
    let input: ListFilesInput = parse_input("list_files", input)?;
    let dir = input
        .path
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| ".".to_string());

    let mut listed: Vec<String> = walk(Path::new(&dir))?
        .into_iter()
        .map(|entry| {
            if entry.is_dir {
                format!("{}/", entry.relative)
            } else {
                entry.relative
            }
        })
        .collect();
    listed.sort();

    debug!(dir = %dir, entries = listed.len(), "listed files");
    Ok(serde_json::to_string(&listed)?)
}

fn edit_file(input: &Value) -> Result<String> {
    let input: EditFileInput = parse_input("edit_file", input)?;
    if input.old_string == input.new_string {
        bail!("old_string and new_string must be different");
    }

    let path = Path::new(&input.path);
    if !path.exists() {
        if !input.old_string.is_empty() {
            bail!("File not found: {}", input.path);
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(path, &input.new_string)
            .with_context(|| format!("Failed to create {}", input.path))?;
        return Ok(format!("Created {}", input.path));
    }

    if input.old_string.is_empty() {
        bail!("old_string must not be empty when editing an existing file");
    }

    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", input.path))?;
    let occurrences = content.matches(&input.old_string).count();
    if occurrences == 0 {
        bail!("old_string not found in {}", input.path);
    }

    let updated = content.replace(&input.old_string, &input.new_string);
    fs::write(path, updated).with_context(|| format!("Failed to write {}", input.path))?;
    Ok(format!(
        "Replaced {} occurrence(s) in {}",
        occurrences, input.path
    ))
}

pub(crate) struct WalkEntry {
    pub relative: String,
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Every entry under `root`, depth first, skipping [`SKIPPED_DIRS`].
/// Symlinked directories are reported as files and not followed.
pub(crate) fn walk(root: &Path) -> Result<Vec<WalkEntry>> {
    if !root.is_dir() {
        bail!("Not a directory: {}", root.display());
    }
    let mut entries = Vec::new();
    walk_into(root, root, &mut entries)?;
    Ok(entries)
}

fn walk_into(root: &Path, dir: &Path, out: &mut Vec<WalkEntry>) -> Result<()> {
    let read = fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))?;
    for entry in read {
        let entry = entry?;
        let is_dir = entry.file_type()?.is_dir();
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if is_dir && SKIPPED_DIRS.iter().any(|skip| *skip == name) {
            continue;
        }

        let path = entry.path();
        let relative = path
            .strip_prefix(root)
            .unwrap_or(path.as_path())
            .to_string_lossy()
            .replace('\\', "/");
        out.push(WalkEntry {
            relative,
            path: path.clone(),
            is_dir,
        });
        if is_dir {
            walk_into(root, &path, out)?;
        }
    }
    Ok(())
}
