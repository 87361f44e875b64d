use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::providers::types::message::Message;

/// Rewrite the transcript as one JSON message per line.
pub fn persist_messages(session_file: &Path, messages: &[Message]) -> Result<()> {
    if let Some(parent) = session_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    // Create or truncate the file
    let file = File::create(session_file)
        .with_context(|| format!("Failed to create {}", session_file.display()))?;
    let mut writer = BufWriter::new(file);

    for message in messages {
        serde_json::to_writer(&mut writer, message)?;
        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(())
}

pub fn read_messages(session_file: &Path) -> Result<Vec<Message>> {
    let file = File::open(session_file)
        .with_context(|| format!("Failed to open session file {}", session_file.display()))?;

    let mut messages = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let message: Message = serde_json::from_str(&line).with_context(|| {
            format!(
                "Invalid message on line {} of {}",
                index + 1,
                session_file.display()
            )
        })?;
        messages.push(message);
    }
    Ok(messages)
}
