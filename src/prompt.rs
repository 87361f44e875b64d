use std::io;

use crate::providers::types::content::{ToolResult, ToolUse};

pub mod stdio;

/// The terminal side of a session: where user turns come from and where the
/// turn-labeled transcript goes.
pub trait Prompt {
    fn get_input(&mut self) -> io::Result<Input>;

    /// Shown once before the first turn
    fn ready(&mut self, provider: &str, model: &str) -> io::Result<()>;

    fn render_text(&mut self, speaker: &str, text: &str) -> io::Result<()>;

    fn render_tool_use(&mut self, tool_use: &ToolUse) -> io::Result<()>;

    fn render_tool_result(&mut self, result: &ToolResult) -> io::Result<()>;

    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Input {
    pub input_type: InputType,
    pub content: Option<String>, // None unless the user sent a message
}

impl Input {
    pub fn message<S: Into<String>>(content: S) -> Self {
        Self {
            input_type: InputType::Message,
            content: Some(content.into()),
        }
    }

    pub fn ask_again() -> Self {
        Self {
            input_type: InputType::AskAgain,
            content: None,
        }
    }

    pub fn exit() -> Self {
        Self {
            input_type: InputType::Exit,
            content: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputType {
    AskAgain, // Blank line, nothing to send
    Message,  // User sent a message
    Exit,     // Input stream ended
}
