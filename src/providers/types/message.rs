use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::content::{Content, ToolResult, ToolUse};
use crate::errors::{AgentError, AgentResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Either a plain string or an ordered block sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<Content>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
}

impl Message {
    pub fn new(role: Role, content: Vec<Content>) -> AgentResult<Self> {
        let msg = Self {
            role,
            content: MessageContent::Blocks(content),
        };
        msg.validate()?;
        Ok(msg)
    }

    pub fn user<S: Into<String>>(text: S) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn assistant<S: Into<String>>(text: S) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::Text(text.into()),
        }
    }

    /// The synthetic user turn that carries tool outcomes back to the model.
    pub fn tool_results(results: Vec<ToolResult>) -> AgentResult<Self> {
        Self::new(
            Role::User,
            results.into_iter().map(Content::ToolResult).collect(),
        )
    }

    pub(crate) fn validate(&self) -> AgentResult<()> {
        match self.role {
            Role::User => {
                if self.has_tool_use() {
                    return Err(AgentError::InvalidMessage(
                        "User message does not support ToolUse".into(),
                    ));
                }
            }
            Role::Assistant => {
                if self.has_tool_result() {
                    return Err(AgentError::InvalidMessage(
                        "Assistant message does not support ToolResult".into(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Blocks in order; a plain-text message reads as a single text block.
    pub fn blocks(&self) -> Vec<Content> {
        match &self.content {
            MessageContent::Text(text) => vec![Content::text(text.clone())],
            MessageContent::Blocks(blocks) => blocks.clone(),
        }
    }

    fn block_slice(&self) -> &[Content] {
        match &self.content {
            MessageContent::Text(_) => &[],
            MessageContent::Blocks(blocks) => blocks,
        }
    }

    pub fn text(&self) -> String {
        match &self.content {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .filter_map(|content| content.as_text())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    pub fn tool_uses(&self) -> Vec<&ToolUse> {
        self.block_slice()
            .iter()
            .filter_map(|content| content.as_tool_use())
            .collect()
    }

    pub fn tool_result_blocks(&self) -> Vec<&ToolResult> {
        self.block_slice()
            .iter()
            .filter_map(|content| content.as_tool_result())
            .collect()
    }

    fn has_tool_use(&self) -> bool {
        self.block_slice()
            .iter()
            .any(|c| matches!(c, Content::ToolUse(_)))
    }

    fn has_tool_result(&self) -> bool {
        self.block_slice()
            .iter()
            .any(|c| matches!(c, Content::ToolResult(_)))
    }

    pub fn summary(&self) -> String {
        let content_summaries: Vec<String> = self.blocks().iter().map(|c| c.summary()).collect();
        format!("message:{:?}\n{}", self.role, content_summaries.join("\n"))
    }
}

/// Append-only history; the only state carried between loop iterations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a conversation, replaying the append checks on every message.
    pub fn from_messages(messages: Vec<Message>) -> AgentResult<Self> {
        let mut conversation = Self::new();
        for message in messages {
            conversation.push(message)?;
        }
        Ok(conversation)
    }

    /// Append a message. Tool results must answer tool uses issued by the
    /// immediately preceding assistant message.
    pub fn push(&mut self, message: Message) -> AgentResult<()> {
        message.validate()?;

        let results = message.tool_result_blocks();
        if !results.is_empty() {
            let issued: HashSet<&str> = match self.messages.last() {
                Some(previous) if previous.role == Role::Assistant => previous
                    .tool_uses()
                    .into_iter()
                    .map(|tool_use| tool_use.id.as_str())
                    .collect(),
                _ => {
                    return Err(AgentError::InvalidConversation(
                        "tool results must follow an assistant message".into(),
                    ))
                }
            };

            if let Some(orphan) = results
                .iter()
                .find(|result| !issued.contains(result.tool_call_id.as_str()))
            {
                return Err(AgentError::InvalidConversation(format!(
                    "tool result '{}' has no matching tool use",
                    orphan.tool_call_id
                )));
            }
        }

        self.messages.push(message);
        Ok(())
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
