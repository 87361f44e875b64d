use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::types::{content::Content, message::Message, tool::Tool};

/// Upper bound on one blocking round trip to a vendor.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: Option<i32>,
    pub completion_tokens: Option<i32>,
    pub total_tokens: Option<i32>,
}

impl Usage {
    /// A missing total is derived from the two counts when both are known.
    pub fn new(
        prompt_tokens: Option<i32>,
        completion_tokens: Option<i32>,
        total_tokens: Option<i32>,
    ) -> Self {
        let total_tokens = total_tokens.or(match (prompt_tokens, completion_tokens) {
            (Some(prompt), Some(completion)) => Some(prompt + completion),
            _ => None,
        });
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens,
        }
    }
}

/// One complete model reply in normalized form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LlmResponse {
    pub content: Vec<Content>,
    pub usage: Option<Usage>,
    pub finish_reason: Option<String>,
}

impl LlmResponse {
    pub fn new(content: Vec<Content>) -> Self {
        Self {
            content,
            ..Default::default()
        }
    }

    pub fn has_tool_use(&self) -> bool {
        self.content.iter().any(|c| matches!(c, Content::ToolUse(_)))
    }
}

/// Base trait for AI providers (Anthropic, Gemini, OpenAI)
pub trait Provider: Send + Sync {
    /// Display name used in banners and turn labels
    fn name(&self) -> &str;

    /// Models this backend is known to serve
    fn available_models(&self) -> Vec<String>;

    /// The model requests are sent to
    fn model(&self) -> &str;

    /// Send the whole conversation and tool catalogue, blocking until the vendor replies.
    fn send(&self, messages: &[Message], tools: &[Tool]) -> Result<LlmResponse>;
}
