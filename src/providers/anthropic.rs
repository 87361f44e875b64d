use anyhow::{anyhow, Result};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{
    base::{LlmResponse, Provider, Usage, REQUEST_TIMEOUT},
    configs::anthropic::AnthropicProviderConfig,
    types::{
        content::{Content, ToolResult},
        message::{Message, MessageContent, Role},
        objectid::synthesize_call_id,
        tool::Tool,
    },
    utils::vendor_error_message,
};

const ANTHROPIC_VERSION: &str = "2023-06-01";

pub const ANTHROPIC_MODELS: &[&str] = &[
    "claude-3-7-sonnet-latest",
    "claude-3-5-sonnet-latest",
    "claude-3-haiku-20240307",
];

pub struct AnthropicProvider {
    client: Client,
    config: AnthropicProviderConfig,
}

impl AnthropicProvider {
    pub fn new(config: AnthropicProviderConfig) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self { client, config })
    }

    fn get_usage(data: &Value) -> Option<Usage> {
        let usage = data.get("usage")?;
        let input_tokens = usage
            .get("input_tokens")
            .and_then(|v| v.as_i64())
            .map(|v| v as i32);
        let output_tokens = usage
            .get("output_tokens")
            .and_then(|v| v.as_i64())
            .map(|v| v as i32);
        Some(Usage::new(input_tokens, output_tokens, None))
    }

    fn post(&self, payload: Value) -> Result<Value> {
        let url = format!("{}/v1/messages", self.config.host.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&payload)
            .send()?;

        match response.status() {
            StatusCode::OK => Ok(response.json()?),
            status => {
                let body = response.text().unwrap_or_default();
                Err(anyhow!(
                    "Request failed: {} - {}",
                    status,
                    vendor_error_message(&body)
                ))
            }
        }
    }
}

/// Convert internal messages to the Messages API shape. Block order is kept verbatim.
pub fn messages_to_anthropic_spec(messages: &[Message]) -> Vec<Value> {
    let mut spec = Vec::new();

    for message in messages {
        let role = match message.role {
            Role::User => "user",
            Role::Assistant => "assistant",
        };

        let content = match &message.content {
            MessageContent::Text(text) => json!(text),
            MessageContent::Blocks(blocks) if blocks.is_empty() => {
                warn!(role, "skipping message with no content blocks");
                continue;
            }
            MessageContent::Blocks(blocks) => {
                Value::Array(blocks.iter().map(content_to_anthropic).collect())
            }
        };

        spec.push(json!({ "role": role, "content": content }));
    }

    spec
}

fn content_to_anthropic(content: &Content) -> Value {
    match content {
        Content::Text(text) => json!({ "type": "text", "text": text.text }),
        Content::ToolUse(tool_use) => json!({
            "type": "tool_use",
            "id": tool_use.id,
            "name": tool_use.name,
            "input": tool_use.input,
        }),
        Content::ToolResult(result) => json!({
            "type": "tool_result",
            "tool_use_id": result.tool_call_id,
            "content": result.content,
            "is_error": result.is_error,
        }),
    }
}

pub fn tools_to_anthropic_spec(tools: &[Tool]) -> Vec<Value> {
    tools
        .iter()
        .map(|tool| {
            json!({
                "name": tool.name,
                "description": tool.description,
                "input_schema": tool.input_schema,
            })
        })
        .collect()
}

/// Convert Messages API content blocks back into internal content.
/// Block kinds with no internal counterpart are dropped and logged.
pub fn content_from_anthropic(blocks: &[Value]) -> Vec<Content> {
    let mut content = Vec::new();

    for block in blocks {
        match block.get("type").and_then(|t| t.as_str()) {
            Some("text") => {
                let text = block["text"].as_str().unwrap_or_default();
                content.push(Content::text(text));
            }
            Some("tool_use") => {
                let id = match block.get("id").and_then(|id| id.as_str()) {
                    Some(id) if !id.is_empty() => id.to_string(),
                    _ => synthesize_call_id(),
                };
                let name = block["name"].as_str().unwrap_or_default();
                let input = block.get("input").cloned().unwrap_or_else(|| json!({}));
                content.push(Content::tool_use(id, name, input));
            }
            Some("tool_result") => {
                let tool_call_id = block["tool_use_id"].as_str().unwrap_or_default();
                let text = match &block["content"] {
                    Value::String(text) => text.clone(),
                    Value::Array(parts) => parts
                        .iter()
                        .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
                        .collect::<Vec<_>>()
                        .join("\n"),
                    _ => String::new(),
                };
                let result = if block["is_error"].as_bool().unwrap_or(false) {
                    ToolResult::error(tool_call_id, text)
                } else {
                    ToolResult::success(tool_call_id, text)
                };
                content.push(Content::ToolResult(result));
            }
            other => {
                warn!(block_type = ?other, "dropping unsupported Anthropic content block");
            }
        }
    }

    content
}

pub fn anthropic_response_to_llm_response(response: &Value) -> Result<LlmResponse> {
    let blocks = response
        .get("content")
        .and_then(|c| c.as_array())
        .ok_or_else(|| anyhow!("Invalid response format from Anthropic API: missing content"))?;

    let mut llm_response = LlmResponse::new(content_from_anthropic(blocks));
    llm_response.usage = AnthropicProvider::get_usage(response);
    llm_response.finish_reason = response
        .get("stop_reason")
        .and_then(|r| r.as_str())
        .map(String::from);

    Ok(llm_response)
}

impl Provider for AnthropicProvider {
    fn name(&self) -> &str {
        "Anthropic Claude"
    }

    fn available_models(&self) -> Vec<String> {
        ANTHROPIC_MODELS.iter().map(|m| m.to_string()).collect()
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn send(&self, messages: &[Message], tools: &[Tool]) -> Result<LlmResponse> {
        let mut payload = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "messages": messages_to_anthropic_spec(messages),
        });

        if !tools.is_empty() {
            payload["tools"] = json!(tools_to_anthropic_spec(tools));
        }

        debug!(model = %self.config.model, messages = messages.len(), "sending Anthropic request");
        let response = self.post(payload)?;

        if let Some(error) = response.get("error") {
            return Err(anyhow!("Anthropic API error: {}", error));
        }

        anthropic_response_to_llm_response(&response)
    }
}
