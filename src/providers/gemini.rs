use anyhow::{anyhow, Result};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use tracing::{debug, warn};

use super::{
    base::{LlmResponse, Provider, Usage, REQUEST_TIMEOUT},
    configs::gemini::GeminiProviderConfig,
    types::{
        content::{Content, ToolResult},
        message::{Message, Role},
        objectid::synthesize_call_id,
        tool::Tool,
    },
    utils::vendor_error_message,
};

pub const GEMINI_MODELS: &[&str] = &["gemini-1.5-pro", "gemini-1.5-flash", "gemini-1.0-pro"];

/// JSON-Schema keywords outside the OpenAPI subset that function declarations accept.
const UNSUPPORTED_SCHEMA_KEYS: &[&str] = &["additionalProperties", "$schema", "default", "examples"];

pub struct GeminiProvider {
    client: Client,
    config: GeminiProviderConfig,
}

impl GeminiProvider {
    pub fn new(config: GeminiProviderConfig) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self { client, config })
    }

    fn post(&self, payload: Value) -> Result<Value> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.host.trim_end_matches('/'),
            self.config.model
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
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

/// Convert internal messages to `contents`. Function responses are keyed by
/// name on this wire, so the name is recovered from the originating tool use.
pub fn messages_to_gemini_spec(messages: &[Message]) -> Vec<Value> {
    let names: HashMap<&str, &str> = messages
        .iter()
        .flat_map(|message| message.tool_uses())
        .map(|tool_use| (tool_use.id.as_str(), tool_use.name.as_str()))
        .collect();

    let mut contents = Vec::new();
    for message in messages {
        let role = match message.role {
            Role::User => "user",
            Role::Assistant => "model",
        };

        let parts: Vec<Value> = message
            .blocks()
            .iter()
            .map(|block| match block {
                Content::Text(text) => json!({ "text": text.text }),
                Content::ToolUse(tool_use) => json!({
                    "functionCall": {
                        "id": tool_use.id,
                        "name": tool_use.name,
                        "args": tool_use.input,
                    }
                }),
                Content::ToolResult(result) => {
                    let name = match names.get(result.tool_call_id.as_str()) {
                        Some(name) => name.to_string(),
                        None => {
                            warn!(id = %result.tool_call_id, "no tool use found for function response name");
                            result.tool_call_id.clone()
                        }
                    };
                    let response = if result.is_error {
                        json!({ "error": result.content })
                    } else {
                        json!({ "result": result.content })
                    };
                    json!({
                        "functionResponse": {
                            "id": result.tool_call_id,
                            "name": name,
                            "response": response,
                        }
                    })
                }
            })
            .collect();

        if parts.is_empty() {
            warn!(role, "skipping message with no parts");
            continue;
        }

        contents.push(json!({ "role": role, "parts": parts }));
    }

    contents
}

/// A single tool entry holding every function declaration.
pub fn tools_to_gemini_spec(tools: &[Tool]) -> Vec<Value> {
    if tools.is_empty() {
        return vec![];
    }

    let declarations: Vec<Value> = tools
        .iter()
        .map(|tool| {
            let mut declaration = json!({
                "name": tool.name,
                "description": tool.description,
            });
            if has_properties(&tool.input_schema) {
                declaration["parameters"] = sanitize_schema(&tool.name, &tool.input_schema);
            } else {
                debug!(tool = %tool.name, "omitting empty parameter schema");
            }
            declaration
        })
        .collect();

    vec![json!({ "functionDeclarations": declarations })]
}

fn has_properties(schema: &Value) -> bool {
    schema
        .get("properties")
        .and_then(|p| p.as_object())
        .map(|p| !p.is_empty())
        .unwrap_or(false)
}

/// Strip keywords the function-declaration schema rejects. Property names are
/// never stripped, only schema keywords.
///
/// Declarations reject an object schema with no `properties`, which is what a
/// free-form map becomes once `additionalProperties` is gone. Such properties
/// are degraded to a JSON-encoded string.
pub fn sanitize_schema(tool: &str, schema: &Value) -> Value {
    match schema {
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, value) in map {
                if UNSUPPORTED_SCHEMA_KEYS.contains(&key.as_str()) {
                    debug!(tool, keyword = %key, "dropping unsupported schema keyword");
                    continue;
                }
                let value = match (key.as_str(), value) {
                    ("properties", Value::Object(properties)) => Value::Object(
                        properties
                            .iter()
                            .map(|(name, property)| {
                                (name.clone(), sanitize_property(tool, name, property))
                            })
                            .collect(),
                    ),
                    ("items", items) => sanitize_property(tool, "items", items),
                    _ => sanitize_schema(tool, value),
                };
                out.insert(key.clone(), value);
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| sanitize_schema(tool, item))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn sanitize_property(tool: &str, name: &str, property: &Value) -> Value {
    let sanitized = sanitize_schema(tool, property);
    let is_object = sanitized.get("type").and_then(|t| t.as_str()) == Some("object");
    if !is_object || has_properties(&sanitized) {
        return sanitized;
    }

    warn!(tool, property = name, "object without properties sent as a JSON-encoded string");
    let description = match sanitized.get("description").and_then(|d| d.as_str()) {
        Some(description) => format!("{} JSON-encoded object.", description),
        None => "JSON-encoded object.".to_string(),
    };
    json!({ "type": "string", "description": description })
}

/// Convert response parts back into internal content, synthesizing ids for
/// function calls that arrive without one.
pub fn parts_to_content(parts: &[Value]) -> Vec<Content> {
    let mut content = Vec::new();

    for part in parts {
        if let Some(text) = part.get("text").and_then(|t| t.as_str()) {
            if text.is_empty() {
                debug!("dropping empty Gemini text part");
            } else {
                content.push(Content::text(text));
            }
        } else if let Some(call) = part.get("functionCall") {
            let id = match call.get("id").and_then(|id| id.as_str()) {
                Some(id) if !id.is_empty() => id.to_string(),
                _ => synthesize_call_id(),
            };
            let name = call["name"].as_str().unwrap_or_default();
            let args = call.get("args").cloned().unwrap_or_else(|| json!({}));
            content.push(Content::tool_use(id, name, args));
        } else if let Some(response) = part.get("functionResponse") {
            let id = response["id"].as_str().unwrap_or_default();
            let body = &response["response"];
            let result = match body.get("error") {
                Some(error) => ToolResult::error(id, value_to_text(error)),
                None => ToolResult::success(id, value_to_text(&body["result"])),
            };
            content.push(Content::ToolResult(result));
        } else {
            warn!(part = %part, "dropping unsupported Gemini part");
        }
    }

    content
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn get_usage(response: &Value) -> Option<Usage> {
    let usage = response.get("usageMetadata")?;
    let count = |key: &str| usage.get(key).and_then(|v| v.as_i64()).map(|v| v as i32);
    Some(Usage::new(
        count("promptTokenCount"),
        count("candidatesTokenCount"),
        count("totalTokenCount"),
    ))
}

pub fn gemini_response_to_llm_response(response: &Value) -> Result<LlmResponse> {
    let candidate = response
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .ok_or_else(|| anyhow!("No candidates in Gemini response"))?;

    let parts = candidate["content"]["parts"]
        .as_array()
        .map(|parts| parts.as_slice())
        .unwrap_or_default();

    let mut llm_response = LlmResponse::new(parts_to_content(parts));
    llm_response.usage = get_usage(response);
    llm_response.finish_reason = candidate
        .get("finishReason")
        .and_then(|r| r.as_str())
        .map(String::from);

    Ok(llm_response)
}

impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        "Google Gemini"
    }

    fn available_models(&self) -> Vec<String> {
        GEMINI_MODELS.iter().map(|m| m.to_string()).collect()
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn send(&self, messages: &[Message], tools: &[Tool]) -> Result<LlmResponse> {
        let mut payload = json!({
            "contents": messages_to_gemini_spec(messages),
        });

        let tools_spec = tools_to_gemini_spec(tools);
        if !tools_spec.is_empty() {
            payload["tools"] = json!(tools_spec);
        }
        if let Some(max_tokens) = self.config.max_tokens {
            payload["generationConfig"] = json!({ "maxOutputTokens": max_tokens });
        }

        debug!(model = %self.config.model, messages = messages.len(), "sending Gemini request");
        let response = self.post(payload)?;

        if let Some(error) = response.get("error") {
            return Err(anyhow!("Gemini API error: {}", error));
        }

        gemini_response_to_llm_response(&response)
    }
}
