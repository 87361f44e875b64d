use anyhow::{anyhow, Result};
use regex::Regex;
use serde_json::{json, Value};
use std::collections::HashSet;
use tracing::warn;

use super::base::{LlmResponse, Usage};
use super::types::{
    content::{Content, ToolResult},
    message::{Message, Role},
    objectid::synthesize_call_id,
    tool::Tool,
};

/// The chat wire format has no error flag on tool messages, so error results
/// carry this prefix. Decoding cannot tell it apart from a successful output
/// that happens to start with it: such output reads back as an error without
/// the prefix.
const TOOL_ERROR_PREFIX: &str = "Error: ";

/// Convert internal Message format to OpenAI's API message specification.
/// Each contiguous run of text/tool_use blocks becomes one message and each
/// tool result its own `tool` message. Within a run all text is joined into
/// `content` ahead of `tool_calls`, so text following a tool call moves before
/// it; this is logged.
pub fn messages_to_openai_spec(messages: &[Message]) -> Vec<Value> {
    let mut messages_spec = Vec::new();

    for message in messages {
        let role = match message.role {
            Role::User => "user",
            Role::Assistant => "assistant",
        };

        let mut texts: Vec<String> = Vec::new();
        let mut tool_calls: Vec<Value> = Vec::new();

        for content in message.blocks() {
            match content {
                Content::Text(text) => {
                    if !tool_calls.is_empty() {
                        warn!(role, "text after a tool call moved ahead of it for OpenAI");
                    }
                    texts.push(text.text)
                }
                Content::ToolUse(tool_use) => tool_calls.push(json!({
                    "id": tool_use.id,
                    "type": "function",
                    "function": {
                        "name": tool_use.name,
                        "arguments": tool_use.input.to_string(),
                    }
                })),
                Content::ToolResult(tool_result) => {
                    flush_run(&mut messages_spec, role, &mut texts, &mut tool_calls);
                    let content = if tool_result.is_error {
                        format!("{}{}", TOOL_ERROR_PREFIX, tool_result.content)
                    } else {
                        tool_result.content
                    };
                    messages_spec.push(json!({
                        "role": "tool",
                        "content": content,
                        "tool_call_id": tool_result.tool_call_id,
                    }));
                }
            }
        }
        flush_run(&mut messages_spec, role, &mut texts, &mut tool_calls);
    }

    messages_spec
}

fn flush_run(
    spec: &mut Vec<Value>,
    role: &str,
    texts: &mut Vec<String>,
    tool_calls: &mut Vec<Value>,
) {
    if texts.is_empty() && tool_calls.is_empty() {
        return;
    }

    let mut converted = json!({ "role": role });
    converted["content"] = if texts.is_empty() {
        Value::Null
    } else {
        json!(texts.join("\n"))
    };
    if !tool_calls.is_empty() {
        converted["tool_calls"] = Value::Array(std::mem::take(tool_calls));
    }
    texts.clear();
    spec.push(converted);
}

/// Convert internal Tool format to OpenAI's API tool specification
pub fn tools_to_openai_spec(tools: &[Tool]) -> Result<Vec<Value>> {
    let mut tool_names = HashSet::new();
    let mut result = Vec::new();

    for tool in tools {
        if !tool_names.insert(&tool.name) {
            return Err(anyhow!("Duplicate tool name: {}", tool.name));
        }

        let name = sanitize_function_name(&tool.name)?;
        if name != tool.name {
            warn!(tool = %tool.name, sanitized = %name, "tool name rewritten for OpenAI");
        }

        result.push(json!({
            "type": "function",
            "function": {
                "name": name,
                "description": tool.description,
                "parameters": tool.input_schema,
            }
        }));
    }

    Ok(result)
}

/// Convert one wire message (request or response shape) into internal content.
pub fn content_from_openai_message(message: &Value) -> Vec<Content> {
    let mut content = Vec::new();

    if message["role"] == "tool" {
        let id = message["tool_call_id"].as_str().unwrap_or_default();
        let text = message["content"].as_str().unwrap_or_default();
        let result = match text.strip_prefix(TOOL_ERROR_PREFIX) {
            Some(error) => ToolResult::error(id, error),
            None => ToolResult::success(id, text),
        };
        content.push(Content::ToolResult(result));
        return content;
    }

    if let Some(text) = message.get("content").and_then(|t| t.as_str()) {
        content.push(Content::text(text));
    }

    if let Some(tool_calls) = message.get("tool_calls").and_then(|t| t.as_array()) {
        for tool_call in tool_calls {
            let id = match tool_call["id"].as_str() {
                Some(id) if !id.is_empty() => id.to_string(),
                _ => synthesize_call_id(),
            };
            let function_name = tool_call["function"]["name"]
                .as_str()
                .unwrap_or_default()
                .to_string();
            let arguments = tool_call["function"]["arguments"]
                .as_str()
                .unwrap_or_default();

            // Unparseable arguments are passed through so the tool reports the problem.
            let input = match serde_json::from_str::<Value>(arguments) {
                Ok(params) => params,
                Err(_) => {
                    warn!(id = %id, "could not interpret tool call arguments as JSON");
                    Value::String(arguments.to_string())
                }
            };
            content.push(Content::tool_use(id, function_name, input));
        }
    }

    content
}

fn get_usage(data: &Value) -> Option<Usage> {
    let usage = data.get("usage")?;
    let count = |key: &str| usage.get(key).and_then(|v| v.as_i64()).map(|v| v as i32);
    Some(Usage::new(
        count("prompt_tokens"),
        count("completion_tokens"),
        count("total_tokens"),
    ))
}

/// Convert OpenAI's API response to the normalized response
pub fn openai_response_to_llm_response(response: &Value) -> Result<LlmResponse> {
    let choice = response
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .ok_or_else(|| anyhow!("No choices in OpenAI response"))?;

    let mut llm_response = LlmResponse::new(content_from_openai_message(&choice["message"]));
    llm_response.usage = get_usage(response);
    llm_response.finish_reason = choice
        .get("finish_reason")
        .and_then(|r| r.as_str())
        .map(String::from);

    Ok(llm_response)
}

pub fn sanitize_function_name(name: &str) -> Result<String> {
    let re = Regex::new(r"[^a-zA-Z0-9_-]")?;
    Ok(re.replace_all(name, "_").to_string())
}

/// The human-readable message inside a vendor error body, or the body itself.
pub fn vendor_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value["error"]["message"]
                .as_str()
                .map(String::from)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

#[derive(Debug, thiserror::Error)]
#[error("Input message too long. Message: {0}")]
pub struct InitialMessageTooLargeError(String);

pub fn check_openai_context_length_error(error: &Value) -> Option<InitialMessageTooLargeError> {
    let code = error.get("code")?.as_str()?;
    if code == "context_length_exceeded" || code == "string_above_max_length" {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown error")
            .to_string();
        Some(InitialMessageTooLargeError(message))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::types::message::Conversation;

    const OPENAI_TOOL_USE_RESPONSE: &str = r#"{
        "choices": [{
            "index": 0,
            "finish_reason": "tool_calls",
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "1",
                    "type": "function",
                    "function": {
                        "name": "example_fn",
                        "arguments": "{\"param\": \"value\"}"
                    }
                }]
            }
        }],
        "usage": {
            "prompt_tokens": 10,
            "completion_tokens": 25,
            "total_tokens": 35
        }
    }"#;

    fn noop_tool(name: &str) -> Tool {
        Tool::new(name, "A test tool", json!({"type": "object"}), |_| {
            Ok(String::new())
        })
    }

    #[test]
    fn test_messages_to_openai_spec() {
        let spec = messages_to_openai_spec(&[Message::user("Hello")]);

        assert_eq!(spec.len(), 1);
        assert_eq!(spec[0]["role"], "user");
        assert_eq!(spec[0]["content"], "Hello");
    }

    #[test]
    fn test_messages_to_openai_spec_complex() -> Result<()> {
        let mut conversation = Conversation::new();
        conversation.push(Message::assistant("Hello!"))?;
        conversation.push(Message::user("How are you?"))?;
        conversation.push(Message::new(
            Role::Assistant,
            vec![
                Content::text("Let me look."),
                Content::tool_use("1", "tool1", json!({"param1": "value1"})),
                Content::tool_use("2", "tool2", json!({})),
            ],
        )?)?;
        conversation.push(Message::tool_results(vec![
            ToolResult::success("1", "Result"),
            ToolResult::error("2", "boom"),
        ])?)?;

        let spec = messages_to_openai_spec(conversation.messages());

        assert_eq!(spec.len(), 5);
        assert_eq!(spec[0]["role"], "assistant");
        assert_eq!(spec[0]["content"], "Hello!");
        assert_eq!(spec[1]["role"], "user");
        assert_eq!(spec[2]["role"], "assistant");
        assert_eq!(spec[2]["tool_calls"][1]["id"], "2");
        assert_eq!(spec[3]["role"], "tool");
        assert_eq!(spec[3]["content"], "Result");
        assert_eq!(spec[3]["tool_call_id"], "1");
        assert_eq!(spec[4]["content"], "Error: boom");

        // and back again
        let assistant = content_from_openai_message(&spec[2]);
        assert_eq!(assistant, conversation.messages()[2].blocks());
        let results: Vec<Content> = spec[3..]
            .iter()
            .flat_map(content_from_openai_message)
            .collect();
        assert_eq!(results, conversation.messages()[3].blocks());
        Ok(())
    }

    #[test]
    fn test_text_after_tool_call_joins_content() -> Result<()> {
        let message = Message::new(
            Role::Assistant,
            vec![
                Content::text("A"),
                Content::tool_use("x", "list_files", json!({})),
                Content::text("B"),
            ],
        )?;

        let spec = messages_to_openai_spec(&[message]);
        assert_eq!(spec.len(), 1);
        assert_eq!(spec[0]["content"], "A\nB");
        assert_eq!(spec[0]["tool_calls"][0]["id"], "x");

        // the wire cannot interleave, so the text comes back first
        assert_eq!(
            content_from_openai_message(&spec[0]),
            vec![
                Content::text("A\nB"),
                Content::tool_use("x", "list_files", json!({})),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_error_prefix_in_successful_output() -> Result<()> {
        let results = Message::tool_results(vec![ToolResult::success("x", "Error: not really")])?;
        let spec = messages_to_openai_spec(&[results]);
        assert_eq!(spec[0]["content"], "Error: not really");
        assert_eq!(
            content_from_openai_message(&spec[0]),
            vec![Content::ToolResult(ToolResult::error("x", "not really"))]
        );
        Ok(())
    }

    #[test]
    fn test_tools_to_openai_spec() -> Result<()> {
        let spec = tools_to_openai_spec(&[noop_tool("test_tool")])?;

        assert_eq!(spec.len(), 1);
        assert_eq!(spec[0]["type"], "function");
        assert_eq!(spec[0]["function"]["name"], "test_tool");
        assert_eq!(spec[0]["function"]["parameters"]["type"], "object");
        Ok(())
    }

    #[test]
    fn test_tools_to_openai_spec_duplicate() {
        let result = tools_to_openai_spec(&[noop_tool("test_tool"), noop_tool("test_tool")]);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Duplicate tool name"));
    }

    #[test]
    fn test_tools_to_openai_spec_empty() -> Result<()> {
        assert!(tools_to_openai_spec(&[])?.is_empty());
        Ok(())
    }

    #[test]
    fn test_sanitize_function_name() -> Result<()> {
        assert_eq!(sanitize_function_name("hello-world")?, "hello-world");
        assert_eq!(sanitize_function_name("hello world")?, "hello_world");
        assert_eq!(sanitize_function_name("hello@world")?, "hello_world");
        Ok(())
    }

    #[test]
    fn test_openai_response_text() -> Result<()> {
        let response = json!({
            "choices": [{
                "finish_reason": "stop",
                "message": {"role": "assistant", "content": "Hello from John Cena!"}
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 25}
        });

        let llm_response = openai_response_to_llm_response(&response)?;
        assert_eq!(llm_response.content, vec![Content::text("Hello from John Cena!")]);
        assert_eq!(llm_response.finish_reason.as_deref(), Some("stop"));
        assert_eq!(llm_response.usage.and_then(|u| u.total_tokens), Some(35));
        Ok(())
    }

    #[test]
    fn test_openai_response_valid_tooluse() -> Result<()> {
        let response: Value = serde_json::from_str(OPENAI_TOOL_USE_RESPONSE)?;
        let llm_response = openai_response_to_llm_response(&response)?;

        assert_eq!(
            llm_response.content,
            vec![Content::tool_use("1", "example_fn", json!({"param": "value"}))]
        );
        Ok(())
    }

    #[test]
    fn test_openai_response_json_decode_error() -> Result<()> {
        let mut response: Value = serde_json::from_str(OPENAI_TOOL_USE_RESPONSE)?;
        response["choices"][0]["message"]["tool_calls"][0]["function"]["arguments"] =
            json!("invalid json {");
        response["choices"][0]["message"]["tool_calls"][0]["id"] = Value::Null;

        let llm_response = openai_response_to_llm_response(&response)?;
        let tool_use = llm_response.content[0].as_tool_use().cloned();
        let tool_use = tool_use.ok_or_else(|| anyhow!("expected tool use"))?;

        assert_eq!(tool_use.input, json!("invalid json {"));
        assert!(tool_use.id.starts_with("call_"));
        Ok(())
    }

    #[test]
    fn test_vendor_error_message() {
        let body = r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}"#;
        assert_eq!(vendor_error_message(body), "Incorrect API key provided");
        assert_eq!(vendor_error_message("  bad gateway \n"), "bad gateway");
    }

    #[test]
    fn test_check_openai_context_length_error() {
        let error = json!({
            "code": "context_length_exceeded",
            "message": "This message is too long"
        });

        let result = check_openai_context_length_error(&error);
        assert_eq!(
            result.map(|e| e.to_string()),
            Some("Input message too long. Message: This message is too long".to_string())
        );

        let error = json!({
            "code": "other_error",
            "message": "Some other error"
        });
        assert!(check_openai_context_length_error(&error).is_none());
    }
}
