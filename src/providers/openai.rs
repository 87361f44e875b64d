use anyhow::{anyhow, Result};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::debug;

use super::{
    base::{LlmResponse, Provider, REQUEST_TIMEOUT},
    configs::openai::OpenAiProviderConfig,
    types::{message::Message, tool::Tool},
    utils::{
        check_openai_context_length_error, messages_to_openai_spec,
        openai_response_to_llm_response, tools_to_openai_spec, vendor_error_message,
    },
};

pub const OPENAI_MODELS: &[&str] = &["gpt-4o", "gpt-4", "gpt-4-turbo", "gpt-3.5-turbo"];

pub struct OpenAiProvider {
    client: Client,
    config: OpenAiProviderConfig,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self { client, config })
    }

    /// Error bodies are returned as values so the context-length check can inspect them.
    fn post(&self, payload: Value) -> Result<Value> {
        let url = format!(
            "{}/v1/chat/completions",
            self.config.host.trim_end_matches('/')
        );
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&payload)
            .send()?;

        match response.status() {
            StatusCode::OK => Ok(response.json()?),
            StatusCode::BAD_REQUEST => {
                let body = response.text().unwrap_or_default();
                match serde_json::from_str::<Value>(&body) {
                    Ok(value) if value.get("error").is_some() => Ok(value),
                    _ => Err(anyhow!("Request failed: 400 Bad Request - {}", body.trim())),
                }
            }
            status if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() >= 500 => {
                let body = response.text().unwrap_or_default();
                Err(anyhow!(
                    "Server error: {} - {}",
                    status,
                    vendor_error_message(&body)
                ))
            }
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

impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        "OpenAI"
    }

    fn available_models(&self) -> Vec<String> {
        OPENAI_MODELS.iter().map(|m| m.to_string()).collect()
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn send(&self, messages: &[Message], tools: &[Tool]) -> Result<LlmResponse> {
        let tools_spec = tools_to_openai_spec(tools)?;

        let mut payload = json!({
            "model": self.config.model,
            "messages": messages_to_openai_spec(messages),
        });

        if !tools_spec.is_empty() {
            payload["tools"] = json!(tools_spec);
        }
        if let Some(tokens) = self.config.max_tokens {
            payload["max_tokens"] = json!(tokens);
        }

        debug!(model = %self.config.model, messages = messages.len(), "sending OpenAI request");
        let response = self.post(payload)?;

        // Check for context length error if single message
        if let Some(error) = response.get("error") {
            if messages.len() == 1 {
                if let Some(err) = check_openai_context_length_error(error) {
                    return Err(err.into());
                }
            }
            return Err(anyhow!("OpenAI API error: {}", error));
        }

        openai_response_to_llm_response(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::base::Usage;
    use crate::providers::types::content::Content;
    use mockito::Matcher;

    fn provider_for(server: &mockito::Server) -> Result<OpenAiProvider> {
        OpenAiProvider::new(OpenAiProviderConfig::new(
            server.url(),
            "test_key".to_string(),
            "gpt-4o".to_string(),
            None,
        ))
    }

    #[test]
    fn test_send_with_tools() -> Result<()> {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer test_key")
            .match_body(Matcher::PartialJson(json!({
                "model": "gpt-4o",
                "tools": [{"type": "function", "function": {"name": "read_file"}}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "choices": [{
                        "finish_reason": "tool_calls",
                        "message": {
                            "role": "assistant",
                            "content": null,
                            "tool_calls": [{
                                "id": "call_abc",
                                "type": "function",
                                "function": {"name": "read_file", "arguments": "{\"path\":\"main.go\"}"}
                            }]
                        }
                    }],
                    "usage": {"prompt_tokens": 3, "completion_tokens": 4, "total_tokens": 7}
                })
                .to_string(),
            )
            .create();

        let tool = Tool::new(
            "read_file",
            "Read a file",
            json!({"type": "object", "properties": {"path": {"type": "string"}}}),
            |_| Ok(String::new()),
        );
        let provider = provider_for(&server)?;
        let response = provider.send(&[Message::user("read main.go")], &[tool])?;
        mock.assert();

        assert_eq!(
            response.content,
            vec![Content::tool_use("call_abc", "read_file", json!({"path": "main.go"}))]
        );
        assert_eq!(response.usage, Some(Usage::new(Some(3), Some(4), Some(7))));
        Ok(())
    }

    #[test]
    fn test_context_length_error() -> Result<()> {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(400)
            .with_body(
                json!({"error": {"code": "context_length_exceeded", "message": "too long"}})
                    .to_string(),
            )
            .create();

        let provider = provider_for(&server)?;
        let err = provider.send(&[Message::user("x")], &[]).unwrap_err();
        assert_eq!(err.to_string(), "Input message too long. Message: too long");
        Ok(())
    }

    #[test]
    fn test_server_error() -> Result<()> {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(503)
            .with_body("upstream unavailable")
            .create();

        let provider = provider_for(&server)?;
        let err = provider.send(&[Message::user("x")], &[]).unwrap_err();
        assert!(err.to_string().starts_with("Server error: 503"));
        assert!(err.to_string().contains("upstream unavailable"));
        Ok(())
    }

    #[test]
    fn test_descriptors() -> Result<()> {
        let server = mockito::Server::new();
        let provider = provider_for(&server)?;
        assert_eq!(provider.name(), "OpenAI");
        assert!(provider.available_models().contains(&"gpt-4".to_string()));
        Ok(())
    }
}
