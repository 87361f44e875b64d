use anyhow::{anyhow, Context, Result};
use reqwest::blocking::Client;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::debug;

use super::parse_input;
use crate::providers::base::REQUEST_TIMEOUT;
use crate::providers::types::tool::Tool;

#[derive(Debug, Deserialize)]
struct ApiCallInput {
    url: String,
    #[serde(default = "default_method")]
    method: String,
    #[serde(default, deserialize_with = "headers")]
    headers: HashMap<String, String>,
    #[serde(default)]
    body: Option<String>,
}

fn default_method() -> String {
    "GET".to_string()
}

/// Headers arrive as an object, or as a JSON-encoded object from models whose
/// schemas cannot describe free-form maps.
fn headers<'de, D>(deserializer: D) -> std::result::Result<HashMap<String, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Headers {
        Map(HashMap<String, String>),
        Encoded(String),
    }

    match Option::<Headers>::deserialize(deserializer)? {
        None => Ok(HashMap::new()),
        Some(Headers::Map(map)) => Ok(map),
        Some(Headers::Encoded(text)) if text.trim().is_empty() => Ok(HashMap::new()),
        Some(Headers::Encoded(text)) => {
            serde_json::from_str(&text).map_err(serde::de::Error::custom)
        }
    }
}

pub fn api_call_tool() -> Tool {
    Tool::new(
        "api_call",
        "Make an HTTP request to a given URL. Supports GET, POST, PUT, DELETE, etc.",
        json!({
            "type": "object",
            "required": ["url", "method"],
            "properties": {
                "url": {
                    "type": "string",
                    "description": "The URL to send the request to."
                },
                "method": {
                    "type": "string",
                    "description": "The HTTP method, e.g. GET or POST."
                },
                "headers": {
                    "type": "object",
                    "description": "Optional request headers.",
                    "additionalProperties": {"type": "string"}
                },
                "body": {
                    "type": "string",
                    "description": "Optional request body."
                }
            }
        }),
        api_call,
    )
}

fn api_call(input: &Value) -> Result<String> {
    let input: ApiCallInput = parse_input("api_call", input)?;
    let method = Method::from_bytes(input.method.trim().to_uppercase().as_bytes())
        .map_err(|_| anyhow!("invalid HTTP method: {}", input.method))?;

    let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
    let mut request = client.request(method.clone(), &input.url);
    for (name, value) in &input.headers {
        request = request.header(name.as_str(), value.as_str());
    }
    if let Some(body) = input.body {
        request = request.body(body);
    }

    debug!(%method, url = %input.url, "api call");
    let response = request
        .send()
        .with_context(|| format!("{} {} failed", method, input.url))?;
    let status = response.status();
    let body = response.text()?;

    Ok(format!("Status: {}\nBody: {}", status, body))
}
