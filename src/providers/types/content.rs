use serde::{Deserialize, Serialize};
use serde_json::Value;

// Shared behaviour of every content block kind
pub trait ContentType {
    fn content_type(&self) -> &'static str;
    fn summary(&self) -> String;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub text: String,
}

impl ContentType for Text {
    fn content_type(&self) -> &'static str {
        "text"
    }

    fn summary(&self) -> String {
        format!("content:text\n{}", self.text)
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolUse {
    pub id: String,
    pub name: String,
    /// Passed to the tool untouched; the tool validates it.
    pub input: Value,
}

impl ContentType for ToolUse {
    fn content_type(&self) -> &'static str {
        "tool_use"
    }

    fn summary(&self) -> String {
        format!(
            "content:tool_use:{}:{}\ninput:{}",
            self.name,
            self.id,
            serde_json::to_string(&self.input).unwrap_or_default()
        )
    }
}

/// The outcome of running one [`ToolUse`], correlated by `tool_call_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_call_id: String,
    pub content: String,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolResult {
    pub fn success<I: Into<String>, C: Into<String>>(tool_call_id: I, content: C) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error<I: Into<String>, C: Into<String>>(tool_call_id: I, content: C) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
            is_error: true,
        }
    }
}

impl ContentType for ToolResult {
    fn content_type(&self) -> &'static str {
        "tool_result"
    }

    fn summary(&self) -> String {
        format!(
            "content:tool_result:{}:error={}\ncontent:{}",
            self.tool_call_id, self.is_error, self.content
        )
    }
}

/// One typed unit of message content. Block order inside a message is significant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Content {
    Text(Text),
    ToolUse(ToolUse),
    ToolResult(ToolResult),
}

impl Content {
    pub fn text<S: Into<String>>(text: S) -> Self {
        Content::Text(Text { text: text.into() })
    }

    pub fn tool_use<I: Into<String>, N: Into<String>>(id: I, name: N, input: Value) -> Self {
        Content::ToolUse(ToolUse {
            id: id.into(),
            name: name.into(),
            input,
        })
    }

    pub fn tool_result(result: ToolResult) -> Self {
        Content::ToolResult(result)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Content::Text(text) => Some(&text.text),
            _ => None,
        }
    }

    pub fn as_tool_use(&self) -> Option<&ToolUse> {
        match self {
            Content::ToolUse(tool_use) => Some(tool_use),
            _ => None,
        }
    }

    pub fn as_tool_result(&self) -> Option<&ToolResult> {
        match self {
            Content::ToolResult(tool_result) => Some(tool_result),
            _ => None,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Content::Text(t) => t.content_type(),
            Content::ToolUse(t) => t.content_type(),
            Content::ToolResult(t) => t.content_type(),
        }
    }

    pub fn summary(&self) -> String {
        match self {
            Content::Text(t) => t.summary(),
            Content::ToolUse(t) => t.summary(),
            Content::ToolResult(t) => t.summary(),
        }
    }
}
