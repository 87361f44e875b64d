use tracing::{debug, warn};

use crate::errors::{AgentError, AgentResult};
use crate::prompt::Prompt;
use crate::providers::base::{LlmResponse, Provider};
use crate::providers::types::content::{Content, ToolResult, ToolUse};
use crate::providers::types::message::{Conversation, Message, Role};
use crate::tools::ToolRegistry;

/// Drives one user turn: send, dispatch requested tools once, send the results back.
pub struct Agent {
    provider: Box<dyn Provider>,
    registry: ToolRegistry,
}

impl Agent {
    pub fn new(provider: Box<dyn Provider>, registry: ToolRegistry) -> Self {
        Self { provider, registry }
    }

    pub fn provider(&self) -> &dyn Provider {
        self.provider.as_ref()
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Run one tool call. Failures become error results for the model to see.
    pub fn dispatch_tool_call(&self, tool_use: &ToolUse) -> ToolResult {
        match self.registry.invoke(&tool_use.name, &tool_use.input) {
            Ok(output) => ToolResult::success(&tool_use.id, output),
            Err(err) => {
                warn!(tool = %tool_use.name, id = %tool_use.id, "tool call failed: {}", err);
                ToolResult::error(&tool_use.id, err.to_string())
            }
        }
    }

    fn send(&self, conversation: &Conversation) -> AgentResult<LlmResponse> {
        if let Some(last) = conversation.last() {
            debug!(
                messages = conversation.len(),
                last = %last.summary(),
                "sending conversation"
            );
        }
        let response = self
            .provider
            .send(conversation.messages(), self.registry.tools())
            .map_err(|cause| AgentError::transport(self.provider.name(), cause))?;

        if let Some(usage) = &response.usage {
            debug!(
                prompt = ?usage.prompt_tokens,
                completion = ?usage.completion_tokens,
                total = ?usage.total_tokens,
                finish_reason = ?response.finish_reason,
                tool_use = response.has_tool_use(),
                "response received"
            );
        }
        Ok(response)
    }

    /// Handle one user turn. Any provider error is returned as
    /// [`AgentError::Transport`] and ends the run; tool failures do not.
    pub fn reply(
        &self,
        conversation: &mut Conversation,
        text: &str,
        prompt: &mut dyn Prompt,
    ) -> AgentResult<()> {
        conversation.push(Message::user(text))?;
        let response = self.send(conversation)?;
        let content = assistant_content(response.content);

        let mut results = Vec::new();
        for block in &content {
            match block {
                Content::Text(text) => self.render_text(prompt, &text.text)?,
                Content::ToolUse(tool_use) => {
                    prompt.render_tool_use(tool_use)?;
                    let result = self.dispatch_tool_call(tool_use);
                    prompt.render_tool_result(&result)?;
                    results.push(result);
                }
                Content::ToolResult(_) => {}
            }
        }

        // the tool-bearing message must precede its results
        conversation.push(Message::new(Role::Assistant, content)?)?;
        if results.is_empty() {
            return Ok(());
        }

        debug!(results = results.len(), "sending tool results");
        conversation.push(Message::tool_results(results)?)?;
        let followup = self.send(conversation)?;
        let content = assistant_content(followup.content);

        for block in &content {
            match block {
                Content::Text(text) => self.render_text(prompt, &text.text)?,
                Content::ToolUse(tool_use) => {
                    warn!(
                        tool = %tool_use.name,
                        id = %tool_use.id,
                        "tool call in follow-up response not dispatched"
                    );
                }
                Content::ToolResult(_) => {}
            }
        }

        conversation.push(Message::new(Role::Assistant, content)?)?;
        Ok(())
    }

    fn render_text(&self, prompt: &mut dyn Prompt, text: &str) -> AgentResult<()> {
        if !text.trim().is_empty() {
            prompt.render_text(self.provider.name(), text)?;
        }
        Ok(())
    }
}

/// Models never legitimately answer with tool results; drop any that appear.
fn assistant_content(content: Vec<Content>) -> Vec<Content> {
    content
        .into_iter()
        .filter(|block| {
            let keep = !matches!(block, Content::ToolResult(_));
            if !keep {
                warn!("dropping tool result block from model response");
            }
            keep
        })
        .collect()
}
