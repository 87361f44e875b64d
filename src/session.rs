use std::path::PathBuf;
use tracing::{debug, warn};

use crate::agent::Agent;
use crate::errors::AgentResult;
use crate::prompt::{InputType, Prompt};
use crate::providers::types::message::Conversation;

pub mod session_file;

use session_file::persist_messages;

/// The interactive loop: read a line, hand it to the agent, repeat until input ends.
pub struct Session<'a> {
    agent: Agent,
    prompt: Box<dyn Prompt + 'a>,
    conversation: Conversation,
    transcript: Option<PathBuf>,
}

impl<'a> Session<'a> {
    pub fn new(agent: Agent, prompt: Box<dyn Prompt + 'a>) -> Self {
        Session {
            agent,
            prompt,
            conversation: Conversation::new(),
            transcript: None,
        }
    }

    pub fn with_transcript(mut self, path: PathBuf) -> Self {
        self.transcript = Some(path);
        self
    }

    /// Continue from an earlier conversation instead of starting empty.
    pub fn with_conversation(mut self, conversation: Conversation) -> Self {
        self.conversation = conversation;
        self
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn start(&mut self) -> AgentResult<()> {
        let outcome = self.run();
        self.prompt.close()?;
        outcome
    }

    fn run(&mut self) -> AgentResult<()> {
        let provider = self.agent.provider();
        self.prompt.ready(provider.name(), provider.model())?;

        loop {
            let input = self.prompt.get_input()?;
            match input.input_type {
                InputType::Message => {
                    if let Some(content) = &input.content {
                        self.agent
                            .reply(&mut self.conversation, content, self.prompt.as_mut())?;
                        self.persist();
                    }
                }
                InputType::Exit => break,
                InputType::AskAgain => continue,
            }
        }
        debug!(messages = self.conversation.len(), "session ended");
        Ok(())
    }

    fn persist(&self) {
        if let Some(path) = &self.transcript {
            persist_messages(path, self.conversation.messages()).unwrap_or_else(|e| {
                warn!(path = %path.display(), "Failed to persist messages: {:#}", e)
            });
        }
    }
}
