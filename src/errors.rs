use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{provider} request failed: {cause:#}")]
    Transport {
        provider: String,
        cause: anyhow::Error,
    },

    #[error("tool '{0}' not found")]
    ToolNotFound(String),

    /// Carries the tool's own failure text unchanged, it is what the model sees.
    #[error("{0}")]
    ToolExecution(String),

    #[error("Duplicate tool name: {0}")]
    DuplicateTool(String),

    #[error("Invalid tool name '{0}': use only letters, digits, '_' and '-'")]
    InvalidToolName(String),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Invalid conversation: {0}")]
    InvalidConversation(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AgentError {
    pub fn transport<S: Into<String>>(provider: S, cause: anyhow::Error) -> Self {
        AgentError::Transport {
            provider: provider.into(),
            cause,
        }
    }
}

pub type AgentResult<T> = Result<T, AgentError>;
