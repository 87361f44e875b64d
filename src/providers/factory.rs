use clap::ValueEnum;
use std::env;
use std::fmt;
use std::str::FromStr;
use tracing::info;

use super::{
    anthropic::AnthropicProvider,
    base::Provider,
    configs::{
        anthropic::AnthropicProviderConfig, base::ProviderConfig, gemini::GeminiProviderConfig,
        openai::OpenAiProviderConfig,
    },
    gemini::GeminiProvider,
    openai::OpenAiProvider,
};
use crate::errors::{AgentError, AgentResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProviderType {
    Anthropic,
    #[value(name = "openai")]
    OpenAi,
    Gemini,
}

impl ProviderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderType::Anthropic => "anthropic",
            ProviderType::OpenAi => "openai",
            ProviderType::Gemini => "gemini",
        }
    }

    pub fn api_key_var(&self) -> &'static str {
        match self {
            ProviderType::Anthropic => "ANTHROPIC_API_KEY",
            ProviderType::OpenAi => "OPENAI_API_KEY",
            ProviderType::Gemini => "GEMINI_API_KEY",
        }
    }

    pub fn host_var(&self) -> &'static str {
        match self {
            ProviderType::Anthropic => "ANTHROPIC_HOST",
            ProviderType::OpenAi => "OPENAI_HOST",
            ProviderType::Gemini => "GEMINI_HOST",
        }
    }

    /// `LLM_PROVIDER`, defaulting to Anthropic.
    pub fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> AgentResult<Self> {
        match lookup("LLM_PROVIDER").filter(|value| !value.trim().is_empty()) {
            Some(value) => value.parse(),
            None => Ok(ProviderType::Anthropic),
        }
    }

    pub fn from_env() -> AgentResult<Self> {
        Self::from_lookup(&|key| env::var(key).ok())
    }
}

impl FromStr for ProviderType {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" => Ok(ProviderType::Anthropic),
            "openai" => Ok(ProviderType::OpenAi),
            "gemini" => Ok(ProviderType::Gemini),
            other => Err(AgentError::Configuration(format!(
                "unsupported provider: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Command-line values that take precedence over the environment.
#[derive(Debug, Clone, Default)]
pub struct ProviderOverrides {
    pub model: Option<String>,
    pub api_key: Option<String>,
}

/// Resolve the adapter once at startup from the process environment.
pub fn get_provider(
    provider_type: ProviderType,
    overrides: &ProviderOverrides,
) -> AgentResult<Box<dyn Provider>> {
    get_provider_with_lookup(provider_type, overrides, &|key| env::var(key).ok())
}

pub fn get_provider_with_lookup(
    provider_type: ProviderType,
    overrides: &ProviderOverrides,
    env_lookup: &dyn Fn(&str) -> Option<String>,
) -> AgentResult<Box<dyn Provider>> {
    let api_key_var = provider_type.api_key_var();
    let lookup = |key: &str| -> Option<String> {
        let overridden = match key {
            "LLM_MODEL" => overrides.model.clone(),
            k if k == api_key_var => overrides.api_key.clone(),
            _ => None,
        };
        overridden.or_else(|| env_lookup(key))
    };

    let provider: Box<dyn Provider> = match provider_type {
        ProviderType::Anthropic => {
            let config = AnthropicProviderConfig::from_lookup(&lookup).map_err(configuration)?;
            Box::new(AnthropicProvider::new(config).map_err(configuration)?)
        }
        ProviderType::OpenAi => {
            let config = OpenAiProviderConfig::from_lookup(&lookup).map_err(configuration)?;
            Box::new(OpenAiProvider::new(config).map_err(configuration)?)
        }
        ProviderType::Gemini => {
            let config = GeminiProviderConfig::from_lookup(&lookup).map_err(configuration)?;
            Box::new(GeminiProvider::new(config).map_err(configuration)?)
        }
    };

    info!(provider = provider.name(), model = provider.model(), "provider selected");
    Ok(provider)
}

fn configuration(err: anyhow::Error) -> AgentError {
    AgentError::Configuration(format!("{:#}", err))
}
