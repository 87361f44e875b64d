use super::base::{max_tokens, ProviderConfig};
use anyhow::Result;

pub const ANTHROPIC_DEFAULT_HOST: &str = "https://api.anthropic.com";
pub const ANTHROPIC_DEFAULT_MODEL: &str = "claude-3-7-sonnet-latest";
pub const ANTHROPIC_DEFAULT_MAX_TOKENS: u32 = 1024;

#[derive(Debug, Clone)]
pub struct AnthropicProviderConfig {
    pub host: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
}

impl AnthropicProviderConfig {
    pub fn new(host: String, api_key: String, model: String, max_tokens: u32) -> Self {
        Self {
            host,
            api_key,
            model,
            max_tokens,
        }
    }
}

impl ProviderConfig for AnthropicProviderConfig {
    fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = Self::get_env(lookup, "ANTHROPIC_API_KEY", true, None)?
            .ok_or_else(|| anyhow::anyhow!("Anthropic API key should be present"))?;

        let host = Self::get_env(lookup, "ANTHROPIC_HOST", false, None)?
            .unwrap_or_else(|| ANTHROPIC_DEFAULT_HOST.to_string());

        let model = Self::get_env(lookup, "LLM_MODEL", false, None)?
            .unwrap_or_else(|| ANTHROPIC_DEFAULT_MODEL.to_string());

        let max_tokens = max_tokens(lookup)?.unwrap_or(ANTHROPIC_DEFAULT_MAX_TOKENS);

        Ok(Self::new(host, api_key, model, max_tokens))
    }
}
