use super::base::{max_tokens, ProviderConfig};
use anyhow::Result;

pub const OPENAI_DEFAULT_HOST: &str = "https://api.openai.com";
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o";

#[derive(Debug, Clone)]
pub struct OpenAiProviderConfig {
    pub host: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: Option<u32>,
}

impl OpenAiProviderConfig {
    pub fn new(host: String, api_key: String, model: String, max_tokens: Option<u32>) -> Self {
        Self {
            host,
            api_key,
            model,
            max_tokens,
        }
    }
}

impl ProviderConfig for OpenAiProviderConfig {
    fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = Self::get_env(lookup, "OPENAI_API_KEY", true, None)?
            .ok_or_else(|| anyhow::anyhow!("OpenAI API key should be present"))?;

        let host = Self::get_env(
            lookup,
            "OPENAI_HOST",
            false,
            Some(OPENAI_DEFAULT_HOST.to_string()),
        )?
        .unwrap_or_else(|| OPENAI_DEFAULT_HOST.to_string());

        let model = Self::get_env(lookup, "LLM_MODEL", false, None)?
            .unwrap_or_else(|| OPENAI_DEFAULT_MODEL.to_string());

        Ok(Self::new(host, api_key, model, max_tokens(lookup)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::configs::base::lookup_from;

    #[test]
    fn test_provider_config() -> Result<()> {
        let config = OpenAiProviderConfig::from_lookup(&lookup_from(&[
            ("OPENAI_API_KEY", "test_key"),
            ("LLM_MAX_TOKENS", "256"),
        ]))?;
        assert_eq!(config.api_key, "test_key");
        assert_eq!(config.host, OPENAI_DEFAULT_HOST);
        assert_eq!(config.model, OPENAI_DEFAULT_MODEL);
        assert_eq!(config.max_tokens, Some(256));
        Ok(())
    }
}
