use super::base::{max_tokens, ProviderConfig};
use anyhow::Result;

pub const GEMINI_DEFAULT_HOST: &str = "https://generativelanguage.googleapis.com";
pub const GEMINI_DEFAULT_MODEL: &str = "gemini-1.5-pro";

#[derive(Debug, Clone)]
pub struct GeminiProviderConfig {
    pub host: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: Option<u32>,
}

impl GeminiProviderConfig {
    pub fn new(host: String, api_key: String, model: String, max_tokens: Option<u32>) -> Self {
        Self {
            host,
            api_key,
            model,
            max_tokens,
        }
    }
}

impl ProviderConfig for GeminiProviderConfig {
    fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = Self::get_env(lookup, "GEMINI_API_KEY", true, None)?
            .ok_or_else(|| anyhow::anyhow!("Gemini API key should be present"))?;

        let host = Self::get_env(lookup, "GEMINI_HOST", false, None)?
            .unwrap_or_else(|| GEMINI_DEFAULT_HOST.to_string());

        let model = Self::get_env(
            lookup,
            "LLM_MODEL",
            false,
            Some(GEMINI_DEFAULT_MODEL.to_string()),
        )?
        .unwrap_or_else(|| GEMINI_DEFAULT_MODEL.to_string());

        Ok(Self::new(host, api_key, model, max_tokens(lookup)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::configs::base::lookup_from;

    #[test]
    fn test_defaults() -> Result<()> {
        let config =
            GeminiProviderConfig::from_lookup(&lookup_from(&[("GEMINI_API_KEY", "g-key")]))?;
        assert_eq!(config.host, GEMINI_DEFAULT_HOST);
        assert_eq!(config.model, "gemini-1.5-pro");
        assert_eq!(config.max_tokens, None);
        Ok(())
    }

    #[test]
    fn test_missing_key() {
        assert!(GeminiProviderConfig::from_lookup(&lookup_from(&[])).is_err());
    }
}
