use anyhow::{anyhow, Result};
use std::env;

pub trait ProviderConfig {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self>
    where
        Self: Sized,
    {
        Self::from_lookup(&|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup, so tests need not touch the process env
    fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self>
    where
        Self: Sized;

    /// Helper function to get a value with error handling. Blank values count as unset.
    fn get_env(
        lookup: &dyn Fn(&str) -> Option<String>,
        key: &str,
        required: bool,
        default: Option<String>,
    ) -> Result<Option<String>> {
        match lookup(key).filter(|value| !value.trim().is_empty()) {
            Some(value) => Ok(Some(value)),
            None if !required => Ok(default),
            None => Err(anyhow!(
                "Environment variable '{}' is required but not set.",
                key
            )),
        }
    }
}

/// `LLM_MAX_TOKENS`, shared by every backend.
pub fn max_tokens(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Option<u32>> {
    match lookup("LLM_MAX_TOKENS").filter(|value| !value.trim().is_empty()) {
        Some(value) => value
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|_| anyhow!("LLM_MAX_TOKENS must be a positive integer, got '{}'", value)),
        None => Ok(None),
    }
}

#[cfg(test)]
pub(crate) fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: std::collections::HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}
