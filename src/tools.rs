use anyhow::Context;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use crate::errors::{AgentError, AgentResult};
use crate::project::ProjectStore;
use crate::providers::types::tool::Tool;
use crate::providers::utils::sanitize_function_name;

pub mod files;
pub mod http;
pub mod project;
pub mod search;
pub mod shell;

/// Static, name-keyed collection of the tools offered to the model.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: Vec<Tool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names must already be valid vendor function names, since calls come
    /// back under the name that was declared.
    pub fn register(&mut self, tool: Tool) -> AgentResult<()> {
        let valid = sanitize_function_name(&tool.name)
            .map(|sanitized| sanitized == tool.name)
            .unwrap_or(false);
        if tool.name.is_empty() || !valid {
            return Err(AgentError::InvalidToolName(tool.name));
        }
        if self.get(&tool.name).is_some() {
            return Err(AgentError::DuplicateTool(tool.name));
        }
        debug!(tool = %tool.name, "registered tool");
        self.tools.push(tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.iter().find(|tool| tool.name == name)
    }

    /// Definitions in registration order, as sent to providers
    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|tool| tool.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Look up `name` exactly and run it with `input` untouched.
    pub fn invoke(&self, name: &str, input: &Value) -> AgentResult<String> {
        let tool = self
            .get(name)
            .ok_or_else(|| AgentError::ToolNotFound(name.to_string()))?;

        info!(tool = name, "invoking tool");
        tool.invoke(input)
            .map_err(|e| AgentError::ToolExecution(format!("{:#}", e)))
    }
}

/// The default tool set. Project tools are always offered and report
/// "project store not initialized" when `store` is absent.
pub fn builtin_registry(store: Option<Arc<dyn ProjectStore>>) -> AgentResult<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    for tool in [
        files::read_file_tool(),
        files::list_files_tool(),
        shell::bash_tool(),
        files::edit_file_tool(),
        search::code_search_tool(),
        http::api_call_tool(),
    ] {
        registry.register(tool)?;
    }
    for tool in project::project_tools(store) {
        registry.register(tool)?;
    }
    Ok(registry)
}

/// Decode a tool's input object, naming the tool on failure.
pub(crate) fn parse_input<T: DeserializeOwned>(tool: &str, input: &Value) -> anyhow::Result<T> {
    serde_json::from_value(input.clone())
        .with_context(|| format!("invalid input for {}", tool))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn echo() -> Tool {
        Tool::new("echo", "Echo text", json!({"type": "object"}), |input| {
            Ok(input["text"].as_str().unwrap_or_default().to_string())
        })
    }

    #[test]
    fn test_invoke_by_exact_name() -> AgentResult<()> {
        let mut registry = ToolRegistry::new();
        registry.register(echo())?;

        assert_eq!(registry.invoke("echo", &json!({"text": "hi"}))?, "hi");
        assert!(matches!(
            registry.invoke("Echo", &json!({})),
            Err(AgentError::ToolNotFound(name)) if name == "Echo"
        ));
        Ok(())
    }

    #[test]
    fn test_unknown_tool_runs_nothing() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut registry = ToolRegistry::new();
        registry
            .register(Tool::new("count", "", json!({}), move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(String::new())
            }))
            .unwrap();

        let err = registry.invoke("shell_run", &json!({})).unwrap_err();
        assert_eq!(err.to_string(), "tool 'shell_run' not found");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_tool_errors_keep_their_text() {
        let mut registry = ToolRegistry::new();
        registry
            .register(Tool::new("fail", "", json!({}), |_| bail!("disk full")))
            .unwrap();

        let err = registry.invoke("fail", &json!({})).unwrap_err();
        assert!(matches!(&err, AgentError::ToolExecution(text) if text == "disk full"));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut registry = ToolRegistry::new();
        registry.register(echo()).unwrap();
        assert!(matches!(
            registry.register(echo()),
            Err(AgentError::DuplicateTool(name)) if name == "echo"
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_names_outside_function_charset_rejected() {
        let mut registry = ToolRegistry::new();
        for name in ["read file", "fs.read", "", "grep@v2"] {
            let tool = Tool::new(name, "", json!({}), |_| Ok(String::new()));
            assert!(matches!(
                registry.register(tool),
                Err(AgentError::InvalidToolName(rejected)) if rejected == name
            ));
        }
        assert!(registry.is_empty());
        registry
            .register(Tool::new("read-file_2", "", json!({}), |_| Ok(String::new())))
            .unwrap();
    }

    #[test]
    fn test_builtin_registry() -> AgentResult<()> {
        let registry = builtin_registry(None)?;
        assert_eq!(
            registry.names(),
            vec![
                "read_file",
                "list_files",
                "bash",
                "edit_file",
                "code_search",
                "api_call",
                "save_project_file",
                "list_project_files",
                "create_checkpoint",
                "restore_checkpoint",
                "list_checkpoints",
            ]
        );
        assert!(registry
            .tools()
            .iter()
            .all(|tool| tool.input_schema["type"] == "object"));

        let err = registry.invoke("list_project_files", &json!({})).unwrap_err();
        assert_eq!(err.to_string(), "project store not initialized");
        Ok(())
    }

    #[test]
    fn test_parse_input_names_the_tool() {
        #[derive(serde::Deserialize, Debug)]
        struct Input {
            #[allow(dead_code)]
            path: String,
        }
        let err = parse_input::<Input>("read_file", &json!({"file": "x"})).unwrap_err();
        assert!(format!("{:#}", err).starts_with("invalid input for read_file: "));
    }
}
