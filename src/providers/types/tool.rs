use serde_json::Value;
use std::fmt::Debug;

/// A tool that can be used by a model.
pub struct Tool {
    /// The name of the tool, unique within a registry
    pub name: String,
    /// A description of what the tool does, sent to the model
    pub description: String,
    /// A json schema of the expected input object
    pub input_schema: Value,
    /// The function that powers the tool
    pub function: Box<dyn Fn(&Value) -> anyhow::Result<String> + Send + Sync>,
}

impl Tool {
    pub fn new<N, D>(
        name: N,
        description: D,
        input_schema: Value,
        function: impl Fn(&Value) -> anyhow::Result<String> + Send + Sync + 'static,
    ) -> Self
    where
        N: Into<String>,
        D: Into<String>,
    {
        Tool {
            name: name.into(),
            description: description.into(),
            input_schema,
            function: Box::new(function),
        }
    }

    pub fn invoke(&self, input: &Value) -> anyhow::Result<String> {
        (self.function)(input)
    }
}

impl Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .field("function", &"<function>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use serde_json::json;

    fn get_current_weather(params: &Value) -> anyhow::Result<String> {
        match params["location"].as_str() {
            Some(location) => Ok(format!("{}: 72F", location)),
            None => bail!("location is required"),
        }
    }

    fn weather_tool() -> Tool {
        Tool::new(
            "get_current_weather",
            "Get the current weather in a given location",
            json!({
                "type": "object",
                "required": ["location"],
                "properties": {
                    "location": {
                        "type": "string",
                        "description": "The city and state, e.g. San Francisco, CA"
                    }
                }
            }),
            get_current_weather,
        )
    }

    #[test]
    fn test_basic_tool_creation() -> anyhow::Result<()> {
        let tool = weather_tool();

        assert_eq!(tool.name, "get_current_weather");
        assert_eq!(
            tool.description,
            "Get the current weather in a given location"
        );
        assert_eq!(tool.input_schema["required"], json!(["location"]));

        let result = tool.invoke(&json!({"location": "Chicago, IL"}))?;
        assert_eq!(result, "Chicago, IL: 72F");
        Ok(())
    }

    #[test]
    fn test_tool_reports_its_own_errors() {
        let tool = weather_tool();
        let err = tool.invoke(&json!({})).unwrap_err();
        assert_eq!(err.to_string(), "location is required");
    }

    #[test]
    fn test_tool_debug_output() {
        let tool = Tool::new("test_tool", "Test description", json!({}), |_| {
            Ok(String::new())
        });

        let debug_output = format!("{:?}", tool);
        assert!(debug_output.contains("test_tool"));
        assert!(debug_output.contains("Test description"));
        assert!(debug_output.contains("<function>"));
    }
}
