//! Tool trait — the abstraction over capabilities the model may invoke.
//!
//! The model asks for a tool by emitting a [`ToolInvocation`] inside a
//! completion round. The registry resolves it, runs it, and always hands back
//! a [`ToolResult`]: failures become error payloads the model can read, never
//! errors that abort the chat stream.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use crate::error::ToolError;
use crate::provider::ToolDefinition;

/// A tool invocation emitted by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Correlation ID the result must echo back (`call_id` upstream)
    pub call_id: String,

    /// Upstream output item ID, echoed back verbatim when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,

    /// Name of the tool to execute
    pub name: String,

    /// Arguments exactly as the model produced them (a JSON document as text)
    pub arguments: String,
}

impl ToolInvocation {
    pub fn new(
        call_id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            item_id: None,
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Parse the raw argument text into a JSON object.
    pub fn parse_arguments(&self) -> Result<serde_json::Value, ToolError> {
        let value: serde_json::Value = serde_json::from_str(&self.arguments)
            .map_err(|e| ToolError::InvalidArguments(format!("arguments are not valid JSON: {e}")))?;
        if !value.is_object() {
            return Err(ToolError::InvalidArguments(
                "arguments must be a JSON object".into(),
            ));
        }
        Ok(value)
    }
}

/// The outcome of a tool invocation, correlated by `invocation_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    /// The `call_id` of the invocation this result answers
    pub invocation_id: String,

    /// Text handed back to the model (JSON for both success and error payloads)
    pub output: String,

    /// Whether `output` is an error payload
    #[serde(default)]
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(invocation_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            output: output.into(),
            is_error: false,
        }
    }

    /// Build an error payload of the form `{"error": "<message>"}`.
    pub fn error(invocation_id: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            output: serde_json::json!({ "error": message.to_string() }).to_string(),
            is_error: true,
        }
    }
}

/// The core Tool trait.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "fetch_article").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Whether the schema should be enforced strictly by the model.
    fn strict(&self) -> bool {
        true
    }

    /// Execute the tool with already-parsed arguments, returning the text output.
    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the LLM.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
            strict: self.strict(),
        }
    }
}

/// The catalog of tools advertised to the model.
///
/// Read-only once built; shared across requests behind an `Arc`.
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Get all tool definitions, ordered by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<_> = self.tools.values().map(|t| t.to_definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Execute an invocation, surfacing every failure as a `ToolError`.
    pub async fn execute(&self, invocation: &ToolInvocation) -> Result<String, ToolError> {
        let tool = self
            .tools
            .get(&invocation.name)
            .ok_or_else(|| ToolError::NotFound(invocation.name.clone()))?;
        let arguments = invocation.parse_arguments()?;
        tool.execute(arguments).await
    }

    /// Execute an invocation and fold any failure into an error-shaped result.
    pub async fn dispatch(&self, invocation: &ToolInvocation) -> ToolResult {
        match self.execute(invocation).await {
            Ok(output) => ToolResult::success(&invocation.call_id, output),
            Err(e) => {
                warn!(tool = %invocation.name, call_id = %invocation.call_id, error = %e, "Tool invocation failed");
                ToolResult::error(&invocation.call_id, e)
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
