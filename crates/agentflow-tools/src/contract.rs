//! Tool contract (spec §4.3): every tool implements `name`, `description`,
//! `security_level`, `input_schema`, `execute`. Grounded on
//! `examples/original_source/backend/airbeeps/agents/tools/base.py`'s
//! `AgentTool` abstract base (properties + `get_input_schema` +
//! `to_openai_tool`/`to_anthropic_tool` + abstract async `execute`).

use agentflow_core::{FunctionDef, SecurityLevel, ToolDefinition};
use async_trait::async_trait;

use crate::error::ToolError;

#[async_trait]
pub trait AgentTool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn security_level(&self) -> SecurityLevel {
        SecurityLevel::Moderate
    }
    fn input_schema(&self) -> serde_json::Value;
    async fn execute(&self, input: serde_json::Value) -> Result<serde_json::Value, ToolError>;

    /// OpenAI-compatible tool definition, the way `base.py`'s
    /// `to_openai_tool()` renders a tool for the LLM's tool-call list.
    fn to_openai_tool(&self) -> ToolDefinition {
        ToolDefinition {
            tool_type: "function".to_string(),
            function: FunctionDef {
                name: self.name().to_string(),
                description: self.description().to_string(),
                parameters: self.input_schema(),
            },
        }
    }
}

/// Summary of a registered tool, independent of its live instance —
/// used to list what's available without holding a trait object.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub security_level: SecurityLevel,
    pub input_schema: serde_json::Value,
}

impl ToolDescriptor {
    pub fn from_tool(tool: &dyn AgentTool) -> Self {
        Self {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            security_level: tool.security_level(),
            input_schema: tool.input_schema(),
        }
    }
}
