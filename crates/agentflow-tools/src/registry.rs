//! Tool registry (spec §4.3): a process-wide mapping from name to tool,
//! grounded on `skilllite-agent/extensions/registry.rs`'s builder pattern
//! ("add a new tool by calling `register(...)` once, no changes anywhere
//! else") generalized from compile-time `ToolDefinition` lists to runtime
//! factories returning live `AgentTool` instances.

use std::collections::HashMap;
use std::sync::Arc;

use crate::contract::{AgentTool, ToolDescriptor};
use crate::error::ToolError;

#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn AgentTool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tool via `factory` and register it under its own `name()`.
    /// Registration is idempotent: a duplicate name is rejected rather than
    /// silently overwriting the existing entry.
    pub fn register(&mut self, factory: impl FnOnce() -> Arc<dyn AgentTool>) -> Result<(), ToolError> {
        let tool = factory();
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(ToolError::DuplicateRegistration(name));
        }
        self.tools.insert(name, tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn AgentTool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.values().map(|t| ToolDescriptor::from_tool(t.as_ref())).collect()
    }

    pub async fn execute(&self, name: &str, input: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let tool = self.get(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        tool.execute(input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentflow_core::SecurityLevel;

    struct EchoTool;

    #[async_trait::async_trait]
    impl AgentTool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "echoes its input"
        }
        fn security_level(&self) -> SecurityLevel {
            SecurityLevel::Safe
        }
        fn input_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object"})
        }
        async fn execute(&self, input: serde_json::Value) -> Result<serde_json::Value, ToolError> {
            Ok(input)
        }
    }

    #[test]
    fn register_and_get_round_trips() {
        let mut registry = ToolRegistry::new();
        registry.register(|| Arc::new(EchoTool)).unwrap();
        assert!(registry.contains("echo"));
        assert_eq!(registry.descriptors().len(), 1);
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = ToolRegistry::new();
        registry.register(|| Arc::new(EchoTool)).unwrap();
        let err = registry.register(|| Arc::new(EchoTool)).unwrap_err();
        assert!(matches!(err, ToolError::DuplicateRegistration(name) if name == "echo"));
    }

    #[tokio::test]
    async fn execute_dispatches_by_name() {
        let mut registry = ToolRegistry::new();
        registry.register(|| Arc::new(EchoTool)).unwrap();
        let out = registry.execute("echo", serde_json::json!({"x": 1})).await.unwrap();
        assert_eq!(out["x"], 1);

        let err = registry.execute("missing", serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(name) if name == "missing"));
    }
}
