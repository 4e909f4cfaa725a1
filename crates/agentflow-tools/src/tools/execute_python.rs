//! `execute_python` (DANGEROUS), grounded on
//! `examples/original_source/backend/airbeeps/agents/tools/code_executor.py`'s
//! `CodeExecutorTool`. Execution itself is delegated to `agentflow_sandbox::Sandbox`
//! (static AST validation + Docker/Subprocess/Disabled dispatch, spec §4.4.1).

use agentflow_core::SecurityLevel;
use agentflow_sandbox::Sandbox;
use async_trait::async_trait;
use serde::Deserialize;

use crate::contract::AgentTool;
use crate::error::ToolError;

pub struct ExecutePythonTool {
    sandbox: Sandbox,
}

impl ExecutePythonTool {
    pub fn new(sandbox: Sandbox) -> Self {
        Self { sandbox }
    }
}

#[derive(Deserialize)]
struct Input {
    code: String,
}

#[async_trait]
impl AgentTool for ExecutePythonTool {
    fn name(&self) -> &str {
        "execute_python"
    }

    fn description(&self) -> &str {
        "Execute Python code in a sandboxed environment. The code runs with limited imports \
         (math, json, datetime, re, collections, itertools, functools, statistics, decimal, csv) \
         and restricted system access. Use this for calculations, data processing, or algorithm \
         execution. Output is captured from print statements."
    }

    fn security_level(&self) -> SecurityLevel {
        SecurityLevel::Dangerous
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "code": {
                    "type": "string",
                    "description": "Python code to execute. Use print() to output results. \
                        Avoid: os, subprocess, open(), eval(), exec()."
                },
            },
            "required": ["code"],
        })
    }

    async fn execute(&self, input: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let input: Input = serde_json::from_value(input).map_err(|e| ToolError::InvalidInput(e.to_string()))?;
        let result = self.sandbox.run(&input.code).await?;
        Ok(serde_json::to_value(result).map_err(|e| ToolError::ExecutionFailed(e.to_string()))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentflow_sandbox::{SandboxConfig, SandboxMode};

    #[tokio::test]
    async fn rejects_disallowed_import_with_failed_result() {
        let sandbox = Sandbox::new(SandboxConfig { mode: SandboxMode::Disabled, ..Default::default() });
        let tool = ExecutePythonTool::new(sandbox);
        let output = tool.execute(serde_json::json!({"code": "import os\n"})).await.unwrap();
        assert_eq!(output["success"], false);
        assert!(output["error_message"].as_str().unwrap().contains("Import of 'os' is not allowed"));
    }
}
