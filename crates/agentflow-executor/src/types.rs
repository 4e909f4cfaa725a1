//! Shared types for the parallel tool executor (spec §3, §4.5).

use std::collections::HashMap;
use std::time::Duration;

use agentflow_core::ToolPriority;
use agentflow_security::UserRole;
use serde::{Deserialize, Serialize};

/// A tool call the planner or reflector wants dispatched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingToolCall {
    pub tool: String,
    #[serde(default)]
    pub input: serde_json::Value,
}

/// Record of one completed tool call (spec §3 `ToolCallRecord`), appended to
/// `AgentState.tools_used`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub tool_name: String,
    pub tool_input: serde_json::Value,
    pub result: String,
    pub success: bool,
    pub duration_ms: u64,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    pub cost_usd: f64,
}

/// Who is asking for this tool call, for the permission gate (spec §4.4
/// step 1). Not named in the spec's `AgentState` fields; threaded alongside
/// state into `execute_batch` and the graph runner instead, since the
/// budget/compression fields of `AgentState` have nothing to do with
/// identity and a caller may run many conversations under one process.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub user_id: String,
    pub role: UserRole,
}

impl ExecutionContext {
    pub fn new(user_id: impl Into<String>, role: UserRole) -> Self {
        Self { user_id: user_id.into(), role }
    }
}

/// Configuration for the parallel tool executor (spec §4.5).
#[derive(Debug, Clone)]
pub struct ToolExecutionConfig {
    pub max_concurrent: usize,
    pub default_timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub tool_timeouts: HashMap<String, Duration>,
    pub tool_priorities: HashMap<String, ToolPriority>,
    pub retryable_patterns: Vec<String>,
}

impl Default for ToolExecutionConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 3,
            default_timeout: Duration::from_secs(30),
            max_retries: 2,
            retry_delay: Duration::from_secs(1),
            tool_timeouts: HashMap::new(),
            tool_priorities: HashMap::new(),
            retryable_patterns: vec![
                "timeout".to_string(),
                "rate limit".to_string(),
                "connection".to_string(),
                "temporary".to_string(),
                "retry".to_string(),
                "503".to_string(),
                "429".to_string(),
            ],
        }
    }
}

impl ToolExecutionConfig {
    pub fn timeout_for(&self, tool_name: &str) -> Duration {
        self.tool_timeouts.get(tool_name).copied().unwrap_or(self.default_timeout)
    }

    pub fn priority_for(&self, tool_name: &str) -> ToolPriority {
        self.tool_priorities.get(tool_name).copied().unwrap_or_default()
    }
}
