//! `AgentState` (spec §3), grounded on
//! `examples/original_source/backend/airbeeps/agents/graph/state.py`'s
//! `AgentState`/`AgentStateDict`.

use std::collections::HashMap;

use agentflow_core::{ChatMessage, MemoryItem};
use agentflow_executor::{PendingToolCall, ToolCallRecord};
use serde::{Deserialize, Serialize};

/// Control-flow label read by the graph's conditional edges (spec §3, §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextAction {
    Plan,
    Execute,
    Reflect,
    Respond,
    Abort,
}

/// Immutable budget caps for one run, supplied at construction (spec §3).
#[derive(Debug, Clone)]
pub struct BudgetConfig {
    pub token_budget: u64,
    pub max_iterations: u32,
    pub max_tool_calls: usize,
    pub cost_limit_usd: f64,
    pub max_parallel_tools: usize,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self { token_budget: 8_000, max_iterations: 10, max_tool_calls: 20, cost_limit_usd: 0.50, max_parallel_tools: 3 }
    }
}

/// The state that flows through the graph (spec §3). Monotonic fields —
/// `iterations`, `cost_spent_usd`, `tools_used.len()`, `reflections.len()`,
/// `compression_count` — are only ever incremented by node logic; nothing
/// here enforces that beyond the nodes themselves never decrementing them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentState {
    pub messages: Vec<ChatMessage>,
    pub user_input: String,
    pub plan: Option<String>,
    pub final_answer: Option<String>,

    pub pending_tool_calls: Vec<PendingToolCall>,
    pub tools_used: Vec<ToolCallRecord>,

    pub reflections: Vec<String>,
    pub quality_score: Option<f64>,

    pub memory_context: Vec<MemoryContextItem>,

    pub token_budget: u64,
    pub token_usage: HashMap<String, u64>,
    pub max_iterations: u32,
    pub iterations: u32,
    pub max_tool_calls: usize,
    pub max_parallel_tools: usize,
    pub cost_limit_usd: f64,
    pub cost_spent_usd: f64,

    pub compressed_history: Option<String>,
    pub compression_count: u32,

    pub next_action: NextAction,
    pub abort_reason: Option<String>,
    /// Non-fatal >=90%-of-budget notice (budget checker step 3); not part of
    /// the spec's named `AgentState` fields but present on the original's
    /// state dict and surfaced as the `budget_warning` stream event.
    pub budget_warning: Option<String>,
}

/// A recalled memory spliced into planner/responder context (spec §4.7,
/// §6's `recall_memories` shape).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryContextItem {
    pub memory_type: String,
    pub content: String,
}

impl From<MemoryItem> for MemoryContextItem {
    fn from(m: MemoryItem) -> Self {
        Self { memory_type: m.memory_type, content: m.content }
    }
}

impl AgentState {
    /// Build the initial state for a run (spec §4.8's `_build_initial_state`).
    pub fn new(user_input: impl Into<String>, chat_history: Vec<ChatMessage>, budget: &BudgetConfig) -> Self {
        let user_input = user_input.into();
        let mut messages = chat_history;
        messages.push(ChatMessage::user(user_input.clone()));

        Self {
            messages,
            user_input,
            plan: None,
            final_answer: None,
            pending_tool_calls: Vec::new(),
            tools_used: Vec::new(),
            reflections: Vec::new(),
            quality_score: None,
            memory_context: Vec::new(),
            token_budget: budget.token_budget,
            token_usage: HashMap::new(),
            max_iterations: budget.max_iterations,
            iterations: 0,
            max_tool_calls: budget.max_tool_calls,
            max_parallel_tools: budget.max_parallel_tools,
            cost_limit_usd: budget.cost_limit_usd,
            cost_spent_usd: 0.0,
            compressed_history: None,
            compression_count: 0,
            next_action: NextAction::Plan,
            abort_reason: None,
            budget_warning: None,
        }
    }

    /// Number of times `"retry"` or a `[Retry N]` marker appears in
    /// `reflections` so far (spec §4.7 reflector's retry-limit check).
    pub fn retry_count(&self) -> usize {
        self.reflections.iter().filter(|r| r.to_lowercase().contains("retry")).count()
    }

    pub fn record_token_usage(&mut self, label: &str, tokens: u64) {
        *self.token_usage.entry(label.to_string()).or_insert(0) += tokens;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_seeds_messages_with_user_input() {
        let state = AgentState::new("hello", Vec::new(), &BudgetConfig::default());
        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.messages[0].role, "user");
        assert_eq!(state.next_action, NextAction::Plan);
    }

    #[test]
    fn retry_count_matches_retry_markers_only() {
        let mut state = AgentState::new("hi", Vec::new(), &BudgetConfig::default());
        state.reflections.push("looked good".to_string());
        state.reflections.push("[Retry 1]: trying different approach".to_string());
        assert_eq!(state.retry_count(), 1);
    }
}
