//! Executor node (spec §4.7), grounded on
//! `examples/original_source/.../agents/graph/nodes/executor.py`'s
//! `executor_node`: hands pending tool calls to the parallel executor and
//! clears them once dispatched.

use agentflow_core::ChatMessage;

use crate::state::{AgentState, NextAction};
use crate::NodeDeps;

pub async fn run(state: &mut AgentState, deps: &NodeDeps) {
    let pending = std::mem::take(&mut state.pending_tool_calls);
    let remaining_budget = state.max_tool_calls.saturating_sub(state.tools_used.len());

    let records = deps.tool_executor.execute_batch(pending, remaining_budget, &deps.ctx).await;

    for record in &records {
        state.cost_spent_usd += record.cost_usd;
        state.messages.push(ChatMessage::assistant(format!(
            "[Tool Call: {}] Status: {}: {}",
            record.tool_name,
            if record.success { "success" } else { "failed" },
            record.result
        )));
    }
    state.tools_used.extend(records);
    state.next_action = NextAction::Reflect;
}
