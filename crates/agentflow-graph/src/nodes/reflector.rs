//! Reflector node (spec §4.7), grounded on
//! `examples/original_source/.../agents/graph/nodes/reflector.py`'s
//! `reflector_node`: scores the latest tool results and decides whether to
//! respond, execute more tools, or replan.

use agentflow_core::{extract_widest_json_object, ChatMessage};
use agentflow_executor::{PendingToolCall, ToolCallRecord};

use crate::state::{AgentState, NextAction};
use crate::NodeDeps;

const REFLECTION_PROMPT: &str = "Review the tool results below against the user's question and the plan. \
Respond ONLY with JSON: {\"quality_score\": 0-10, \"has_enough_info\": bool, \
\"needs_different_approach\": bool, \"missing_info\": \"...\" (optional), \
\"next_tool_calls\": [{\"tool\": \"...\", \"input\": {...}}] (optional), \"reasoning\": \"...\"}.";

pub async fn run(state: &mut AgentState, deps: &NodeDeps) {
    let Some(llm) = deps.llm.as_deref() else {
        state.next_action = NextAction::Respond;
        return;
    };

    let tool_results = format_tool_results(&state.tools_used);
    let prompt = format!(
        "{REFLECTION_PROMPT}\n\nUser question: {}\nPlan: {}\nTool results:\n{tool_results}",
        state.user_input,
        state.plan.as_deref().unwrap_or("(none)")
    );

    let mut messages = state.messages.clone();
    messages.push(ChatMessage::system(prompt));

    let response = match llm.ainvoke(&messages, None, &deps.model, deps.temperature).await {
        Ok(r) => r,
        Err(_) => {
            state.next_action = NextAction::Respond;
            return;
        }
    };
    state.record_token_usage("reflector", response.usage.total_tokens);

    let Some(content) = response.content else {
        state.next_action = NextAction::Respond;
        return;
    };
    let Some(parsed) = extract_widest_json_object(&content) else {
        state.reflections.push(content);
        state.next_action = NextAction::Respond;
        return;
    };

    let quality_score = parsed.get("quality_score").and_then(|v| v.as_f64()).unwrap_or(0.0);
    let has_enough_info = parsed.get("has_enough_info").and_then(|v| v.as_bool()).unwrap_or(false);
    let needs_different_approach = parsed.get("needs_different_approach").and_then(|v| v.as_bool()).unwrap_or(false);
    let reasoning = parsed.get("reasoning").and_then(|v| v.as_str()).unwrap_or_default().to_string();

    state.quality_score = Some(quality_score);
    state.reflections.push(reasoning.clone());

    let current_retries = state.retry_count();

    if has_enough_info && quality_score >= deps.quality_threshold {
        state.next_action = NextAction::Respond;
        return;
    }

    let next_tool_calls: Vec<PendingToolCall> = parsed
        .get("next_tool_calls")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|c| {
                    let tool = c.get("tool")?.as_str()?.to_string();
                    let input = c.get("input").cloned().unwrap_or(serde_json::json!({}));
                    Some(PendingToolCall { tool, input })
                })
                .collect()
        })
        .unwrap_or_default();

    if !next_tool_calls.is_empty() && current_retries < deps.max_retries {
        state.pending_tool_calls = next_tool_calls;
        state.next_action = NextAction::Execute;
        return;
    }

    if needs_different_approach && current_retries < deps.max_retries {
        state.reflections.push(format!("[Retry {}]: Trying different approach", current_retries + 1));
        state.plan = None;
        state.next_action = NextAction::Plan;
        return;
    }

    state.next_action = NextAction::Respond;
}

fn format_tool_results(records: &[ToolCallRecord]) -> String {
    records
        .iter()
        .map(|r| format!("- {} ({}): {}", r.tool_name, if r.success { "ok" } else { "failed" }, r.result))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::BudgetConfig;
    use crate::NodeDeps;
    use agentflow_core::collaborators::testing::FakeLlmClient;
    use agentflow_executor::ExecutionContext;
    use agentflow_security::UserRole;
    use agentflow_tools::ToolRegistry;
    use std::sync::Arc;

    fn deps_with(llm: FakeLlmClient) -> NodeDeps {
        NodeDeps {
            registry: Arc::new(ToolRegistry::new()),
            tool_executor: crate::nodes::tests_support::dummy_executor(),
            llm: Some(Arc::new(llm)),
            memory: None,
            ctx: ExecutionContext::new("u1", UserRole::User),
            assistant_id: "assistant-1".to_string(),
            model: "gpt-4o".to_string(),
            temperature: 0.7,
            quality_threshold: 7.0,
            max_retries: 3,
        }
    }

    #[tokio::test]
    async fn enough_info_above_threshold_moves_to_respond() {
        let llm = FakeLlmClient::single(
            r#"{"quality_score": 8, "has_enough_info": true, "needs_different_approach": false, "reasoning": "solid"}"#,
        );
        let deps = deps_with(llm);
        let mut state = AgentState::new("hi", Vec::new(), &BudgetConfig::default());
        run(&mut state, &deps).await;
        assert_eq!(state.next_action, NextAction::Respond);
        assert_eq!(state.quality_score, Some(8.0));
    }

    #[tokio::test]
    async fn low_quality_requests_more_tools() {
        let llm = FakeLlmClient::single(
            r#"{"quality_score": 3, "has_enough_info": false, "needs_different_approach": false, "reasoning": "missing data", "next_tool_calls": [{"tool": "web_search", "input": {"query": "more"}}]}"#,
        );
        let deps = deps_with(llm);
        let mut state = AgentState::new("hi", Vec::new(), &BudgetConfig::default());
        run(&mut state, &deps).await;
        assert_eq!(state.next_action, NextAction::Execute);
        assert_eq!(state.pending_tool_calls.len(), 1);
    }

    #[tokio::test]
    async fn needs_different_approach_replans_under_retry_limit() {
        let llm = FakeLlmClient::single(
            r#"{"quality_score": 2, "has_enough_info": false, "needs_different_approach": true, "reasoning": "wrong tool"}"#,
        );
        let deps = deps_with(llm);
        let mut state = AgentState::new("hi", Vec::new(), &BudgetConfig::default());
        run(&mut state, &deps).await;
        assert_eq!(state.next_action, NextAction::Plan);
        assert!(state.plan.is_none());
    }

    #[tokio::test]
    async fn exhausted_retries_falls_back_to_respond() {
        let llm = FakeLlmClient::single(
            r#"{"quality_score": 2, "has_enough_info": false, "needs_different_approach": true, "reasoning": "still bad"}"#,
        );
        let deps = deps_with(llm);
        let mut state = AgentState::new("hi", Vec::new(), &BudgetConfig::default());
        state.reflections = vec!["[Retry 1]".into(), "[Retry 2]".into(), "[Retry 3]".into()];
        run(&mut state, &deps).await;
        assert_eq!(state.next_action, NextAction::Respond);
    }
}
