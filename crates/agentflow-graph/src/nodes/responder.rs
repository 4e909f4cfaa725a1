//! Responder node (spec §4.7), grounded on
//! `examples/original_source/.../agents/graph/nodes/responder.py`'s
//! `responder_node`: composes the final answer from whatever state is
//! available, degrading gracefully without an LLM.

use agentflow_core::ChatMessage;
use agentflow_executor::ToolCallRecord;

use crate::state::AgentState;
use crate::NodeDeps;

const RESPONSE_PROMPT: &str = "Compose a final answer to the user's question using the plan, tool results, \
and reflection below. Be direct and do not mention internal planning.";

const MAX_PARTIAL_RESULTS: usize = 3;
const PARTIAL_RESULT_CHARS: usize = 500;

pub async fn run(state: &mut AgentState, deps: &NodeDeps) {
    if let Some(answer) = state.final_answer.clone() {
        if state.abort_reason.is_some() {
            let partial = format_partial_results(&state.tools_used);
            if !partial.is_empty() {
                state.final_answer = Some(format!("{answer}\n\n{partial}"));
            }
        }
        return;
    }

    let Some(llm) = deps.llm.as_deref() else {
        state.final_answer = Some(format_fallback_response(state));
        return;
    };

    let tool_response = format_tool_response(&state.tools_used);
    let latest_reflection = state.reflections.last().cloned().unwrap_or_default();
    let memory_block: Vec<String> = state.memory_context.iter().map(|m| format!("[{}] {}", m.memory_type, m.content)).collect();

    let prompt = format!(
        "{RESPONSE_PROMPT}\n\nUser question: {}\nPlan: {}\nTool results:\n{tool_response}\nLatest reflection: {latest_reflection}\nMemory:\n{}",
        state.user_input,
        state.plan.as_deref().unwrap_or("(none)"),
        memory_block.join("\n")
    );

    let mut messages = state.messages.clone();
    messages.push(ChatMessage::system(prompt));

    match llm.ainvoke(&messages, None, &deps.model, deps.temperature).await {
        Ok(response) => {
            state.record_token_usage("responder", response.usage.total_tokens);
            state.final_answer = Some(response.content.unwrap_or_else(|| format_fallback_response(state)));
        }
        Err(_) => {
            state.final_answer = Some(format_fallback_response(state));
        }
    }
}

fn format_tool_response(records: &[ToolCallRecord]) -> String {
    records
        .iter()
        .map(|r| format!("- {} ({}): {}", r.tool_name, if r.success { "ok" } else { "failed" }, r.result))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_partial_results(records: &[ToolCallRecord]) -> String {
    let successes: Vec<&ToolCallRecord> = records.iter().filter(|r| r.success).take(MAX_PARTIAL_RESULTS).collect();
    if successes.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = successes
        .iter()
        .map(|r| {
            let mut text = r.result.clone();
            if text.len() > PARTIAL_RESULT_CHARS {
                text.truncate(PARTIAL_RESULT_CHARS);
                text.push_str("...");
            }
            format!("- {}: {text}", r.tool_name)
        })
        .collect();
    format!("Partial results found:\n{}", parts.join("\n"))
}

/// No-LLM fallback (spec §4.7's opening line: every node degrades
/// gracefully without a configured model).
fn format_fallback_response(state: &AgentState) -> String {
    if state.tools_used.is_empty() {
        return "I wasn't able to generate a response.".to_string();
    }
    let lines: Vec<String> = state
        .tools_used
        .iter()
        .filter(|r| r.success)
        .map(|r| format!("- {}: {}", r.tool_name, r.result))
        .collect();
    if lines.is_empty() {
        "I ran some tools but none of them produced a usable result.".to_string()
    } else {
        format!("Here's what I found:\n{}", lines.join("\n"))
    }
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

    fn deps_with(llm: Option<FakeLlmClient>) -> NodeDeps {
        NodeDeps {
            registry: Arc::new(ToolRegistry::new()),
            tool_executor: crate::nodes::tests_support::dummy_executor(),
            llm: llm.map(|l| Arc::new(l) as Arc<dyn agentflow_core::LlmClient>),
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
    async fn existing_final_answer_is_kept() {
        let deps = deps_with(None);
        let mut state = AgentState::new("hi", Vec::new(), &BudgetConfig::default());
        state.final_answer = Some("already answered".to_string());
        run(&mut state, &deps).await;
        assert_eq!(state.final_answer.as_deref(), Some("already answered"));
    }

    #[tokio::test]
    async fn abort_with_partial_results_appends_them() {
        let deps = deps_with(None);
        let mut state = AgentState::new("hi", Vec::new(), &BudgetConfig::default());
        state.final_answer = Some("ran out of budget".to_string());
        state.abort_reason = Some("cost limit".to_string());
        state.tools_used.push(ToolCallRecord {
            tool_name: "web_search".into(),
            tool_input: serde_json::json!({}),
            result: "rust is a language".into(),
            success: true,
            duration_ms: 1,
            attempts: 1,
            error_type: None,
            cost_usd: 0.001,
        });
        run(&mut state, &deps).await;
        assert!(state.final_answer.unwrap().contains("Partial results"));
    }

    #[tokio::test]
    async fn no_llm_falls_back_to_tool_summary() {
        let deps = deps_with(None);
        let mut state = AgentState::new("hi", Vec::new(), &BudgetConfig::default());
        state.tools_used.push(ToolCallRecord {
            tool_name: "web_search".into(),
            tool_input: serde_json::json!({}),
            result: "rust is a language".into(),
            success: true,
            duration_ms: 1,
            attempts: 1,
            error_type: None,
            cost_usd: 0.001,
        });
        run(&mut state, &deps).await;
        assert!(state.final_answer.unwrap().contains("rust is a language"));
    }

    #[tokio::test]
    async fn llm_composes_final_answer() {
        let deps = deps_with(Some(FakeLlmClient::single("Rust is a systems language.")));
        let mut state = AgentState::new("what is rust", Vec::new(), &BudgetConfig::default());
        run(&mut state, &deps).await;
        assert_eq!(state.final_answer.as_deref(), Some("Rust is a systems language."));
    }
}
