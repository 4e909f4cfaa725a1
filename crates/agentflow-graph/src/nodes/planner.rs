//! Planner node (spec §4.7), grounded on
//! `examples/original_source/.../agents/graph/nodes/planner.py`.

use agentflow_core::{extract_widest_json_object, ChatMessage};
use agentflow_executor::PendingToolCall;
use agentflow_tools::ToolRegistry;

use crate::state::{AgentState, MemoryContextItem, NextAction};
use crate::NodeDeps;

const PLANNING_PROMPT: &str = "You are an assistant deciding how to respond to the user. \
Given the conversation so far and the tools available, decide whether you need to call any \
tools or can answer directly. Respond ONLY with a JSON object, either \
{\"needs_tools\": true, \"reasoning\": \"...\", \"plan\": \"...\", \"tool_calls\": [{\"tool\": \"...\", \"input\": {...}}]} \
or {\"needs_tools\": false, \"reasoning\": \"...\", \"answer\": \"...\"}.";

pub async fn run(state: &mut AgentState, deps: &NodeDeps) {
    let Some(llm) = deps.llm.as_deref() else {
        state.next_action = NextAction::Respond;
        state.final_answer = Some("I don't have a language model configured to plan a response.".to_string());
        return;
    };

    if let Some(memory) = deps.memory.as_deref() {
        if let Ok(recalled) = memory.recall_memories(&state.user_input, &deps.assistant_id, &deps.ctx.user_id, 3).await {
            state.memory_context = recalled.into_iter().map(MemoryContextItem::from).collect();
        }
    }

    let tools_description = describe_tools(&deps.registry);
    let mut prompt = format!("{PLANNING_PROMPT}\n\nAvailable tools:\n{tools_description}");
    if !state.memory_context.is_empty() {
        let memory_block: Vec<String> =
            state.memory_context.iter().map(|m| format!("[{}] {}", m.memory_type, m.content)).collect();
        prompt.push_str(&format!("\n\nRelevant memory:\n{}", memory_block.join("\n")));
    }

    let mut messages = state.messages.clone();
    messages.push(ChatMessage::system(prompt));

    let response = match llm.ainvoke(&messages, None, &deps.model, deps.temperature).await {
        Ok(r) => r,
        Err(_) => {
            state.next_action = NextAction::Respond;
            state.final_answer = Some("I ran into trouble planning a response.".to_string());
            return;
        }
    };

    state.record_token_usage("planner", response.usage.total_tokens);

    let Some(content) = response.content else {
        state.next_action = NextAction::Respond;
        return;
    };

    match extract_widest_json_object(&content) {
        Some(parsed) => {
            let needs_tools = parsed.get("needs_tools").and_then(|v| v.as_bool()).unwrap_or(false);
            let reasoning = parsed.get("reasoning").and_then(|v| v.as_str()).unwrap_or_default();
            if needs_tools {
                let plan = parsed.get("plan").and_then(|v| v.as_str()).unwrap_or(reasoning).to_string();
                let tool_calls: Vec<PendingToolCall> = parsed
                    .get("tool_calls")
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
                state.messages.push(ChatMessage::assistant(format!("[Planning]: {plan}")));
                state.plan = Some(plan);
                state.pending_tool_calls = tool_calls;
                state.next_action = NextAction::Execute;
            } else {
                let answer = parsed.get("answer").and_then(|v| v.as_str()).unwrap_or(&content).to_string();
                state.final_answer = Some(answer);
                state.next_action = NextAction::Respond;
            }
        }
        None => {
            state.final_answer = Some(content);
            state.next_action = NextAction::Respond;
        }
    }
}

fn describe_tools(registry: &ToolRegistry) -> String {
    registry
        .descriptors()
        .iter()
        .map(|d| format!("- {}: {}", d.name, d.description))
        .collect::<Vec<_>>()
        .join("\n")
}
