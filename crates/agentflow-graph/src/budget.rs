//! Budget checker (spec §4.6), grounded on
//! `examples/original_source/.../agents/graph/nodes/budget_checker.py`'s
//! `budget_checker_node`/`compress_state`.

use agentflow_core::{ChatMessage, CostEstimator, LlmClient};

use crate::state::{AgentState, NextAction};

/// Runs at the start of every iteration (spec §4.6's seven ordered steps).
pub struct BudgetChecker {
    /// How many of the most recent messages survive compression verbatim
    /// (spec: "keep the last 5 messages verbatim"); configurable via
    /// `AGENTFLOW_COMPACTION_KEEP_RECENT`.
    pub compaction_keep_recent: usize,
}

impl Default for BudgetChecker {
    fn default() -> Self {
        Self { compaction_keep_recent: 5 }
    }
}

impl BudgetChecker {
    pub fn new(compaction_keep_recent: usize) -> Self {
        Self { compaction_keep_recent }
    }

    pub async fn check(&self, state: &mut AgentState, llm: Option<&dyn LlmClient>) {
        // 1. Iteration limit.
        if state.iterations >= state.max_iterations {
            state.next_action = NextAction::Abort;
            state.abort_reason = Some(format!("Maximum iterations ({}) reached", state.max_iterations));
            state.final_answer = Some(
                "I've reached the maximum number of reasoning steps. Here's a summary of what I found so far..."
                    .to_string(),
            );
            return;
        }

        // 2. Cost limit.
        if state.cost_spent_usd >= state.cost_limit_usd {
            state.next_action = NextAction::Abort;
            state.abort_reason = Some(format!("Cost limit (${:.2}) reached", state.cost_limit_usd));
            state.final_answer = Some(format!(
                "I've reached the cost limit for this conversation (${:.2}). Summarizing what I found...",
                state.cost_limit_usd
            ));
            return;
        }

        // 3. Non-fatal 90% warning.
        if state.cost_limit_usd > 0.0 && state.cost_spent_usd >= 0.9 * state.cost_limit_usd {
            let pct = state.cost_spent_usd / state.cost_limit_usd * 100.0;
            state.budget_warning = Some(format!("Budget is {pct:.1}% used"));
        }

        // 4. Tool-call limit.
        if state.tools_used.len() >= state.max_tool_calls {
            state.next_action = NextAction::Abort;
            state.abort_reason = Some(format!("Tool call limit ({}) reached", state.max_tool_calls));
            state.final_answer =
                Some("I've used the maximum number of tool calls for this conversation. Based on what I found...".to_string());
            return;
        }

        // 5. Token budget + compression.
        let estimated_tokens: u64 =
            state.messages.iter().map(|m| CostEstimator::estimate_tokens(m.content.as_deref().unwrap_or(""))).sum();
        if (estimated_tokens as f64) > 0.8 * (state.token_budget as f64) {
            self.compress(state, llm).await;
        }

        // 6. Increment iterations.
        state.iterations += 1;

        // 7. Default next_action.
        if state.next_action != NextAction::Abort {
            state.next_action = if state.plan.is_none() {
                NextAction::Plan
            } else if !state.pending_tool_calls.is_empty() {
                NextAction::Execute
            } else {
                NextAction::Plan
            };
        }
    }

    async fn compress(&self, state: &mut AgentState, llm: Option<&dyn LlmClient>) {
        let keep = self.compaction_keep_recent;
        if state.messages.len() <= keep {
            return;
        }
        let split_at = state.messages.len() - keep;
        let old: Vec<ChatMessage> = state.messages[..split_at].to_vec();
        let recent: Vec<ChatMessage> = state.messages[split_at..].to_vec();

        let summary_parts: Vec<String> = old
            .iter()
            .map(|m| {
                let mut content = m.content.clone().unwrap_or_default();
                if content.len() > 100 {
                    content.truncate(100);
                    content.push_str("...");
                }
                format!("[{}]: {content}", m.role)
            })
            .collect();
        let joined = summary_parts.join("\n");
        let mut summary = format!("Previous conversation summary:\n{joined}");

        if let Some(llm) = llm {
            let prompt = format!(
                "Summarize this conversation history in 2-3 sentences, preserving key information and context:\n\n{joined}"
            );
            if let Ok(resp) = llm.ainvoke(&[ChatMessage::user(prompt)], None, "default", 0.3).await {
                if let Some(content) = resp.content {
                    summary = format!("Previous context: {content}");
                }
            }
        }

        let mut new_messages = vec![ChatMessage::system(summary.clone())];
        new_messages.extend(recent);
        state.messages = new_messages;
        state.compressed_history = Some(summary);
        state.compression_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::BudgetConfig;

    #[tokio::test]
    async fn aborts_at_iteration_limit() {
        let mut state = AgentState::new("hi", Vec::new(), &BudgetConfig { max_iterations: 1, ..Default::default() });
        state.iterations = 1;
        BudgetChecker::default().check(&mut state, None).await;
        assert_eq!(state.next_action, NextAction::Abort);
        assert!(state.abort_reason.unwrap().contains("iterations"));
    }

    #[tokio::test]
    async fn aborts_at_cost_limit() {
        let mut state = AgentState::new("hi", Vec::new(), &BudgetConfig { cost_limit_usd: 0.1, ..Default::default() });
        state.cost_spent_usd = 0.2;
        BudgetChecker::default().check(&mut state, None).await;
        assert_eq!(state.next_action, NextAction::Abort);
        assert!(state.abort_reason.unwrap().contains("Cost limit"));
    }

    #[tokio::test]
    async fn warns_without_aborting_at_ninety_percent() {
        let mut state = AgentState::new("hi", Vec::new(), &BudgetConfig { cost_limit_usd: 1.0, ..Default::default() });
        state.cost_spent_usd = 0.95;
        BudgetChecker::default().check(&mut state, None).await;
        assert_ne!(state.next_action, NextAction::Abort);
        assert!(state.budget_warning.is_some());
    }

    #[tokio::test]
    async fn aborts_at_tool_call_limit() {
        use agentflow_executor::ToolCallRecord;
        let mut state = AgentState::new("hi", Vec::new(), &BudgetConfig { max_tool_calls: 1, ..Default::default() });
        state.tools_used.push(ToolCallRecord {
            tool_name: "x".into(),
            tool_input: serde_json::json!({}),
            result: "ok".into(),
            success: true,
            duration_ms: 1,
            attempts: 1,
            error_type: None,
            cost_usd: 0.0,
        });
        BudgetChecker::default().check(&mut state, None).await;
        assert_eq!(state.next_action, NextAction::Abort);
    }

    #[tokio::test]
    async fn compresses_when_over_token_budget() {
        let mut state = AgentState::new("hi", Vec::new(), &BudgetConfig { token_budget: 10, ..Default::default() });
        for i in 0..10 {
            state.messages.push(ChatMessage::user(format!("message number {i} with some padding text")));
        }
        let before = state.messages.len();
        BudgetChecker::new(5).check(&mut state, None).await;
        assert_eq!(state.compression_count, 1);
        assert!(state.messages.len() < before);
        assert!(state.compressed_history.is_some());
    }

    #[tokio::test]
    async fn increments_iterations_and_picks_plan_by_default() {
        let mut state = AgentState::new("hi", Vec::new(), &BudgetConfig::default());
        BudgetChecker::default().check(&mut state, None).await;
        assert_eq!(state.iterations, 1);
        assert_eq!(state.next_action, NextAction::Plan);
    }

    #[tokio::test]
    async fn picks_execute_when_pending_tool_calls_present() {
        let mut state = AgentState::new("hi", Vec::new(), &BudgetConfig::default());
        state.plan = Some("do something".to_string());
        state.pending_tool_calls.push(agentflow_executor::PendingToolCall { tool: "web_search".into(), input: serde_json::json!({}) });
        BudgetChecker::default().check(&mut state, None).await;
        assert_eq!(state.next_action, NextAction::Execute);
    }
}
