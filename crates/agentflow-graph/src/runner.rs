//! Graph topology and runner (spec §4.8), grounded on
//! `examples/original_source/.../agents/graph/builder.py`'s
//! `create_agent_graph`/`AgentGraphRunner`:
//!
//! ```text
//! budget_checker --[abort]--> responder --> END
//! budget_checker --[continue]--> planner --[respond]--> responder --> END
//!                                        --[execute]--> executor --> reflector --[continue]--> budget_checker (loop)
//!                                                                               --[respond]--> responder --> END
//! ```

use std::sync::Arc;

use agentflow_core::ChatMessage;

use crate::budget::BudgetChecker;
use crate::checkpoint::Checkpointer;
use crate::deps::NodeDeps;
use crate::events::{chunk_content, AgentEvent};
use crate::nodes::{executor, planner, reflector, responder};
use crate::state::{AgentState, BudgetConfig, NextAction};

/// Configuration for one graph run (spec §4.8's `AgentGraphConfig`).
#[derive(Clone)]
pub struct AgentGraphConfig {
    pub budget: BudgetConfig,
    pub compaction_keep_recent: usize,
    pub quality_threshold: f64,
    pub max_retries: usize,
    pub stream_chunk_size: usize,
}

impl Default for AgentGraphConfig {
    fn default() -> Self {
        Self {
            budget: BudgetConfig::default(),
            compaction_keep_recent: 5,
            quality_threshold: 7.0,
            max_retries: 3,
            stream_chunk_size: 40,
        }
    }
}

/// The outcome of one `execute` call (spec §4.8's runner return shape).
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub output: String,
    pub iterations: u32,
    pub token_usage: std::collections::HashMap<String, u64>,
    pub cost_spent: f64,
    pub tools_used: Vec<agentflow_executor::ToolCallRecord>,
    pub reflections: Vec<String>,
    /// Set when the budget checker or loop detector cut the run short
    /// before the planner chose to respond. `responder::run` already
    /// folds this into `output`'s text; callers that need a structured
    /// success/failure signal (e.g. tracing instrumentation) should use
    /// this field rather than sniffing the output text.
    pub abort_reason: Option<String>,
}

pub struct AgentGraphRunner {
    config: AgentGraphConfig,
    deps: NodeDeps,
    budget_checker: BudgetChecker,
    checkpointer: Option<Arc<dyn Checkpointer>>,
}

impl AgentGraphRunner {
    pub fn new(config: AgentGraphConfig, deps: NodeDeps, checkpointer: Option<Arc<dyn Checkpointer>>) -> Self {
        let budget_checker = BudgetChecker::new(config.compaction_keep_recent);
        Self { config, deps, budget_checker, checkpointer }
    }

    /// Build the initial state for `user_input`, restoring from `thread_id`'s
    /// checkpoint if one exists.
    async fn initial_state(&self, user_input: &str, chat_history: Vec<ChatMessage>, thread_id: Option<&str>) -> AgentState {
        if let (Some(thread_id), Some(checkpointer)) = (thread_id, self.checkpointer.as_ref()) {
            if let Some(state) = checkpointer.load(thread_id).await {
                return state;
            }
        }
        AgentState::new(user_input, chat_history, &self.config.budget)
    }

    async fn checkpoint(&self, thread_id: Option<&str>, state: &AgentState) {
        if let (Some(thread_id), Some(checkpointer)) = (thread_id, self.checkpointer.as_ref()) {
            checkpointer.save(thread_id, state).await;
        }
    }

    /// Run the graph to completion and return the final answer plus
    /// bookkeeping (spec §4.8's `AgentGraphRunner.run()`).
    pub async fn execute(&self, user_input: &str, chat_history: Vec<ChatMessage>, thread_id: Option<&str>) -> RunOutcome {
        let mut state = self.initial_state(user_input, chat_history, thread_id).await;

        // budget_checker routes to planner by default, but skips straight to
        // the executor when the reflector already queued `pending_tool_calls`
        // (step 7's "execute if pending tool calls present, else plan") so a
        // replan round doesn't discard a reflector-chosen retry.
        loop {
            self.budget_checker.check(&mut state, self.deps.llm.as_deref()).await;
            self.checkpoint(thread_id, &state).await;

            if state.next_action == NextAction::Abort {
                break;
            }

            if state.next_action != NextAction::Execute {
                planner::run(&mut state, &self.deps).await;
                self.checkpoint(thread_id, &state).await;

                if state.next_action == NextAction::Respond {
                    break;
                }
            }

            // planner --[execute]--> executor --> reflector (unconditional).
            executor::run(&mut state, &self.deps).await;
            self.checkpoint(thread_id, &state).await;

            reflector::run(&mut state, &self.deps).await;
            self.checkpoint(thread_id, &state).await;

            if state.next_action == NextAction::Respond {
                break;
            }
            // reflector --[continue]--> budget_checker (loop).
        }

        responder::run(&mut state, &self.deps).await;
        self.checkpoint(thread_id, &state).await;

        RunOutcome {
            output: state.final_answer.clone().unwrap_or_default(),
            iterations: state.iterations,
            token_usage: state.token_usage.clone(),
            cost_spent: state.cost_spent_usd,
            tools_used: state.tools_used.clone(),
            reflections: state.reflections.clone(),
            abort_reason: state.abort_reason.clone(),
        }
    }

    /// Run the graph, emitting ordered [`AgentEvent`]s as each node
    /// produces something observable (spec §4.8's `AgentGraphRunner.stream()`).
    pub async fn stream_execute(
        &self,
        user_input: &str,
        chat_history: Vec<ChatMessage>,
        thread_id: Option<&str>,
    ) -> Vec<AgentEvent> {
        let mut events = Vec::new();
        let mut state = self.initial_state(user_input, chat_history, thread_id).await;

        loop {
            self.budget_checker.check(&mut state, self.deps.llm.as_deref()).await;
            self.checkpoint(thread_id, &state).await;
            if let Some(warning) = state.budget_warning.take() {
                events.push(AgentEvent::BudgetWarning { message: warning });
            }

            if state.next_action == NextAction::Abort {
                break;
            }

            if state.next_action != NextAction::Execute {
                planner::run(&mut state, &self.deps).await;
                self.checkpoint(thread_id, &state).await;
                if let Some(plan) = state.plan.clone() {
                    events.push(AgentEvent::Planning { plan });
                }
                if state.next_action == NextAction::Respond {
                    break;
                }
            }

            let before = state.tools_used.len();
            executor::run(&mut state, &self.deps).await;
            self.checkpoint(thread_id, &state).await;
            for record in &state.tools_used[before..] {
                events.push(AgentEvent::AgentAction { tool: record.tool_name.clone(), input: record.tool_input.clone() });
                events.push(AgentEvent::AgentObservation {
                    tool: record.tool_name.clone(),
                    result: record.result.clone(),
                    success: record.success,
                });
            }

            reflector::run(&mut state, &self.deps).await;
            self.checkpoint(thread_id, &state).await;
            if let Some(reasoning) = state.reflections.last().cloned() {
                events.push(AgentEvent::Reflection { quality_score: state.quality_score, reasoning });
            }

            if state.next_action == NextAction::Respond {
                break;
            }
        }

        responder::run(&mut state, &self.deps).await;
        self.checkpoint(thread_id, &state).await;

        for (label, tokens) in &state.token_usage {
            events.push(AgentEvent::TokenUsage { label: label.clone(), tokens: *tokens });
        }

        let output = state.final_answer.clone().unwrap_or_default();
        events.extend(chunk_content(&output, self.config.stream_chunk_size));

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentflow_core::collaborators::testing::FakeLlmClient;
    use agentflow_executor::ExecutionContext;
    use agentflow_security::UserRole;
    use agentflow_tools::ToolRegistry;

    fn runner_with(llm: FakeLlmClient) -> AgentGraphRunner {
        let deps = NodeDeps {
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
        };
        AgentGraphRunner::new(AgentGraphConfig::default(), deps, None)
    }

    #[tokio::test]
    async fn direct_answer_resolves_without_looping() {
        let llm = FakeLlmClient::single(r#"{"needs_tools": false, "reasoning": "easy", "answer": "4"}"#);
        let runner = runner_with(llm);
        let outcome = runner.execute("what is 2+2", Vec::new(), None).await;
        assert_eq!(outcome.output, "4");
        assert_eq!(outcome.iterations, 1);
    }

    #[tokio::test]
    async fn missing_llm_still_produces_an_answer() {
        let deps = NodeDeps {
            registry: Arc::new(ToolRegistry::new()),
            tool_executor: crate::nodes::tests_support::dummy_executor(),
            llm: None,
            memory: None,
            ctx: ExecutionContext::new("u1", UserRole::User),
            assistant_id: "assistant-1".to_string(),
            model: "gpt-4o".to_string(),
            temperature: 0.7,
            quality_threshold: 7.0,
            max_retries: 3,
        };
        let runner = AgentGraphRunner::new(AgentGraphConfig::default(), deps, None);
        let outcome = runner.execute("hello", Vec::new(), None).await;
        assert!(!outcome.output.is_empty());
    }

    #[tokio::test]
    async fn checkpointing_persists_state_between_runs() {
        use crate::checkpoint::InMemoryCheckpointer;

        let llm = FakeLlmClient::single(r#"{"needs_tools": false, "reasoning": "easy", "answer": "done"}"#);
        let deps = NodeDeps {
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
        };
        let checkpointer = Arc::new(InMemoryCheckpointer::new());
        let runner = AgentGraphRunner::new(AgentGraphConfig::default(), deps, Some(checkpointer.clone()));
        runner.execute("hi", Vec::new(), Some("thread-1")).await;
        assert!(checkpointer.load("thread-1").await.is_some());
    }

    #[tokio::test]
    async fn stream_execute_ends_with_a_final_content_chunk() {
        let llm = FakeLlmClient::single(r#"{"needs_tools": false, "reasoning": "easy", "answer": "hi there"}"#);
        let runner = runner_with(llm);
        let events = runner.stream_execute("hello", Vec::new(), None).await;
        let last = events.last().unwrap();
        assert!(matches!(last, AgentEvent::ContentChunk { is_final: true, .. }));
    }
}
