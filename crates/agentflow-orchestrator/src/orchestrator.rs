//! Multi-agent orchestrator (spec §4.10), grounded on
//! `examples/original_source/.../agents/specialist/orchestrator.py`'s
//! `MultiAgentOrchestrator`: routes to an initial specialist, then follows
//! handoff requests between specialists with loop detection and a shared
//! budget, recording an append-only `Vec<CollaborationStep>` the way
//! `AgentState` records `tools_used`/`reflections`.

use std::collections::HashMap;
use std::sync::Arc;

use agentflow_core::ChatMessage;
use agentflow_graph::AgentGraphRunner;

use crate::events::CollaborationEvent;
use crate::router::AgentRouter;
use crate::types::{get_specialist_config, SpecialistConfig, SpecialistType};

/// Collaboration-wide caps (spec §4.10's `AgentCollaborationConfig`).
#[derive(Debug, Clone)]
pub struct AgentCollaborationConfig {
    pub max_handoffs: u32,
    pub max_total_iterations: u32,
    pub cost_limit_usd: f64,
    pub cost_limit_per_handoff: f64,
    pub loop_detection_window: usize,
    /// Reserved for concurrent specialist execution; not implemented.
    pub enable_parallel_specialists: bool,
}

impl Default for AgentCollaborationConfig {
    fn default() -> Self {
        Self {
            max_handoffs: 3,
            max_total_iterations: 15,
            cost_limit_usd: 1.00,
            cost_limit_per_handoff: 0.25,
            loop_detection_window: 4,
            enable_parallel_specialists: false,
        }
    }
}

/// Record of one specialist's turn (spec §4.10's `CollaborationStep`).
#[derive(Debug, Clone)]
pub struct CollaborationStep {
    pub step_number: usize,
    pub specialist_type: SpecialistType,
    pub input_context: String,
    pub output: String,
    pub iterations: u32,
    pub cost_usd: f64,
    pub duration_ms: f64,
    pub handoff_requested: Option<SpecialistType>,
}

/// Why a collaboration ended without producing a normal answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollaborationErrorType {
    LoopDetected,
    BudgetExceeded,
    MaxIterations,
    NoSpecialist,
}

impl CollaborationErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollaborationErrorType::LoopDetected => "LOOP_DETECTED",
            CollaborationErrorType::BudgetExceeded => "BUDGET_EXCEEDED",
            CollaborationErrorType::MaxIterations => "MAX_ITERATIONS",
            CollaborationErrorType::NoSpecialist => "NO_SPECIALIST",
        }
    }
}

/// Outcome of a full collaboration run (spec §4.10).
#[derive(Debug, Clone)]
pub struct CollaborationResult {
    pub success: bool,
    pub final_output: String,
    pub steps: Vec<CollaborationStep>,
    pub total_iterations: u32,
    pub total_cost_usd: f64,
    pub total_duration_ms: f64,
    pub error: Option<String>,
    pub error_type: Option<CollaborationErrorType>,
    pub agent_chain: Vec<SpecialistType>,
}

pub struct MultiAgentOrchestrator {
    router: AgentRouter,
    config: AgentCollaborationConfig,
}

impl MultiAgentOrchestrator {
    pub fn new(router: AgentRouter, config: AgentCollaborationConfig) -> Self {
        Self { router, config }
    }

    /// Run a collaboration to completion (spec §4.10's `execute`).
    ///
    /// `assistants` mirrors the original's `assistants: dict[SpecialistType, Any]`:
    /// a pre-built runner per available specialist.
    pub async fn execute(
        &self,
        user_input: &str,
        assistants: &HashMap<SpecialistType, Arc<AgentGraphRunner>>,
        chat_history: Vec<ChatMessage>,
    ) -> CollaborationResult {
        let started = std::time::Instant::now();

        let available: Vec<SpecialistType> = assistants.keys().copied().collect();
        let routing = self.router.route(user_input, &available).await;

        let mut agent_chain = vec![routing.specialist_type];
        let mut current_specialist = routing.specialist_type;
        let mut current_context = user_input.to_string();
        let mut steps: Vec<CollaborationStep> = Vec::new();
        let mut total_iterations = 0u32;
        let mut total_cost = 0.0f64;
        let mut handoff_count = 0u32;

        tracing::info!(
            specialist = current_specialist.as_str(),
            confidence = routing.confidence,
            "starting multi-agent collaboration"
        );

        while handoff_count <= self.config.max_handoffs {
            if detect_loop(&agent_chain, self.config.loop_detection_window) {
                return CollaborationResult {
                    success: false,
                    final_output: "I encountered a loop while trying to answer your question. Let me provide what I have so far.".to_string(),
                    steps,
                    total_iterations,
                    total_cost_usd: total_cost,
                    total_duration_ms: started.elapsed().as_secs_f64() * 1000.0,
                    error: Some("Loop detected in agent collaboration".to_string()),
                    error_type: Some(CollaborationErrorType::LoopDetected),
                    agent_chain,
                };
            }

            if total_cost >= self.config.cost_limit_usd {
                return CollaborationResult {
                    success: false,
                    final_output: "I've reached the cost limit for this request. Here's what I found so far.".to_string(),
                    steps,
                    total_iterations,
                    total_cost_usd: total_cost,
                    total_duration_ms: started.elapsed().as_secs_f64() * 1000.0,
                    error: Some("Cost limit exceeded".to_string()),
                    error_type: Some(CollaborationErrorType::BudgetExceeded),
                    agent_chain,
                };
            }

            if total_iterations >= self.config.max_total_iterations {
                return CollaborationResult {
                    success: false,
                    final_output: "I've reached the maximum number of steps for this request.".to_string(),
                    steps,
                    total_iterations,
                    total_cost_usd: total_cost,
                    total_duration_ms: started.elapsed().as_secs_f64() * 1000.0,
                    error: Some("Max iterations exceeded".to_string()),
                    error_type: Some(CollaborationErrorType::MaxIterations),
                    agent_chain,
                };
            }

            let spec_config = get_specialist_config(self.router.configs(), current_specialist);

            let mut runner = assistants.get(&current_specialist);
            if runner.is_none() && current_specialist != SpecialistType::General {
                current_specialist = SpecialistType::General;
                runner = assistants.get(&current_specialist);
            }

            let Some(runner) = runner else {
                return CollaborationResult {
                    success: false,
                    final_output: "I don't have the right specialist available for this task.".to_string(),
                    steps,
                    total_iterations,
                    total_cost_usd: total_cost,
                    total_duration_ms: started.elapsed().as_secs_f64() * 1000.0,
                    error: Some(format!("No assistant for specialist type: {}", current_specialist.as_str())),
                    error_type: Some(CollaborationErrorType::NoSpecialist),
                    agent_chain,
                };
            };

            let step_prompt = build_specialist_prompt(&current_context, &steps);
            let step_started = std::time::Instant::now();
            let outcome = runner.execute(&step_prompt, chat_history.clone(), None).await;
            let step_duration_ms = step_started.elapsed().as_secs_f64() * 1000.0;

            let step_output = outcome.output;
            let step_iterations = outcome.iterations;
            let step_cost = outcome.cost_spent;

            let handoff_requested = self.router.parse_handoff_request(&step_output);

            steps.push(CollaborationStep {
                step_number: steps.len() + 1,
                specialist_type: current_specialist,
                input_context: truncate(&current_context, 500),
                output: step_output.clone(),
                iterations: step_iterations,
                cost_usd: step_cost,
                duration_ms: step_duration_ms,
                handoff_requested,
            });

            total_iterations += step_iterations;
            total_cost += step_cost;

            match handoff_requested {
                Some(target) if spec_config.can_handoff_to.contains(&target) && assistants.contains_key(&target) => {
                    current_context = prepare_handoff_context(user_input, &step_output, current_specialist, target);
                    current_specialist = target;
                    agent_chain.push(current_specialist);
                    handoff_count += 1;
                    tracing::info!(from = ?agent_chain[agent_chain.len() - 2], to = ?current_specialist, "handoff");
                }
                _ => break,
            }
        }

        let final_output = steps.last().map(|s| clean_handoff_markers(&s.output)).unwrap_or_else(|| "Unable to process request".to_string());

        CollaborationResult {
            success: true,
            final_output,
            steps,
            total_iterations,
            total_cost_usd: total_cost,
            total_duration_ms: started.elapsed().as_secs_f64() * 1000.0,
            error: None,
            error_type: None,
            agent_chain,
        }
    }

    /// Run a collaboration, emitting [`CollaborationEvent`]s for routing,
    /// handoffs, and each specialist's own node-level events (spec §4.10's
    /// `stream_execute`).
    pub async fn stream_execute(
        &self,
        user_input: &str,
        assistants: &HashMap<SpecialistType, Arc<AgentGraphRunner>>,
        chat_history: Vec<ChatMessage>,
    ) -> Vec<CollaborationEvent> {
        let started = std::time::Instant::now();
        let mut events = Vec::new();

        let available: Vec<SpecialistType> = assistants.keys().copied().collect();
        let routing = self.router.route(user_input, &available).await;

        let mut current_specialist = routing.specialist_type;
        let mut agent_chain = vec![current_specialist];
        events.push(CollaborationEvent::Routing {
            specialist: current_specialist,
            confidence: routing.confidence,
            reasoning: routing.reasoning,
        });

        let mut handoff_count = 0u32;
        let mut current_context = user_input.to_string();

        loop {
            if detect_loop(&agent_chain, self.config.loop_detection_window) {
                events.push(CollaborationEvent::Error {
                    error: "LOOP_DETECTED".to_string(),
                    message: "Loop detected in agent collaboration".to_string(),
                });
                return events;
            }

            let Some(runner) = assistants.get(&current_specialist) else {
                events.push(CollaborationEvent::Error {
                    error: "NO_SPECIALIST".to_string(),
                    message: format!("No assistant for {}", current_specialist.as_str()),
                });
                return events;
            };

            let spec_config = get_specialist_config(self.router.configs(), current_specialist);
            events.push(CollaborationEvent::SpecialistStart {
                specialist: current_specialist,
                specialist_name: spec_config.name(),
                step_number: handoff_count + 1,
            });

            let step_prompt = build_specialist_prompt(&current_context, &[]);
            let node_events = runner.stream_execute(&step_prompt, chat_history.clone(), None).await;

            let mut step_output = String::new();
            for event in node_events {
                if let agentflow_graph::AgentEvent::ContentChunk { ref chunk, .. } = event {
                    step_output.push_str(chunk);
                }
                events.push(CollaborationEvent::Specialist { specialist: current_specialist, event });
            }

            let handoff_requested = self.router.parse_handoff_request(&step_output);

            if let Some(target) = handoff_requested.filter(|t| spec_config.can_handoff_to.contains(t) && assistants.contains_key(t)) {
                events.push(CollaborationEvent::Handoff {
                    from_specialist: current_specialist,
                    to_specialist: target,
                    handoff_number: handoff_count + 1,
                });

                current_context = prepare_handoff_context(user_input, &step_output, current_specialist, target);
                current_specialist = target;
                agent_chain.push(current_specialist);
                handoff_count += 1;

                if handoff_count > self.config.max_handoffs {
                    break;
                }
                continue;
            }

            break;
        }

        events.push(CollaborationEvent::CollaborationComplete {
            agent_chain: agent_chain.clone(),
            handoff_count,
            total_duration_ms: started.elapsed().as_secs_f64() * 1000.0,
        });

        events
    }
}

/// Loop detection (spec §4.10): any of three heuristics firing ends the run.
fn detect_loop(agent_chain: &[SpecialistType], window: usize) -> bool {
    if agent_chain.len() < 3 {
        return false;
    }

    let recent3 = &agent_chain[agent_chain.len() - 3..];
    if recent3[0] == recent3[2] {
        return true;
    }

    if agent_chain.len() >= window * 2 {
        let recent = &agent_chain[agent_chain.len() - window * 2..];
        let (first_half, second_half) = recent.split_at(window);
        if first_half == second_half {
            return true;
        }
    }

    let window_slice = if agent_chain.len() >= window { &agent_chain[agent_chain.len() - window..] } else { agent_chain };
    for specialist in SpecialistType::ALL {
        if window_slice.iter().filter(|s| **s == specialist).count() >= 3 {
            return true;
        }
    }

    false
}

fn build_specialist_prompt(user_input: &str, previous_steps: &[CollaborationStep]) -> String {
    if previous_steps.is_empty() {
        return user_input.to_string();
    }
    let mut parts = vec!["Previous work done by other specialists:".to_string()];
    for step in previous_steps.iter().rev().take(2).collect::<Vec<_>>().into_iter().rev() {
        parts.push(format!("\n[{}]:\n{}", step.specialist_type.as_str(), truncate(&step.output, 500)));
    }
    parts.push("\n---\n".to_string());
    parts.push(user_input.to_string());
    parts.join("\n")
}

fn prepare_handoff_context(original_input: &str, previous_output: &str, from: SpecialistType, _to: SpecialistType) -> String {
    let clean_output = clean_handoff_markers(previous_output);
    format!(
        "Original request: {original_input}\n\nThe {} specialist has done some work and needs your help:\n\n{clean_output}\n\nPlease continue working on the original request using your specialized tools.",
        from.as_str()
    )
}

fn clean_handoff_markers(text: &str) -> String {
    text.replace("NEED_RESEARCH", "").replace("NEED_CODE", "").replace("NEED_DATA", "").trim().to_string()
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars).collect();
    truncated.push_str("...");
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_b_a_pattern_is_a_loop() {
        let chain = vec![SpecialistType::Research, SpecialistType::Code, SpecialistType::Research];
        assert!(detect_loop(&chain, 4));
    }

    #[test]
    fn short_chain_is_never_a_loop() {
        let chain = vec![SpecialistType::Research, SpecialistType::Code];
        assert!(!detect_loop(&chain, 4));
    }

    #[test]
    fn repeated_halves_are_a_loop() {
        let chain = vec![
            SpecialistType::Research,
            SpecialistType::Code,
            SpecialistType::Data,
            SpecialistType::General,
            SpecialistType::Research,
            SpecialistType::Code,
            SpecialistType::Data,
            SpecialistType::General,
        ];
        assert!(detect_loop(&chain, 4));
    }

    #[test]
    fn same_specialist_three_times_in_window_is_a_loop() {
        let chain = vec![SpecialistType::Code, SpecialistType::Research, SpecialistType::Code, SpecialistType::General, SpecialistType::Code];
        assert!(detect_loop(&chain, 4));
    }

    #[test]
    fn clean_handoff_markers_strips_all_tokens() {
        let cleaned = clean_handoff_markers("done here. NEED_DATA please");
        assert_eq!(cleaned, "done here.  please");
    }

    fn runner_with(llm_response: &str) -> Arc<AgentGraphRunner> {
        use agentflow_core::collaborators::testing::FakeLlmClient;
        use agentflow_executor::{ExecutionContext, ParallelToolExecutor, ToolExecutionConfig};
        use agentflow_graph::{AgentGraphConfig, NodeDeps};
        use agentflow_security::{ContentFilter, InMemoryApprovalStore, PermissionChecker, UserRole};
        use agentflow_tools::ToolRegistry;

        let permissions = Arc::new(PermissionChecker::new(std::collections::HashMap::new(), Arc::new(InMemoryApprovalStore::new())));
        let content_filter = Arc::new(ContentFilter::new(vec![], true));
        let tool_executor =
            Arc::new(ParallelToolExecutor::new(Arc::new(ToolRegistry::new()), permissions, content_filter, ToolExecutionConfig::default()));

        let deps = NodeDeps {
            registry: Arc::new(ToolRegistry::new()),
            tool_executor,
            llm: Some(Arc::new(FakeLlmClient::single(llm_response))),
            memory: None,
            ctx: ExecutionContext::new("u1", UserRole::User),
            assistant_id: "assistant-1".to_string(),
            model: "gpt-4o".to_string(),
            temperature: 0.7,
            quality_threshold: 7.0,
            max_retries: 3,
        };

        Arc::new(AgentGraphRunner::new(AgentGraphConfig::default(), deps, None))
    }

    #[tokio::test]
    async fn general_specialist_answers_without_handoff() {
        let router = AgentRouter::new(None, false, 0.7);
        let orchestrator = MultiAgentOrchestrator::new(router, AgentCollaborationConfig::default());

        let mut assistants = HashMap::new();
        assistants.insert(
            SpecialistType::General,
            runner_with(r#"{"needs_tools": false, "reasoning": "simple", "answer": "Hello there."}"#),
        );

        let result = orchestrator.execute("hi there", &assistants, Vec::new()).await;

        assert!(result.success);
        assert_eq!(result.agent_chain, vec![SpecialistType::General]);
        assert_eq!(result.final_output, "Hello there.");
        assert_eq!(result.steps.len(), 1);
    }

    #[tokio::test]
    async fn handoff_to_available_specialist_is_followed() {
        let router = AgentRouter::new(None, false, 0.7);
        let orchestrator = MultiAgentOrchestrator::new(router, AgentCollaborationConfig::default());

        let mut assistants = HashMap::new();
        assistants.insert(
            SpecialistType::General,
            runner_with(r#"{"needs_tools": false, "reasoning": "need code", "answer": "NEED_CODE please help"}"#),
        );
        assistants.insert(
            SpecialistType::Code,
            runner_with(r#"{"needs_tools": false, "reasoning": "done", "answer": "Fixed the bug."}"#),
        );

        let result = orchestrator.execute("can you fix this for me", &assistants, Vec::new()).await;

        assert!(result.success);
        assert_eq!(result.agent_chain, vec![SpecialistType::General, SpecialistType::Code]);
        assert_eq!(result.final_output, "Fixed the bug.");
        assert_eq!(result.steps.len(), 2);
    }

    #[tokio::test]
    async fn missing_specialist_falls_back_to_general_then_no_specialist() {
        let router = AgentRouter::new(None, false, 0.7);
        let orchestrator = MultiAgentOrchestrator::new(router, AgentCollaborationConfig::default());

        let assistants: HashMap<SpecialistType, Arc<AgentGraphRunner>> = HashMap::new();
        let result = orchestrator.execute("search for something", &assistants, Vec::new()).await;

        assert!(!result.success);
        assert_eq!(result.error_type, Some(CollaborationErrorType::NoSpecialist));
    }
}
