//! Shared wiring for the demo commands: a tool registry, the security
//! gates, and the collaborator stubs (spec §6 — this binary exercises the
//! platform against the `testing`-feature fakes, not a real LLM/retrieval
//! backend, matching SPEC_FULL.md §16).

use std::sync::Arc;

use agentflow_core::collaborators::testing::{FakeLlmClient, FakeRetrievalClient};
use agentflow_core::{LlmClient, RetrievedChunk};
use agentflow_executor::{ExecutionContext, ParallelToolExecutor, ToolExecutionConfig};
use agentflow_graph::NodeDeps;
use agentflow_sandbox::{Sandbox, SandboxConfig};
use agentflow_security::{ContentFilter, InMemoryApprovalStore, PermissionChecker, UserRole};
use agentflow_tools::{DataAnalysisTool, ExecutePythonTool, FileReadTool, FileWriteTool, KnowledgeBaseSearchTool, ToolRegistry, WebSearchTool};

/// A canned reply used until a real LLM collaborator is wired in (spec §6:
/// the LLM is an external collaborator behind an interface contract only).
fn fake_llm(prompt: &str) -> Arc<dyn LlmClient> {
    Arc::new(FakeLlmClient::single(format!(
        "{{\"needs_tools\": false, \"answer\": \"(demo response to: {prompt})\"}}"
    )))
}

fn fake_retrieval() -> Arc<FakeRetrievalClient> {
    Arc::new(FakeRetrievalClient {
        chunks: vec![RetrievedChunk {
            content: "No retrieval backend is configured for this demo run.".to_string(),
            score: 1.0,
            metadata: serde_json::json!({}),
        }],
    })
}

fn build_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    let retrieval = fake_retrieval();
    registry.register(|| Arc::new(WebSearchTool::new(retrieval.clone()))).expect("web_search registration");
    registry
        .register(|| Arc::new(KnowledgeBaseSearchTool::new(retrieval, "default")))
        .expect("knowledge_base_search registration");
    registry.register(|| Arc::new(FileReadTool::new("."))).expect("file_read registration");
    registry.register(|| Arc::new(FileWriteTool::new("."))).expect("file_write registration");
    registry.register(|| Arc::new(DataAnalysisTool)).expect("data_analysis registration");
    registry
        .register(|| Arc::new(ExecutePythonTool::new(Sandbox::new(SandboxConfig::default()))))
        .expect("execute_python registration");
    registry
}

/// Build the collaborators a single graph run needs.
pub fn build_node_deps(model: &str, temperature: f64) -> NodeDeps {
    let registry = Arc::new(build_registry());
    let permissions = Arc::new(PermissionChecker::new(Default::default(), Arc::new(InMemoryApprovalStore::new())));
    let content_filter = Arc::new(ContentFilter::new(vec![".".to_string()], true));
    let tool_executor = Arc::new(ParallelToolExecutor::new(registry.clone(), permissions, content_filter, ToolExecutionConfig::default()));

    NodeDeps {
        registry,
        tool_executor,
        llm: Some(fake_llm(model)),
        memory: None,
        ctx: ExecutionContext::new("cli-user", UserRole::User),
        assistant_id: "cli-demo".to_string(),
        model: model.to_string(),
        temperature,
        quality_threshold: 7.0,
        max_retries: 3,
    }
}
