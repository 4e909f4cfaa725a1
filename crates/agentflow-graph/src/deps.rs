//! Shared collaborators each graph node needs (spec §6), bundled so the
//! runner builds them once per run instead of threading five parameters
//! through every node function.

use std::sync::Arc;

use agentflow_core::{LlmClient, MemoryService};
use agentflow_executor::{ExecutionContext, ParallelToolExecutor};
use agentflow_tools::ToolRegistry;

#[derive(Clone)]
pub struct NodeDeps {
    pub registry: Arc<ToolRegistry>,
    pub tool_executor: Arc<ParallelToolExecutor>,
    pub llm: Option<Arc<dyn LlmClient>>,
    pub memory: Option<Arc<dyn MemoryService>>,
    pub ctx: ExecutionContext,
    pub assistant_id: String,
    pub model: String,
    pub temperature: f64,
    pub quality_threshold: f64,
    pub max_retries: usize,
}
