//! `knowledge_base_search` (SAFE), grounded on
//! `examples/original_source/backend/airbeeps/agents/tools/knowledge_base.py`'s
//! `KnowledgeBaseSearchTool` (the structured-result variant; the agentic
//! query-planning/self-RAG/multi-hop modes of `AgenticKnowledgeBaseTool` are
//! out of scope — spec §6 exposes only the flat `retrieve(query, kb_id, k)`
//! collaborator contract).

use std::sync::Arc;

use agentflow_core::{RetrievalClient, SecurityLevel};
use async_trait::async_trait;
use serde::Deserialize;

use crate::contract::AgentTool;
use crate::error::ToolError;

pub struct KnowledgeBaseSearchTool {
    client: Arc<dyn RetrievalClient>,
    default_kb_id: String,
}

impl KnowledgeBaseSearchTool {
    pub fn new(client: Arc<dyn RetrievalClient>, default_kb_id: impl Into<String>) -> Self {
        Self { client, default_kb_id: default_kb_id.into() }
    }
}

#[derive(Deserialize)]
struct Input {
    query: String,
    #[serde(default)]
    kb_id: Option<String>,
    #[serde(default = "default_top_k")]
    top_k: usize,
}

fn default_top_k() -> usize {
    5
}

#[async_trait]
impl AgentTool for KnowledgeBaseSearchTool {
    fn name(&self) -> &str {
        "knowledge_base_search"
    }

    fn description(&self) -> &str {
        "Search the knowledge base and return structured results with metadata."
    }

    fn security_level(&self) -> SecurityLevel {
        SecurityLevel::Safe
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "The search query"},
                "kb_id": {"type": "string", "description": "Knowledge base id to search (default: the configured default)"},
                "top_k": {"type": "integer", "description": "Number of results to return", "default": 5},
            },
            "required": ["query"],
        })
    }

    async fn execute(&self, input: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let input: Input = serde_json::from_value(input).map_err(|e| ToolError::InvalidInput(e.to_string()))?;
        let kb_id = input.kb_id.as_deref().unwrap_or(&self.default_kb_id);

        let mut results = self
            .client
            .retrieve(&input.query, kb_id, input.top_k)
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(input.top_k);

        Ok(serde_json::json!({
            "query": input.query,
            "results": results.iter().map(|r| serde_json::json!({
                "content": r.content,
                "score": r.score,
                "metadata": r.metadata,
            })).collect::<Vec<_>>(),
            "total": results.len(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentflow_core::collaborators::testing::FakeRetrievalClient;
    use agentflow_core::RetrievedChunk;

    #[tokio::test]
    async fn results_are_sorted_by_score_descending() {
        let client = Arc::new(FakeRetrievalClient {
            chunks: vec![
                RetrievedChunk { content: "low".into(), score: 0.2, metadata: serde_json::json!({}) },
                RetrievedChunk { content: "high".into(), score: 0.9, metadata: serde_json::json!({}) },
            ],
        });
        let tool = KnowledgeBaseSearchTool::new(client, "kb-default");
        let out = tool.execute(serde_json::json!({"query": "q", "top_k": 2})).await.unwrap();
        assert_eq!(out["results"][0]["content"], "high");
        assert_eq!(out["total"], 2);
    }

    #[tokio::test]
    async fn explicit_kb_id_overrides_default() {
        let client = Arc::new(FakeRetrievalClient { chunks: vec![] });
        let tool = KnowledgeBaseSearchTool::new(client, "kb-default");
        let out = tool.execute(serde_json::json!({"query": "q", "kb_id": "kb-other"})).await.unwrap();
        assert_eq!(out["total"], 0);
    }
}
