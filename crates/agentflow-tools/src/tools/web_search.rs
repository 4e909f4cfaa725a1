//! `web_search` (SAFE), grounded on
//! `examples/original_source/backend/airbeeps/agents/tools/web_search.py`.
//!
//! The original shops between Brave/Tavily/DuckDuckGo providers; that
//! provider selection is out of scope here (spec §1 — real web search is
//! external). Instead this queries the injected `RetrievalClient`-shaped
//! collaborator (spec §6) against a fixed `"__web__"` corpus id, the same
//! trait the knowledge-base tool uses.

use std::sync::Arc;

use agentflow_core::{RetrievalClient, SecurityLevel};
use async_trait::async_trait;
use serde::Deserialize;

use crate::contract::AgentTool;
use crate::error::ToolError;

const WEB_CORPUS_ID: &str = "__web__";

pub struct WebSearchTool {
    client: Arc<dyn RetrievalClient>,
}

impl WebSearchTool {
    pub fn new(client: Arc<dyn RetrievalClient>) -> Self {
        Self { client }
    }
}

#[derive(Deserialize)]
struct Input {
    query: String,
    #[serde(default = "default_num_results")]
    num_results: usize,
}

fn default_num_results() -> usize {
    5
}

#[async_trait]
impl AgentTool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for current information. Returns snippets with URLs. \
         Use this to find up-to-date information that may not be in your training data."
    }

    fn security_level(&self) -> SecurityLevel {
        SecurityLevel::Safe
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {"type": "string", "description": "The search query to look up on the web"},
                "num_results": {"type": "integer", "description": "Number of results to return (default: 5)", "default": 5, "minimum": 1, "maximum": 10},
            },
            "required": ["query"],
        })
    }

    async fn execute(&self, input: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let input: Input = serde_json::from_value(input).map_err(|e| ToolError::InvalidInput(e.to_string()))?;

        let chunks = self
            .client
            .retrieve(&input.query, WEB_CORPUS_ID, input.num_results)
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;

        if chunks.is_empty() {
            return Ok(serde_json::json!({"results": [], "summary": "No search results found."}));
        }

        let mut lines = vec!["Web search results:".to_string(), String::new()];
        for (i, chunk) in chunks.iter().enumerate() {
            lines.push(format!("[{}] {}", i + 1, chunk.content));
        }

        Ok(serde_json::json!({
            "results": chunks.iter().map(|c| serde_json::json!({"content": c.content, "score": c.score, "metadata": c.metadata})).collect::<Vec<_>>(),
            "summary": lines.join("\n"),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentflow_core::collaborators::testing::FakeRetrievalClient;
    use agentflow_core::RetrievedChunk;

    #[tokio::test]
    async fn returns_formatted_summary_and_structured_results() {
        let client = Arc::new(FakeRetrievalClient {
            chunks: vec![RetrievedChunk { content: "Rust 1.80 released".into(), score: 0.9, metadata: serde_json::json!({}) }],
        });
        let tool = WebSearchTool::new(client);
        let out = tool.execute(serde_json::json!({"query": "rust release"})).await.unwrap();
        assert_eq!(out["results"][0]["content"], "Rust 1.80 released");
        assert!(out["summary"].as_str().unwrap().contains("[1] Rust 1.80 released"));
    }

    #[tokio::test]
    async fn empty_results_report_no_results_found() {
        let client = Arc::new(FakeRetrievalClient { chunks: vec![] });
        let tool = WebSearchTool::new(client);
        let out = tool.execute(serde_json::json!({"query": "nothing"})).await.unwrap();
        assert_eq!(out["summary"], "No search results found.");
    }
}
