//! External collaborator interfaces (spec §6).
//!
//! These are narrow trait contracts only — the real LLM provider client,
//! retrieval engine, and memory service are out of scope for this crate
//! (spec §1) and are assumed to exist behind these traits.

use async_trait::async_trait;

use crate::types::ChatMessage;

/// Usage accounting returned alongside an LLM response.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// Result of an LLM invocation.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: Option<String>,
    pub tool_calls: Option<Vec<crate::types::ToolCall>>,
    pub usage: TokenUsage,
}

/// LLM client contract (spec §6): `ainvoke(messages) -> {content, usage}`.
/// Implementations must be cancellable — i.e. the future they return must
/// honor `tokio` cancellation when dropped, which any well-behaved async fn
/// already does.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn ainvoke(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[crate::types::ToolDefinition]>,
        model: &str,
        temperature: f64,
    ) -> anyhow::Result<LlmResponse>;
}

/// A recalled memory item.
#[derive(Debug, Clone)]
pub struct MemoryItem {
    pub memory_type: String,
    pub content: String,
}

/// Memory/embedding service contract (spec §6). Optional: the planner
/// degrades gracefully if no implementation is configured.
#[async_trait]
pub trait MemoryService: Send + Sync {
    async fn recall_memories(
        &self,
        query: &str,
        assistant_id: &str,
        user_id: &str,
        top_k: usize,
    ) -> anyhow::Result<Vec<MemoryItem>>;
}

/// A retrieved document chunk.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub content: String,
    pub score: f64,
    pub metadata: serde_json::Value,
}

/// RAG retrieval contract (spec §6): `retrieve(query, kb_id, k) -> [...]`.
/// Consumed by tool implementations, not owned by the core.
#[async_trait]
pub trait RetrievalClient: Send + Sync {
    async fn retrieve(&self, query: &str, kb_id: &str, k: usize) -> anyhow::Result<Vec<RetrievedChunk>>;
}

/// Test doubles for the three collaborator traits above. Gated behind the
/// `testing` feature so dependent crates can pull them into their own test
/// suites without shipping them in release builds.
#[cfg(feature = "testing")]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Scripted LLM client: returns queued responses in order, looping the
    /// last one once exhausted.
    pub struct FakeLlmClient {
        responses: Mutex<Vec<LlmResponse>>,
        pub calls: Mutex<Vec<String>>,
    }

    impl FakeLlmClient {
        pub fn new(responses: Vec<LlmResponse>) -> Self {
            Self { responses: Mutex::new(responses), calls: Mutex::new(Vec::new()) }
        }

        pub fn single(content: impl Into<String>) -> Self {
            Self::new(vec![LlmResponse { content: Some(content.into()), tool_calls: None, usage: TokenUsage::default() }])
        }
    }

    #[async_trait]
    impl LlmClient for FakeLlmClient {
        async fn ainvoke(
            &self,
            messages: &[ChatMessage],
            _tools: Option<&[crate::types::ToolDefinition]>,
            _model: &str,
            _temperature: f64,
        ) -> anyhow::Result<LlmResponse> {
            let last_user = messages.iter().rev().find(|m| m.role == "user").and_then(|m| m.content.clone());
            self.calls.lock().unwrap().push(last_user.unwrap_or_default());
            let mut queue = self.responses.lock().unwrap();
            if queue.len() > 1 {
                Ok(queue.remove(0))
            } else {
                Ok(queue.first().cloned().unwrap_or(LlmResponse {
                    content: Some(String::new()),
                    tool_calls: None,
                    usage: TokenUsage::default(),
                }))
            }
        }
    }

    /// Memory service returning a fixed, canned set of memories.
    pub struct FakeMemoryService {
        pub memories: Vec<MemoryItem>,
    }

    #[async_trait]
    impl MemoryService for FakeMemoryService {
        async fn recall_memories(
            &self,
            _query: &str,
            _assistant_id: &str,
            _user_id: &str,
            top_k: usize,
        ) -> anyhow::Result<Vec<MemoryItem>> {
            Ok(self.memories.iter().take(top_k).cloned().collect())
        }
    }

    /// Retrieval client returning a fixed, canned set of chunks.
    pub struct FakeRetrievalClient {
        pub chunks: Vec<RetrievedChunk>,
    }

    #[async_trait]
    impl RetrievalClient for FakeRetrievalClient {
        async fn retrieve(&self, _query: &str, _kb_id: &str, k: usize) -> anyhow::Result<Vec<RetrievedChunk>> {
            Ok(self.chunks.iter().take(k).cloned().collect())
        }
    }
}
