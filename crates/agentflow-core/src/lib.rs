//! Shared vocabulary for the workspace: env configuration, error taxonomy,
//! resilience primitives (retry, circuit breaker), cost estimation, wire
//! types, and the external collaborator contracts (spec §6).
//!
//! Everything else in the workspace (`agentflow-security`, `agentflow-tools`,
//! `agentflow-graph`, `agentflow-executor`, `agentflow-orchestrator`,
//! `agentflow-jobqueue`, `agentflow-tracing`) depends on this crate; it has
//! no dependency on any sibling crate.

pub mod circuit_breaker;
pub mod collaborators;
pub mod config;
pub mod cost;
pub mod error;
pub mod pii;
pub mod process_context;
pub mod retry;
pub mod types;

pub use circuit_breaker::{Admission, BreakerConfig, BreakerState, CircuitBreaker, CircuitBreakerRegistry};
pub use collaborators::{LlmClient, LlmResponse, MemoryItem, MemoryService, RetrievalClient, RetrievedChunk, TokenUsage};
pub use cost::{CostEstimator, ModelPrice, PriceTable};
pub use error::AgentError;
pub use pii::PiiRedactor;
pub use process_context::ProcessContext;
pub use retry::{retry, RetryConfig};
pub use types::{
    extract_widest_json_object, AssistantConfig, ChatMessage, FunctionCall, FunctionDef, SecurityLevel, SpecialistType,
    ToolCall, ToolDefinition, ToolPriority,
};
