//! Error taxonomy (spec §7), shared across the workspace.
//!
//! Each crate additionally defines its own narrower `thiserror` enum for
//! crate-local failure modes; `AgentError` is the cross-crate vocabulary that
//! graph nodes, the executor, and the orchestrator all speak so they can
//! convert into transcript entries or abort reasons uniformly.

use thiserror::Error;

/// Errors surfaced by agent execution (spec §7).
#[derive(Debug, Error, Clone)]
pub enum AgentError {
    /// Invalid tool input, or permission denied — surfaced in the transcript,
    /// the graph continues.
    #[error("user input error: {0}")]
    UserInput(String),

    /// Classified as retryable (spec §4.5 item 5); retried with backoff.
    /// Becomes `ToolExecution` once retries are exhausted.
    #[error("retryable error: {0}")]
    Retryable(String),

    /// Terminal tool failure.
    #[error("tool execution failed: {0}")]
    ToolExecution(String),

    /// Raised by a circuit breaker in the `open` state.
    #[error("circuit open for dependency '{dependency}'")]
    CircuitOpen { dependency: String },

    /// Raised by the budget checker; the graph transitions to abort + responder.
    #[error("budget exceeded: {0}")]
    BudgetExceeded(String),

    /// Orchestrator-level: loop detected between specialists.
    #[error("loop detected: {0}")]
    LoopDetected(String),

    /// Static AST check failure in the code sandbox.
    #[error("sandbox violation: {0}")]
    SandboxViolation(String),

    /// Unexpected internal failure in a graph node.
    #[error("internal error: {0}")]
    FatalInternal(String),
}

impl AgentError {
    /// Stable machine-readable tag, used in span attributes and
    /// `CollaborationResult::error_type`.
    pub fn error_type(&self) -> &'static str {
        match self {
            AgentError::UserInput(_) => "USER_INPUT",
            AgentError::Retryable(_) => "RETRYABLE",
            AgentError::ToolExecution(_) => "TOOL_EXECUTION",
            AgentError::CircuitOpen { .. } => "CIRCUIT_OPEN",
            AgentError::BudgetExceeded(_) => "BUDGET_EXCEEDED",
            AgentError::LoopDetected(_) => "LOOP_DETECTED",
            AgentError::SandboxViolation(_) => "SANDBOX_VIOLATION",
            AgentError::FatalInternal(_) => "FATAL_INTERNAL",
        }
    }

    /// Whether this error class is retryable by the generic retry helper
    /// (spec §4.1's `retryable_predicate`).
    pub fn is_retryable(&self) -> bool {
        matches!(self, AgentError::Retryable(_))
    }
}
