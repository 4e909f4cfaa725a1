//! Parallel tool executor (spec §4.5): priority dispatch, concurrency
//! limits, per-tool timeouts, and retry classification, composed with the
//! security gates of `agentflow-security` and the tool set of
//! `agentflow-tools`.

pub mod error;
pub mod executor;
pub mod types;

pub use error::ExecutorError;
pub use executor::ParallelToolExecutor;
pub use types::{ExecutionContext, PendingToolCall, ToolCallRecord, ToolExecutionConfig};
