use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("tool '{0}' already registered")]
    DuplicateRegistration(String),

    #[error("invalid input for tool: {0}")]
    InvalidInput(String),

    #[error("tool execution failed: {0}")]
    ExecutionFailed(String),

    #[error(transparent)]
    Security(#[from] agentflow_security::SecurityError),

    #[error(transparent)]
    Sandbox(#[from] agentflow_sandbox::SandboxError),
}
