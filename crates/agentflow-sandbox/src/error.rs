use thiserror::Error;

#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("failed to parse source: {0}")]
    ParseFailure(String),

    #[error("docker not available: {0}")]
    DockerUnavailable(String),

    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
