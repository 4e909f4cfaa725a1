use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("tool '{0}' is not registered")]
    UnknownTool(String),
}
