use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecurityError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("content blocked: {0}")]
    ContentBlocked(String),

    #[error("path escapes allowed root: {0}")]
    PathEscape(String),

    #[error("path does not exist: {0}")]
    PathNotFound(String),
}
