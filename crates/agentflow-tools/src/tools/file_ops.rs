//! `file_read` (MODERATE) / `file_write` (DANGEROUS), grounded on
//! `examples/original_source/backend/airbeeps/agents/tools/file_operations.py`.
//! Path containment is delegated to `agentflow_security::validate_path_under_root`
//! rather than re-implementing the original's per-tool `_validate_path`.

use std::path::{Path, PathBuf};

use agentflow_core::SecurityLevel;
use agentflow_security::{validate_path_under_root, SecurityError};
use async_trait::async_trait;
use serde::Deserialize;

use crate::contract::AgentTool;
use crate::error::ToolError;

const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024;

pub struct FileReadTool {
    allowed_root: PathBuf,
    max_file_size: u64,
}

impl FileReadTool {
    pub fn new(allowed_root: impl Into<PathBuf>) -> Self {
        Self { allowed_root: allowed_root.into(), max_file_size: DEFAULT_MAX_FILE_SIZE }
    }

    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }
}

#[derive(Deserialize)]
struct ReadInput {
    path: String,
    #[serde(default)]
    max_lines: Option<usize>,
}

#[async_trait]
impl AgentTool for FileReadTool {
    fn name(&self) -> &str {
        "file_read"
    }

    fn description(&self) -> &str {
        "Read contents of a file. Only files within allowed directories can be read."
    }

    fn security_level(&self) -> SecurityLevel {
        SecurityLevel::Moderate
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "description": "Path to the file to read (relative to the allowed directory)"},
                "max_lines": {"type": "integer", "description": "Maximum number of lines to read (default: all)"},
            },
            "required": ["path"],
        })
    }

    async fn execute(&self, input: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let input: ReadInput = serde_json::from_value(input).map_err(|e| ToolError::InvalidInput(e.to_string()))?;
        let resolved = validate_path_under_root(&self.allowed_root, &input.path)?;

        let metadata = tokio::fs::metadata(&resolved).await.map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
        if !metadata.is_file() {
            return Err(ToolError::InvalidInput(format!("not a file: {}", input.path)));
        }
        if metadata.len() > self.max_file_size {
            return Err(ToolError::InvalidInput(format!(
                "file too large ({} bytes, max {})",
                metadata.len(),
                self.max_file_size
            )));
        }

        let bytes = tokio::fs::read(&resolved).await.map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
        let content = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => {
                let preview: Vec<u8> = e.into_bytes().into_iter().take(500).collect();
                return Ok(serde_json::json!({"binary": true, "preview_hex": hex_encode(&preview)}));
            }
        };

        let content = match input.max_lines {
            Some(n) => {
                let lines: Vec<&str> = content.split('\n').collect();
                if lines.len() > n {
                    format!("{}\n\n... (truncated, showing {} of {} lines)", lines[..n].join("\n"), n, lines.len())
                } else {
                    content
                }
            }
            None => content,
        };

        Ok(serde_json::json!({"path": input.path, "content": content}))
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

pub struct FileWriteTool {
    allowed_root: PathBuf,
    max_file_size: u64,
}

impl FileWriteTool {
    pub fn new(allowed_root: impl Into<PathBuf>) -> Self {
        Self { allowed_root: allowed_root.into(), max_file_size: DEFAULT_MAX_FILE_SIZE }
    }
}

#[derive(Deserialize)]
struct WriteInput {
    path: String,
    content: String,
    #[serde(default)]
    mode: WriteMode,
}

#[derive(Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
enum WriteMode {
    #[default]
    Overwrite,
    Append,
}

/// Validates that `path` (which need not exist yet) resolves under
/// `root`. Unlike `validate_path_under_root`, this only requires the
/// parent directory to exist, since `file_write` may create a new file.
fn validate_write_path(root: &Path, path: &str) -> Result<PathBuf, SecurityError> {
    if path.contains("..") {
        return Err(SecurityError::PathEscape(path.to_string()));
    }
    let root = root.canonicalize().map_err(|e| SecurityError::PathNotFound(format!("allowed root: {e}")))?;
    let input = Path::new(path);
    let full = if input.is_absolute() { input.to_path_buf() } else { root.join(input) };

    let parent = full.parent().unwrap_or(&root);
    let file_name = full.file_name().ok_or_else(|| SecurityError::PathEscape(path.to_string()))?;

    std::fs::create_dir_all(parent).map_err(|e| SecurityError::PathNotFound(e.to_string()))?;
    let canonical_parent = parent.canonicalize().map_err(|e| SecurityError::PathNotFound(e.to_string()))?;
    if !canonical_parent.starts_with(&root) {
        return Err(SecurityError::PathEscape(path.to_string()));
    }
    Ok(canonical_parent.join(file_name))
}

#[async_trait]
impl AgentTool for FileWriteTool {
    fn name(&self) -> &str {
        "file_write"
    }

    fn description(&self) -> &str {
        "Write content to a file. Only writes to allowed directories. Can create new files or overwrite existing ones."
    }

    fn security_level(&self) -> SecurityLevel {
        SecurityLevel::Dangerous
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "description": "Path to the file to write (relative to the allowed directory)"},
                "content": {"type": "string", "description": "Content to write to the file"},
                "mode": {"type": "string", "enum": ["overwrite", "append"], "description": "Write mode (default: overwrite)", "default": "overwrite"},
            },
            "required": ["path", "content"],
        })
    }

    async fn execute(&self, input: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let input: WriteInput = serde_json::from_value(input).map_err(|e| ToolError::InvalidInput(e.to_string()))?;
        if input.content.len() as u64 > self.max_file_size {
            return Err(ToolError::InvalidInput(format!(
                "content too large ({} bytes, max {})",
                input.content.len(),
                self.max_file_size
            )));
        }

        let resolved = validate_write_path(&self.allowed_root, &input.path)?;

        if input.mode == WriteMode::Append {
            use tokio::io::AsyncWriteExt;
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&resolved)
                .await
                .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
            file.write_all(input.content.as_bytes()).await.map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
        } else {
            tokio::fs::write(&resolved, &input.content).await.map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;
        }

        let bytes_written =
            tokio::fs::metadata(&resolved).await.map_err(|e| ToolError::ExecutionFailed(e.to_string()))?.len();
        Ok(serde_json::json!({"path": input.path, "bytes_written": bytes_written}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_file_within_allowed_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "hello").unwrap();
        let tool = FileReadTool::new(dir.path());
        let out = tool.execute(serde_json::json!({"path": "a.txt"})).await.unwrap();
        assert_eq!(out["content"], "hello");
    }

    #[tokio::test]
    async fn read_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("allowed")).unwrap();
        std::fs::write(dir.path().join("secret.txt"), "x").unwrap();
        let tool = FileReadTool::new(dir.path().join("allowed"));
        let err = tool.execute(serde_json::json!({"path": "../secret.txt"})).await.unwrap_err();
        assert!(matches!(err, ToolError::Security(_)));
    }

    #[tokio::test]
    async fn writes_new_file_within_allowed_root() {
        let dir = tempfile::tempdir().unwrap();
        let tool = FileWriteTool::new(dir.path());
        let out = tool.execute(serde_json::json!({"path": "out.txt", "content": "hi"})).await.unwrap();
        assert_eq!(out["bytes_written"], 2);
        assert_eq!(std::fs::read_to_string(dir.path().join("out.txt")).unwrap(), "hi");
    }

    #[tokio::test]
    async fn append_mode_appends_to_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("log.txt"), "a").unwrap();
        let tool = FileWriteTool::new(dir.path());
        tool.execute(serde_json::json!({"path": "log.txt", "content": "b", "mode": "append"})).await.unwrap();
        assert_eq!(std::fs::read_to_string(dir.path().join("log.txt")).unwrap(), "ab");
    }

    #[tokio::test]
    async fn write_rejects_traversal_out_of_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("allowed")).unwrap();
        let tool = FileWriteTool::new(dir.path().join("allowed"));
        let err = tool.execute(serde_json::json!({"path": "../escape.txt", "content": "x"})).await.unwrap_err();
        assert!(matches!(err, ToolError::Security(_)));
    }
}
