//! Sandbox execution modes (spec §4.4.1): `Docker` (default), `Subprocess`
//! (dev), `Disabled` (trusted only).
//!
//! Enum-dispatch shape mirrors `skilllite-sandbox::sandbox_backend`'s
//! `SandboxBackend` trait; `DOCKER` shells out via `tokio::process::Command`
//! the way the teacher's `runner.rs` invokes its platform backends.

use std::io::Write;
use std::process::Stdio;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::SandboxError;

/// Execution mode selector (spec §4.4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SandboxMode {
    Docker,
    Subprocess,
    Disabled,
}

impl Default for SandboxMode {
    fn default() -> Self {
        SandboxMode::Docker
    }
}

/// Execution limits (spec §4.4.1).
#[derive(Debug, Clone, Copy)]
pub struct ExecutionLimits {
    pub timeout: Duration,
    pub memory_mb: u64,
    pub cpus: f64,
    pub max_output_bytes: usize,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(30), memory_mb: 256, cpus: 1.0, max_output_bytes: 1024 * 1024 }
    }
}

/// Result of a sandboxed execution (spec §4.4.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub return_value: Option<serde_json::Value>,
    pub execution_time_ms: u64,
    pub memory_used_mb: Option<u64>,
    pub error_message: Option<String>,
    pub was_timeout: bool,
    pub was_memory_limit: bool,
}

fn truncate_output(mut s: String, max_bytes: usize) -> String {
    if s.len() > max_bytes {
        s.truncate(max_bytes);
        s.push_str("\n... (truncated)");
    }
    s
}

/// Runs `source` under the configured mode. `Disabled` executes in-process
/// with no isolation at all and must only be reached for trusted code.
pub async fn execute(mode: SandboxMode, source: &str, limits: ExecutionLimits) -> Result<ExecutionResult, SandboxError> {
    match mode {
        SandboxMode::Docker => execute_docker(source, limits).await,
        SandboxMode::Subprocess => execute_subprocess(source, limits).await,
        SandboxMode::Disabled => execute_disabled(source, limits).await,
    }
}

async fn run_python_via(mut command: Command, source: &str, limits: ExecutionLimits) -> Result<ExecutionResult, SandboxError> {
    let started = Instant::now();
    command.stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::piped());
    let mut child = command.spawn().map_err(SandboxError::Io)?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(source.as_bytes()).await.ok();
    }

    let output = match tokio::time::timeout(limits.timeout, child.wait_with_output()).await {
        Ok(result) => result.map_err(SandboxError::Io)?,
        Err(_) => {
            return Ok(ExecutionResult {
                success: false,
                stdout: String::new(),
                stderr: String::new(),
                return_value: None,
                execution_time_ms: started.elapsed().as_millis() as u64,
                memory_used_mb: None,
                error_message: Some(format!("execution exceeded {}s timeout", limits.timeout.as_secs())),
                was_timeout: true,
                was_memory_limit: false,
            });
        }
    };

    let stdout = truncate_output(String::from_utf8_lossy(&output.stdout).into_owned(), limits.max_output_bytes);
    let stderr = truncate_output(String::from_utf8_lossy(&output.stderr).into_owned(), limits.max_output_bytes);
    let success = output.status.success();

    Ok(ExecutionResult {
        success,
        stdout,
        stderr: stderr.clone(),
        return_value: None,
        execution_time_ms: started.elapsed().as_millis() as u64,
        memory_used_mb: None,
        error_message: if success { None } else { Some(stderr) },
        was_timeout: false,
        was_memory_limit: false,
    })
}

/// `DOCKER` mode: no network namespace, read-only root fs, tmpfs-only
/// scratch, CPU quota (spec §4.4.1).
async fn execute_docker(source: &str, limits: ExecutionLimits) -> Result<ExecutionResult, SandboxError> {
    which::which("docker").map_err(|e| SandboxError::DockerUnavailable(e.to_string()))?;

    let mut command = Command::new("docker");
    command
        .arg("run")
        .arg("--rm")
        .arg("-i")
        .arg("--network")
        .arg("none")
        .arg("--read-only")
        .arg("--tmpfs")
        .arg("/tmp")
        .arg("--memory")
        .arg(format!("{}m", limits.memory_mb))
        .arg("--cpus")
        .arg(limits.cpus.to_string())
        .arg("python:3.12-slim")
        .arg("python3")
        .arg("-");

    run_python_via(command, source, limits).await
}

/// `SUBPROCESS` mode: same `python3 -` invocation without container
/// isolation, for local development.
async fn execute_subprocess(source: &str, limits: ExecutionLimits) -> Result<ExecutionResult, SandboxError> {
    let python = which::which("python3").map_err(|e| SandboxError::ExecutionFailed(format!("python3 not found: {e}")))?;
    let mut command = Command::new(python);
    command.arg("-");
    run_python_via(command, source, limits).await
}

/// `DISABLED` mode executes with no sandboxing at all. Static validation
/// (spec §4.4.1) still ran before this is reached; this mode exists for
/// trusted, already-vetted callers only.
async fn execute_disabled(source: &str, limits: ExecutionLimits) -> Result<ExecutionResult, SandboxError> {
    execute_subprocess(source, limits).await
}

#[allow(dead_code)]
fn _write_temp_script(source: &str) -> std::io::Result<tempfile::NamedTempFile> {
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(source.as_bytes())?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_mode_is_docker() {
        assert_eq!(SandboxMode::default(), SandboxMode::Docker);
    }

    #[test]
    fn default_limits_match_spec_defaults() {
        let limits = ExecutionLimits::default();
        assert_eq!(limits.timeout, Duration::from_secs(30));
        assert_eq!(limits.memory_mb, 256);
        assert_eq!(limits.max_output_bytes, 1024 * 1024);
    }

    #[test]
    fn truncate_output_appends_marker() {
        let s = "x".repeat(20);
        let truncated = truncate_output(s, 10);
        assert!(truncated.starts_with("xxxxxxxxxx"));
        assert!(truncated.ends_with("(truncated)"));
    }
}
