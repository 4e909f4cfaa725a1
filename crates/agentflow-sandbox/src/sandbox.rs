//! Code sandbox entry point (spec §4.4.1): runs static validation in every
//! mode, then dispatches to the configured execution mode.

use crate::error::SandboxError;
use crate::modes::{self, ExecutionLimits, ExecutionResult, SandboxMode};
use crate::static_check;

/// Configuration for one sandbox instance.
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    pub mode: SandboxMode,
    pub limits: ExecutionLimits,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self { mode: SandboxMode::default(), limits: ExecutionLimits::default() }
    }
}

/// Code sandbox: static validation (always) + execution (mode-dependent).
pub struct Sandbox {
    config: SandboxConfig,
}

impl Sandbox {
    pub fn new(config: SandboxConfig) -> Self {
        Self { config }
    }

    /// Run `source`. Static validation failures short-circuit execution
    /// with a failed `ExecutionResult` (the first violation found, matching
    /// the first-match-wins order of the original validator) and never
    /// invoke the mode backend, in every mode including `Disabled`.
    pub async fn run(&self, source: &str) -> Result<ExecutionResult, SandboxError> {
        let violations = static_check::scan(source)?;
        if let Some(violation) = violations.first() {
            return Ok(ExecutionResult {
                success: false,
                stdout: String::new(),
                stderr: String::new(),
                return_value: None,
                execution_time_ms: 0,
                memory_used_mb: None,
                error_message: Some(violation.to_string()),
                was_timeout: false,
                was_memory_limit: false,
            });
        }
        modes::execute(self.config.mode, source, self.config.limits).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_disallowed_import_before_execution() {
        let sandbox = Sandbox::new(SandboxConfig { mode: SandboxMode::Disabled, ..Default::default() });
        let result = sandbox.run("import os\nos.system('echo hi')\n").await.unwrap();
        assert!(!result.success);
        assert!(result.error_message.unwrap().contains("Import of 'os' is not allowed"));
    }
}
