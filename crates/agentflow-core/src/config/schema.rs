//! Typed configuration structs, populated from environment variables.

use super::env_keys;
use super::loader::{env_bool, env_f64, env_optional, env_or, env_usize};

/// LLM client connection settings.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
}

impl LlmConfig {
    pub fn from_env() -> Self {
        Self {
            api_base: env_or(env_keys::llm::AGENTFLOW_API_BASE, &[], || {
                "https://api.openai.com/v1".to_string()
            }),
            api_key: env_or(env_keys::llm::AGENTFLOW_API_KEY, &[], String::new),
            model: env_or(env_keys::llm::AGENTFLOW_MODEL, &[], || "gpt-4o".to_string()),
        }
    }
}

/// Filesystem / workspace paths.
#[derive(Debug, Clone)]
pub struct PathsConfig {
    pub workspace: String,
}

impl PathsConfig {
    pub fn from_env() -> Self {
        let default_workspace = std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .to_string_lossy()
            .to_string();
        Self {
            workspace: env_or(env_keys::misc::AGENTFLOW_WORKSPACE, &[], || default_workspace),
        }
    }
}

/// Sandbox execution mode (§4.4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SandboxMode {
    Docker,
    Subprocess,
    Disabled,
}

/// Sandbox resource caps and mode.
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    pub mode: SandboxMode,
    pub timeout_secs: u64,
    pub memory_mb: u64,
}

impl SandboxConfig {
    pub fn from_env() -> Self {
        let mode = match env_optional(env_keys::sandbox::AGENTFLOW_SANDBOX_MODE, &[])
            .unwrap_or_else(|| "docker".to_string())
            .to_lowercase()
            .as_str()
        {
            "subprocess" => SandboxMode::Subprocess,
            "disabled" => SandboxMode::Disabled,
            _ => SandboxMode::Docker,
        };
        Self {
            mode,
            timeout_secs: env_usize(env_keys::sandbox::AGENTFLOW_SANDBOX_TIMEOUT_SECS, 30) as u64,
            memory_mb: env_usize(env_keys::sandbox::AGENTFLOW_SANDBOX_MEMORY_MB, 256) as u64,
        }
    }
}

/// Graph-runner feature flags.
#[derive(Debug, Clone)]
pub struct GraphFeatureFlags {
    pub enable_checkpointing: bool,
    pub compaction_threshold: usize,
    pub compaction_keep_recent: usize,
}

impl GraphFeatureFlags {
    pub fn from_env() -> Self {
        Self {
            enable_checkpointing: env_bool(env_keys::graph::AGENTFLOW_ENABLE_CHECKPOINTING, &[], false),
            compaction_threshold: env_usize(env_keys::graph::AGENTFLOW_COMPACTION_THRESHOLD, 16),
            compaction_keep_recent: env_usize(env_keys::graph::AGENTFLOW_COMPACTION_KEEP_RECENT, 5),
        }
    }
}

/// Tracing / observability configuration (§4.12, §6).
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub tracing_enabled: bool,
    pub backend: String,
    pub sample_rate: f64,
    pub redact_pii: bool,
}

impl ObservabilityConfig {
    pub fn from_env() -> Self {
        Self {
            tracing_enabled: env_bool(env_keys::tracing::AGENTFLOW_TRACING_ENABLED, &[], true),
            backend: env_or(env_keys::tracing::AGENTFLOW_TRACING_BACKEND, &[], || "local".to_string()),
            sample_rate: env_f64(env_keys::tracing::AGENTFLOW_TRACING_SAMPLE_RATE, 1.0).clamp(0.0, 1.0),
            redact_pii: env_bool(env_keys::tracing::AGENTFLOW_TRACING_REDACT_PII, &[], true),
        }
    }
}
