//! Recognized environment variable names (§6 of the spec), collected in one
//! place so the rest of the codebase never hand-writes a key string.

/// LLM client configuration.
pub mod llm {
    pub const AGENTFLOW_API_BASE: &str = "AGENTFLOW_API_BASE";
    pub const AGENTFLOW_API_KEY: &str = "AGENTFLOW_API_KEY";
    pub const AGENTFLOW_MODEL: &str = "AGENTFLOW_MODEL";
}

/// Sandbox configuration (§4.4.1).
pub mod sandbox {
    pub const AGENTFLOW_SANDBOX_MODE: &str = "AGENTFLOW_SANDBOX_MODE";
    pub const AGENTFLOW_SANDBOX_TIMEOUT_SECS: &str = "AGENTFLOW_SANDBOX_TIMEOUT_SECS";
    pub const AGENTFLOW_SANDBOX_MEMORY_MB: &str = "AGENTFLOW_SANDBOX_MEMORY_MB";
}

/// Graph / checkpointing configuration (§4.8).
pub mod graph {
    pub const AGENTFLOW_ENABLE_CHECKPOINTING: &str = "AGENTFLOW_ENABLE_CHECKPOINTING";
    pub const AGENTFLOW_COMPACTION_THRESHOLD: &str = "AGENTFLOW_COMPACTION_THRESHOLD";
    pub const AGENTFLOW_COMPACTION_KEEP_RECENT: &str = "AGENTFLOW_COMPACTION_KEEP_RECENT";
}

/// Tracing configuration (§4.12 / §6).
pub mod tracing {
    pub const AGENTFLOW_TRACING_ENABLED: &str = "AGENTFLOW_TRACING_ENABLED";
    pub const AGENTFLOW_TRACING_BACKEND: &str = "AGENTFLOW_TRACING_BACKEND";
    pub const AGENTFLOW_TRACING_SAMPLE_RATE: &str = "AGENTFLOW_TRACING_SAMPLE_RATE";
    pub const AGENTFLOW_TRACING_REDACT_PII: &str = "AGENTFLOW_TRACING_REDACT_PII";
    pub const AGENTFLOW_LOG_LEVEL: &str = "AGENTFLOW_LOG_LEVEL";
    pub const AGENTFLOW_LOG_JSON: &str = "AGENTFLOW_LOG_JSON";
    pub const AGENTFLOW_QUIET: &str = "AGENTFLOW_QUIET";
}

/// Misc per-process tunables.
pub mod misc {
    pub const AGENTFLOW_WORKSPACE: &str = "AGENTFLOW_WORKSPACE";
    pub const AGENTFLOW_MAX_PARALLEL_TOOLS: &str = "AGENTFLOW_MAX_PARALLEL_TOOLS";
}
