//! Parallel tool executor (spec §4.5), grounded on
//! `examples/original_source/backend/airbeeps/agents/graph/nodes/executor.py`'s
//! `ParallelExecutor`: semaphore-bounded dispatch, per-tool timeouts, and
//! linear-backoff retry classification by error-message substring match.

use std::sync::Arc;
use std::time::Instant;

use agentflow_core::CostEstimator;
use agentflow_security::{ContentFilter, FilterAction, PermissionChecker};
use agentflow_tools::ToolRegistry;
use tokio::sync::Semaphore;

use crate::types::{ExecutionContext, PendingToolCall, ToolCallRecord, ToolExecutionConfig};

/// Executes a batch of pending tool calls under the security gates and the
/// concurrency/retry rules of spec §4.5.
pub struct ParallelToolExecutor {
    registry: Arc<ToolRegistry>,
    permissions: Arc<PermissionChecker>,
    content_filter: Arc<ContentFilter>,
    config: ToolExecutionConfig,
}

impl ParallelToolExecutor {
    pub fn new(
        registry: Arc<ToolRegistry>,
        permissions: Arc<PermissionChecker>,
        content_filter: Arc<ContentFilter>,
        config: ToolExecutionConfig,
    ) -> Self {
        Self { registry, permissions, content_filter, config }
    }

    /// Execute `calls` (already truncated to the caller's remaining-budget
    /// count) and return one [`ToolCallRecord`] per call, in the sorted
    /// dispatch order.
    pub async fn execute_batch(
        &self,
        calls: Vec<PendingToolCall>,
        remaining_tool_call_budget: usize,
        ctx: &ExecutionContext,
    ) -> Vec<ToolCallRecord> {
        // Step 1: drop calls beyond the remaining budget.
        let calls: Vec<PendingToolCall> = calls.into_iter().take(remaining_tool_call_budget).collect();

        // Step 2: stable-sort by descending priority; equal-priority calls
        // keep their relative input order (`sort_by_key` is stable).
        let mut ordered: Vec<PendingToolCall> = calls;
        ordered.sort_by_key(|call| std::cmp::Reverse(self.config.priority_for(&call.tool)));

        // Step 3: dispatch under a semaphore of size `max_concurrent`.
        let semaphore = Semaphore::new(self.config.max_concurrent);
        let futures = ordered.iter().map(|call| async {
            let _permit = semaphore.acquire().await.expect("semaphore never closed");
            self.execute_with_retry(call, ctx).await
        });

        futures::future::join_all(futures).await
    }

    async fn execute_with_retry(&self, call: &PendingToolCall, ctx: &ExecutionContext) -> ToolCallRecord {
        let timeout = self.config.timeout_for(&call.tool);
        let start = Instant::now();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let outcome = self.execute_once(call, ctx, timeout).await;

            if outcome.success || attempts > self.config.max_retries || !is_retryable(&outcome, &self.config.retryable_patterns) {
                let duration_ms = start.elapsed().as_millis() as u64;
                let cost_usd = CostEstimator::estimate_tool_cost(&call.tool);
                self.permissions.record_usage(&ctx.user_id, &call.tool, cost_usd).await;
                return ToolCallRecord {
                    tool_name: call.tool.clone(),
                    tool_input: call.input.clone(),
                    result: outcome.result,
                    success: outcome.success,
                    duration_ms,
                    attempts,
                    error_type: outcome.error_type,
                    cost_usd,
                };
            }

            tracing::info!(tool = %call.tool, attempt = attempts, "retrying tool call");
            tokio::time::sleep(self.config.retry_delay * attempts).await;
        }
    }

    async fn execute_once(&self, call: &PendingToolCall, ctx: &ExecutionContext, timeout: std::time::Duration) -> SingleOutcome {
        // Gate 1: permission check.
        let permission = self.permissions.can_use_tool(&ctx.user_id, ctx.role, &call.tool, true).await;
        if !permission.allowed {
            let reason = permission.reason.unwrap_or_else(|| "permission denied".to_string());
            return SingleOutcome { success: false, result: format!("Error: {reason}"), error_type: Some("permission_denied".to_string()) };
        }

        // Gate 2: input content filter.
        let filtered = self.content_filter.filter_input(&call.tool, &call.input);
        if filtered.action == FilterAction::Block {
            let reason = filtered.warnings.join("; ");
            return SingleOutcome { success: false, result: format!("Error: blocked by content filter: {reason}"), error_type: Some("content_filter".to_string()) };
        }
        let input = filtered.modified;

        // Dispatch + per-tool timeout. Sandboxing (spec §4.4 step 3) lives
        // inside `execute_python`'s own tool implementation.
        let invocation = tokio::time::timeout(timeout, self.registry.execute(&call.tool, input));

        match invocation.await {
            Err(_) => SingleOutcome {
                success: false,
                result: format!("Error: tool execution timed out after {}s", timeout.as_secs()),
                error_type: Some("timeout".to_string()),
            },
            Ok(Err(e)) => SingleOutcome { success: false, result: format!("Error: {e}"), error_type: Some(tool_error_type(&e)) },
            Ok(Ok(value)) => {
                let result_text = stringify_tool_result(&value);
                // Gate 4: output content filter.
                let out = self.content_filter.filter_output(&result_text);
                let redacted = out.modified.as_str().map(str::to_string).unwrap_or(result_text);
                SingleOutcome { success: true, result: redacted, error_type: None }
            }
        }
    }
}

struct SingleOutcome {
    success: bool,
    result: String,
    error_type: Option<String>,
}

fn is_retryable(outcome: &SingleOutcome, patterns: &[String]) -> bool {
    if outcome.error_type.as_deref() == Some("timeout") {
        return true;
    }
    let lower = outcome.result.to_lowercase();
    patterns.iter().any(|p| lower.contains(p.as_str()))
}

fn tool_error_type(e: &agentflow_tools::ToolError) -> String {
    match e {
        agentflow_tools::ToolError::UnknownTool(_) => "unknown_tool".to_string(),
        agentflow_tools::ToolError::DuplicateRegistration(_) => "duplicate_registration".to_string(),
        agentflow_tools::ToolError::InvalidInput(_) => "invalid_input".to_string(),
        agentflow_tools::ToolError::ExecutionFailed(_) => "execution_failed".to_string(),
        agentflow_tools::ToolError::Security(_) => "security".to_string(),
        agentflow_tools::ToolError::Sandbox(_) => "sandbox".to_string(),
    }
}

/// Tool results are JSON-encoded structured outputs, stringified before
/// being passed back to the LLM (spec §4.3): a bare JSON string is returned
/// as-is, anything else is serialized.
fn stringify_tool_result(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentflow_core::SecurityLevel;
    use agentflow_security::{InMemoryApprovalStore, UserRole};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingFlakyTool {
        calls: Arc<AtomicUsize>,
        fail_times: usize,
    }

    #[async_trait]
    impl agentflow_tools::AgentTool for CountingFlakyTool {
        fn name(&self) -> &str {
            "flaky"
        }
        fn description(&self) -> &str {
            "fails a fixed number of times with a retryable error, then succeeds"
        }
        fn input_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object"})
        }
        async fn execute(&self, _input: serde_json::Value) -> Result<serde_json::Value, agentflow_tools::ToolError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_times {
                Err(agentflow_tools::ToolError::ExecutionFailed("connection reset, please retry".to_string()))
            } else {
                Ok(serde_json::json!("ok"))
            }
        }
    }

    struct AlwaysFailTool;

    #[async_trait]
    impl agentflow_tools::AgentTool for AlwaysFailTool {
        fn name(&self) -> &str {
            "broken"
        }
        fn description(&self) -> &str {
            "always fails with a non-retryable error"
        }
        fn security_level(&self) -> SecurityLevel {
            SecurityLevel::Safe
        }
        fn input_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object"})
        }
        async fn execute(&self, _input: serde_json::Value) -> Result<serde_json::Value, agentflow_tools::ToolError> {
            Err(agentflow_tools::ToolError::InvalidInput("missing field".to_string()))
        }
    }

    fn executor_with(registry: ToolRegistry, config: ToolExecutionConfig) -> ParallelToolExecutor {
        let permissions = Arc::new(PermissionChecker::new(HashMap::new(), Arc::new(InMemoryApprovalStore::new())));
        let content_filter = Arc::new(ContentFilter::new(vec![], true));
        ParallelToolExecutor::new(Arc::new(registry), permissions, content_filter, config)
    }

    #[tokio::test]
    async fn retries_transient_failure_until_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = ToolRegistry::new();
        let calls2 = calls.clone();
        registry.register(move || Arc::new(CountingFlakyTool { calls: calls2.clone(), fail_times: 1 })).unwrap();

        let config = ToolExecutionConfig { retry_delay: std::time::Duration::from_millis(1), ..Default::default() };
        let executor = executor_with(registry, config);
        let ctx = ExecutionContext::new("u1", UserRole::Superuser);

        let records = executor
            .execute_batch(vec![PendingToolCall { tool: "flaky".to_string(), input: serde_json::json!({}) }], 10, &ctx)
            .await;

        assert_eq!(records.len(), 1);
        assert!(records[0].success);
        assert_eq!(records[0].attempts, 2);
    }

    #[tokio::test]
    async fn non_retryable_failure_stops_at_first_attempt() {
        let mut registry = ToolRegistry::new();
        registry.register(|| Arc::new(AlwaysFailTool)).unwrap();

        let executor = executor_with(registry, ToolExecutionConfig::default());
        let ctx = ExecutionContext::new("u1", UserRole::User);

        let records = executor
            .execute_batch(vec![PendingToolCall { tool: "broken".to_string(), input: serde_json::json!({}) }], 10, &ctx)
            .await;

        assert_eq!(records.len(), 1);
        assert!(!records[0].success);
        assert_eq!(records[0].attempts, 1);
    }

    #[tokio::test]
    async fn budget_truncates_call_list() {
        let mut registry = ToolRegistry::new();
        registry.register(|| Arc::new(AlwaysFailTool)).unwrap();

        let executor = executor_with(registry, ToolExecutionConfig::default());
        let ctx = ExecutionContext::new("u1", UserRole::User);

        let calls = vec![
            PendingToolCall { tool: "broken".to_string(), input: serde_json::json!({}) },
            PendingToolCall { tool: "broken".to_string(), input: serde_json::json!({}) },
            PendingToolCall { tool: "broken".to_string(), input: serde_json::json!({}) },
        ];
        let records = executor.execute_batch(calls, 1, &ctx).await;
        assert_eq!(records.len(), 1);
    }

    struct CountingTool {
        name: &'static str,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl agentflow_tools::AgentTool for CountingTool {
        fn name(&self) -> &str {
            self.name
        }
        fn description(&self) -> &str {
            "counts invocations"
        }
        fn input_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object"})
        }
        async fn execute(&self, _input: serde_json::Value) -> Result<serde_json::Value, agentflow_tools::ToolError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(serde_json::json!("ok"))
        }
    }

    #[tokio::test]
    async fn permission_denial_fails_without_invoking_tool() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = ToolRegistry::new();
        let calls2 = calls.clone();
        // web_search requires User role or above per the default permission table.
        registry.register(move || Arc::new(CountingTool { name: "web_search", calls: calls2.clone() })).unwrap();

        let executor = executor_with(registry, ToolExecutionConfig::default());
        let ctx = ExecutionContext::new("guest1", UserRole::Guest);

        let records = executor
            .execute_batch(vec![PendingToolCall { tool: "web_search".to_string(), input: serde_json::json!({}) }], 10, &ctx)
            .await;

        assert!(!records[0].success);
        assert_eq!(records[0].error_type.as_deref(), Some("permission_denied"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
