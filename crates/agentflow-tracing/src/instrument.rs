//! Fixed-schema instrumentation helpers for the four operation classes
//! (spec §4.12), grounded on
//! `examples/original_source/.../agents/tracing/instrumentation.py`'s
//! `trace_agent_execution`, `trace_tool_call`, `trace_llm_call`, and
//! `trace_retrieval` decorators. Each takes an already-started
//! [`SpanBuilder`] (so the span's own clock starts before the operation
//! runs, matching the decorator wrapping the call) and the operation's
//! outcome, and returns the finished, redacted [`Span`].
//!
//! These helpers are deliberately decoupled from `agentflow-executor`'s
//! `ToolCallRecord` and `agentflow-graph`'s `RunOutcome`: callers extract
//! the handful of fields each schema needs rather than this crate
//! depending on either crate's internal shape.

use crate::span::{Span, SpanBuilder};

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut truncated: String = s.chars().take(max_chars).collect();
    truncated.push_str("...");
    truncated
}

/// Attributes for an `agent_execution` span.
pub struct AgentExecutionAttrs<'a> {
    pub assistant_id: &'a str,
    pub user_id: &'a str,
    pub conversation_id: &'a str,
    pub input: &'a str,
    pub output: &'a str,
    pub iterations: u32,
    pub cost_usd: f64,
    pub tokens_used: u64,
    pub tools_used_count: usize,
    pub success: bool,
    pub error: Option<&'a str>,
}

pub fn record_agent_execution(mut span: SpanBuilder, attrs: AgentExecutionAttrs<'_>) -> Span {
    span.set_attr("assistant_id", attrs.assistant_id.to_string());
    span.set_attr("user_id", attrs.user_id.to_string());
    span.set_attr("conversation_id", attrs.conversation_id.to_string());
    span.set_attr("input_preview", truncate(attrs.input, 500));
    span.set_attr("output_preview", truncate(attrs.output, 500));
    let latency_ms = span.elapsed_ms();
    span.set_attr("latency_ms", latency_ms);
    span.set_attr("iterations", attrs.iterations as u64);
    span.set_attr("cost_usd", attrs.cost_usd);
    span.set_attr("tokens_used", attrs.tokens_used);
    span.set_attr("tools_used_count", attrs.tools_used_count as u64);
    span.finish(attrs.success, attrs.error.map(|e| e.to_string()))
}

/// Attributes for a `tool_<name>` span.
pub struct ToolCallAttrs<'a> {
    pub tool_name: &'a str,
    pub input: &'a str,
    pub output: &'a str,
    pub success: bool,
    pub error: Option<&'a str>,
    pub attempts: u32,
}

pub fn record_tool_call(mut span: SpanBuilder, attrs: ToolCallAttrs<'_>) -> Span {
    span.set_attr("tool.name", attrs.tool_name.to_string());
    span.set_attr("tool.input", truncate(attrs.input, 500));
    span.set_attr("tool.output_preview", truncate(attrs.output, 500));
    let latency_ms = span.elapsed_ms();
    span.set_attr("tool.latency_ms", latency_ms);
    span.set_attr("tool.success", attrs.success);
    span.set_attr("tool.attempts", attrs.attempts as u64);
    span.finish(attrs.success, attrs.error.map(|e| e.to_string()))
}

/// Attributes for an `llm_call` span.
pub struct LlmCallAttrs<'a> {
    pub model: &'a str,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub success: bool,
    pub error: Option<&'a str>,
}

pub fn record_llm_call(mut span: SpanBuilder, attrs: LlmCallAttrs<'_>) -> Span {
    span.set_attr("llm.model", attrs.model.to_string());
    span.set_attr("llm.prompt_tokens", attrs.prompt_tokens);
    span.set_attr("llm.completion_tokens", attrs.completion_tokens);
    span.set_attr("llm.total_tokens", attrs.prompt_tokens + attrs.completion_tokens);
    let latency_ms = span.elapsed_ms();
    span.set_attr("llm.latency_ms", latency_ms);
    span.set_attr("llm.success", attrs.success);
    span.finish(attrs.success, attrs.error.map(|e| e.to_string()))
}

/// Attributes for a `retrieval_<source>` span.
pub struct RetrievalAttrs<'a> {
    pub source: &'a str,
    pub query: &'a str,
    pub kb_id: Option<&'a str>,
    pub top_k: u32,
    pub result_count: u32,
    pub first_result_preview: Option<&'a str>,
    pub success: bool,
    pub error: Option<&'a str>,
}

pub fn record_retrieval(mut span: SpanBuilder, attrs: RetrievalAttrs<'_>) -> Span {
    span.set_attr("retrieval.source", attrs.source.to_string());
    span.set_attr("retrieval.query", truncate(attrs.query, 500));
    if let Some(kb_id) = attrs.kb_id {
        span.set_attr("retrieval.kb_id", kb_id.to_string());
    }
    span.set_attr("retrieval.top_k", attrs.top_k as u64);
    span.set_attr("retrieval.result_count", attrs.result_count as u64);
    if let Some(preview) = attrs.first_result_preview {
        span.set_attr("retrieval.first_result_preview", truncate(preview, 500));
    }
    let latency_ms = span.elapsed_ms();
    span.set_attr("retrieval.latency_ms", latency_ms);
    span.set_attr("retrieval.success", attrs.success);
    span.finish(attrs.success, attrs.error.map(|e| e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::SpanKind;
    use crate::tracer::Tracer;

    #[test]
    fn agent_execution_span_carries_fixed_schema() {
        let tracer = Tracer::new();
        let builder = tracer.start_span("agent_execution", SpanKind::Internal, None, None);
        let span = record_agent_execution(
            builder,
            AgentExecutionAttrs {
                assistant_id: "asst-1",
                user_id: "user-1",
                conversation_id: "conv-1",
                input: "what's 2+2?",
                output: "4",
                iterations: 1,
                cost_usd: 0.0001,
                tokens_used: 42,
                tools_used_count: 0,
                success: true,
                error: None,
            },
        );
        assert_eq!(span.name, "agent_execution");
        assert_eq!(span.attributes["assistant_id"], "asst-1");
        assert_eq!(span.attributes["iterations"], 1);
        assert!(span.success);
    }

    #[test]
    fn tool_call_span_redacts_input_and_keeps_error() {
        let tracer = Tracer::new();
        let builder = tracer.start_span("tool_web_search", SpanKind::Internal, None, None);
        let span = record_tool_call(
            builder,
            ToolCallAttrs {
                tool_name: "web_search",
                input: "search for a@b.com",
                output: "",
                success: false,
                error: Some("timeout"),
                attempts: 2,
            },
        );
        assert_eq!(span.attributes["tool.input"], "search for [REDACTED_EMAIL]");
        assert_eq!(span.error_message.unwrap(), "timeout");
        assert!(!span.success);
    }

    #[test]
    fn retrieval_span_omits_absent_kb_id() {
        let tracer = Tracer::new();
        let builder = tracer.start_span("retrieval_vector_store", SpanKind::Internal, None, None);
        let span = record_retrieval(
            builder,
            RetrievalAttrs {
                source: "vector_store",
                query: "refund policy",
                kb_id: None,
                top_k: 5,
                result_count: 3,
                first_result_preview: Some("refunds are processed within 5 days"),
                success: true,
                error: None,
            },
        );
        assert!(!span.attributes.contains_key("retrieval.kb_id"));
        assert_eq!(span.attributes["retrieval.result_count"], 3);
    }
}
