//! Span type and builder (spec §4.12), grounded on
//! `examples/original_source/.../agents/tracing/storage.py`'s `AgentTrace`
//! column set: trace/span/parent ids, name, kind, start/end, latency,
//! a redacted attribute map, and a success/error outcome.

use std::time::Instant;

use agentflow_core::PiiRedactor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// OpenTelemetry-style span kind, stored as a string column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpanKind {
    Internal,
    Client,
    Server,
    Producer,
    Consumer,
}

impl SpanKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpanKind::Internal => "internal",
            SpanKind::Client => "client",
            SpanKind::Server => "server",
            SpanKind::Producer => "producer",
            SpanKind::Consumer => "consumer",
        }
    }
}

/// A finished span, ready for export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Span {
    pub trace_id: String,
    pub span_id: String,
    pub parent_span_id: Option<String>,
    pub name: String,
    pub kind: SpanKind,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub latency_ms: u64,
    pub attributes: serde_json::Map<String, serde_json::Value>,
    pub success: bool,
    pub error_message: Option<String>,
}

/// Builds a single span: attributes accumulate while the traced operation
/// runs, then `finish` stamps the end time and latency (spec §4.12's
/// four fixed operation classes each go through this).
pub struct SpanBuilder {
    redactor: PiiRedactor,
    trace_id: String,
    span_id: String,
    parent_span_id: Option<String>,
    name: String,
    kind: SpanKind,
    start: Instant,
    start_time: DateTime<Utc>,
    attributes: serde_json::Map<String, serde_json::Value>,
}

/// Identifies a span for use as a parent by a child span.
#[derive(Debug, Clone)]
pub struct SpanContext {
    pub trace_id: String,
    pub span_id: String,
}

impl SpanBuilder {
    pub(crate) fn new(name: impl Into<String>, kind: SpanKind, trace_id: Option<String>, parent_span_id: Option<String>) -> Self {
        Self {
            redactor: PiiRedactor::new(),
            trace_id: trace_id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            span_id: Uuid::new_v4().to_string(),
            parent_span_id,
            name: name.into(),
            kind,
            start: Instant::now(),
            start_time: Utc::now(),
            attributes: serde_json::Map::new(),
        }
    }

    /// Set an attribute, redacting string values before they're stored.
    pub fn set_attr(&mut self, key: &str, value: impl Into<serde_json::Value>) -> &mut Self {
        let value = match value.into() {
            serde_json::Value::String(s) => serde_json::Value::String(self.redactor.redact(&s).0),
            other => other,
        };
        self.attributes.insert(key.to_string(), value);
        self
    }

    pub fn context(&self) -> SpanContext {
        SpanContext { trace_id: self.trace_id.clone(), span_id: self.span_id.clone() }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    pub fn finish(self, success: bool, error_message: Option<String>) -> Span {
        let error_message = error_message.map(|e| self.redactor.redact(&e).0);
        Span {
            trace_id: self.trace_id,
            span_id: self.span_id,
            parent_span_id: self.parent_span_id,
            name: self.name,
            kind: self.kind,
            start_time: self.start_time,
            end_time: Utc::now(),
            latency_ms: self.elapsed_ms(),
            attributes: self.attributes,
            success,
            error_message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_redacts_error_message_and_string_attrs() {
        let mut builder = SpanBuilder::new("tool_lookup", SpanKind::Internal, None, None);
        builder.set_attr("input_preview", "email me at a@b.com");
        let span = builder.finish(false, Some("failed for user a@b.com".to_string()));
        assert_eq!(span.attributes["input_preview"], "email me at [REDACTED_EMAIL]");
        assert_eq!(span.error_message.unwrap(), "failed for user [REDACTED_EMAIL]");
        assert!(!span.success);
    }

    #[test]
    fn context_preserves_trace_and_span_id() {
        let builder = SpanBuilder::new("agent_execution", SpanKind::Internal, Some("trace-1".to_string()), None);
        let ctx = builder.context();
        assert_eq!(ctx.trace_id, "trace-1");
        let span = builder.finish(true, None);
        assert_eq!(span.span_id, ctx.span_id);
    }
}
