//! Entry point for starting spans (spec §4.12).

use crate::span::{SpanBuilder, SpanKind};

/// Starts spans for a trace. Stateless beyond the PII redactor each
/// `SpanBuilder` carries; cheap to construct per call site.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tracer;

impl Tracer {
    pub fn new() -> Self {
        Self
    }

    pub fn start_span(&self, name: impl Into<String>, kind: SpanKind, trace_id: Option<String>, parent_span_id: Option<String>) -> SpanBuilder {
        SpanBuilder::new(name, kind, trace_id, parent_span_id)
    }
}
