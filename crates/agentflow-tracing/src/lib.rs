//! Span tracing, PII-redacted local trace storage, and in-process metrics
//! (spec §4.12): a `Tracer` that opens spans for the four fixed operation
//! classes, an `Exporter` trait with a local SQLite implementation, and a
//! hand-rolled `MetricsRegistry`.

pub mod exporter;
pub mod instrument;
pub mod metrics;
pub mod span;
pub mod tracer;

pub use exporter::{Exporter, ExportResult, LocalSqliteExporter};
pub use instrument::{
    record_agent_execution, record_llm_call, record_retrieval, record_tool_call, AgentExecutionAttrs, LlmCallAttrs, RetrievalAttrs, ToolCallAttrs,
};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
pub use span::{Span, SpanBuilder, SpanContext, SpanKind};
pub use tracer::Tracer;
