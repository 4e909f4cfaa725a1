//! Span export (spec §4.12): `Exporter.export(spans) -> {success|failure}`,
//! with a local SQLite-backed implementation.
//!
//! Grounded on `storage.py`'s `AgentTrace` table and `LocalTraceExporter`
//! for the column set and buffer-then-flush shape, and on
//! `examples/EXboys-skilllite/skilllite/src/executor/memory.rs` for the
//! plain synchronous `rusqlite::Connection` + `execute_batch` DDL +
//! `params!` idiom (the teacher's own `skilllite-executor` crate lists
//! `rusqlite` as a dependency but its session/memory modules were not
//! carried into this pack; `executor/memory.rs` is the file that actually
//! shows the pattern).

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::Connection;
use uuid::Uuid;

use crate::span::Span;

/// Outcome of a single `export` call.
#[derive(Debug, Clone)]
pub enum ExportResult {
    Success,
    Failure(String),
}

#[async_trait]
pub trait Exporter: Send + Sync {
    async fn export(&self, spans: &[Span]) -> ExportResult;
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS agent_traces (
    id TEXT PRIMARY KEY,
    trace_id TEXT NOT NULL,
    span_id TEXT NOT NULL,
    parent_span_id TEXT,
    span_name TEXT NOT NULL,
    span_kind TEXT NOT NULL,
    conversation_id TEXT,
    user_id TEXT,
    assistant_id TEXT,
    start_time TEXT NOT NULL,
    end_time TEXT NOT NULL,
    latency_ms INTEGER NOT NULL,
    attributes TEXT NOT NULL,
    tokens_used INTEGER,
    cost_usd REAL,
    success INTEGER NOT NULL,
    error_message TEXT
);
CREATE INDEX IF NOT EXISTS ix_agent_traces_trace_start ON agent_traces(trace_id, start_time);
"#;

/// Serializes spans into a local SQLite table. Queries (`LocalTraceExporter`'s
/// list/filter/delete-old/stats siblings in `storage.py`) are left to
/// whatever reads this table directly; this crate's scope is export only.
pub struct LocalSqliteExporter {
    conn: Mutex<Connection>,
}

impl LocalSqliteExporter {
    pub fn open(path: &Path) -> rusqlite::Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn in_memory() -> rusqlite::Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Number of rows currently stored, for tests.
    pub fn row_count(&self) -> rusqlite::Result<u64> {
        let conn = self.conn.lock().expect("sqlite connection mutex poisoned");
        conn.query_row("SELECT COUNT(*) FROM agent_traces", [], |row| row.get(0))
    }
}

fn extract_str(attrs: &serde_json::Map<String, serde_json::Value>, key: &str) -> Option<String> {
    attrs.get(key).and_then(|v| v.as_str()).map(|s| s.to_string())
}

fn extract_u64(attrs: &serde_json::Map<String, serde_json::Value>, keys: &[&str]) -> Option<u64> {
    keys.iter().find_map(|key| attrs.get(*key).and_then(|v| v.as_u64()))
}

fn extract_f64(attrs: &serde_json::Map<String, serde_json::Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| attrs.get(*key).and_then(|v| v.as_f64()))
}

#[async_trait]
impl Exporter for LocalSqliteExporter {
    async fn export(&self, spans: &[Span]) -> ExportResult {
        let conn = self.conn.lock().expect("sqlite connection mutex poisoned");
        for span in spans {
            let attributes_json = match serde_json::to_string(&span.attributes) {
                Ok(json) => json,
                Err(e) => return ExportResult::Failure(e.to_string()),
            };
            let result = conn.execute(
                "INSERT INTO agent_traces (id, trace_id, span_id, parent_span_id, span_name, span_kind, \
                 conversation_id, user_id, assistant_id, start_time, end_time, latency_ms, attributes, \
                 tokens_used, cost_usd, success, error_message) \
                 VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17)",
                rusqlite::params![
                    Uuid::new_v4().to_string(),
                    span.trace_id,
                    span.span_id,
                    span.parent_span_id,
                    span.name,
                    span.kind.as_str(),
                    extract_str(&span.attributes, "conversation_id"),
                    extract_str(&span.attributes, "user_id"),
                    extract_str(&span.attributes, "assistant_id"),
                    span.start_time.to_rfc3339(),
                    span.end_time.to_rfc3339(),
                    span.latency_ms as i64,
                    attributes_json,
                    extract_u64(&span.attributes, &["tokens_used", "llm.total_tokens"]).map(|t| t as i64),
                    extract_f64(&span.attributes, &["cost_usd", "llm.cost_usd"]),
                    span.success as i64,
                    span.error_message,
                ],
            );
            if let Err(e) = result {
                tracing::warn!(span_id = %span.span_id, error = %e, "failed to persist span");
                return ExportResult::Failure(e.to_string());
            }
        }
        ExportResult::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::{record_agent_execution, AgentExecutionAttrs};
    use crate::span::SpanKind;
    use crate::tracer::Tracer;

    fn sample_span() -> Span {
        let tracer = Tracer::new();
        let builder = tracer.start_span("agent_execution", SpanKind::Internal, None, None);
        record_agent_execution(
            builder,
            AgentExecutionAttrs {
                assistant_id: "asst-1",
                user_id: "user-1",
                conversation_id: "conv-1",
                input: "hi",
                output: "hello",
                iterations: 1,
                cost_usd: 0.002,
                tokens_used: 10,
                tools_used_count: 0,
                success: true,
                error: None,
            },
        )
    }

    #[tokio::test]
    async fn export_persists_span_row() {
        let exporter = LocalSqliteExporter::in_memory().unwrap();
        let span = sample_span();
        let result = exporter.export(&[span]).await;
        assert!(matches!(result, ExportResult::Success));
        assert_eq!(exporter.row_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn export_is_idempotent_across_calls() {
        let exporter = LocalSqliteExporter::in_memory().unwrap();
        exporter.export(&[sample_span()]).await;
        exporter.export(&[sample_span()]).await;
        assert_eq!(exporter.row_count().unwrap(), 2);
    }
}
