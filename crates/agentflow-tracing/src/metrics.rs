//! In-process metrics registry (spec §4.12), grounded on
//! `examples/original_source/.../agents/tracing/metrics.py`'s
//! `MetricsCollector` counters and histograms, minus any OTel `Meter`
//! dependency: this is a hand-rolled `Arc<Mutex<..>>` registry, since the
//! corpus has no metrics-crate usage to draw from for this concern.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::Serialize;

type Labels<'a> = &'a [(&'a str, &'a str)];
type LabelKey = Vec<(String, String)>;

fn label_key(labels: Labels<'_>) -> LabelKey {
    let mut key: LabelKey = labels.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    key.sort();
    key
}

fn format_metric_key(name: &str, key: &LabelKey) -> String {
    let labels = key.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join(",");
    format!("{name}{{{labels}}}")
}

#[derive(Default)]
struct Inner {
    counters: HashMap<(String, LabelKey), u64>,
    histograms: HashMap<(String, LabelKey), Vec<f64>>,
}

/// Point-in-time snapshot of every recorded counter and histogram, for
/// test assertions and diagnostic dumps.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSnapshot {
    pub counters: HashMap<String, u64>,
    pub histogram_counts: HashMap<String, usize>,
    pub histogram_sums: HashMap<String, f64>,
}

/// Registry of counters and histograms for tool calls, agent executions,
/// LLM calls, retrievals, and errors.
#[derive(Default)]
pub struct MetricsRegistry {
    inner: Mutex<Inner>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn incr_counter(&self, name: &str, labels: Labels<'_>) {
        let key = label_key(labels);
        let mut inner = self.inner.lock().expect("metrics registry mutex poisoned");
        *inner.counters.entry((name.to_string(), key)).or_insert(0) += 1;
    }

    fn record_histogram(&self, name: &str, labels: Labels<'_>, value: f64) {
        let key = label_key(labels);
        let mut inner = self.inner.lock().expect("metrics registry mutex poisoned");
        inner.histograms.entry((name.to_string(), key)).or_default().push(value);
    }

    pub fn record_tool_call(&self, tool_name: &str, success: bool, latency_ms: f64) {
        let success_label = success.to_string();
        let labels = [("tool", tool_name), ("success", success_label.as_str())];
        self.incr_counter("tool_calls_total", &labels);
        self.record_histogram("tool_call_latency_ms", &labels, latency_ms);
        if !success {
            self.record_error("tool_failure", &[("tool", tool_name)]);
        }
    }

    pub fn record_agent_execution(&self, assistant_id: &str, success: bool, latency_ms: f64, iterations: u32, cost_usd: f64, tokens_used: u64) {
        let success_label = success.to_string();
        let labels = [("assistant_id", assistant_id), ("success", success_label.as_str())];
        self.incr_counter("agent_executions_total", &labels);
        self.record_histogram("agent_execution_latency_ms", &labels, latency_ms);
        self.record_histogram("agent_iterations", &labels, iterations as f64);
        if cost_usd > 0.0 {
            self.record_histogram("agent_cost_usd", &labels, cost_usd);
        }
        if tokens_used > 0 {
            self.record_histogram("agent_tokens_used", &labels, tokens_used as f64);
        }
        if !success {
            self.record_error("agent_failure", &[("assistant_id", assistant_id)]);
        }
    }

    pub fn record_llm_call(&self, model: &str, success: bool, latency_ms: f64, prompt_tokens: u64, completion_tokens: u64, cost_usd: f64) {
        let success_label = success.to_string();
        let labels = [("model", model), ("success", success_label.as_str())];
        self.incr_counter("llm_calls_total", &labels);
        self.record_histogram("llm_call_latency_ms", &labels, latency_ms);
        let total_tokens = prompt_tokens + completion_tokens;
        if total_tokens > 0 {
            self.record_histogram("llm_tokens_used", &labels, total_tokens as f64);
        }
        if cost_usd > 0.0 {
            self.record_histogram("llm_cost_usd", &labels, cost_usd);
        }
        if !success {
            self.record_error("llm_failure", &[("model", model)]);
        }
    }

    pub fn record_retrieval(&self, source: &str, success: bool, latency_ms: f64, result_count: u32) {
        let success_label = success.to_string();
        let labels = [("source", source), ("success", success_label.as_str())];
        self.incr_counter("retrievals_total", &labels);
        self.record_histogram("retrieval_latency_ms", &labels, latency_ms);
        if success {
            self.record_histogram("retrieval_result_count", &labels, result_count as f64);
        } else {
            self.record_error("retrieval_failure", &[("source", source)]);
        }
    }

    pub fn record_error(&self, error_type: &str, context: Labels<'_>) {
        let mut labels = vec![("error_type", error_type)];
        labels.extend_from_slice(context);
        self.incr_counter("errors_total", &labels);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let inner = self.inner.lock().expect("metrics registry mutex poisoned");
        let counters = inner.counters.iter().map(|((name, key), count)| (format_metric_key(name, key), *count)).collect();
        let mut histogram_counts = HashMap::new();
        let mut histogram_sums = HashMap::new();
        for ((name, key), values) in inner.histograms.iter() {
            let metric_key = format_metric_key(name, key);
            histogram_counts.insert(metric_key.clone(), values.len());
            histogram_sums.insert(metric_key, values.iter().sum());
        }
        MetricsSnapshot { counters, histogram_counts, histogram_sums }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_tool_call_increments_counter_and_histogram() {
        let registry = MetricsRegistry::new();
        registry.record_tool_call("web_search", true, 120.0);
        registry.record_tool_call("web_search", true, 80.0);
        let snapshot = registry.snapshot();
        assert_eq!(snapshot.counters["tool_calls_total{success=true,tool=web_search}"], 2);
        assert_eq!(snapshot.histogram_counts["tool_call_latency_ms{success=true,tool=web_search}"], 2);
        assert_eq!(snapshot.histogram_sums["tool_call_latency_ms{success=true,tool=web_search}"], 200.0);
    }

    #[test]
    fn failed_tool_call_also_bumps_error_counter() {
        let registry = MetricsRegistry::new();
        registry.record_tool_call("web_search", false, 50.0);
        let snapshot = registry.snapshot();
        assert_eq!(snapshot.counters["errors_total{error_type=tool_failure,tool=web_search}"], 1);
    }

    #[test]
    fn zero_cost_and_tokens_are_not_recorded() {
        let registry = MetricsRegistry::new();
        registry.record_agent_execution("asst-1", true, 10.0, 1, 0.0, 0);
        let snapshot = registry.snapshot();
        assert!(!snapshot.histogram_counts.keys().any(|k| k.starts_with("agent_cost_usd")));
        assert!(!snapshot.histogram_counts.keys().any(|k| k.starts_with("agent_tokens_used")));
    }
}
