//! Streamed events (spec §4.8's `stream_execute`), grounded on
//! `examples/original_source/.../agents/graph/builder.py`'s
//! `AgentGraphRunner.stream()` per-node-type event translation.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    Planning { plan: String },
    AgentAction { tool: String, input: serde_json::Value },
    AgentObservation { tool: String, result: String, success: bool },
    Reflection { quality_score: Option<f64>, reasoning: String },
    ContentChunk { chunk: String, is_final: bool },
    TokenUsage { label: String, tokens: u64 },
    BudgetWarning { message: String },
}

/// Split `text` into fixed-size chunks for `content_chunk` events, marking
/// the last one `is_final`. An empty string yields a single empty final
/// chunk so callers always see a terminal event.
pub fn chunk_content(text: &str, chunk_size: usize) -> Vec<AgentEvent> {
    if text.is_empty() {
        return vec![AgentEvent::ContentChunk { chunk: String::new(), is_final: true }];
    }
    let chars: Vec<char> = text.chars().collect();
    let mut events = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let end = (i + chunk_size).min(chars.len());
        let chunk: String = chars[i..end].iter().collect();
        let is_final = end == chars.len();
        events.push(AgentEvent::ContentChunk { chunk, is_final });
        i = end;
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_mark_only_the_last_as_final() {
        let events = chunk_content("abcdefgh", 3);
        assert_eq!(events.len(), 3);
        for (idx, event) in events.iter().enumerate() {
            if let AgentEvent::ContentChunk { is_final, .. } = event {
                assert_eq!(*is_final, idx == events.len() - 1);
            }
        }
    }

    #[test]
    fn empty_text_yields_one_final_chunk() {
        let events = chunk_content("", 10);
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], AgentEvent::ContentChunk { is_final: true, .. }));
    }
}
