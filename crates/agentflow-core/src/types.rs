//! Shared wire/domain types used across the workspace.
//!
//! `ChatMessage`/`ToolCall`/`ToolDefinition` follow the OpenAI-compatible
//! shape the teacher's `skilllite-agent/types.rs` already uses, since the
//! LLM client contract (spec §6) is the same "list of role/content turns,
//! optional tool calls" shape regardless of backend.

use serde::{Deserialize, Serialize};

/// A chat message in OpenAI-compatible format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".into(), content: Some(content.into()), tool_calls: None, tool_call_id: None, name: None }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".into(), content: Some(content.into()), tool_calls: None, tool_call_id: None, name: None }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: "assistant".into(), content: Some(content.into()), tool_calls: None, tool_call_id: None, name: None }
    }

    pub fn assistant_with_tool_calls(content: Option<&str>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: "assistant".into(),
            content: content.map(|s| s.to_string()),
            tool_calls: Some(tool_calls),
            tool_call_id: None,
            name: None,
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: "tool".into(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
            name: None,
        }
    }
}

/// A tool call requested by the LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: String,
    pub function: FunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

/// An OpenAI-compatible tool definition advertised to the LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: FunctionDef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDef {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Tool security level (spec §3 `ToolDescriptor`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SecurityLevel {
    Safe,
    Moderate,
    Dangerous,
    Critical,
}

/// Dispatch priority for the parallel tool executor (spec §4.5 step 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum ToolPriority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

/// Specialist functional role (spec GLOSSARY, §4.9/§4.10).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecialistType {
    Research,
    Code,
    Data,
    General,
}

impl SpecialistType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpecialistType::Research => "RESEARCH",
            SpecialistType::Code => "CODE",
            SpecialistType::Data => "DATA",
            SpecialistType::General => "GENERAL",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "RESEARCH" => Some(SpecialistType::Research),
            "CODE" => Some(SpecialistType::Code),
            "DATA" => Some(SpecialistType::Data),
            "GENERAL" => Some(SpecialistType::General),
            _ => None,
        }
    }
}

/// Per-assistant configuration (spec §6): model, budgets, and tool allowlist.
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    pub model: String,
    pub temperature: f64,
    pub token_budget: u64,
    pub max_iterations: usize,
    pub max_tool_calls: usize,
    pub cost_limit_usd: f64,
    pub max_parallel_tools: usize,
    pub enable_planning: bool,
    pub enable_reflection: bool,
    pub reflection_threshold: f64,
    pub enabled_tools: Vec<String>,
    pub tool_config: serde_json::Value,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            temperature: 0.7,
            token_budget: 8_000,
            max_iterations: 10,
            max_tool_calls: 20,
            cost_limit_usd: 1.0,
            max_parallel_tools: 3,
            enable_planning: true,
            enable_reflection: true,
            reflection_threshold: 7.0,
            enabled_tools: Vec::new(),
            tool_config: serde_json::json!({}),
        }
    }
}

/// Tolerantly extract the widest top-level `{...}` JSON object embedded in
/// prose — used by the planner (spec §4.7) to parse LLM responses that may
/// be bare JSON, fenced JSON, or JSON embedded in explanatory text.
pub fn extract_widest_json_object(text: &str) -> Option<serde_json::Value> {
    // Fast path: the whole trimmed string already parses.
    let trimmed = text.trim();
    if let Ok(v) = serde_json::from_str::<serde_json::Value>(trimmed) {
        return Some(v);
    }
    // Strip a ```json ... ``` or ``` ... ``` fence if present.
    let unfenced = strip_code_fence(trimmed);
    if let Ok(v) = serde_json::from_str::<serde_json::Value>(unfenced.trim()) {
        return Some(v);
    }
    // Scan for the widest balanced-brace span and try each candidate from
    // widest to narrowest.
    let bytes = unfenced.as_bytes();
    let starts: Vec<usize> = bytes.iter().enumerate().filter(|(_, &b)| b == b'{').map(|(i, _)| i).collect();
    let ends: Vec<usize> = bytes.iter().enumerate().filter(|(_, &b)| b == b'}').map(|(i, _)| i).collect();
    let mut best: Option<(usize, &str)> = None;
    for &start in &starts {
        for &end in ends.iter().rev() {
            if end < start {
                continue;
            }
            let candidate = &unfenced[start..=end];
            if let Ok(v) = serde_json::from_str::<serde_json::Value>(candidate) {
                let len = candidate.len();
                if best.as_ref().map_or(true, |(best_len, _)| len > *best_len) {
                    best = Some((len, candidate));
                }
                let _ = v;
                break;
            }
        }
    }
    best.and_then(|(_, s)| serde_json::from_str(s).ok())
}

fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        if let Some(end) = rest.rfind("```") {
            return rest[..end].trim();
        }
        return rest.trim();
    }
    if let Some(rest) = text.strip_prefix("```") {
        if let Some(end) = rest.rfind("```") {
            return rest[..end].trim();
        }
        return rest.trim();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_json() {
        let v = extract_widest_json_object(r#"{"needs_tools": false, "answer": "4"}"#).unwrap();
        assert_eq!(v["answer"], "4");
    }

    #[test]
    fn parses_fenced_json() {
        let text = "```json\n{\"needs_tools\": true, \"tool_calls\": []}\n```";
        let v = extract_widest_json_object(text).unwrap();
        assert_eq!(v["needs_tools"], true);
    }

    #[test]
    fn parses_json_embedded_in_prose() {
        let text = "Sure, here is my plan: {\"needs_tools\": false, \"answer\": \"42\"} Hope that helps!";
        let v = extract_widest_json_object(text).unwrap();
        assert_eq!(v["answer"], "42");
    }

    #[test]
    fn returns_none_for_non_json() {
        assert!(extract_widest_json_object("just plain prose, no braces here").is_none());
    }

    #[test]
    fn specialist_type_round_trips_through_str() {
        for t in [SpecialistType::Research, SpecialistType::Code, SpecialistType::Data, SpecialistType::General] {
            assert_eq!(SpecialistType::from_str_loose(t.as_str()), Some(t));
        }
    }
}
