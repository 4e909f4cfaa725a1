//! Specialist router (spec §4.9), grounded on
//! `examples/original_source/.../agents/specialist/router.py`'s
//! `AgentRouter`: a two-stage keyword/LLM classifier plus handoff-marker
//! parsing, composed with the teacher's capability-matching style from
//! `skilllite-swarm/routing.rs` (ordered candidate scoring, deduped fallback).

use std::collections::HashMap;

use agentflow_core::{ChatMessage, LlmClient};

use crate::types::{classify_intent_keywords, default_specialist_configs, SpecialistConfig, SpecialistType};

const CLASSIFICATION_PROMPT: &str = "Analyze the user's request and classify it into ONE of these categories:\n\n\
RESEARCH - needs web search, documentation lookup, or fact-finding.\n\
CODE - needs writing or executing code, file operations, or debugging.\n\
DATA - needs analyzing spreadsheet/CSV data or statistics.\n\
GENERAL - a simple or conversational request that needs none of the above.\n\n\
Respond with ONLY one word: RESEARCH, CODE, DATA, or GENERAL.";

/// How a [`RoutingDecision`] was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingMethod {
    Keyword,
    Llm,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct RoutingDecision {
    pub specialist_type: SpecialistType,
    pub confidence: f64,
    pub reasoning: String,
    pub method: RoutingMethod,
}

pub struct AgentRouter {
    llm: Option<std::sync::Arc<dyn LlmClient>>,
    use_llm_classification: bool,
    keyword_confidence_threshold: f64,
    configs: HashMap<SpecialistType, SpecialistConfig>,
}

impl AgentRouter {
    pub fn new(llm: Option<std::sync::Arc<dyn LlmClient>>, use_llm_classification: bool, keyword_confidence_threshold: f64) -> Self {
        Self { llm, use_llm_classification, keyword_confidence_threshold, configs: default_specialist_configs() }
    }

    /// Route `user_input` to a specialist (spec §4.9's two-stage classifier).
    pub async fn route(&self, user_input: &str, available: &[SpecialistType]) -> RoutingDecision {
        let keyword_result = self.classify_by_keywords(user_input, available);

        if let Some(ref result) = keyword_result {
            if result.confidence >= self.keyword_confidence_threshold {
                return result.clone();
            }
        }

        if self.use_llm_classification {
            if let Some(llm_result) = self.classify_by_llm(user_input, available).await {
                return llm_result;
            }
        }

        if let Some(mut result) = keyword_result {
            result.reasoning.push_str(" (LLM unavailable, using keyword match)");
            return result;
        }

        RoutingDecision {
            specialist_type: SpecialistType::General,
            confidence: 0.3,
            reasoning: "No clear specialist match, routing to general".to_string(),
            method: RoutingMethod::Fallback,
        }
    }

    fn classify_by_keywords(&self, user_input: &str, available: &[SpecialistType]) -> Option<RoutingDecision> {
        let result = classify_intent_keywords(user_input, &self.configs)?;
        if !available.contains(&result) {
            return None;
        }
        let config = &self.configs[&result];
        let lower = user_input.to_lowercase();
        let matched: Vec<&str> = config.priority_keywords.iter().filter(|kw| lower.contains(kw.as_str())).map(|s| s.as_str()).collect();
        let confidence = (0.5 + matched.len() as f64 * 0.1).min(0.9);

        Some(RoutingDecision {
            specialist_type: result,
            confidence,
            reasoning: format!("Matched keywords: {}", matched.iter().take(3).cloned().collect::<Vec<_>>().join(", ")),
            method: RoutingMethod::Keyword,
        })
    }

    async fn classify_by_llm(&self, user_input: &str, available: &[SpecialistType]) -> Option<RoutingDecision> {
        let llm = self.llm.as_ref()?;
        let truncated: String = user_input.chars().take(500).collect();
        let prompt = format!("{CLASSIFICATION_PROMPT}\n\nUser request: {truncated}");

        let response = llm.ainvoke(&[ChatMessage::user(prompt)], None, "default", 0.0).await.ok()?;
        let content = response.content?.trim().to_uppercase();

        let specialist_type = Self::parse_classification(&content)?;
        if !available.contains(&specialist_type) {
            return None;
        }

        Some(RoutingDecision {
            specialist_type,
            confidence: 0.85,
            reasoning: format!("LLM classified as {}", specialist_type.as_str()),
            method: RoutingMethod::Llm,
        })
    }

    fn parse_classification(response: &str) -> Option<SpecialistType> {
        SpecialistType::ALL.into_iter().find(|t| response.contains(t.as_str()))
    }

    /// Detect a handoff marker in a specialist's raw output (spec §4.9).
    pub fn parse_handoff_request(&self, agent_response: &str) -> Option<SpecialistType> {
        if agent_response.contains("NEED_RESEARCH") {
            Some(SpecialistType::Research)
        } else if agent_response.contains("NEED_CODE") {
            Some(SpecialistType::Code)
        } else if agent_response.contains("NEED_DATA") {
            Some(SpecialistType::Data)
        } else {
            None
        }
    }

    pub fn configs(&self) -> &HashMap<SpecialistType, SpecialistConfig> {
        &self.configs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentflow_core::collaborators::testing::FakeLlmClient;
    use std::sync::Arc;

    #[tokio::test]
    async fn strong_keyword_match_skips_llm() {
        let router = AgentRouter::new(None, true, 0.7);
        let decision = router.route("please search the web for rust news and find documentation", &SpecialistType::ALL).await;
        assert_eq!(decision.specialist_type, SpecialistType::Research);
        assert_eq!(decision.method, RoutingMethod::Keyword);
    }

    #[tokio::test]
    async fn ambiguous_input_falls_through_to_llm() {
        let llm = Arc::new(FakeLlmClient::single("CODE"));
        let router = AgentRouter::new(Some(llm), true, 0.7);
        let decision = router.route("hmm, not sure what I need", &SpecialistType::ALL).await;
        assert_eq!(decision.specialist_type, SpecialistType::Code);
        assert_eq!(decision.method, RoutingMethod::Llm);
        assert_eq!(decision.confidence, 0.85);
    }

    #[tokio::test]
    async fn no_match_and_no_llm_falls_back_to_general() {
        let router = AgentRouter::new(None, true, 0.7);
        let decision = router.route("hello there", &SpecialistType::ALL).await;
        assert_eq!(decision.specialist_type, SpecialistType::General);
        assert_eq!(decision.confidence, 0.3);
        assert_eq!(decision.method, RoutingMethod::Fallback);
    }

    #[test]
    fn handoff_markers_are_detected() {
        let router = AgentRouter::new(None, true, 0.7);
        assert_eq!(router.parse_handoff_request("I found it. NEED_RESEARCH"), Some(SpecialistType::Research));
        assert_eq!(router.parse_handoff_request("all good here"), None);
    }
}
