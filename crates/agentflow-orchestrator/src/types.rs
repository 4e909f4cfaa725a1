//! Specialist types and their default configuration (spec §4.9-§4.10),
//! grounded on `examples/original_source/.../agents/specialist/types.py`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The specialist agent kinds a router can classify a request into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SpecialistType {
    Research,
    Code,
    Data,
    General,
}

impl SpecialistType {
    pub const ALL: [SpecialistType; 4] =
        [SpecialistType::Research, SpecialistType::Code, SpecialistType::Data, SpecialistType::General];

    pub fn as_str(&self) -> &'static str {
        match self {
            SpecialistType::Research => "RESEARCH",
            SpecialistType::Code => "CODE",
            SpecialistType::Data => "DATA",
            SpecialistType::General => "GENERAL",
        }
    }
}

/// Per-specialist configuration (spec §4.9's keyword/handoff tables).
#[derive(Debug, Clone)]
pub struct SpecialistConfig {
    pub specialist_type: SpecialistType,
    pub tools: Vec<String>,
    pub system_prompt_suffix: String,
    pub max_iterations: u32,
    pub cost_limit_usd: f64,
    pub can_handoff_to: Vec<SpecialistType>,
    pub priority_keywords: Vec<String>,
}

impl SpecialistConfig {
    pub fn name(&self) -> String {
        let title = match self.specialist_type {
            SpecialistType::Research => "Research",
            SpecialistType::Code => "Code",
            SpecialistType::Data => "Data",
            SpecialistType::General => "General",
        };
        format!("{title} Specialist")
    }
}

fn keywords(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

/// Default configuration table for every specialist type (spec §4.9).
pub fn default_specialist_configs() -> HashMap<SpecialistType, SpecialistConfig> {
    let mut map = HashMap::new();

    map.insert(
        SpecialistType::Research,
        SpecialistConfig {
            specialist_type: SpecialistType::Research,
            tools: keywords(&["web_search", "knowledge_base_query", "knowledge_base_search"]),
            system_prompt_suffix: "You are a research specialist. Search the web and knowledge bases, \
synthesize information from multiple sources, and cite what you find."
                .to_string(),
            max_iterations: 5,
            cost_limit_usd: 0.25,
            can_handoff_to: vec![SpecialistType::Code, SpecialistType::Data, SpecialistType::General],
            priority_keywords: keywords(&[
                "search", "find", "look up", "research", "information about", "what is", "who is", "when did",
                "where is", "how does", "explain", "learn about", "documentation", "article", "news",
            ]),
        },
    );

    map.insert(
        SpecialistType::Code,
        SpecialistConfig {
            specialist_type: SpecialistType::Code,
            tools: keywords(&["execute_python", "file_read", "file_write", "file_list"]),
            system_prompt_suffix: "You are a code specialist. Write and execute code safely, read and write \
files, and debug issues. Request a handoff with NEED_DATA or NEED_RESEARCH if the task needs those capabilities."
                .to_string(),
            max_iterations: 3,
            cost_limit_usd: 0.15,
            can_handoff_to: vec![SpecialistType::Data, SpecialistType::Research, SpecialistType::General],
            priority_keywords: keywords(&[
                "code", "python", "programming", "script", "function", "execute", "run", "debug", "error",
                "file", "write code", "algorithm", "implement", "create a program",
            ]),
        },
    );

    map.insert(
        SpecialistType::Data,
        SpecialistConfig {
            specialist_type: SpecialistType::Data,
            tools: keywords(&["analyze_data", "list_tabular_documents", "knowledge_base_query"]),
            system_prompt_suffix: "You are a data analysis specialist. Analyze tabular data, run statistics, \
and present findings clearly. Request a handoff with NEED_CODE if the task needs code execution beyond analysis."
                .to_string(),
            max_iterations: 4,
            cost_limit_usd: 0.20,
            can_handoff_to: vec![SpecialistType::Code, SpecialistType::Research, SpecialistType::General],
            priority_keywords: keywords(&[
                "data", "analyze", "statistics", "csv", "excel", "spreadsheet", "aggregate", "filter", "sum",
                "average", "count", "group by", "chart", "graph", "table", "dataset",
            ]),
        },
    );

    map.insert(
        SpecialistType::General,
        SpecialistConfig {
            specialist_type: SpecialistType::General,
            tools: Vec::new(),
            system_prompt_suffix: "You are a general-purpose assistant. Answer directly when no specialized \
tools are needed, or request a handoff with NEED_RESEARCH, NEED_CODE, or NEED_DATA."
                .to_string(),
            max_iterations: 10,
            cost_limit_usd: 0.50,
            can_handoff_to: vec![SpecialistType::Research, SpecialistType::Code, SpecialistType::Data],
            priority_keywords: Vec::new(),
        },
    );

    map
}

pub fn get_specialist_config(
    configs: &HashMap<SpecialistType, SpecialistConfig>,
    specialist_type: SpecialistType,
) -> SpecialistConfig {
    configs.get(&specialist_type).cloned().unwrap_or_else(|| configs[&SpecialistType::General].clone())
}

/// Keyword-based classification (spec §4.9 stage 1): score every non-GENERAL
/// specialist by keyword hits in the lowercased input, return the highest.
pub fn classify_intent_keywords(
    user_input: &str,
    configs: &HashMap<SpecialistType, SpecialistConfig>,
) -> Option<SpecialistType> {
    let lower = user_input.to_lowercase();
    let mut scores: HashMap<SpecialistType, usize> =
        [SpecialistType::Research, SpecialistType::Code, SpecialistType::Data].iter().map(|t| (*t, 0)).collect();

    for (spec_type, config) in configs {
        if *spec_type == SpecialistType::General {
            continue;
        }
        let hits = config.priority_keywords.iter().filter(|kw| lower.contains(kw.as_str())).count();
        if let Some(score) = scores.get_mut(spec_type) {
            *score = hits;
        }
    }

    let max_score = *scores.values().max().unwrap_or(&0);
    if max_score == 0 {
        return None;
    }
    // Iterate in a fixed order so ties resolve deterministically (matching
    // the original's insertion-ordered dict iteration: RESEARCH, CODE, DATA).
    [SpecialistType::Research, SpecialistType::Code, SpecialistType::Data]
        .into_iter()
        .find(|t| scores.get(t) == Some(&max_score))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn research_keywords_win_with_clear_match() {
        let configs = default_specialist_configs();
        let result = classify_intent_keywords("can you search the web for rust news", &configs);
        assert_eq!(result, Some(SpecialistType::Research));
    }

    #[test]
    fn no_keyword_hits_returns_none() {
        let configs = default_specialist_configs();
        let result = classify_intent_keywords("hello there", &configs);
        assert_eq!(result, None);
    }
}
