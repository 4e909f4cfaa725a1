//! Input/output content filter (spec §4.4 steps 2 and 4).
//!
//! Ported rule-for-rule from
//! `examples/original_source/backend/airbeeps/agents/security/content_filter.py`:
//! path-traversal/SQL-injection/dangerous-import rejection on input, and
//! credential/PII redaction on output.

use regex::Regex;
use serde_json::Value;
use std::path::Path;
use std::sync::LazyLock;

/// Action a filter pass decided to take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterAction {
    Block,
    Redact,
    Warn,
    Pass,
}

/// Result of a filter pass.
#[derive(Debug, Clone)]
pub struct FilterResult {
    pub action: FilterAction,
    pub modified: Value,
    pub matches: Vec<String>,
    pub warnings: Vec<String>,
}

impl FilterResult {
    fn pass(modified: Value, warnings: Vec<String>) -> Self {
        Self { action: FilterAction::Pass, modified, matches: Vec::new(), warnings }
    }

    fn warn(modified: Value, warnings: Vec<String>) -> Self {
        Self { action: FilterAction::Warn, modified, matches: Vec::new(), warnings }
    }

    fn block(reason: String) -> Self {
        Self { action: FilterAction::Block, modified: Value::Null, matches: vec![reason.clone()], warnings: vec![reason] }
    }
}

static PATH_TRAVERSAL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"\.\./", r"\.\.\\", r"^/", r"^[A-Za-z]:", r"~", r"\$\{", r"\$\("]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
});

static SQL_DANGEROUS_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (Regex::new(r"(?i)\bDROP\s+(TABLE|DATABASE|SCHEMA|INDEX)\b").unwrap(), "DROP operation not allowed"),
        (Regex::new(r"(?i)\bTRUNCATE\s+TABLE\b").unwrap(), "TRUNCATE not allowed"),
        (Regex::new(r"(?i)\bALTER\s+(TABLE|DATABASE)\b").unwrap(), "ALTER operation not allowed"),
        (Regex::new(r"(?i)\bCREATE\s+(TABLE|DATABASE|SCHEMA)\b").unwrap(), "CREATE operation not allowed"),
        (Regex::new(r"(?i)\bDELETE\s+FROM\s+\w+\s*$").unwrap(), "DELETE without WHERE clause not allowed"),
        (Regex::new(r"(?is)\bUPDATE\s+\w+\s+SET\b(?!.*\bWHERE\b)").unwrap(), "UPDATE without WHERE clause not allowed"),
        (Regex::new(r"(?i);\s*(DROP|DELETE|UPDATE|ALTER|CREATE)").unwrap(), "multiple statements not allowed"),
        (Regex::new(r"--").unwrap(), "SQL comments not allowed"),
        (Regex::new(r"(?s)/\*.*\*/").unwrap(), "block comments not allowed"),
        (Regex::new(r"(?i)\bEXEC\b|\bEXECUTE\b").unwrap(), "EXEC not allowed"),
        (Regex::new(r"(?i)\bxp_").unwrap(), "extended stored procedures not allowed"),
    ]
});

static CODE_WARNING_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (Regex::new(r"\bimport\s+os\b").unwrap(), "os module usage detected"),
        (Regex::new(r"\bimport\s+subprocess\b").unwrap(), "subprocess module usage detected"),
        (Regex::new(r"\bimport\s+sys\b").unwrap(), "sys module usage detected"),
        (Regex::new(r"\bopen\s*\(").unwrap(), "file open operation detected"),
        (Regex::new(r"\beval\s*\(").unwrap(), "eval function detected"),
        (Regex::new(r"\bexec\s*\(").unwrap(), "exec function detected"),
        (Regex::new(r"\b__import__\s*\(").unwrap(), "__import__ function detected"),
    ]
});

static CREDENTIAL_LEAK_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (Regex::new(r"(?i)password\s*[:=]\s*\S+").unwrap(), "possible password leak"),
        (Regex::new(r"(?i)api[_-]?key\s*[:=]\s*\S+").unwrap(), "possible API key leak"),
        (Regex::new(r"(?i)secret\s*[:=]\s*\S+").unwrap(), "possible secret leak"),
        (Regex::new(r"(?i)token\s*[:=]\s*\S+").unwrap(), "possible token leak"),
    ]
});

const MAX_OUTPUT_BYTES: usize = 1024 * 1024;
const MAX_SEARCH_QUERY_LEN: usize = 500;

/// Input/output content filter (spec §4.4 steps 2 and 4).
///
/// PII redaction reuses `agentflow_core::PiiRedactor` (shared with the
/// tracing span exporter, spec §4.12) so both gates speak the same pattern
/// set instead of maintaining duplicate regexes.
pub struct ContentFilter {
    allowed_base_paths: Vec<String>,
    pii_redactor: Option<agentflow_core::PiiRedactor>,
}

impl ContentFilter {
    pub fn new(allowed_base_paths: Vec<String>, enable_pii_redaction: bool) -> Self {
        Self {
            allowed_base_paths,
            pii_redactor: if enable_pii_redaction { Some(agentflow_core::PiiRedactor::new()) } else { None },
        }
    }

    /// `filter_input(tool_name, input_data)` (spec §4.4 step 2).
    pub fn filter_input(&self, tool_name: &str, input: &Value) -> FilterResult {
        match tool_name {
            "file_read" | "file_write" | "file_operations" => self.filter_file_path(input),
            "sql_execute" | "database_query" => self.filter_sql_query(input),
            "execute_python" | "code_executor" => self.filter_code(input),
            "web_search" => self.filter_search_query(input),
            _ => FilterResult::pass(input.clone(), Vec::new()),
        }
    }

    /// `filter_output(tool_name, output)` (spec §4.4 step 4).
    pub fn filter_output(&self, output: &str) -> FilterResult {
        let mut warnings = Vec::new();
        for (pattern, warning) in CREDENTIAL_LEAK_PATTERNS.iter() {
            if pattern.is_match(output) {
                warnings.push(warning.to_string());
            }
        }

        let mut truncated = output.to_string();
        if truncated.len() > MAX_OUTPUT_BYTES {
            truncated.truncate(MAX_OUTPUT_BYTES);
            truncated.push_str("\n... (output truncated)");
            warnings.push(format!("output truncated to {MAX_OUTPUT_BYTES} bytes"));
        }

        let mut matches = Vec::new();
        if let Some(redactor) = &self.pii_redactor {
            let (redacted, pii_matches) = redactor.redact(&truncated);
            truncated = redacted;
            if !pii_matches.is_empty() {
                warnings.push(format!("PII redacted: {}", pii_matches.join(", ")));
                matches = pii_matches;
            }
        }

        FilterResult { action: FilterAction::Pass, modified: Value::String(truncated), matches, warnings }
    }

    fn filter_file_path(&self, input: &Value) -> FilterResult {
        let path = input.get("path").or_else(|| input.get("file_path")).and_then(Value::as_str).unwrap_or("");
        if path.is_empty() {
            return FilterResult::pass(input.clone(), Vec::new());
        }
        // `^/` rejects every absolute path outright (matching the original
        // filter rule-for-rule), so the containment check below only ever
        // sees relative paths.
        for pattern in PATH_TRAVERSAL_PATTERNS.iter() {
            if pattern.is_match(path) {
                return FilterResult::block(format!("dangerous path pattern detected: {}", pattern.as_str()));
            }
        }
        if !self.allowed_base_paths.is_empty()
            && !self.allowed_base_paths.iter().any(|base| Path::new(path).starts_with(Path::new(base)))
        {
            return FilterResult::block(format!("path '{path}' is outside allowed directories"));
        }
        FilterResult::pass(input.clone(), Vec::new())
    }

    fn filter_sql_query(&self, input: &Value) -> FilterResult {
        let query = input.get("query").or_else(|| input.get("sql")).and_then(Value::as_str).unwrap_or("");
        if query.is_empty() {
            return FilterResult::pass(input.clone(), Vec::new());
        }
        for (pattern, message) in SQL_DANGEROUS_PATTERNS.iter() {
            if pattern.is_match(query) {
                return FilterResult::block(message.to_string());
            }
        }
        FilterResult::pass(input.clone(), Vec::new())
    }

    fn filter_code(&self, input: &Value) -> FilterResult {
        let code = input.get("code").and_then(Value::as_str).unwrap_or("");
        if code.is_empty() {
            return FilterResult::pass(input.clone(), Vec::new());
        }
        let warnings: Vec<String> =
            CODE_WARNING_PATTERNS.iter().filter(|(p, _)| p.is_match(code)).map(|(_, w)| w.to_string()).collect();
        if warnings.is_empty() {
            FilterResult::pass(input.clone(), warnings)
        } else {
            FilterResult::warn(input.clone(), warnings)
        }
    }

    fn filter_search_query(&self, input: &Value) -> FilterResult {
        let query = input.get("query").and_then(Value::as_str).unwrap_or("");
        if query.len() <= MAX_SEARCH_QUERY_LEN {
            return FilterResult::pass(input.clone(), Vec::new());
        }
        let mut modified = input.clone();
        let truncated: String = query.chars().take(MAX_SEARCH_QUERY_LEN).collect();
        if let Some(obj) = modified.as_object_mut() {
            obj.insert("query".to_string(), Value::String(truncated));
        }
        FilterResult::pass(modified, vec![format!("query truncated to {MAX_SEARCH_QUERY_LEN} characters")])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn filter() -> ContentFilter {
        ContentFilter::new(vec!["allowed".to_string()], true)
    }

    #[test]
    fn blocks_path_traversal() {
        let result = filter().filter_input("file_read", &json!({"path": "../../etc/passwd"}));
        assert_eq!(result.action, FilterAction::Block);
    }

    #[test]
    fn blocks_absolute_path_unconditionally() {
        // `^/` rejects every absolute path before the allowed-base
        // containment check ever runs, matching the original filter.
        let result = filter().filter_input("file_read", &json!({"path": "/allowed/file.txt"}));
        assert_eq!(result.action, FilterAction::Block);
    }

    #[test]
    fn prefix_collision_is_not_fooled() {
        // allowedX must not be treated as inside allowed.
        let result = filter().filter_input("file_read", &json!({"path": "allowedX/secret"}));
        assert_eq!(result.action, FilterAction::Block);
    }

    #[test]
    fn allows_path_under_allowed_base() {
        let result = filter().filter_input("file_read", &json!({"path": "allowed/file.txt"}));
        assert_eq!(result.action, FilterAction::Pass);
    }

    #[test]
    fn blocks_drop_table() {
        let result = filter().filter_input("sql_execute", &json!({"query": "DROP TABLE users"}));
        assert_eq!(result.action, FilterAction::Block);
    }

    #[test]
    fn warns_on_dangerous_import_without_blocking() {
        let result = filter().filter_input("execute_python", &json!({"code": "import os\nprint(1)"}));
        assert_eq!(result.action, FilterAction::Warn);
    }

    #[test]
    fn truncates_overlong_search_query() {
        let query = "a".repeat(600);
        let result = filter().filter_input("web_search", &json!({"query": query}));
        assert_eq!(result.action, FilterAction::Pass);
        assert_eq!(result.modified["query"].as_str().unwrap().len(), MAX_SEARCH_QUERY_LEN);
    }

    #[test]
    fn output_filter_redacts_pii_and_flags_credentials() {
        let result = filter().filter_output("contact me at a@b.com, password=hunter22xyz");
        assert!(!result.modified.as_str().unwrap().contains("a@b.com"));
        assert!(result.warnings.iter().any(|w| w.contains("password")));
    }
}
