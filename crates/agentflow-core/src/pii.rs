//! PII redaction (spec §4.12), shared by the tracing span exporter and the
//! security content filter's output gate (spec §4.4 step 4) so both speak
//! the same pattern set.
//!
//! Ported from `examples/original_source/backend/airbeeps/agents/tracing/pii_redactor.py`'s
//! pattern table (email/phone/SSN/credit-card/IP/API-key/password/AWS-key/JWT).

use std::sync::LazyLock;

use regex::Regex;

struct Pattern {
    name: &'static str,
    regex: Regex,
    replacement: &'static str,
}

static PATTERNS: LazyLock<Vec<Pattern>> = LazyLock::new(|| {
    let defs: &[(&str, &str, &str)] = &[
        ("email", r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b", "[REDACTED_EMAIL]"),
        ("phone_us", r"\b(?:\+1[-.\s]?)?\(?[2-9]\d{2}\)?[-.\s]?\d{3}[-.\s]?\d{4}\b", "[REDACTED_PHONE]"),
        ("ssn", r"\b\d{3}[-\s]?\d{2}[-\s]?\d{4}\b", "[REDACTED_SSN]"),
        ("credit_card", r"\b(?:\d{4}[-\s]?){3}\d{4}\b", "[REDACTED_CC]"),
        ("ip_address", r"\b(?:\d{1,3}\.){3}\d{1,3}\b", "[REDACTED_IP]"),
        (
            "api_key",
            r#"(?i)(api[_-]?key|apikey|secret[_-]?key|access[_-]?token|auth[_-]?token)["':\s]*[=:]?\s*["'`]?([a-zA-Z0-9_\-]{20,})["'`]?"#,
            "[REDACTED_API_KEY]",
        ),
        (
            "password",
            r#"(?i)(password|passwd|pwd)["':\s]*[=:]?\s*["'`]?(\S{8,})["'`]?"#,
            "[REDACTED_PASSWORD]",
        ),
        ("aws_key", r"\b(AKIA[0-9A-Z]{16})\b", "[REDACTED_AWS_KEY]"),
        ("jwt", r"\beyJ[A-Za-z0-9_-]*\.eyJ[A-Za-z0-9_-]*\.[A-Za-z0-9_-]*\b", "[REDACTED_JWT]"),
        ("bearer_token", r"(?i)\bBearer\s+[A-Za-z0-9_\-.=]{8,}\b", "[REDACTED_BEARER]"),
    ];
    defs.iter().map(|(name, pattern, replacement)| Pattern { name, regex: Regex::new(pattern).unwrap(), replacement }).collect()
});

/// Maximum recursion depth when redacting a nested `serde_json::Value`
/// (spec §4.12: cycle guard for attacker-controlled / self-referential spans).
pub const MAX_REDACT_DEPTH: usize = 10;

/// Mapping keys whose value is dropped wholesale rather than pattern-matched
/// (spec §4.12, `pii_redactor.py`'s `SENSITIVE_FIELDS`).
const SENSITIVE_FIELDS: &[&str] = &[
    "password",
    "passwd",
    "secret",
    "api_key",
    "apikey",
    "api_secret",
    "token",
    "auth_token",
    "access_token",
    "refresh_token",
    "private_key",
    "secret_key",
    "credentials",
    "ssn",
    "social_security",
    "credit_card",
    "card_number",
    "cvv",
    "pin",
];

fn is_sensitive_field(key: &str) -> bool {
    let lower = key.to_lowercase();
    SENSITIVE_FIELDS.iter().any(|field| lower.contains(field))
}

/// Regex-based PII/credential redactor.
#[derive(Debug, Clone, Copy, Default)]
pub struct PiiRedactor;

impl PiiRedactor {
    pub fn new() -> Self {
        Self
    }

    /// Redact all configured patterns from `text`, returning the redacted
    /// text and the list of pattern names that matched.
    pub fn redact(&self, text: &str) -> (String, Vec<String>) {
        if text.is_empty() {
            return (text.to_string(), Vec::new());
        }
        let mut result = text.to_string();
        let mut matched = Vec::new();
        for pattern in PATTERNS.iter() {
            if pattern.regex.is_match(&result) {
                matched.push(pattern.name.to_string());
                result = pattern.regex.replace_all(&result, pattern.replacement).into_owned();
            }
        }
        (result, matched)
    }

    /// Recursively redact all string values in a JSON value, guarding
    /// against unbounded depth (spec §4.12).
    pub fn redact_json(&self, value: &serde_json::Value) -> serde_json::Value {
        self.redact_json_at_depth(value, 0)
    }

    fn redact_json_at_depth(&self, value: &serde_json::Value, depth: usize) -> serde_json::Value {
        if depth >= MAX_REDACT_DEPTH {
            return value.clone();
        }
        match value {
            serde_json::Value::String(s) => serde_json::Value::String(self.redact(s).0),
            serde_json::Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(|v| self.redact_json_at_depth(v, depth + 1)).collect())
            }
            serde_json::Value::Object(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| {
                        if is_sensitive_field(k) {
                            (k.clone(), serde_json::Value::String("[REDACTED]".to_string()))
                        } else {
                            (k.clone(), self.redact_json_at_depth(v, depth + 1))
                        }
                    })
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_email() {
        let (redacted, matched) = PiiRedactor::new().redact("contact a@b.com now");
        assert!(redacted.contains("[REDACTED_EMAIL]"));
        assert!(matched.contains(&"email".to_string()));
    }

    #[test]
    fn redacts_password_assignment() {
        let (redacted, _) = PiiRedactor::new().redact("password=hunter22xyz");
        assert!(redacted.contains("[REDACTED_PASSWORD]"));
    }

    #[test]
    fn leaves_clean_text_untouched() {
        let (redacted, matched) = PiiRedactor::new().redact("just a normal sentence");
        assert_eq!(redacted, "just a normal sentence");
        assert!(matched.is_empty());
    }

    #[test]
    fn redact_json_recurses_into_nested_objects() {
        let value = serde_json::json!({"user": {"email": "a@b.com"}, "notes": ["call 555-123-4567x"]});
        let redacted = PiiRedactor::new().redact_json(&value);
        assert_eq!(redacted["user"]["email"], "[REDACTED_EMAIL]");
    }

    #[test]
    fn redact_json_drops_sensitive_field_values_wholesale() {
        let value = serde_json::json!({"api_key": "sk-not-a-pattern-match", "notes": "fine"});
        let redacted = PiiRedactor::new().redact_json(&value);
        assert_eq!(redacted["api_key"], "[REDACTED]");
        assert_eq!(redacted["notes"], "fine");
    }

    #[test]
    fn redact_json_stops_at_max_depth() {
        let mut value = serde_json::json!("a@b.com");
        for _ in 0..(MAX_REDACT_DEPTH + 5) {
            value = serde_json::json!([value]);
        }
        // Should not panic or stack overflow; depth guard returns the
        // innermost unredacted clone once the cap is hit.
        let _ = PiiRedactor::new().redact_json(&value);
    }
}
