//! Cost estimator (spec §4.2): maps `(model, input_tokens, output_tokens)` to
//! a USD estimate, using a static price table with partial-match lookup.
//!
//! Defaults ported from `examples/original_source/backend/airbeeps/agents/graph/cost_estimator.py`'s
//! hardcoded model price map. The table is a plain struct (not a `static`)
//! so a deployment can load updated prices (spec's Open Question: "production
//! needs an injection point for updated prices").

/// Price per 1M tokens, input and output, in USD.
#[derive(Debug, Clone, Copy)]
pub struct ModelPrice {
    pub input_per_1m: f64,
    pub output_per_1m: f64,
}

/// Static model => price table with partial-match lookup.
///
/// `prices` is insertion-ordered (`Vec`, not `HashMap`) because
/// [`PriceTable::price_for`]'s partial-match scan must return the first
/// configured key that substring-matches, deterministically across runs.
#[derive(Debug, Clone)]
pub struct PriceTable {
    prices: Vec<(String, ModelPrice)>,
    default: ModelPrice,
}

impl Default for PriceTable {
    fn default() -> Self {
        let prices = vec![
            ("gpt-4o-mini".to_string(), ModelPrice { input_per_1m: 0.15, output_per_1m: 0.60 }),
            ("gpt-4o".to_string(), ModelPrice { input_per_1m: 2.50, output_per_1m: 10.00 }),
            ("gpt-4-turbo".to_string(), ModelPrice { input_per_1m: 10.00, output_per_1m: 30.00 }),
            ("gpt-3.5-turbo".to_string(), ModelPrice { input_per_1m: 0.50, output_per_1m: 1.50 }),
            ("claude-3-5-sonnet".to_string(), ModelPrice { input_per_1m: 3.00, output_per_1m: 15.00 }),
            ("claude-3-opus".to_string(), ModelPrice { input_per_1m: 15.00, output_per_1m: 75.00 }),
            ("claude-3-haiku".to_string(), ModelPrice { input_per_1m: 0.25, output_per_1m: 1.25 }),
            ("deepseek-chat".to_string(), ModelPrice { input_per_1m: 0.14, output_per_1m: 0.28 }),
        ];
        Self { prices, default: ModelPrice { input_per_1m: 1.00, output_per_1m: 3.00 } }
    }
}

impl PriceTable {
    /// Load a price table from YAML: `{"model": {"input_per_1m": f, "output_per_1m": f}, ...}`
    /// plus an optional `"default"` key. Falls back to [`PriceTable::default`]'s
    /// default tier if `"default"` is absent. Parsed via `serde_yaml::Mapping`
    /// rather than a `HashMap` so the document's key order survives into the
    /// partial-match scan.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        #[derive(serde::Deserialize)]
        struct RawPrice {
            input_per_1m: f64,
            output_per_1m: f64,
        }
        let mapping: serde_yaml::Mapping = serde_yaml::from_str(yaml)?;
        let mut default = Self::default().default;
        let mut prices = Vec::with_capacity(mapping.len());
        for (key, value) in mapping {
            let key: String = serde_yaml::from_value(key)?;
            let price: RawPrice = serde_yaml::from_value(value)?;
            let price = ModelPrice { input_per_1m: price.input_per_1m, output_per_1m: price.output_per_1m };
            if key == "default" {
                default = price;
            } else {
                prices.push((key, price));
            }
        }
        Ok(Self { prices, default })
    }

    /// Partial-match lookup: exact key, else first key (in table order)
    /// that is a case-insensitive substring of `model`, else the default
    /// tier.
    pub fn price_for(&self, model: &str) -> ModelPrice {
        if let Some((_, p)) = self.prices.iter().find(|(k, _)| k == model) {
            return *p;
        }
        let model_lower = model.to_lowercase();
        if let Some((_, p)) = self.prices.iter().find(|(k, _)| model_lower.contains(&k.to_lowercase())) {
            return *p;
        }
        self.default
    }
}

/// Cost estimator: wraps a [`PriceTable`] and computes USD cost.
#[derive(Debug, Clone, Default)]
pub struct CostEstimator {
    table: PriceTable,
}

impl CostEstimator {
    pub fn new(table: PriceTable) -> Self {
        Self { table }
    }

    /// `estimate_cost(input_tokens, output_tokens, model)` per spec §4.2.
    pub fn estimate_cost(&self, input_tokens: u64, output_tokens: u64, model: &str) -> f64 {
        let price = self.table.price_for(model);
        (input_tokens as f64 / 1_000_000.0) * price.input_per_1m
            + (output_tokens as f64 / 1_000_000.0) * price.output_per_1m
    }

    /// Cheap pre-call token-size approximation: `ceil(len(text) / 4)`.
    pub fn estimate_tokens(text: &str) -> u64 {
        ((text.len() as f64) / 4.0).ceil() as u64
    }

    /// Per-call cost for a tool invocation (spec §4.5 step 6). Most tools
    /// have zero marginal cost; a few wrap metered external APIs.
    pub fn estimate_tool_cost(tool_name: &str) -> f64 {
        match tool_name {
            "web_search" => 0.001,
            "execute_python" => 0.0001,
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_wins_over_substring() {
        let estimator = CostEstimator::default();
        let cost = estimator.estimate_cost(1_000_000, 0, "gpt-4o");
        assert!((cost - 2.50).abs() < 1e-9);
    }

    #[test]
    fn partial_match_is_case_insensitive() {
        let estimator = CostEstimator::default();
        let cost = estimator.estimate_cost(1_000_000, 0, "GPT-4O-2024-08-06");
        assert!((cost - 2.50).abs() < 1e-9);
    }

    #[test]
    fn unknown_model_uses_default_tier() {
        let estimator = CostEstimator::default();
        let cost = estimator.estimate_cost(1_000_000, 1_000_000, "some-unreleased-model");
        assert!((cost - 4.00).abs() < 1e-9);
    }

    #[test]
    fn token_estimate_rounds_up() {
        assert_eq!(CostEstimator::estimate_tokens("abcde"), 2);
        assert_eq!(CostEstimator::estimate_tokens("abcd"), 1);
        assert_eq!(CostEstimator::estimate_tokens(""), 0);
    }

    #[test]
    fn tool_cost_is_zero_for_free_tools() {
        assert_eq!(CostEstimator::estimate_tool_cost("file_read"), 0.0);
        assert!(CostEstimator::estimate_tool_cost("web_search") > 0.0);
    }

    #[test]
    fn price_table_from_yaml_overrides_default() {
        let yaml = "custom-model:\n  input_per_1m: 5.0\n  output_per_1m: 10.0\ndefault:\n  input_per_1m: 9.0\n  output_per_1m: 9.0\n";
        let table = PriceTable::from_yaml(yaml).unwrap();
        let estimator = CostEstimator::new(table);
        assert!((estimator.estimate_cost(1_000_000, 0, "custom-model") - 5.0).abs() < 1e-9);
        assert!((estimator.estimate_cost(1_000_000, 0, "totally-unknown") - 9.0).abs() < 1e-9);
    }
}
