//! Known model pricing and cost estimation (spec §4.10).

/// `(input_per_1k, output_per_1k)` in USD, keyed by model id.
const MODEL_PRICING: &[(&str, f64, f64)] = &[
    // Gemini
    ("gemini/gemini-2.0-flash", 0.0001, 0.0004),
    ("gemini/gemini-2.5-flash", 0.00015, 0.00035),
    ("gemini/gemini-2.5-pro", 0.00125, 0.005),
    // OpenAI
    ("gpt-4o-mini", 0.00015, 0.0006),
    ("gpt-4o", 0.0025, 0.01),
    ("o3", 0.01, 0.04),
    ("o3-mini", 0.0011, 0.0044),
    // Anthropic
    ("claude-3-5-haiku-20241022", 0.0008, 0.004),
    ("claude-sonnet-4-20250514", 0.003, 0.015),
    ("claude-opus-4-20250514", 0.015, 0.075),
    // DeepSeek
    ("deepseek/deepseek-chat", 0.00014, 0.00028),
    ("deepseek/deepseek-reasoner", 0.00055, 0.00219),
    // Local/free
    ("ollama/llama3.1", 0.0, 0.0),
    ("ollama/codellama", 0.0, 0.0),
    ("ollama/deepseek-coder-v2", 0.0, 0.0),
];

/// Conservative fallback rate for unrecognized models, USD per token.
const UNKNOWN_MODEL_RATE_PER_TOKEN: f64 = 0.000_002;

fn lookup(model: &str) -> Option<(f64, f64)> {
    if let Some(&(_, input, output)) = MODEL_PRICING.iter().find(|(name, _, _)| *name == model) {
        return Some((input, output));
    }
    // Partial match, mirroring upstream pricing-table lookups that tolerate
    // provider-prefix or version-suffix drift (e.g. a caller passing just
    // "gpt-4o" against a table keyed by "openai/gpt-4o").
    MODEL_PRICING
        .iter()
        .find(|(name, _, _)| name.contains(model) || model.contains(name))
        .map(|&(_, input, output)| (input, output))
}

/// Estimate the USD cost of a call, falling back to a conservative flat
/// rate for unrecognized models (spec §4.10).
#[must_use]
pub fn estimate_cost(model: &str, prompt_tokens: u64, completion_tokens: u64) -> f64 {
    match lookup(model) {
        Some((input_per_1k, output_per_1k)) => {
            let input_cost = (prompt_tokens as f64 / 1000.0) * input_per_1k;
            let output_cost = (completion_tokens as f64 / 1000.0) * output_per_1k;
            input_cost + output_cost
        }
        None => (prompt_tokens + completion_tokens) as f64 * UNKNOWN_MODEL_RATE_PER_TOKEN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_model_uses_its_table_rate() {
        let cost = estimate_cost("gpt-4o-mini", 1000, 1000);
        assert!((cost - (0.00015 + 0.0006)).abs() < 1e-9);
    }

    #[test]
    fn unknown_model_falls_back_to_conservative_flat_rate() {
        let cost = estimate_cost("some-future-model", 1_000_000, 0);
        assert!((cost - 2.0).abs() < 1e-9);
    }

    #[test]
    fn free_local_model_costs_nothing() {
        assert_eq!(estimate_cost("ollama/llama3.1", 5000, 5000), 0.0);
    }
}
