//! Local, regex-based request complexity scoring (spec §4.9).

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Complexity tier a request is classified into (spec §4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestTier {
    /// Trivial queries, quick answers.
    Simple,
    /// Standard coding tasks.
    Medium,
    /// Multi-file changes, architecture work.
    Complex,
    /// Deep analysis, proofs, debugging.
    Reasoning,
}

impl RequestTier {
    /// Canonical wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Medium => "medium",
            Self::Complex => "complex",
            Self::Reasoning => "reasoning",
        }
    }
}

static REASONING_MARKERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(prove|analyze|compare|explain\s+why|reason|debug|trade-?offs?|pros?\s+(?:and|&)\s+cons?|justify|evaluate|critique|assess|what\s+(?:would|could)\s+happen|implications?|consequences?|root\s+cause|deep\s+dive|architecture|design\s+pattern)\b",
    )
    .expect("reasoning marker pattern is valid")
});

static CODE_MARKERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(```[\s\S]*?```|`[^`]+`|\.py\b|\.ts\b|\.js\b|\.go\b|\.rs\b|function\s|class\s|def\s|import\s|require\(|refactor|implement|fix\s+(?:the\s+)?bug|write\s+(?:a\s+)?(?:test|function|class)|create\s+(?:a\s+)?(?:file|module|component|api))",
    )
    .expect("code marker pattern is valid")
});

static SIMPLE_MARKERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(what\s+is|who\s+is|when\s+was|where\s+is|how\s+many|list\s+|show\s+me|tell\s+me|what\s+does|yes|no|ok|thanks|hi|hello|help|version)\s*\??$",
    )
    .expect("simple marker pattern is valid")
});

static AGENTIC_MARKERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(build|create|implement|develop|write|deploy|setup|configure|test|debug|fix|refactor|optimize|migrate|upgrade|step\s+by\s+step|multi|parallel|automate|pipeline|workflow)\b",
    )
    .expect("agentic marker pattern is valid")
});

static MATH_MARKERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(\b(?:equation|formula|integral|derivative|matrix|vector|probability|statistics|theorem|proof|induction|O\(n|complexity|algorithm)\b|[∫∑∏√±×÷≠≤≥])",
    )
    .expect("math marker pattern is valid")
});

/// Per-dimension weights applied to the weighted-sum classification (spec
/// §4.9 defaults).
const WEIGHT_LENGTH: f64 = 0.10;
const WEIGHT_CODE: f64 = 0.20;
const WEIGHT_REASONING: f64 = 0.25;
const WEIGHT_AGENTIC: f64 = 0.20;
const WEIGHT_MATH: f64 = 0.10;
const WEIGHT_DEPTH: f64 = 0.05;
const WEIGHT_SIMPLICITY: f64 = 0.10;

/// Result of scoring a request (spec §4.9).
#[derive(Debug, Clone)]
pub struct ScoringResult {
    /// The classified complexity tier.
    pub tier: RequestTier,
    /// Confidence in the classification, 0.0–1.0.
    pub confidence: f64,
    /// Raw per-dimension scores, keyed by dimension name.
    pub scores: BTreeMap<String, f64>,
    /// Human-readable summary of the dominant factors.
    pub explanation: String,
}

/// Scores requests across seven dimensions, entirely locally (spec §4.9).
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestScorer;

impl RequestScorer {
    /// Build a scorer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Score `message` in the context of `conversation_depth` turns so far.
    #[must_use]
    pub fn score(&self, message: &str, conversation_depth: usize) -> ScoringResult {
        let mut scores = BTreeMap::new();

        scores.insert("length".to_string(), (message.chars().count() as f64 / 2000.0).min(1.0));
        scores.insert("code".to_string(), (CODE_MARKERS.find_iter(message).count() as f64 / 3.0).min(1.0));
        scores.insert(
            "reasoning".to_string(),
            (REASONING_MARKERS.find_iter(message).count() as f64 / 2.0).min(1.0),
        );
        scores.insert(
            "agentic".to_string(),
            (AGENTIC_MARKERS.find_iter(message).count() as f64 / 3.0).min(1.0),
        );
        scores.insert("math".to_string(), (MATH_MARKERS.find_iter(message).count() as f64 / 2.0).min(1.0));
        scores.insert("depth".to_string(), (conversation_depth as f64 / 20.0).min(1.0));
        scores.insert(
            "simplicity".to_string(),
            if SIMPLE_MARKERS.is_match(message.trim()) { 1.0 } else { 0.0 },
        );

        let weighted = scores["length"] * WEIGHT_LENGTH
            + scores["code"] * WEIGHT_CODE
            + scores["reasoning"] * WEIGHT_REASONING
            + scores["agentic"] * WEIGHT_AGENTIC
            + scores["math"] * WEIGHT_MATH
            + scores["depth"] * WEIGHT_DEPTH
            + scores["simplicity"] * WEIGHT_SIMPLICITY;

        let (tier, confidence) = classify(weighted, &scores);
        let explanation = explain(&scores, tier);

        ScoringResult {
            tier,
            confidence,
            scores,
            explanation,
        }
    }
}

fn classify(weighted_score: f64, scores: &BTreeMap<String, f64>) -> (RequestTier, f64) {
    if scores.get("reasoning").copied().unwrap_or(0.0) > 0.8 {
        return (RequestTier::Reasoning, 0.97);
    }
    if scores.get("simplicity").copied().unwrap_or(0.0) > 0.5 {
        return (RequestTier::Simple, 0.95);
    }
    if scores.get("math").copied().unwrap_or(0.0) > 0.5 {
        return (RequestTier::Reasoning, 0.90);
    }

    if weighted_score < 0.15 {
        (RequestTier::Simple, 0.85)
    } else if weighted_score < 0.35 {
        (RequestTier::Medium, 0.80)
    } else if weighted_score < 0.55 {
        (RequestTier::Complex, 0.75)
    } else {
        (RequestTier::Reasoning, 0.70)
    }
}

fn explain(scores: &BTreeMap<String, f64>, tier: RequestTier) -> String {
    let mut ranked: Vec<(&String, &f64)> = scores.iter().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(a.1).unwrap_or(std::cmp::Ordering::Equal));
    let factors: Vec<String> = ranked
        .into_iter()
        .take(3)
        .filter(|(_, v)| **v > 0.0)
        .map(|(k, v)| format!("{k}={v:.2}"))
        .collect();
    format!("tier={} (factors: {})", tier.as_str(), factors.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greeting_scores_simple() {
        let result = RequestScorer::new().score("hello", 0);
        assert_eq!(result.tier, RequestTier::Simple);
        assert!((result.confidence - 0.95).abs() < 1e-9);
    }

    #[test]
    fn proof_request_scores_reasoning() {
        let result = RequestScorer::new().score(
            "Please prove this theorem and analyze the trade-offs, then justify the root cause of the failure and explain why it happens.",
            0,
        );
        assert_eq!(result.tier, RequestTier::Reasoning);
    }

    #[test]
    fn math_heavy_message_overrides_to_reasoning() {
        let result = RequestScorer::new().score("Compute the integral of this formula using the derivative and a matrix of probability values, then check the algorithm's complexity.", 0);
        assert_eq!(result.tier, RequestTier::Reasoning);
        assert!((result.confidence - 0.90).abs() < 1e-9);
    }

    #[test]
    fn plain_coding_request_scores_medium_or_complex() {
        let result = RequestScorer::new().score("Please implement a function to fix the bug in auth.py", 0);
        assert!(matches!(result.tier, RequestTier::Medium | RequestTier::Complex));
    }

    #[test]
    fn explanation_lists_top_factors() {
        let result = RequestScorer::new().score("hello", 0);
        assert!(result.explanation.contains("simplicity"));
    }
}
