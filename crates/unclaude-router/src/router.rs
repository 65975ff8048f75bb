//! Profile-based model selection on top of the request scorer (spec §4.9).

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::scorer::{RequestScorer, RequestTier, ScoringResult};

/// Cost/quality trade-off a routing decision optimizes for (spec §4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingProfile {
    /// Balanced — smart per-request selection.
    Auto,
    /// Minimize cost, prefer smaller/cheaper models.
    Eco,
    /// Always use the best available model.
    Premium,
    /// Only free/local models.
    Free,
}

impl RoutingProfile {
    /// Parse from the wire/config name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "auto" => Some(Self::Auto),
            "eco" => Some(Self::Eco),
            "premium" => Some(Self::Premium),
            "free" => Some(Self::Free),
            _ => None,
        }
    }
}

/// A candidate model within a tier (spec §4.9).
#[derive(Debug, Clone)]
pub struct ModelSpec {
    /// Provider-qualified model identifier.
    pub model_id: String,
    /// Provider name.
    pub provider: String,
    /// Tier this model is listed under.
    pub tier: RequestTier,
    /// Approximate input cost per 1K tokens.
    pub cost_per_1k: f64,
    /// Whether this model supports tool calling.
    pub supports_tools: bool,
    /// Whether this model is free to use.
    pub is_free: bool,
    /// Whether this model runs locally (no network egress).
    pub is_local: bool,
}

impl ModelSpec {
    /// A tool-capable, non-free, non-local model.
    #[must_use]
    pub fn new(model_id: impl Into<String>, provider: impl Into<String>, tier: RequestTier, cost_per_1k: f64) -> Self {
        Self {
            model_id: model_id.into(),
            provider: provider.into(),
            tier,
            cost_per_1k,
            supports_tools: true,
            is_free: false,
            is_local: false,
        }
    }

    /// Mark this model free/local (builder-style).
    #[must_use]
    pub fn free_local(mut self) -> Self {
        self.is_free = true;
        self.is_local = true;
        self
    }
}

/// The result of routing a request to a model (spec §4.9).
#[derive(Debug, Clone)]
pub struct RoutingDecision {
    /// Selected model identifier.
    pub model_id: String,
    /// Selected model's provider.
    pub provider: String,
    /// Classified complexity tier.
    pub tier: RequestTier,
    /// Profile the decision was made under.
    pub profile: RoutingProfile,
    /// The scoring that produced `tier` (irrelevant — carried for
    /// diagnostics — when `pinned` is true).
    pub scoring: ScoringResult,
    /// Estimated input cost per 1K tokens for the selected model.
    pub estimated_cost_per_1k: f64,
    /// Up to two fallback models to try if the primary call fails.
    pub fallback_models: Vec<String>,
    /// Whether this decision came from a session pin rather than scoring.
    pub pinned: bool,
}

fn infer_provider(model_id: &str) -> &'static str {
    if model_id.starts_with("gemini/") {
        "gemini"
    } else if model_id.starts_with("ollama/") {
        "ollama"
    } else if model_id.contains("claude") {
        "anthropic"
    } else if model_id.contains("gpt") || model_id.starts_with('o') {
        "openai"
    } else {
        "unknown"
    }
}

fn default_model_tiers() -> HashMap<RequestTier, Vec<ModelSpec>> {
    use RequestTier::{Complex, Medium, Reasoning, Simple};

    let mut tiers = HashMap::new();
    tiers.insert(
        Simple,
        vec![
            ModelSpec::new("gpt-4o-mini", "openai", Simple, 0.00015),
            ModelSpec::new("claude-3-5-haiku-20241022", "anthropic", Simple, 0.0008),
            ModelSpec::new("gemini/gemini-2.0-flash", "gemini", Simple, 0.0001),
        ],
    );
    tiers.insert(
        Medium,
        vec![
            ModelSpec::new("gpt-4o", "openai", Medium, 0.0025),
            ModelSpec::new("claude-sonnet-4-20250514", "anthropic", Medium, 0.003),
            ModelSpec::new("gemini/gemini-2.5-flash", "gemini", Medium, 0.00015),
        ],
    );
    tiers.insert(
        Complex,
        vec![
            ModelSpec::new("claude-sonnet-4-20250514", "anthropic", Complex, 0.003),
            ModelSpec::new("gpt-4o", "openai", Complex, 0.0025),
            ModelSpec::new("gemini/gemini-2.5-pro", "gemini", Complex, 0.00125),
        ],
    );
    tiers.insert(
        Reasoning,
        vec![
            ModelSpec::new("claude-opus-4-20250514", "anthropic", Reasoning, 0.015),
            ModelSpec::new("o3", "openai", Reasoning, 0.010),
            ModelSpec::new("gemini/gemini-2.5-pro", "gemini", Reasoning, 0.00125),
        ],
    );
    tiers
}

fn eco_override(tier: RequestTier) -> &'static str {
    match tier {
        RequestTier::Simple => "gemini/gemini-2.0-flash",
        RequestTier::Medium => "gemini/gemini-2.5-flash",
        RequestTier::Complex => "gpt-4o-mini",
        RequestTier::Reasoning => "gemini/gemini-2.5-pro",
    }
}

fn premium_override(tier: RequestTier) -> &'static str {
    match tier {
        RequestTier::Simple | RequestTier::Medium => "claude-sonnet-4-20250514",
        RequestTier::Complex | RequestTier::Reasoning => "claude-opus-4-20250514",
    }
}

fn free_models() -> Vec<ModelSpec> {
    vec![
        ModelSpec::new("ollama/llama3.1", "ollama", RequestTier::Medium, 0.0).free_local(),
        ModelSpec {
            model_id: "ollama/codellama".to_string(),
            provider: "ollama".to_string(),
            tier: RequestTier::Medium,
            cost_per_1k: 0.0,
            supports_tools: true,
            is_free: true,
            is_local: true,
        },
        ModelSpec::new("ollama/deepseek-coder-v2", "ollama", RequestTier::Complex, 0.0).free_local(),
        ModelSpec::new("gemini/gemini-2.0-flash", "gemini", RequestTier::Simple, 0.0),
    ]
}

/// Local heuristic request scoring and profile-based model selection (spec
/// §4.9). Holds no I/O state; session pins live in an in-process map.
pub struct SmartRouter {
    scorer: RequestScorer,
    model_tiers: HashMap<RequestTier, Vec<ModelSpec>>,
    default_profile: RoutingProfile,
    preferred_provider: Option<String>,
    session_pins: RwLock<HashMap<String, String>>,
}

impl Default for SmartRouter {
    fn default() -> Self {
        Self::new(RoutingProfile::Auto, None)
    }
}

impl SmartRouter {
    /// Build a router with the default model tier tables.
    #[must_use]
    pub fn new(default_profile: RoutingProfile, preferred_provider: Option<String>) -> Self {
        Self {
            scorer: RequestScorer::new(),
            model_tiers: default_model_tiers(),
            default_profile,
            preferred_provider,
            session_pins: RwLock::new(HashMap::new()),
        }
    }

    /// Route `message`, honoring any session pin for `conversation_id`
    /// (spec §4.9).
    pub fn route(
        &self,
        message: &str,
        profile: Option<RoutingProfile>,
        conversation_depth: usize,
        conversation_id: Option<&str>,
        require_tools: bool,
    ) -> RoutingDecision {
        let profile = profile.unwrap_or(self.default_profile);

        if let Some(conversation_id) = conversation_id {
            let pins = self.session_pins.read().expect("session pin lock poisoned");
            if let Some(pinned_model) = pins.get(conversation_id).cloned() {
                drop(pins);
                let scoring = self.scorer.score(message, conversation_depth);
                return RoutingDecision {
                    provider: infer_provider(&pinned_model).to_string(),
                    model_id: pinned_model,
                    tier: scoring.tier,
                    profile,
                    scoring,
                    estimated_cost_per_1k: 0.0,
                    fallback_models: Vec::new(),
                    pinned: true,
                };
            }
        }

        let scoring = self.scorer.score(message, conversation_depth);
        tracing::debug!(tier = scoring.tier.as_str(), explanation = %scoring.explanation, "scored request");

        match profile {
            RoutingProfile::Free => self.route_free(scoring, profile, require_tools),
            RoutingProfile::Eco => Self::route_eco(scoring, profile),
            RoutingProfile::Premium => Self::route_premium(scoring, profile),
            RoutingProfile::Auto => self.route_auto(scoring, profile, require_tools),
        }
    }

    /// Pin `conversation_id` to `model_id` for routing continuity.
    pub fn pin_session(&self, conversation_id: impl Into<String>, model_id: impl Into<String>) {
        let mut pins = self.session_pins.write().expect("session pin lock poisoned");
        pins.insert(conversation_id.into(), model_id.into());
    }

    /// Remove a session's model pin, if any.
    pub fn unpin_session(&self, conversation_id: &str) {
        let mut pins = self.session_pins.write().expect("session pin lock poisoned");
        pins.remove(conversation_id);
    }

    fn route_auto(&self, scoring: ScoringResult, profile: RoutingProfile, require_tools: bool) -> RoutingDecision {
        let tier = scoring.tier;
        let mut candidates: Vec<&ModelSpec> = self.model_tiers.get(&tier).into_iter().flatten().collect();

        if require_tools {
            candidates.retain(|m| m.supports_tools);
        }
        if candidates.is_empty() {
            candidates = self.model_tiers.get(&RequestTier::Medium).into_iter().flatten().collect();
        }

        if let Some(preferred) = &self.preferred_provider {
            let (matching, rest): (Vec<&ModelSpec>, Vec<&ModelSpec>) =
                candidates.into_iter().partition(|m| &m.provider == preferred);
            candidates = matching.into_iter().chain(rest).collect();
        }

        let fallback_default = ModelSpec::new("gpt-4o-mini", "openai", RequestTier::Simple, 0.00015);
        let selected = candidates.first().copied().unwrap_or(&fallback_default);
        let fallback_models = candidates.iter().skip(1).take(2).map(|m| m.model_id.clone()).collect();

        RoutingDecision {
            model_id: selected.model_id.clone(),
            provider: selected.provider.clone(),
            tier,
            profile,
            scoring,
            estimated_cost_per_1k: selected.cost_per_1k,
            fallback_models,
            pinned: false,
        }
    }

    fn route_eco(scoring: ScoringResult, profile: RoutingProfile) -> RoutingDecision {
        let tier = scoring.tier;
        let model_id = eco_override(tier).to_string();
        RoutingDecision {
            provider: infer_provider(&model_id).to_string(),
            model_id,
            tier,
            profile,
            scoring,
            estimated_cost_per_1k: 0.0001,
            fallback_models: Vec::new(),
            pinned: false,
        }
    }

    fn route_premium(scoring: ScoringResult, profile: RoutingProfile) -> RoutingDecision {
        let tier = scoring.tier;
        let model_id = premium_override(tier).to_string();
        RoutingDecision {
            provider: infer_provider(&model_id).to_string(),
            model_id,
            tier,
            profile,
            scoring,
            estimated_cost_per_1k: 0.015,
            fallback_models: Vec::new(),
            pinned: false,
        }
    }

    fn route_free(&self, scoring: ScoringResult, profile: RoutingProfile, require_tools: bool) -> RoutingDecision {
        let mut candidates = free_models();
        if require_tools {
            candidates.retain(|m| m.supports_tools);
        }

        let selected = candidates
            .iter()
            .find(|m| m.tier == scoring.tier)
            .or_else(|| candidates.first())
            .cloned()
            .unwrap_or_else(|| ModelSpec::new("ollama/llama3.1", "ollama", RequestTier::Medium, 0.0).free_local());

        RoutingDecision {
            model_id: selected.model_id,
            provider: selected.provider,
            tier: scoring.tier,
            profile,
            scoring,
            estimated_cost_per_1k: 0.0,
            fallback_models: Vec::new(),
            pinned: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_profile_selects_first_candidate_in_tier() {
        let router = SmartRouter::default();
        let decision = router.route("hello", Some(RoutingProfile::Auto), 0, None, false);
        assert_eq!(decision.tier, RequestTier::Simple);
        assert_eq!(decision.model_id, "gpt-4o-mini");
        assert!(!decision.pinned);
    }

    #[test]
    fn preferred_provider_is_promoted_to_the_front() {
        let router = SmartRouter::new(RoutingProfile::Auto, Some("anthropic".to_string()));
        let decision = router.route("hello", Some(RoutingProfile::Auto), 0, None, false);
        assert_eq!(decision.provider, "anthropic");
    }

    #[test]
    fn eco_profile_uses_flat_tier_mapping() {
        let router = SmartRouter::default();
        let decision = router.route("hello", Some(RoutingProfile::Eco), 0, None, false);
        assert_eq!(decision.model_id, "gemini/gemini-2.0-flash");
    }

    #[test]
    fn premium_profile_uses_best_models() {
        let router = SmartRouter::default();
        let decision = router.route(
            "Please prove this theorem and analyze the trade-offs, then justify the root cause of the failure and explain why it happens.",
            Some(RoutingProfile::Premium),
            0,
            None,
            false,
        );
        assert_eq!(decision.model_id, "claude-opus-4-20250514");
    }

    #[test]
    fn free_profile_never_selects_a_paid_model() {
        let router = SmartRouter::default();
        let decision = router.route("build a complex multi-step pipeline", Some(RoutingProfile::Free), 0, None, false);
        assert_eq!(decision.estimated_cost_per_1k, 0.0);
    }

    #[test]
    fn session_pin_overrides_scoring_and_wins_over_profile() {
        let router = SmartRouter::default();
        router.pin_session("conv-1", "claude-opus-4-20250514");

        let decision = router.route("hello", Some(RoutingProfile::Eco), 0, Some("conv-1"), false);
        assert!(decision.pinned);
        assert_eq!(decision.model_id, "claude-opus-4-20250514");
        assert_eq!(decision.provider, "anthropic");
    }

    #[test]
    fn unpinning_restores_normal_routing() {
        let router = SmartRouter::default();
        router.pin_session("conv-1", "claude-opus-4-20250514");
        router.unpin_session("conv-1");

        let decision = router.route("hello", Some(RoutingProfile::Auto), 0, Some("conv-1"), false);
        assert!(!decision.pinned);
    }
}
