//! Usage records and period aggregation shapes (spec §3 Usage Record,
//! §4.10).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use unclaude_core::Timestamp;

/// A single LLM call's accounted usage (spec §3 Usage Record).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    /// When the call completed.
    pub timestamp: Timestamp,
    /// Model identifier (`"gpt-4o-mini"`, `"gemini/gemini-2.5-flash"`, ...).
    pub model: String,
    /// Provider name (`"openai"`, `"gemini"`, ...).
    pub provider: String,
    /// Input tokens consumed.
    pub prompt_tokens: u64,
    /// Output tokens generated.
    pub completion_tokens: u64,
    /// `prompt_tokens + completion_tokens`.
    pub total_tokens: u64,
    /// Cost in USD, estimated from the pricing table if not supplied.
    pub cost_usd: f64,
    /// Conversation this call belongs to, if any.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Daemon task this call belongs to, if any.
    #[serde(default)]
    pub task_id: Option<String>,
    /// `"chat"`, `"stream"`, or `"daemon"`.
    #[serde(default = "default_request_type")]
    pub request_type: String,
}

fn default_request_type() -> String {
    "chat".to_string()
}

/// A named or bounded aggregation window for [`crate::UsageTracker::summary`]
/// (spec §4.10).
#[derive(Debug, Clone, Copy)]
pub enum Period {
    /// Midnight-to-now, local calendar day.
    Today,
    /// The full previous calendar day.
    Yesterday,
    /// The trailing 7 days up to now.
    Week,
    /// The trailing 30 days up to now.
    Month,
    /// Since the epoch.
    All,
    /// An explicit `[start, end]` range.
    Custom {
        /// Inclusive lower bound.
        start: Timestamp,
        /// Inclusive upper bound.
        end: Timestamp,
    },
}

impl Period {
    /// Stable label used in [`UsageSummary::period`] and budget lookups.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Yesterday => "yesterday",
            Self::Week => "week",
            Self::Month => "month",
            Self::All => "all",
            Self::Custom { .. } => "custom",
        }
    }
}

/// Aggregated usage over a period (spec §4.10 `get_summary`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageSummary {
    /// The period's label (spec §4.10).
    pub period: String,
    /// Window lower bound.
    pub start_time: Timestamp,
    /// Window upper bound.
    pub end_time: Timestamp,
    /// Number of calls in the window.
    pub total_requests: u64,
    /// Sum of prompt tokens.
    pub total_prompt_tokens: u64,
    /// Sum of completion tokens.
    pub total_completion_tokens: u64,
    /// Sum of total tokens.
    pub total_tokens: u64,
    /// Sum of cost in USD.
    pub total_cost_usd: f64,
    /// Request count by model id.
    pub models_used: BTreeMap<String, u64>,
    /// Request count by provider name.
    pub providers_used: BTreeMap<String, u64>,
    /// `total_tokens / total_requests`, zero if no requests.
    pub avg_tokens_per_request: f64,
    /// `total_cost_usd / total_requests`, zero if no requests.
    pub avg_cost_per_request: f64,
}
