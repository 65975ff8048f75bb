//! The persistent usage tracker (spec §4.10).

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use unclaude_core::Timestamp;
use unclaude_storage::Database;

use crate::budget::{Budget, BudgetAction, BudgetCheck, BudgetPeriod};
use crate::error::UsageResult;
use crate::pricing::estimate_cost;
use crate::record::{Period, UsageRecord, UsageSummary};

const SCHEMA_DDL: &str = "
    DEFINE TABLE usage SCHEMAFULL;
    DEFINE FIELD timestamp ON usage TYPE number;
    DEFINE FIELD model ON usage TYPE string;
    DEFINE FIELD provider ON usage TYPE string;
    DEFINE FIELD prompt_tokens ON usage TYPE number;
    DEFINE FIELD completion_tokens ON usage TYPE number;
    DEFINE FIELD total_tokens ON usage TYPE number;
    DEFINE FIELD cost_usd ON usage TYPE number;
    DEFINE FIELD session_id ON usage TYPE option<string>;
    DEFINE FIELD task_id ON usage TYPE option<string>;
    DEFINE FIELD request_type ON usage TYPE string;
    DEFINE INDEX usage_timestamp ON usage FIELDS timestamp;
    DEFINE INDEX usage_model ON usage FIELDS model;
    DEFINE INDEX usage_session ON usage FIELDS session_id;
    DEFINE TABLE budget_config SCHEMALESS;
";

/// Row shape persisted for each call.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredRecord {
    timestamp: f64,
    model: String,
    provider: String,
    prompt_tokens: i64,
    completion_tokens: i64,
    total_tokens: i64,
    cost_usd: f64,
    session_id: Option<String>,
    task_id: Option<String>,
    request_type: String,
}

impl From<&UsageRecord> for StoredRecord {
    fn from(r: &UsageRecord) -> Self {
        Self {
            timestamp: r.timestamp.as_epoch_seconds(),
            model: r.model.clone(),
            provider: r.provider.clone(),
            prompt_tokens: r.prompt_tokens as i64,
            completion_tokens: r.completion_tokens as i64,
            total_tokens: r.total_tokens as i64,
            cost_usd: r.cost_usd,
            session_id: r.session_id.clone(),
            task_id: r.task_id.clone(),
            request_type: r.request_type.clone(),
        }
    }
}

impl StoredRecord {
    fn into_usage_record(self) -> UsageRecord {
        let secs = self.timestamp.trunc() as i64;
        let nanos = (self.timestamp.fract() * 1_000_000_000.0) as u32;
        let timestamp = DateTime::from_timestamp(secs, nanos).unwrap_or_else(Utc::now);
        UsageRecord {
            timestamp: Timestamp::from_datetime(timestamp),
            model: self.model,
            provider: self.provider,
            prompt_tokens: self.prompt_tokens.max(0) as u64,
            completion_tokens: self.completion_tokens.max(0) as u64,
            total_tokens: self.total_tokens.max(0) as u64,
            cost_usd: self.cost_usd,
            session_id: self.session_id,
            task_id: self.task_id,
            request_type: self.request_type,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredBudget {
    limit_usd: f64,
    period: String,
    action: String,
    soft_limit_pct: f64,
}

impl From<Budget> for StoredBudget {
    fn from(b: Budget) -> Self {
        Self {
            limit_usd: b.limit_usd,
            period: match b.period {
                BudgetPeriod::Daily => "daily",
                BudgetPeriod::Weekly => "weekly",
                BudgetPeriod::Monthly => "monthly",
                BudgetPeriod::Total => "total",
            }
            .to_string(),
            action: match b.action {
                BudgetAction::Warn => "warn",
                BudgetAction::Downgrade => "downgrade",
                BudgetAction::Block => "block",
            }
            .to_string(),
            soft_limit_pct: b.soft_limit_pct,
        }
    }
}

impl StoredBudget {
    fn into_budget(self) -> Option<Budget> {
        let period = match self.period.as_str() {
            "daily" => BudgetPeriod::Daily,
            "weekly" => BudgetPeriod::Weekly,
            "monthly" => BudgetPeriod::Monthly,
            "total" => BudgetPeriod::Total,
            _ => return None,
        };
        let action = match self.action.as_str() {
            "warn" => BudgetAction::Warn,
            "downgrade" => BudgetAction::Downgrade,
            "block" => BudgetAction::Block,
            _ => return None,
        };
        Some(Budget {
            limit_usd: self.limit_usd,
            period,
            action,
            soft_limit_pct: self.soft_limit_pct,
        })
    }
}

fn day_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always a valid time")
        .and_utc()
}

fn window_for(period: Period) -> (DateTime<Utc>, DateTime<Utc>) {
    let now = Utc::now();
    match period {
        Period::Today => (day_start(now), now),
        Period::Yesterday => (day_start(now) - Duration::days(1), day_start(now)),
        Period::Week => (day_start(now) - Duration::days(7), now),
        Period::Month => (day_start(now) - Duration::days(30), now),
        Period::All => (DateTime::from_timestamp(0, 0).unwrap_or(now), now),
        Period::Custom { start, end } => (start.0, end.0),
    }
}

/// Persistent per-call usage accounting and budget enforcement (spec
/// §4.10).
pub struct UsageTracker {
    db: Database,
}

impl UsageTracker {
    /// Open (or create) the usage store at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened or the schema fails
    /// to apply.
    pub async fn open(path: impl AsRef<Path>) -> UsageResult<Self> {
        let db = Database::open(path).await?;
        db.define_schema(SCHEMA_DDL).await?;
        Ok(Self { db })
    }

    /// Open an in-memory usage store, used by tests.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened or the schema fails
    /// to apply.
    pub async fn open_memory() -> UsageResult<Self> {
        let db = Database::open_memory().await?;
        db.define_schema(SCHEMA_DDL).await?;
        Ok(Self { db })
    }

    /// Record one call's usage, estimating `cost_usd` from the pricing
    /// table when not supplied (spec §4.10 `record`).
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    #[allow(clippy::too_many_arguments)]
    pub async fn record(
        &self,
        model: impl Into<String>,
        provider: impl Into<String>,
        prompt_tokens: u64,
        completion_tokens: u64,
        cost_usd: Option<f64>,
        session_id: Option<String>,
        task_id: Option<String>,
        request_type: impl Into<String>,
    ) -> UsageResult<UsageRecord> {
        let model = model.into();
        let cost_usd = cost_usd.unwrap_or_else(|| estimate_cost(&model, prompt_tokens, completion_tokens));

        let record = UsageRecord {
            timestamp: Timestamp::now(),
            model,
            provider: provider.into(),
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
            cost_usd,
            session_id,
            task_id,
            request_type: request_type.into(),
        };

        let row = StoredRecord::from(&record);
        self.db
            .execute(
                "CREATE usage SET \
                    timestamp = $timestamp, model = $model, provider = $provider, \
                    prompt_tokens = $prompt_tokens, completion_tokens = $completion_tokens, \
                    total_tokens = $total_tokens, cost_usd = $cost_usd, \
                    session_id = $session_id, task_id = $task_id, request_type = $request_type",
                vec![
                    ("timestamp", serde_json::json!(row.timestamp)),
                    ("model", serde_json::json!(row.model)),
                    ("provider", serde_json::json!(row.provider)),
                    ("prompt_tokens", serde_json::json!(row.prompt_tokens)),
                    ("completion_tokens", serde_json::json!(row.completion_tokens)),
                    ("total_tokens", serde_json::json!(row.total_tokens)),
                    ("cost_usd", serde_json::json!(row.cost_usd)),
                    ("session_id", serde_json::json!(row.session_id)),
                    ("task_id", serde_json::json!(row.task_id)),
                    ("request_type", serde_json::json!(row.request_type)),
                ],
            )
            .await?;

        Ok(record)
    }

    /// Aggregate usage over `period` (spec §4.10 `get_summary`).
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying query fails.
    pub async fn summary(&self, period: Period) -> UsageResult<UsageSummary> {
        let (start, end) = window_for(period);
        let rows: Vec<StoredRecord> = self
            .db
            .query(
                "SELECT * FROM usage WHERE timestamp >= $start AND timestamp <= $end ORDER BY timestamp DESC",
                vec![
                    ("start", serde_json::json!(start.timestamp() as f64)),
                    ("end", serde_json::json!(end.timestamp() as f64)),
                ],
            )
            .await?;

        let mut summary = UsageSummary {
            period: period.label().to_string(),
            start_time: Timestamp::from_datetime(start),
            end_time: Timestamp::from_datetime(end),
            total_requests: 0,
            total_prompt_tokens: 0,
            total_completion_tokens: 0,
            total_tokens: 0,
            total_cost_usd: 0.0,
            models_used: BTreeMap::new(),
            providers_used: BTreeMap::new(),
            avg_tokens_per_request: 0.0,
            avg_cost_per_request: 0.0,
        };

        for row in &rows {
            summary.total_requests += 1;
            summary.total_prompt_tokens += row.prompt_tokens.max(0) as u64;
            summary.total_completion_tokens += row.completion_tokens.max(0) as u64;
            summary.total_tokens += row.total_tokens.max(0) as u64;
            summary.total_cost_usd += row.cost_usd;
            *summary.models_used.entry(row.model.clone()).or_insert(0) += 1;
            *summary.providers_used.entry(row.provider.clone()).or_insert(0) += 1;
        }

        if summary.total_requests > 0 {
            summary.avg_tokens_per_request = summary.total_tokens as f64 / summary.total_requests as f64;
            summary.avg_cost_per_request = summary.total_cost_usd / summary.total_requests as f64;
        }

        Ok(summary)
    }

    /// Set (replacing) the active budget (spec §4.10 `set_budget`).
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn set_budget(&self, budget: Budget) -> UsageResult<()> {
        let stored = StoredBudget::from(budget);
        self.db
            .execute(
                "UPDATE budget_config:cfg CONTENT { \
                    limit_usd: $limit_usd, period: $period, action: $action, soft_limit_pct: $soft_limit_pct \
                }",
                vec![
                    ("limit_usd", serde_json::json!(stored.limit_usd)),
                    ("period", serde_json::json!(stored.period)),
                    ("action", serde_json::json!(stored.action)),
                    ("soft_limit_pct", serde_json::json!(stored.soft_limit_pct)),
                ],
            )
            .await?;
        Ok(())
    }

    /// Fetch the active budget, if one has been set (spec §4.10
    /// `get_budget`).
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_budget(&self) -> UsageResult<Option<Budget>> {
        let rows: Vec<StoredBudget> = self.db.query("SELECT * FROM budget_config:cfg", vec![]).await?;
        Ok(rows.into_iter().next().and_then(StoredBudget::into_budget))
    }

    /// Remove the active budget.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn clear_budget(&self) -> UsageResult<()> {
        self.db.execute("DELETE budget_config:cfg", vec![]).await?;
        Ok(())
    }

    /// Check current spend against the active budget (spec §4.10
    /// `check_budget`). `budget_set = false` when unconstrained.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying queries fail.
    pub async fn check_budget(&self) -> UsageResult<BudgetCheck> {
        let Some(budget) = self.get_budget().await? else {
            return Ok(BudgetCheck::unconstrained());
        };

        let summary = self.summary(budget.period.as_aggregation_period()).await?;
        let current_spend = summary.total_cost_usd;
        let remaining = (budget.limit_usd - current_spend).max(0.0);
        let percentage = if budget.limit_usd > 0.0 {
            current_spend / budget.limit_usd * 100.0
        } else {
            0.0
        };
        let within_budget = current_spend < budget.limit_usd;

        Ok(BudgetCheck {
            budget_set: true,
            within_budget,
            soft_warning: percentage >= budget.soft_limit_pct * 100.0,
            current_spend,
            limit: budget.limit_usd,
            remaining,
            percentage,
            action: if within_budget { None } else { Some(budget.action) },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn record_estimates_cost_when_not_supplied() {
        let tracker = UsageTracker::open_memory().await.unwrap();
        let record = tracker
            .record("gpt-4o-mini", "openai", 1000, 1000, None, None, None, "chat")
            .await
            .unwrap();
        assert!((record.cost_usd - (0.00015 + 0.0006)).abs() < 1e-9);
        assert_eq!(record.total_tokens, 2000);
    }

    #[tokio::test]
    async fn summary_aggregates_recorded_calls() {
        let tracker = UsageTracker::open_memory().await.unwrap();
        tracker
            .record("gpt-4o-mini", "openai", 100, 50, None, Some("sess-1".to_string()), None, "chat")
            .await
            .unwrap();
        tracker
            .record("claude-sonnet-4-20250514", "anthropic", 200, 100, None, Some("sess-1".to_string()), None, "chat")
            .await
            .unwrap();

        let summary = tracker.summary(Period::Today).await.unwrap();
        assert_eq!(summary.total_requests, 2);
        assert_eq!(summary.total_prompt_tokens, 300);
        assert_eq!(summary.total_completion_tokens, 150);
        assert_eq!(summary.models_used.len(), 2);
        assert_eq!(summary.providers_used.get("openai"), Some(&1));
        assert!(summary.avg_tokens_per_request > 0.0);
    }

    #[tokio::test]
    async fn check_budget_is_unconstrained_without_a_budget() {
        let tracker = UsageTracker::open_memory().await.unwrap();
        let check = tracker.check_budget().await.unwrap();
        assert!(!check.budget_set);
        assert!(check.within_budget);
    }

    #[tokio::test]
    async fn check_budget_reports_action_once_over_limit() {
        let tracker = UsageTracker::open_memory().await.unwrap();
        tracker
            .set_budget(Budget {
                limit_usd: 0.001,
                period: BudgetPeriod::Daily,
                action: BudgetAction::Block,
                soft_limit_pct: 0.8,
            })
            .await
            .unwrap();
        tracker
            .record("gpt-4o", "openai", 10_000, 10_000, None, None, None, "chat")
            .await
            .unwrap();

        let check = tracker.check_budget().await.unwrap();
        assert!(check.budget_set);
        assert!(!check.within_budget);
        assert_eq!(check.action, Some(BudgetAction::Block));
    }

    #[tokio::test]
    async fn clear_budget_returns_to_unconstrained() {
        let tracker = UsageTracker::open_memory().await.unwrap();
        tracker.set_budget(Budget::new(5.0)).await.unwrap();
        tracker.clear_budget().await.unwrap();
        assert!(tracker.get_budget().await.unwrap().is_none());
    }
}
