//! The per-task agent iteration loop (spec §4.8(b)): routes each turn
//! through the Smart Router, builds the message list from session history
//! and recalled memory, calls the LLM client with fallback, dispatches any
//! requested tool calls through the policy engine, and feeds results back
//! until the model stops calling tools, a stuck pattern forces a bail, or
//! the sandbox's `max_iterations` is exhausted.

use std::collections::{hash_map::DefaultHasher, HashMap};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use unclaude_audit::{AuditEvent, AuditEventType, AuditLog};
use unclaude_capabilities::Capability;
use unclaude_core::{ChatMessage, ContextCompactor, ContextPruner, LlmClient, LlmError, MemoryStore, RiskLevel, Tool, ToolCallRequest};
use unclaude_policy::{capability_for_tool, EnforceContext, PolicyEngine};
use unclaude_router::{RoutingDecision, RoutingProfile, SmartRouter};
use unclaude_sessions::{SessionKey, SessionMessage, SessionStore};
use unclaude_usage::{BudgetAction, UsageTracker};

use crate::stuck::{StuckDetector, StuckSignal, BAIL_SENTINEL};

/// Number of messages (excluding the leading system prompt) past which a
/// compaction is attempted, and the modulus of iterations at which it's
/// retried for a conversation that keeps growing (spec §4.8(b)).
const COMPACTION_THRESHOLD: usize = 50;
const COMPACTION_RECHECK_EVERY: u32 = 10;
const COMPACTION_KEEP_RECENT: usize = 20;

/// Token budget handed to the context pruner before every LLM call.
const PRUNE_MAX_TOKENS: usize = 100_000;

const SYSTEM_PROMPT: &str = "You are an autonomous coding agent operating inside a policy-enforced \
sandbox. Every tool call you request is checked against a capability set \
and a sandbox policy before it runs; a denied call comes back as a tool \
error, not a crash. Work the task to completion, then stop calling tools.";

/// The outcome of a single turn of the loop (one LLM call plus however many
/// tool calls it produced).
#[derive(Debug)]
pub enum IterationOutcome {
    /// The model has more to do; keep iterating.
    Continue,
    /// The model produced a final answer with no further tool calls.
    Done(String),
    /// The stuck detector has bailed: one more call, with tools disabled,
    /// should be made to let the model summarize before giving up.
    Bail,
    /// The loop must stop: budget block or a terminal LLM/chain error.
    Terminate(String),
}

/// The final result of running a task through the loop to completion.
#[derive(Debug)]
pub enum TaskOutcome {
    /// The task's final answer, iteration count, and total cost.
    Completed { result: String, iterations: u32, cost_usd: f64 },
    /// The task could not be completed, with the reason, iteration count,
    /// and cost spent before giving up.
    Failed { error: String, iterations: u32, cost_usd: f64 },
}

/// Everything the loop needs to drive one task to completion. Built fresh
/// per task by [`crate::runtime::DaemonRuntime`]; holds no task-specific
/// state itself (that lives in the loop's local variables).
pub struct AgentLoop {
    pub llm: Arc<dyn LlmClient>,
    pub tools: Arc<HashMap<String, Arc<dyn Tool>>>,
    pub memory: Option<Arc<dyn MemoryStore>>,
    pub compactor: Option<Arc<dyn ContextCompactor>>,
    pub pruner: Option<Arc<dyn ContextPruner>>,
    pub router: Arc<SmartRouter>,
    pub usage: Arc<UsageTracker>,
    pub audit: Arc<AuditLog>,
    pub sessions: Arc<SessionStore>,
    pub routing_profile: RoutingProfile,
    pub pinned: bool,
}

impl AgentLoop {
    /// Drive `task_description` to completion against `session_key`,
    /// bounded by `max_iterations` (spec's sandbox `max_iterations` limit)
    /// and `max_cost_usd` (spec's sandbox `max_cost_usd` limit).
    #[allow(clippy::too_many_arguments)]
    pub async fn run(
        &self,
        task_id: &str,
        session_key: &SessionKey,
        task_description: &str,
        project_path: &str,
        policy: &mut PolicyEngine,
        max_iterations: u64,
        max_cost_usd: f64,
    ) -> TaskOutcome {
        self.sessions
            .append(session_key, &SessionMessage::new("user", Some(task_description.to_string())))
            .ok();

        let mut detector = StuckDetector::new();
        let mut total_cost = 0.0_f64;
        let mut iteration: u32 = 0;
        let mut tools_enabled = true;
        let mut final_call = false;

        loop {
            iteration += 1;
            if u64::from(iteration) > max_iterations {
                return TaskOutcome::Failed {
                    error: format!("exhausted max_iterations ({max_iterations}) without completing"),
                    iterations: iteration,
                    cost_usd: total_cost,
                };
            }

            match self
                .run_iteration(
                    task_id,
                    session_key,
                    project_path,
                    policy,
                    &mut detector,
                    iteration,
                    &mut total_cost,
                    max_cost_usd,
                    tools_enabled,
                )
                .await
            {
                IterationOutcome::Continue => {
                    if final_call {
                        return TaskOutcome::Failed {
                            error: "stuck-loop detector bailed out after three warnings".to_string(),
                            iterations: iteration,
                            cost_usd: total_cost,
                        };
                    }
                }
                IterationOutcome::Done(result) => {
                    if final_call {
                        return TaskOutcome::Failed {
                            error: format!("stuck-loop detector bailed out after three warnings; model's closing note: {result}"),
                            iterations: iteration,
                            cost_usd: total_cost,
                        };
                    }
                    return TaskOutcome::Completed {
                        result,
                        iterations: iteration,
                        cost_usd: total_cost,
                    };
                }
                IterationOutcome::Bail => {
                    tools_enabled = false;
                    final_call = true;
                }
                IterationOutcome::Terminate(error) => {
                    return TaskOutcome::Failed {
                        error,
                        iterations: iteration,
                        cost_usd: total_cost,
                    };
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_iteration(
        &self,
        task_id: &str,
        session_key: &SessionKey,
        project_path: &str,
        policy: &mut PolicyEngine,
        detector: &mut StuckDetector,
        iteration: u32,
        total_cost: &mut f64,
        max_cost_usd: f64,
        tools_enabled: bool,
    ) -> IterationOutcome {
        if let Err(reason) = self.check_budget(session_key, *total_cost, max_cost_usd).await {
            return IterationOutcome::Terminate(reason);
        }

        if iteration % COMPACTION_RECHECK_EVERY == 0 {
            self.maybe_compact(session_key).await;
        }

        let conversation = match self.sessions.load(session_key) {
            Ok(conversation) => conversation,
            Err(error) => return IterationOutcome::Terminate(format!("session load failed: {error}")),
        };

        let mut messages = self.build_messages(&conversation, project_path).await;
        if let Some(pruner) = &self.pruner {
            messages = pruner.prune(messages, PRUNE_MAX_TOKENS);
        }

        let last_user_text = conversation
            .messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .and_then(|m| m.content.clone())
            .unwrap_or_default();

        let decision = self.router.route(
            &last_user_text,
            Some(self.routing_profile),
            conversation.messages.len(),
            Some(&session_key.as_wire()),
            true,
        );

        let response = match self.call_llm_with_fallback(session_key, task_id, &decision, &messages, tools_enabled).await {
            Ok(response) => response,
            Err(error) => return IterationOutcome::Terminate(error),
        };

        *total_cost += self
            .usage
            .record(
                decision.model_id.clone(),
                decision.provider.clone(),
                response.usage.prompt_tokens,
                response.usage.completion_tokens,
                None,
                Some(session_key.as_wire()),
                Some(task_id.to_string()),
                "daemon",
            )
            .await
            .map(|record| record.cost_usd)
            .unwrap_or(0.0);

        if response.tool_calls.is_empty() {
            let content = response.content.unwrap_or_default();
            self.sessions
                .append(session_key, &SessionMessage::new("assistant", Some(content.clone())))
                .ok();
            return IterationOutcome::Done(content);
        }

        self.sessions
            .append(session_key, &SessionMessage::assistant_tool_calls(response.tool_calls.clone()))
            .ok();

        let max_tool_calls = policy.sandbox().limits().max_tool_calls_per_turn;
        let mut accepted = response.tool_calls;
        if accepted.len() as u64 > max_tool_calls {
            tracing::warn!(task_id, accepted = accepted.len(), cap = max_tool_calls, "truncating tool calls to sandbox limit");
            accepted.truncate(max_tool_calls as usize);
        }

        let mut successes = 0usize;
        for call in &accepted {
            let succeeded = self.dispatch_tool_call(session_key, policy, detector, call).await;
            if succeeded {
                successes += 1;
            }
        }
        detector.record_iteration_successes(successes);

        match detector.detect(iteration) {
            StuckSignal::Clear => IterationOutcome::Continue,
            StuckSignal::Warning(message) => {
                self.sessions
                    .append(session_key, &SessionMessage::new("system", Some(message)))
                    .ok();
                IterationOutcome::Continue
            }
            StuckSignal::Bail => {
                self.sessions
                    .append(session_key, &SessionMessage::new("system", Some(BAIL_SENTINEL.to_string())))
                    .ok();
                IterationOutcome::Bail
            }
        }
    }

    async fn dispatch_tool_call(
        &self,
        session_key: &SessionKey,
        policy: &mut PolicyEngine,
        detector: &mut StuckDetector,
        call: &ToolCallRequest,
    ) -> bool {
        detector.record_call(&call.name, hash_arguments(&call.arguments));

        let Some(capability) = capability_for_tool(&call.name) else {
            let message = format!("unmapped tool {:?}; treating as a configuration error", call.name);
            self.sessions
                .append(session_key, &SessionMessage::tool_response(&call.id, &call.name, &message))
                .ok();
            return false;
        };

        let ctx = enforce_context_for(capability, &call.arguments);
        self.audit
            .log(
                AuditEvent::new(AuditEventType::ToolStart)
                    .with_session(session_key.as_wire())
                    .with_tool(&call.name)
                    .with_capability(capability.as_str()),
            )
            .await
            .ok();

        if let Err(violation) = policy.enforce(capability, ctx) {
            self.audit
                .log(
                    AuditEvent::new(AuditEventType::PermissionDenied)
                        .with_session(session_key.as_wire())
                        .with_tool(&call.name)
                        .with_capability(capability.as_str())
                        .with_risk(RiskLevel::Medium)
                        .with_error(violation.reason.clone()),
                )
                .await
                .ok();
            let message = format!("denied: {}", violation.reason);
            self.sessions
                .append(session_key, &SessionMessage::tool_response(&call.id, &call.name, &message))
                .ok();
            return false;
        }

        let Some(tool) = self.tools.get(&call.name) else {
            let message = format!("tool {:?} is not registered with this daemon", call.name);
            self.sessions
                .append(session_key, &SessionMessage::tool_response(&call.id, &call.name, &message))
                .ok();
            return false;
        };

        let args = call
            .arguments
            .as_object()
            .map(|obj| obj.clone().into_iter().collect::<HashMap<_, _>>())
            .unwrap_or_default();
        let output = tool.execute(&args).await;

        let (event_type, risk) = if output.success {
            (AuditEventType::ToolSuccess, RiskLevel::Low)
        } else {
            (AuditEventType::ToolFailure, RiskLevel::Medium)
        };
        let mut event = AuditEvent::new(event_type)
            .with_session(session_key.as_wire())
            .with_tool(&call.name)
            .with_capability(capability.as_str());
        if let Some(error) = &output.error {
            event = event.with_risk(risk).with_error(error.clone());
        }
        self.audit.log(event).await.ok();

        let response_text = if output.success {
            output.output
        } else {
            output.error.unwrap_or(output.output)
        };
        self.sessions
            .append(session_key, &SessionMessage::tool_response(&call.id, &call.name, response_text))
            .ok();

        output.success
    }

    async fn call_llm_with_fallback(
        &self,
        session_key: &SessionKey,
        task_id: &str,
        decision: &RoutingDecision,
        messages: &[ChatMessage],
        tools_enabled: bool,
    ) -> Result<unclaude_core::ChatResponse, String> {
        let mut candidates = vec![decision.model_id.clone()];
        candidates.extend(decision.fallback_models.iter().cloned());

        let mut last_error = String::new();
        for model in &candidates {
            self.audit
                .log(
                    AuditEvent::new(AuditEventType::LlmRequest)
                        .with_session(session_key.as_wire())
                        .with_data(serde_json::json!({ "model": model, "task_id": task_id, "tier": decision.tier.as_str() })),
                )
                .await
                .ok();

            match self.llm.chat(model, messages, tools_enabled).await {
                Ok(response) => {
                    self.audit
                        .log(
                            AuditEvent::new(AuditEventType::LlmResponse)
                                .with_session(session_key.as_wire())
                                .with_data(serde_json::json!({ "model": model, "tool_calls": response.tool_calls.len() })),
                        )
                        .await
                        .ok();
                    return Ok(response);
                }
                Err(LlmError::Transient(reason)) | Err(LlmError::Request(reason)) => {
                    last_error = reason;
                    tracing::warn!(model, error = %last_error, "llm call failed, trying next candidate");
                }
            }
        }

        self.audit
            .log(
                AuditEvent::new(AuditEventType::LlmError)
                    .with_session(session_key.as_wire())
                    .with_risk(RiskLevel::High)
                    .with_error(last_error.clone()),
            )
            .await
            .ok();
        Err(format!("all candidate models failed; last error: {last_error}"))
    }

    async fn check_budget(&self, session_key: &SessionKey, spent_this_task: f64, max_cost_usd: f64) -> Result<(), String> {
        if spent_this_task >= max_cost_usd {
            return Err(format!("sandbox max_cost_usd ({max_cost_usd:.2}) exceeded for this task"));
        }

        let check = match self.usage.check_budget().await {
            Ok(check) => check,
            Err(error) => {
                tracing::warn!(error = %error, "budget check failed, proceeding without enforcement");
                return Ok(());
            }
        };
        if check.within_budget {
            return Ok(());
        }

        match check.action {
            Some(BudgetAction::Block) => Err(format!("budget exceeded: {:.2}/{:.2}", check.current_spend, check.limit)),
            Some(BudgetAction::Downgrade) => {
                if !self.pinned {
                    self.router.pin_session(session_key.as_wire(), "gemini/gemini-2.0-flash");
                    tracing::info!(session = %session_key, "budget downgrade: pinned session to eco model");
                } else {
                    tracing::info!(session = %session_key, "budget downgrade signaled but session is pinned; honoring pin");
                }
                Ok(())
            }
            Some(BudgetAction::Warn) | None => {
                self.audit
                    .log(
                        AuditEvent::new(AuditEventType::CostIncurred)
                            .with_session(session_key.as_wire())
                            .with_risk(RiskLevel::Medium)
                            .with_data(serde_json::json!({ "percentage": check.percentage })),
                    )
                    .await
                    .ok();
                Ok(())
            }
        }
    }

    async fn maybe_compact(&self, session_key: &SessionKey) {
        let Ok(conversation) = self.sessions.load(session_key) else {
            return;
        };
        if conversation.messages.len() <= COMPACTION_THRESHOLD {
            return;
        }
        let Some(compactor) = &self.compactor else {
            return;
        };
        let chat_messages: Vec<ChatMessage> = conversation.messages.iter().map(SessionMessage::to_chat_message).collect();
        let summary = compactor.summarize(&chat_messages).await;
        if let Err(error) = self.sessions.compact(session_key, summary, COMPACTION_KEEP_RECENT) {
            tracing::warn!(session = %session_key, error = %error, "compaction failed");
        }
    }

    async fn build_messages(&self, conversation: &unclaude_sessions::ConversationSession, project_path: &str) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage {
            role: "system".to_string(),
            content: Some(SYSTEM_PROMPT.to_string()),
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
        }];

        if let Some(summary) = &conversation.compaction_summary {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: Some(format!("Earlier conversation summary: {summary}")),
                tool_calls: Vec::new(),
                tool_call_id: None,
                name: None,
            });
        }

        if let Some(memory) = &self.memory {
            if let Some(last_user) = conversation.messages.iter().rev().find(|m| m.role == "user") {
                if let Some(query) = &last_user.content {
                    let recalled = memory.search(query, None, Some(project_path), 5).await;
                    if !recalled.is_empty() {
                        let joined = recalled.iter().map(|node| format!("- ({}) {}", node.layer, node.content)).collect::<Vec<_>>().join("\n");
                        messages.push(ChatMessage {
                            role: "system".to_string(),
                            content: Some(format!("Recalled memory:\n{joined}")),
                            tool_calls: Vec::new(),
                            tool_call_id: None,
                            name: None,
                        });
                    }
                }
            }
        }

        messages.extend(conversation.messages.iter().map(SessionMessage::to_chat_message));
        messages
    }
}

fn hash_arguments(arguments: &serde_json::Value) -> u64 {
    let mut hasher = DefaultHasher::new();
    arguments.to_string().hash(&mut hasher);
    hasher.finish()
}

fn enforce_context_for(capability: Capability, arguments: &serde_json::Value) -> EnforceContext<'_> {
    let string_arg = |key: &str| arguments.get(key).and_then(serde_json::Value::as_str);

    if let Some(path) = string_arg("path").or_else(|| string_arg("file_path")) {
        let is_write = matches!(capability, Capability::FileWrite | Capability::FileDelete | Capability::DirCreate);
        return EnforceContext::path(path, is_write);
    }
    if let Some(command) = string_arg("command") {
        return EnforceContext::command(command);
    }
    if let Some(url) = string_arg("url") {
        return EnforceContext::url(url);
    }
    EnforceContext::none()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_arguments_is_stable_for_equal_values() {
        let a = serde_json::json!({ "path": "/tmp/x", "n": 1 });
        let b = serde_json::json!({ "path": "/tmp/x", "n": 1 });
        assert_eq!(hash_arguments(&a), hash_arguments(&b));
    }

    #[test]
    fn enforce_context_picks_path_over_command() {
        let args = serde_json::json!({ "path": "/tmp/x", "command": "ls" });
        let ctx = enforce_context_for(Capability::FileWrite, &args);
        assert_eq!(ctx.path, Some("/tmp/x"));
        assert!(ctx.is_write);
    }

    #[test]
    fn enforce_context_falls_back_to_none_with_no_recognized_fields() {
        let args = serde_json::json!({ "foo": "bar" });
        let ctx = enforce_context_for(Capability::MemoryRead, &args);
        assert!(ctx.path.is_none());
        assert!(ctx.command.is_none());
        assert!(ctx.url.is_none());
    }
}
