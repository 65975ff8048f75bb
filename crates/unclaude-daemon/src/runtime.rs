//! The daemon's main loop (spec §4.8(a)): a cooperative, single-process
//! scheduler that pops tasks off the queue up to `max_concurrent` in
//! flight, drives each through the agent iteration loop, interleaves the
//! proactive engine and file watchers on their own cadences, and shuts
//! down gracefully on request (spec §4.8(g)).
//!
//! [`DaemonRuntime`] owns every long-lived collaborator (identity manager,
//! policy engine, session store, task queue, audit log, usage tracker,
//! smart router, status tracker) and assembles a fresh [`AgentLoop`] call
//! per popped task. The process entry point lives in the `unclauded`
//! binary crate: it builds a [`RuntimeConfig`], supplies the external
//! collaborators (`LlmClient`, tools, memory, compaction, bridges), and
//! calls [`DaemonRuntime::run`].

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Notify};
use tokio::task::JoinSet;

use unclaude_audit::{AuditEvent, AuditEventType, AuditLog};
use unclaude_capabilities::{CapabilitySet, Profile as CapabilityProfile};
use unclaude_config::ProactiveConfig;
use unclaude_core::{ContextCompactor, ContextPruner, LlmClient, MemoryStore, Tool};
use unclaude_identity::{IdentityManager, SessionType};
use unclaude_policy::PolicyEngine;
use unclaude_router::{RoutingProfile, SmartRouter};
use unclaude_sandbox::{SandboxPolicy, SandboxProfile};
use unclaude_sessions::{SessionKey, SessionStore};
use unclaude_tasks::{Task, TaskQueue};
use unclaude_usage::UsageTracker;

use crate::agent_loop::{AgentLoop, TaskOutcome};
use crate::error::DaemonResult;
use crate::pidfile::{pid_file_path, remove_pid_file, write_pid_file};
use crate::proactive::ProactiveEngine;
use crate::status::{DaemonState, StatusTracker};
use crate::watcher::{TaskFileWatcher, TasksMarkdownWatcher};

/// The fixed agent identity every daemon-driven task's session is logged
/// under (spec §4.6 `agent:<agent_id>:<session_id>` key). Every task gets
/// its own conversation (`session_id = task_id`); only the agent half of
/// the key is shared.
const TASK_AGENT_ID: &str = "daemon";

/// Map a capability preset to the sandbox preset it's conventionally paired
/// with (spec §4.2 profile table): readonly/subagent run strict, developer
/// runs standard, autonomous/full run permissive.
fn sandbox_profile_for(capability_profile: CapabilityProfile) -> SandboxProfile {
    match capability_profile {
        CapabilityProfile::Readonly | CapabilityProfile::Subagent => SandboxProfile::Strict,
        CapabilityProfile::Developer => SandboxProfile::Standard,
        CapabilityProfile::Autonomous | CapabilityProfile::Full => SandboxProfile::Permissive,
    }
}

/// Everything needed to assemble a [`DaemonRuntime`] (spec §4.8, §6
/// `config.yaml`).
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// `<state_dir>` root (spec §6 on-disk layout).
    pub state_dir: PathBuf,
    /// The project directory this daemon instance operates against.
    pub project_path: String,
    /// Active capability preset.
    pub security_profile: CapabilityProfile,
    /// Active Smart Router profile.
    pub routing_profile: RoutingProfile,
    /// Preferred LLM provider, if configured.
    pub preferred_provider: Option<String>,
    /// How often the main loop checks the task queue for new work.
    pub poll_interval: Duration,
    /// How often the file watchers re-scan the project directory.
    pub watcher_interval: Duration,
    /// How often the proactive engine is given a chance to self-schedule.
    pub proactive_interval: Duration,
    /// Maximum tasks executing concurrently (spec §4.8 "Concurrency
    /// model": default 1).
    pub max_concurrent: usize,
}

impl RuntimeConfig {
    /// Build a config from the loaded `config.yaml` and resolved state
    /// directory, using the defaults spec §4.8 describes for the polling
    /// cadences.
    #[must_use]
    pub fn new(state_dir: PathBuf, project_path: impl Into<String>, config: &unclaude_config::Config) -> Self {
        let security_profile =
            CapabilityProfile::parse(config.security.profile.as_str()).unwrap_or(CapabilityProfile::Developer);
        let routing_profile = RoutingProfile::parse(config.routing.profile.as_str()).unwrap_or(RoutingProfile::Auto);
        Self {
            state_dir,
            project_path: project_path.into(),
            security_profile,
            routing_profile,
            preferred_provider: config.default_provider.clone(),
            poll_interval: Duration::from_secs(5),
            watcher_interval: Duration::from_secs(30),
            proactive_interval: Duration::from_secs(60),
            max_concurrent: 1,
        }
    }

    fn daemon_dir(&self) -> PathBuf {
        self.state_dir.join("daemon")
    }
}

/// The long-running daemon process (C8). Holds every collaborator the
/// agent loop and the self-scheduling subsystems need, built once at
/// startup and shared across every task the main loop pops.
pub struct DaemonRuntime {
    config: RuntimeConfig,
    identity: Mutex<IdentityManager>,
    policy: Mutex<PolicyEngine>,
    sessions: Arc<SessionStore>,
    queue: Arc<TaskQueue>,
    audit: Arc<AuditLog>,
    status: Arc<StatusTracker>,
    proactive: ProactiveEngine,
    proactive_config: Option<ProactiveConfig>,
    task_file_watcher: TaskFileWatcher,
    tasks_md_watcher: TasksMarkdownWatcher,
    agent_loop: AgentLoop,
    daemon_session_id: String,
    shutdown: Notify,
}

/// One agent loop attempt's result, folded back into the task queue and
/// status tracker by the main loop.
struct TaskAttempt {
    task_id: String,
    succeeded: bool,
    cost_usd: f64,
}

impl DaemonRuntime {
    /// Assemble a runtime: opens (or creates) every on-disk store rooted at
    /// `config.state_dir`, mints the daemon's own standing identity session
    /// on first run, and wires the supplied external collaborators into a
    /// fresh [`AgentLoop`].
    ///
    /// # Errors
    ///
    /// Returns an error if any on-disk store fails to open or the identity
    /// manager cannot be initialized.
    #[allow(clippy::too_many_arguments)]
    pub async fn new(
        config: RuntimeConfig,
        llm: Arc<dyn LlmClient>,
        tools: HashMap<String, Arc<dyn Tool>>,
        memory: Option<Arc<dyn MemoryStore>>,
        compactor: Option<Arc<dyn ContextCompactor>>,
        pruner: Option<Arc<dyn ContextPruner>>,
        proactive_config: Option<ProactiveConfig>,
    ) -> DaemonResult<Self> {
        std::fs::create_dir_all(&config.state_dir)?;
        let daemon_dir = config.daemon_dir();
        std::fs::create_dir_all(&daemon_dir)?;

        let mut identity = IdentityManager::new(config.state_dir.join("identity"))?;
        let daemon_session_id = identity.create_session(
            "daemon",
            SessionType::Daemon,
            config.security_profile.as_str(),
            config.project_path.clone(),
            None,
        );

        let (capabilities, _token) = CapabilitySet::new(config.security_profile);
        let sandbox = SandboxPolicy::for_profile(sandbox_profile_for(config.security_profile));
        let policy = PolicyEngine::new(capabilities, sandbox);

        let sessions = Arc::new(SessionStore::open(config.state_dir.join("sessions"))?);
        let queue = Arc::new(TaskQueue::open(&daemon_dir)?);
        let audit = Arc::new(AuditLog::open(config.state_dir.join("audit.db")).await?);
        let usage = Arc::new(UsageTracker::open(config.state_dir.join("daemon").join("usage.db")).await?);
        let router = Arc::new(SmartRouter::new(config.routing_profile, config.preferred_provider.clone()));
        let status = StatusTracker::new(daemon_dir.clone(), config.project_path.as_str(), std::process::id());

        let agent_loop = AgentLoop {
            llm,
            tools: Arc::new(tools),
            memory,
            compactor,
            pruner,
            router,
            usage,
            audit: Arc::clone(&audit),
            sessions: Arc::clone(&sessions),
            routing_profile: config.routing_profile,
            pinned: false,
        };

        Ok(Self {
            proactive: ProactiveEngine::new(&daemon_dir),
            task_file_watcher: TaskFileWatcher::new(&daemon_dir),
            tasks_md_watcher: TasksMarkdownWatcher::new(&daemon_dir),
            identity: Mutex::new(identity),
            policy: Mutex::new(policy),
            sessions,
            queue,
            audit,
            status,
            proactive_config,
            agent_loop,
            daemon_session_id,
            shutdown: Notify::new(),
            config,
        })
    }

    /// The status tracker, for handing to a status-reporting RPC surface
    /// or read directly by a CLI sharing this process (tests only; the
    /// real CLI reads the persisted status file instead).
    #[must_use]
    pub fn status(&self) -> Arc<StatusTracker> {
        Arc::clone(&self.status)
    }

    /// The task queue, so the binary entry point (or an embedded CLI
    /// command) can push tasks into the same daemon the runtime just
    /// opened.
    #[must_use]
    pub fn queue(&self) -> Arc<TaskQueue> {
        Arc::clone(&self.queue)
    }

    /// Run the daemon to completion: writes the pid file, moves to
    /// `running`, then loops until [`DaemonHandle::shutdown`] is called,
    /// at which point it cancels gracefully (spec §4.8(g)) and returns.
    ///
    /// # Errors
    ///
    /// Returns an error if the pid file cannot be written, or if
    /// persisting the status file fails in a way that isn't safe to
    /// ignore.
    pub async fn run(self: Arc<Self>) -> DaemonResult<()> {
        let daemon_dir = self.config.daemon_dir();
        write_pid_file(&pid_file_path(&daemon_dir), std::process::id()).await?;
        self.status.set_state(DaemonState::Idle).await;
        self.status.persist().await?;

        let mut poll = tokio::time::interval(self.config.poll_interval);
        let mut watcher_tick = tokio::time::interval(self.config.watcher_interval);
        let mut proactive_tick = tokio::time::interval(self.config.proactive_interval);
        let mut tasks: JoinSet<TaskAttempt> = JoinSet::new();
        let mut idle_since = tokio::time::Instant::now();

        loop {
            tokio::select! {
                () = self.shutdown.notified() => {
                    break;
                }
                _ = poll.tick() => {
                    Self::on_poll_tick(&self, &mut tasks, &mut idle_since).await;
                }
                _ = watcher_tick.tick() => {
                    if let Err(error) = self.run_watchers().await {
                        tracing::warn!(error = %error, "file watcher scan failed");
                    }
                }
                _ = proactive_tick.tick() => {
                    let busy = !tasks.is_empty();
                    let idle_seconds = i64::try_from(idle_since.elapsed().as_secs()).unwrap_or(i64::MAX);
                    if let Err(error) = self.run_proactive_cycle(busy, idle_seconds).await {
                        tracing::warn!(error = %error, "proactive cycle failed");
                    }
                }
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    idle_since = tokio::time::Instant::now();
                    self.on_task_finished(joined, &tasks).await;
                }
            }
        }

        self.graceful_shutdown(tasks).await
    }

    /// A handle another task can use to request shutdown of a runtime
    /// that's executing inside [`DaemonRuntime::run`].
    #[must_use]
    pub fn handle(runtime: &Arc<Self>) -> DaemonHandle {
        DaemonHandle { runtime: Arc::clone(runtime) }
    }

    async fn on_poll_tick(runtime: &Arc<Self>, tasks: &mut JoinSet<TaskAttempt>, idle_since: &mut tokio::time::Instant) {
        let pending = runtime.queue.pending_count().unwrap_or(0);
        runtime.status.set_gauges(pending, tasks.len());

        if tasks.len() >= runtime.config.max_concurrent {
            return;
        }

        match runtime.queue.pop() {
            Ok(Some(task)) => {
                *idle_since = tokio::time::Instant::now();
                runtime.status.set_state(DaemonState::Processing).await;
                let spawned = Arc::clone(runtime);
                tasks.spawn(async move { spawned.execute_task(task).await });
            }
            Ok(None) => {
                if tasks.is_empty() {
                    runtime.status.set_state(DaemonState::Idle).await;
                }
            }
            Err(error) => tracing::error!(error = %error, "task queue pop failed"),
        }

        runtime.status.persist().await.ok();
    }

    async fn on_task_finished(&self, joined: Result<TaskAttempt, tokio::task::JoinError>, remaining: &JoinSet<TaskAttempt>) {
        match joined {
            Ok(attempt) => {
                self.status.record_task_outcome(attempt.succeeded, attempt.cost_usd);
                tracing::info!(task_id = %attempt.task_id, succeeded = attempt.succeeded, "task execution finished");
            }
            Err(join_error) => {
                tracing::error!(error = %join_error, "task execution unit panicked");
            }
        }
        if remaining.is_empty() {
            self.status.set_state(DaemonState::Idle).await;
        }
        self.status.persist().await.ok();
    }

    /// Drive one popped task through the agent loop to a terminal outcome,
    /// recording it on the queue, status tracker, and audit log.
    async fn execute_task(self: Arc<Self>, task: Task) -> TaskAttempt {
        let task_id = task.task_id.clone();
        let session_key = SessionKey::new(TASK_AGENT_ID, task_id.clone());

        {
            let identity = self.identity.lock().await;
            if !identity.verify_session_chain(&self.daemon_session_id) {
                drop(identity);
                tracing::error!(task_id = %task_id, "daemon identity chain failed verification");
                self.queue.fail(&task_id, "daemon identity chain invalid").ok();
                self.log_task_event(AuditEventType::TaskFailed, &session_key, false, Some("identity chain invalid"))
                    .await;
                return TaskAttempt { task_id, succeeded: false, cost_usd: 0.0 };
            }
        }

        if self.sessions.load(&session_key).is_err() {
            if let Err(error) = self.sessions.create(TASK_AGENT_ID, Some(task_id.clone()), task.project_path.clone()) {
                tracing::error!(task_id = %task_id, error = %error, "failed to open task session log");
                self.queue.fail(&task_id, format!("session store error: {error}")).ok();
                return TaskAttempt { task_id, succeeded: false, cost_usd: 0.0 };
            }
        }

        let (max_iterations, max_cost_usd) = {
            let policy = self.policy.lock().await;
            let limits = policy.sandbox().limits();
            (limits.max_iterations, limits.max_cost_usd)
        };

        let outcome = {
            let mut policy = self.policy.lock().await;
            self.agent_loop
                .run(
                    &task_id,
                    &session_key,
                    &task.description,
                    &task.project_path,
                    &mut policy,
                    max_iterations,
                    max_cost_usd,
                )
                .await
        };

        match outcome {
            TaskOutcome::Completed { result, iterations, cost_usd } => {
                self.queue.record_usage(&task_id, iterations, cost_usd).ok();
                self.queue.complete(&task_id, result).ok();
                self.log_task_event(AuditEventType::TaskCompleted, &session_key, true, None).await;
                TaskAttempt { task_id, succeeded: true, cost_usd }
            }
            TaskOutcome::Failed { error, iterations, cost_usd } => {
                self.queue.record_usage(&task_id, iterations, cost_usd).ok();
                self.queue.fail(&task_id, error.clone()).ok();
                self.log_task_event(AuditEventType::TaskFailed, &session_key, false, Some(&error)).await;
                TaskAttempt { task_id, succeeded: false, cost_usd }
            }
        }
    }

    async fn log_task_event(&self, event_type: AuditEventType, session_key: &SessionKey, success: bool, error: Option<&str>) {
        let mut event = AuditEvent::new(event_type).with_session(session_key.as_wire()).with_agent(TASK_AGENT_ID);
        if !success {
            event = event.with_error(error.unwrap_or("task failed"));
        }
        self.audit.log(event).await.ok();
    }

    async fn run_watchers(&self) -> DaemonResult<()> {
        let file_found = self.task_file_watcher.scan(&self.config.project_path, &self.queue).await?;
        let md_found = self.tasks_md_watcher.scan(&self.config.project_path, &self.queue).await?;
        if file_found + md_found > 0 {
            tracing::info!(file_found, md_found, "file watchers enqueued new tasks");
        }
        Ok(())
    }

    async fn run_proactive_cycle(&self, busy: bool, idle_seconds: i64) -> DaemonResult<()> {
        let Some(config) = &self.proactive_config else {
            return Ok(());
        };
        if let Some(behavior) = self.proactive.run_cycle(config, &self.queue, &self.config.project_path, busy, idle_seconds).await? {
            tracing::info!(behavior, "proactive engine submitted a task");
        }
        Ok(())
    }

    /// Shut down gracefully (spec §4.8(g)): fail every in-flight task with
    /// a `"Daemon shutdown"` reason, flush the audit log, remove the pid
    /// file, and write a final `stopped` status snapshot.
    async fn graceful_shutdown(&self, mut tasks: JoinSet<TaskAttempt>) -> DaemonResult<()> {
        self.status.set_state(DaemonState::Stopping).await;
        self.status.persist().await.ok();

        tasks.abort_all();
        while let Some(joined) = tasks.join_next().await {
            if let Ok(attempt) = joined {
                self.queue.fail(&attempt.task_id, "Daemon shutdown").ok();
            }
        }

        // Any task still `running` in the queue file that wasn't tracked in
        // `tasks` (e.g. a stale entry recovered from a prior crash) is
        // failed here too, so the queue never reports a phantom in-flight
        // task after a clean stop.
        if let Ok(running) = self.queue.list_tasks(Some(unclaude_tasks::TaskStatus::Running), usize::MAX) {
            for task in running {
                self.queue.fail(&task.task_id, "Daemon shutdown").ok();
            }
        }

        self.audit.flush().await.ok();
        remove_pid_file(&pid_file_path(&self.config.daemon_dir())).await.ok();
        self.status.set_state(DaemonState::Stopped).await;
        self.status.persist().await.ok();
        Ok(())
    }
}

/// A handle that can request shutdown of a [`DaemonRuntime`] running in
/// another task (spec §4.8(g): "On SIGINT/SIGTERM: set shutdown flag").
#[derive(Clone)]
pub struct DaemonHandle {
    runtime: Arc<DaemonRuntime>,
}

impl DaemonHandle {
    /// Signal the runtime's main loop to stop and begin graceful shutdown.
    pub fn shutdown(&self) {
        self.runtime.shutdown.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unclaude_test::{temp_state_dir, MockLlmClient};

    async fn build_runtime(dir: &std::path::Path) -> Arc<DaemonRuntime> {
        let config = unclaude_config::Config::default();
        let runtime_config = RuntimeConfig::new(dir.to_path_buf(), "/tmp/project", &config);
        let llm: Arc<dyn LlmClient> = Arc::new(MockLlmClient::always_text("done"));
        let runtime = DaemonRuntime::new(runtime_config, llm, HashMap::new(), None, None, None, None)
            .await
            .unwrap();
        Arc::new(runtime)
    }

    #[tokio::test]
    async fn executes_a_popped_task_to_completion() {
        let dir = temp_state_dir();
        let runtime = build_runtime(dir.path()).await;

        runtime
            .queue()
            .push(Task::new("say hello", unclaude_core::Priority::Normal, "cli", "/tmp/project"))
            .unwrap();
        let task = runtime.queue().pop().unwrap().expect("pushed task is poppable");

        let attempt = Arc::clone(&runtime).execute_task(task).await;

        assert!(attempt.succeeded);
        assert!(runtime.queue().list_tasks(Some(unclaude_tasks::TaskStatus::Completed), 10).unwrap().len() == 1);
    }

    #[tokio::test]
    async fn pops_nothing_from_an_empty_queue() {
        let dir = temp_state_dir();
        let runtime = build_runtime(dir.path()).await;
        assert!(runtime.queue().pop().unwrap().is_none());
    }

    #[tokio::test]
    async fn handle_shutdown_wakes_the_notify() {
        let dir = temp_state_dir();
        let runtime = build_runtime(dir.path()).await;
        let handle = DaemonRuntime::handle(&runtime);
        handle.shutdown();
        // `notified()` resolves immediately since `notify_one` was already
        // called; this just proves the handle reaches the same `Notify`.
        runtime.shutdown.notified().await;
    }
}
