//! `SessionOrchestrator`: owns one project's conversation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use artreal_core::{ProjectId, RoleId, ToolDefinition, Turn, TurnBody};
use artreal_llm::CompletionClient;
use artreal_settings::AgentSettings;
use artreal_tools::ToolRegistry;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::errors::{RuntimeError, StopReason};
use crate::orchestrator::state::{RoleMemories, SessionState, StateStore};
use crate::orchestrator::tool_executor::execute_tool_calls;
use crate::roles::{Executor, Planner, Role};
use crate::router;
use crate::termination::TerminationRule;
use crate::types::{FinalMessage, RunContext, RunEvent, RunOutcome, RunStream, Task};

/// Conversation limits and prompts.
#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    /// Message ceiling per run (the task plus one per role activation).
    pub max_messages: usize,
    /// Model calls the executor may chain per activation.
    pub executor_tool_iterations: usize,
    /// Turns kept in each role's memory.
    pub buffer_size: usize,
    /// History entries kept on restore.
    pub restore_history_limit: usize,
    /// Planner system prompt.
    pub planner_prompt: String,
    /// Executor system prompt.
    pub executor_prompt: String,
}

impl From<&AgentSettings> for OrchestratorConfig {
    fn from(settings: &AgentSettings) -> Self {
        Self {
            max_messages: settings.max_messages,
            executor_tool_iterations: settings.executor_tool_iterations,
            buffer_size: settings.buffer_size,
            restore_history_limit: settings.restore_history_limit,
            planner_prompt: settings.planner_prompt.clone(),
            executor_prompt: settings.executor_prompt.clone(),
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::from(&AgentSettings::default())
    }
}

/// Mutable conversation: the history plus both role memories.
struct Conversation {
    history: Vec<Turn>,
    planner: Planner,
    executor: Executor,
    extra: Map<String, Value>,
}

impl Conversation {
    fn new(config: &OrchestratorConfig) -> Self {
        Self {
            history: Vec::new(),
            planner: Planner::new(&config.planner_prompt, config.buffer_size),
            executor: Executor::new(
                &config.executor_prompt,
                config.buffer_size,
                config.executor_tool_iterations,
            ),
            extra: Map::new(),
        }
    }

    /// Append to the history and broadcast to both roles.
    fn record(&mut self, turn: &Turn) {
        self.history.push(turn.clone());
        self.planner.observe(turn);
        self.executor.observe(turn);
    }

    fn role(&self, id: RoleId) -> &dyn Role {
        match id {
            RoleId::Planner => &self.planner,
            RoleId::Executor => &self.executor,
        }
    }

    fn run_turns(&self, run_start: usize) -> &[Turn] {
        self.history.get(run_start..).unwrap_or(&[])
    }

    fn snapshot(&self) -> SessionState {
        SessionState {
            history: self.history.clone(),
            roles: RoleMemories {
                planner: self.planner.context().snapshot(),
                executor: self.executor.context().snapshot(),
            },
            extra: self.extra.clone(),
            ..SessionState::default()
        }
    }

    fn load(&mut self, state: SessionState) {
        let SessionState {
            history,
            roles,
            extra,
            ..
        } = state;
        // Older documents may lack role memories; rebuild them from history.
        let planner = if roles.planner.is_empty() {
            history.clone()
        } else {
            roles.planner
        };
        let executor = if roles.executor.is_empty() {
            history.clone()
        } else {
            roles.executor
        };
        self.planner.restore(planner);
        self.executor.restore(executor);
        self.history = history;
        self.extra = extra;
    }
}

/// Conversation owner for one project.
///
/// Runs are single-flight: a second `run` waits for the first to finish.
pub struct SessionOrchestrator {
    project_id: ProjectId,
    workspace: PathBuf,
    client: Arc<dyn CompletionClient>,
    tools: ToolRegistry,
    store: Arc<dyn StateStore>,
    config: OrchestratorConfig,
    conversation: Mutex<Conversation>,
    run_gate: Mutex<()>,
}

impl SessionOrchestrator {
    /// Orchestrator with an empty conversation.
    pub fn new(
        project_id: ProjectId,
        workspace: impl Into<PathBuf>,
        client: Arc<dyn CompletionClient>,
        tools: ToolRegistry,
        store: Arc<dyn StateStore>,
        config: OrchestratorConfig,
    ) -> Self {
        let conversation = Mutex::new(Conversation::new(&config));
        Self {
            project_id,
            workspace: workspace.into(),
            client,
            tools,
            store,
            config,
            conversation,
            run_gate: Mutex::new(()),
        }
    }

    /// Project this session belongs to.
    pub fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    /// Project workspace root.
    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    /// Tools offered to the executor.
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Whether a run is in progress.
    pub fn is_busy(&self) -> bool {
        self.run_gate.try_lock().is_err()
    }

    /// Copy of the full history.
    pub async fn history(&self) -> Vec<Turn> {
        self.conversation.lock().await.history.clone()
    }

    /// Run one task to completion.
    ///
    /// Yields the user turn, then every turn the roles and the tool runtime
    /// produce, then [`RunEvent::Finished`]. Provider failures and
    /// cancellation end the stream with an `Err` item.
    pub fn run(self: &Arc<Self>, task: Task, ctx: RunContext) -> RunStream {
        type Item = Result<RunEvent, RuntimeError>;

        let this = Arc::clone(self);
        Box::pin(async_stream::stream! {
            let _gate = this.run_gate.lock().await;
            let tools = this.tools.definitions();
            let rule = TerminationRule::new(this.config.max_messages);
            let workspace = this.workspace.to_string_lossy().into_owned();

            let user = Turn::user(task.text).with_direct_edit(task.direct_edit);
            let run_start = {
                let mut conv = this.conversation.lock().await;
                let start = conv.history.len();
                conv.record(&user);
                start
            };
            info!(
                project_id = %this.project_id,
                direct_edit = user.direct_edit,
                "run started"
            );
            let v: Item = Ok(RunEvent::Turn(user));
            yield v;

            // The task is the first message; each finished activation adds one.
            let mut messages = 1;
            let stop_reason = loop {
                if let Some(reason) = this.check_stop(&rule, run_start, messages).await {
                    break reason;
                }
                if ctx.cancellation.is_cancelled() {
                    info!(project_id = %this.project_id, "run cancelled");
                    let v: Item = Err(RuntimeError::Cancelled);
                    yield v;
                    return;
                }
                let next = router::select(&this.conversation.lock().await.history);
                let Some(role) = next else {
                    break StopReason::Terminated;
                };

                let budget = this.conversation.lock().await.role(role).max_model_calls();
                for _ in 0..budget {
                    let turn = match this.take_turn(role, &tools, &ctx).await {
                        Ok(turn) => turn,
                        Err(e) => {
                            warn!(project_id = %this.project_id, error = %e, "run failed");
                            let v: Item = Err(e);
                            yield v;
                            return;
                        }
                    };
                    let calls = match &turn.body {
                        TurnBody::ToolCalls { calls, .. } if !calls.is_empty() => Some(calls.clone()),
                        _ => None,
                    };
                    let v: Item = Ok(RunEvent::Turn(turn));
                    yield v;

                    let Some(calls) = calls else { break };
                    if this.check_stop(&rule, run_start, messages).await.is_some()
                        || ctx.cancellation.is_cancelled()
                    {
                        break;
                    }

                    let results = execute_tool_calls(
                        &calls,
                        &this.tools,
                        this.project_id.as_str(),
                        &workspace,
                        &ctx.cancellation,
                    )
                    .await;
                    let turn = Turn::tool_results(results);
                    this.conversation.lock().await.record(&turn);
                    let v: Item = Ok(RunEvent::Turn(turn));
                    yield v;

                    if ctx.cancellation.is_cancelled() {
                        break;
                    }
                }
                messages += 1;
            };

            let last_message = {
                let conv = this.conversation.lock().await;
                final_message(conv.run_turns(run_start))
            };
            info!(
                project_id = %this.project_id,
                stop_reason = %stop_reason,
                "run finished"
            );
            let v: Item = Ok(RunEvent::Finished(RunOutcome {
                stop_reason,
                last_message,
            }));
            yield v;
        })
    }

    async fn check_stop(
        &self,
        rule: &TerminationRule,
        run_start: usize,
        messages: usize,
    ) -> Option<StopReason> {
        let conv = self.conversation.lock().await;
        rule.check(conv.run_turns(run_start).last(), messages)
    }

    /// One model call for `role`. The conversation is locked only to build
    /// the request and to record the resulting turn, never across the call.
    async fn take_turn(
        &self,
        role: RoleId,
        tools: &[ToolDefinition],
        ctx: &RunContext,
    ) -> Result<Turn, RuntimeError> {
        let request = self.conversation.lock().await.role(role).build_request(tools);
        debug!(
            role = %role,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "requesting turn"
        );
        let response = self
            .client
            .complete(&request, ctx.credential.as_ref())
            .await?;

        let mut conv = self.conversation.lock().await;
        let turn = conv.role(role).to_turn(response);
        conv.record(&turn);
        debug!(role = %role, kind = ?turn.kind(), signal = ?turn.signal, "turn recorded");
        Ok(turn)
    }

    /// Save the current state. Failures are logged, never raised.
    #[instrument(skip_all, fields(project_id = %id))]
    pub async fn persist(&self, id: &ProjectId) {
        let state = self.conversation.lock().await.snapshot();
        match self.store.save(id, &state).await {
            Ok(()) => debug!(entries = state.history.len(), "session persisted"),
            Err(e) => warn!(error = %e, "failed to persist session"),
        }
    }

    /// Load saved state, keeping only the newest entries. Returns whether
    /// anything was restored; missing or unreadable state leaves the
    /// session empty.
    #[instrument(skip_all, fields(project_id = %id))]
    pub async fn restore(&self, id: &ProjectId) -> bool {
        match self.store.load(id).await {
            Ok(Some(state)) => {
                let state = state.truncated(self.config.restore_history_limit);
                let entries = state.history.len();
                self.conversation.lock().await.load(state);
                info!(entries, "session restored");
                true
            }
            Ok(None) => {
                debug!("no saved session");
                false
            }
            Err(e) => {
                warn!(error = %e, "failed to restore session, starting fresh");
                false
            }
        }
    }

    /// Release the completion client.
    pub async fn close(&self) {
        self.client.close().await;
        debug!(project_id = %self.project_id, "orchestrator closed");
    }
}

/// Newest turn of the run that carries text.
fn final_message(run_turns: &[Turn]) -> Option<FinalMessage> {
    run_turns.iter().rev().find_map(|turn| {
        let text = turn.text()?.trim();
        (!text.is_empty()).then(|| FinalMessage {
            content: text.to_owned(),
            agent_name: turn.author.as_str().to_owned(),
        })
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
