//! `ExecutionStreamer`: one run in, the external event protocol out.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use artreal_core::{Author, ProjectId, SessionId, Turn, TurnBody};
use artreal_settings::StreamingSettings;
use artreal_tools::ToolRegistry;
use artreal_tools::fs::{CONTENT_KEYS, PATH_KEYS};
use artreal_tools::utils::path::{resolve_path, workspace_relative};
use futures::{Stream, StreamExt};
use serde_json::{Value, json};
use tracing::{debug, error, info, warn};

use crate::errors::RuntimeError;
use crate::orchestrator::SessionOrchestrator;
use crate::streaming::events::{AgentInteraction, FileUpdate, InteractionKind, StreamEvent};
use crate::streaming::store::{InteractionLog, InteractionStore};
use crate::types::{RunContext, RunEvent, RunOutcome, Task};

/// Notice sent with the final `files_ready` event.
pub const FILES_READY_MESSAGE: &str = "Files ready for download";

/// Boxed stream of protocol events.
pub type EventStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

/// Filtering and checkpoint cadence.
#[derive(Clone, Copy, Debug)]
pub struct StreamerConfig {
    /// Interactions between interim checkpoints.
    pub checkpoint_every: usize,
    /// Shorter narration (after trimming) is not streamed.
    pub min_thought_chars: usize,
}

impl From<&StreamingSettings> for StreamerConfig {
    fn from(settings: &StreamingSettings) -> Self {
        Self {
            checkpoint_every: settings.checkpoint_every.max(1),
            min_thought_chars: settings.min_thought_chars,
        }
    }
}

impl Default for StreamerConfig {
    fn default() -> Self {
        Self::from(&StreamingSettings::default())
    }
}

/// Identifies the run being streamed.
#[derive(Clone, Debug)]
pub struct StreamRequest {
    /// The task.
    pub task: Task,
    /// Chat session the run belongs to.
    pub session_id: SessionId,
    /// Message that started the run.
    pub user_message_id: String,
}

/// Drives one orchestrator run and turns it into [`StreamEvent`]s.
pub struct ExecutionStreamer {
    orchestrator: Arc<SessionOrchestrator>,
    interactions: Arc<dyn InteractionStore>,
    config: StreamerConfig,
}

impl ExecutionStreamer {
    /// Streamer over a live orchestrator.
    pub fn new(
        orchestrator: Arc<SessionOrchestrator>,
        interactions: Arc<dyn InteractionStore>,
        config: StreamerConfig,
    ) -> Self {
        Self {
            orchestrator,
            interactions,
            config,
        }
    }

    /// Run the task and stream its events.
    ///
    /// The stream always starts with `start` and ends with exactly one of
    /// `complete` or `error`. A run failure never tears the session down;
    /// the log gathered so far is checkpointed before `error` goes out.
    pub fn stream(&self, request: StreamRequest, ctx: RunContext) -> EventStream {
        let orchestrator = Arc::clone(&self.orchestrator);
        let interactions = Arc::clone(&self.interactions);
        let config = self.config;

        Box::pin(async_stream::stream! {
            let project_id = orchestrator.project_id().clone();
            yield StreamEvent::Start {
                session_id: request.session_id,
                user_message_id: request.user_message_id.clone(),
            };

            let mut translator = Translator::new(
                project_id.clone(),
                orchestrator.workspace(),
                orchestrator.tools().clone(),
                config.min_thought_chars,
                request.user_message_id,
            );
            let checkpoint = Checkpointer {
                orchestrator: Arc::clone(&orchestrator),
                interactions,
                project_id: project_id.clone(),
            };

            let mut run = orchestrator.run(request.task, ctx);
            let mut outcome: Option<RunOutcome> = None;
            let mut failure: Option<RuntimeError> = None;
            while let Some(item) = run.next().await {
                match item {
                    Ok(RunEvent::Turn(turn)) => {
                        for event in translator.translate(&turn).await {
                            yield event;
                        }
                        if translator.since_checkpoint >= config.checkpoint_every {
                            translator.since_checkpoint = 0;
                            checkpoint.save(&translator.log).await;
                        }
                    }
                    Ok(RunEvent::Finished(done)) => {
                        outcome = Some(done);
                        break;
                    }
                    Err(e) => {
                        failure = Some(e);
                        break;
                    }
                }
            }
            drop(run);

            match (outcome, failure) {
                (Some(done), _) => {
                    translator.log.final_message = done.last_message.clone();
                    checkpoint.save(&translator.log).await;
                    info!(
                        project_id = %project_id,
                        stop_reason = %done.stop_reason,
                        interactions = translator.log.interactions.len(),
                        "stream complete"
                    );
                    yield StreamEvent::FilesReady {
                        message: FILES_READY_MESSAGE.into(),
                        project_id: project_id.clone(),
                        files: None,
                    };
                    yield StreamEvent::ReloadPreview {
                        project_id: project_id.clone(),
                    };
                    yield StreamEvent::Complete {
                        project_id,
                        stop_reason: done.stop_reason,
                        final_message: done.last_message,
                    };
                }
                (None, failure) => {
                    let e = failure.unwrap_or_else(|| {
                        RuntimeError::Internal("run ended without a result".into())
                    });
                    error!(
                        project_id = %project_id,
                        error = %e,
                        category = e.category(),
                        recoverable = e.is_recoverable(),
                        detail = ?e,
                        "run failed"
                    );
                    checkpoint.save(&translator.log).await;
                    yield StreamEvent::Error {
                        message: e.to_string(),
                        category: e.category().to_owned(),
                    };
                }
            }
        })
    }
}

struct Checkpointer {
    orchestrator: Arc<SessionOrchestrator>,
    interactions: Arc<dyn InteractionStore>,
    project_id: ProjectId,
}

impl Checkpointer {
    /// Save the log and the session. Failures are logged only.
    async fn save(&self, log: &InteractionLog) {
        if let Err(e) = self.interactions.save(&self.project_id, log).await {
            warn!(project_id = %self.project_id, error = %e, "failed to save interaction log");
        }
        self.orchestrator.persist(&self.project_id).await;
        debug!(
            project_id = %self.project_id,
            interactions = log.interactions.len(),
            final_checkpoint = log.final_message.is_some(),
            "checkpoint written"
        );
    }
}

struct PendingCall {
    name: String,
    arguments: Value,
}

/// Turn → event translation with the pending-call table.
struct Translator {
    project_id: ProjectId,
    workspace: PathBuf,
    tools: ToolRegistry,
    min_thought_chars: usize,
    pending: HashMap<String, PendingCall>,
    log: InteractionLog,
    since_checkpoint: usize,
}

impl Translator {
    fn new(
        project_id: ProjectId,
        workspace: &Path,
        tools: ToolRegistry,
        min_thought_chars: usize,
        user_message_id: String,
    ) -> Self {
        Self {
            project_id,
            workspace: workspace.to_path_buf(),
            tools,
            min_thought_chars,
            pending: HashMap::new(),
            log: InteractionLog {
                user_message_id,
                ..InteractionLog::default()
            },
            since_checkpoint: 0,
        }
    }

    async fn translate(&mut self, turn: &Turn) -> Vec<StreamEvent> {
        if turn.is_user() {
            return Vec::new();
        }
        let mut events = Vec::new();
        match &turn.body {
            TurnBody::Text { text } => {
                if turn.signal.is_continue() {
                    self.thought(turn, text, &mut events);
                }
            }
            TurnBody::ToolCalls { calls, text } => {
                if let Some(text) = text {
                    self.thought(turn, text, &mut events);
                }
                for call in calls {
                    let arguments = parse_arguments(&call.arguments);
                    let _ = self.pending.insert(
                        call.id.clone(),
                        PendingCall {
                            name: call.name.clone(),
                            arguments: arguments.clone(),
                        },
                    );
                    self.record(
                        AgentInteraction {
                            agent_name: turn.author.as_str().to_owned(),
                            message_type: InteractionKind::ToolCall,
                            content: format!("Calling: {}", call.name),
                            tool_name: Some(call.name.clone()),
                            tool_arguments: Some(arguments),
                            timestamp: turn.timestamp,
                        },
                        &mut events,
                    );
                }
            }
            TurnBody::ToolResults { results } => {
                for result in results {
                    let pending = self.pending.remove(&result.call_id);
                    self.record(
                        AgentInteraction {
                            agent_name: Author::ToolRuntime.as_str().to_owned(),
                            message_type: InteractionKind::ToolResult,
                            content: result.content.clone(),
                            tool_name: Some(result.name.clone()),
                            tool_arguments: pending.as_ref().map(|p| p.arguments.clone()),
                            timestamp: turn.timestamp,
                        },
                        &mut events,
                    );

                    let Some(pending) = pending else {
                        warn!(call_id = %result.call_id, "tool result without a pending call");
                        continue;
                    };
                    if result.is_error || !self.tools.writes_files(&pending.name) {
                        continue;
                    }
                    if let Some(update) = self.file_update(&pending.arguments).await {
                        events.push(StreamEvent::FilesReady {
                            message: format!("Updated {}", update.path),
                            project_id: self.project_id.clone(),
                            files: Some(vec![update]),
                        });
                    }
                }
            }
        }
        events
    }

    /// Narration worth showing: not a bare control marker, not trivially short.
    fn thought(&mut self, turn: &Turn, text: &str, events: &mut Vec<StreamEvent>) {
        let trimmed = text.trim();
        if trimmed.chars().count() < self.min_thought_chars {
            return;
        }
        self.record(
            AgentInteraction {
                agent_name: turn.author.as_str().to_owned(),
                message_type: InteractionKind::Thought,
                content: trimmed.to_owned(),
                tool_name: None,
                tool_arguments: None,
                timestamp: turn.timestamp,
            },
            events,
        );
    }

    fn record(&mut self, interaction: AgentInteraction, events: &mut Vec<StreamEvent>) {
        self.log.interactions.push(interaction.clone());
        self.since_checkpoint += 1;
        events.push(StreamEvent::AgentInteraction(interaction));
    }

    /// Path and full content of a written file. Content comes from the
    /// arguments when they carry it, otherwise it is read back from disk.
    async fn file_update(&self, arguments: &Value) -> Option<FileUpdate> {
        let path = PATH_KEYS
            .iter()
            .find_map(|k| arguments.get(*k).and_then(Value::as_str))?;
        let workspace = self.workspace.to_string_lossy();
        let resolved = resolve_path(path, &workspace);

        let inline = CONTENT_KEYS
            .iter()
            .find_map(|k| arguments.get(*k).and_then(Value::as_str));
        let content = match inline {
            Some(content) => content.to_owned(),
            None => match tokio::fs::read_to_string(&resolved).await {
                Ok(content) => content,
                Err(e) => {
                    warn!(path = %resolved.display(), error = %e, "cannot read back written file");
                    return None;
                }
            },
        };
        Some(FileUpdate {
            path: workspace_relative(&resolved, &self.workspace),
            content,
        })
    }
}

/// Arguments as JSON, or `{"raw": text}` when the model sent something else.
fn parse_arguments(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| json!({ "raw": raw }))
}
