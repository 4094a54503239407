//! External event protocol.

use artreal_core::{ProjectId, SessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::StopReason;
use crate::types::FinalMessage;

/// What an interaction shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    /// Narration.
    Thought,
    /// A tool invocation.
    ToolCall,
    /// A tool's output.
    ToolResult,
}

/// One entry of the interaction log, also streamed live.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentInteraction {
    /// Who produced it.
    pub agent_name: String,
    /// Kind of entry.
    pub message_type: InteractionKind,
    /// Text shown to the user.
    pub content: String,
    /// Tool involved, for tool entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    /// Parsed call arguments, for tool entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_arguments: Option<Value>,
    /// When the underlying turn was emitted.
    pub timestamp: DateTime<Utc>,
}

/// A file the executor just wrote.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUpdate {
    /// Path relative to the project workspace.
    pub path: String,
    /// Full file content.
    pub content: String,
}

/// Events emitted by [`ExecutionStreamer`](crate::ExecutionStreamer).
///
/// Serialized as `{"type": "...", "data": {...}}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Always first.
    Start {
        /// Chat session.
        session_id: SessionId,
        /// Message that started the run.
        user_message_id: String,
    },
    /// A thought, tool call, or tool result.
    AgentInteraction(AgentInteraction),
    /// Files changed, or the final "ready" notice when `files` is absent.
    FilesReady {
        /// Human-readable notice.
        message: String,
        /// Project.
        project_id: ProjectId,
        /// Changed files.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        files: Option<Vec<FileUpdate>>,
    },
    /// The preview should reload.
    ReloadPreview {
        /// Project.
        project_id: ProjectId,
    },
    /// The run finished normally.
    Complete {
        /// Project.
        project_id: ProjectId,
        /// Why it stopped.
        stop_reason: StopReason,
        /// Last message with text.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        final_message: Option<FinalMessage>,
    },
    /// The run failed. Always last.
    Error {
        /// Error text.
        message: String,
        /// Error category.
        category: String,
    },
}

impl StreamEvent {
    /// Whether this event ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Error { .. })
    }
}
