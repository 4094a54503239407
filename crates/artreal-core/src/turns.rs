//! Conversation turns.
//!
//! A [`Turn`] is one immutable unit of conversation output. Its payload is a
//! tagged [`TurnBody`] and any control intent travels in the typed
//! [`ControlSignal`] field beside the text. Model phrasing is inspected exactly
//! once, when role output is converted into a turn; routing and streaming only
//! read the typed field afterwards.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::TurnId;

/// Marker a role writes when the whole task is finished.
pub const TERMINATE_MARKER: &str = "TERMINATE";
/// Marker the executor writes to hand control back to the planner.
pub const DELEGATE_MARKER: &str = "DELEGATE_TO_PLANNER";
/// Marker the executor writes after finishing one planned subtask.
pub const SUBTASK_DONE_MARKER: &str = "SUBTASK_DONE";

/// Task prefixes that mark a user request as a direct edit.
pub const DIRECT_EDIT_TAGS: [&str; 2] = ["[VISUAL EDIT]", "[BUG FIX]"];

// ─────────────────────────────────────────────────────────────────────────────
// Roles and authors
// ─────────────────────────────────────────────────────────────────────────────

/// One of the two cooperating roles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleId {
    /// Text-only planner.
    Planner,
    /// Tool-capable executor.
    Executor,
}

impl RoleId {
    /// Display name used on the wire (`agent_name`).
    #[must_use]
    pub fn agent_name(self) -> &'static str {
        match self {
            Self::Planner => "Planner",
            Self::Executor => "Executor",
        }
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.agent_name())
    }
}

/// Who produced a turn.
///
/// Serialized as a plain string so persisted histories stay readable and
/// unknown authors survive a round trip.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Author {
    /// The planner role.
    Planner,
    /// The executor role.
    Executor,
    /// The tool runtime reporting results.
    ToolRuntime,
    /// The external user.
    User,
    /// Anything else found in a restored history.
    Other(String),
}

impl Author {
    /// The role behind this author, if it is one.
    #[must_use]
    pub fn role(&self) -> Option<RoleId> {
        match self {
            Self::Planner => Some(RoleId::Planner),
            Self::Executor => Some(RoleId::Executor),
            _ => None,
        }
    }

    /// Wire name of the author.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Planner => "Planner",
            Self::Executor => "Executor",
            Self::ToolRuntime => "tool",
            Self::User => "user",
            Self::Other(name) => name,
        }
    }
}

impl From<RoleId> for Author {
    fn from(role: RoleId) -> Self {
        match role {
            RoleId::Planner => Self::Planner,
            RoleId::Executor => Self::Executor,
        }
    }
}

impl From<String> for Author {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Planner" | "planner" => Self::Planner,
            "Executor" | "executor" | "Coder" => Self::Executor,
            "tool" => Self::ToolRuntime,
            "user" => Self::User,
            _ => Self::Other(value),
        }
    }
}

impl From<Author> for String {
    fn from(author: Author) -> Self {
        match author {
            Author::Other(name) => name,
            other => other.as_str().to_owned(),
        }
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Control signals
// ─────────────────────────────────────────────────────────────────────────────

/// Control intent attached to a turn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlSignal {
    /// Keep going with the current role.
    #[default]
    Continue,
    /// Hand control to the planner.
    Delegate,
    /// One subtask finished; the planner picks the next.
    SubtaskDone,
    /// The task is complete.
    Terminate,
}

impl ControlSignal {
    /// Classify role output text. Terminate wins over delegate, which wins
    /// over subtask-done.
    #[must_use]
    pub fn detect(text: &str) -> Self {
        if text.contains(TERMINATE_MARKER) {
            Self::Terminate
        } else if text.contains(DELEGATE_MARKER) {
            Self::Delegate
        } else if text.contains(SUBTASK_DONE_MARKER) {
            Self::SubtaskDone
        } else {
            Self::Continue
        }
    }

    /// Whether this is the default [`ControlSignal::Continue`].
    #[must_use]
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tool traffic
// ─────────────────────────────────────────────────────────────────────────────

/// A tool invocation requested by the executor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call id assigned by the completion service.
    pub id: String,
    /// Tool name.
    pub name: String,
    /// Raw JSON argument text exactly as the model produced it.
    pub arguments: String,
}

/// Result of executing one [`ToolCall`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Id of the call this answers.
    pub call_id: String,
    /// Tool name, repeated for readers of the history.
    pub name: String,
    /// Opaque textual output.
    pub content: String,
    /// Whether the tool failed.
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_error: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Turn
// ─────────────────────────────────────────────────────────────────────────────

/// Payload of a turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TurnBody {
    /// Narration or plan text.
    Text {
        /// The text.
        text: String,
    },
    /// One or more tool invocations, with optional accompanying text.
    ToolCalls {
        /// Requested calls.
        calls: Vec<ToolCall>,
        /// Text the model emitted alongside the calls.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
    },
    /// Results for a batch of tool calls.
    ToolResults {
        /// One result per executed call.
        results: Vec<ToolResult>,
    },
}

/// Coarse turn kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnKind {
    /// [`TurnBody::Text`].
    Text,
    /// [`TurnBody::ToolCalls`].
    ToolCall,
    /// [`TurnBody::ToolResults`].
    ToolResult,
}

/// One emitted unit of conversation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Unique id.
    pub id: TurnId,
    /// Producer.
    pub author: Author,
    /// Payload.
    #[serde(flatten)]
    pub body: TurnBody,
    /// Typed control intent.
    #[serde(default, skip_serializing_if = "ControlSignal::is_continue")]
    pub signal: ControlSignal,
    /// User request that should skip planning.
    #[serde(default, skip_serializing_if = "is_false")]
    pub direct_edit: bool,
    /// Emission time.
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    fn build(author: Author, body: TurnBody, signal: ControlSignal) -> Self {
        Self {
            id: TurnId::new(),
            author,
            body,
            signal,
            direct_edit: false,
            timestamp: Utc::now(),
        }
    }

    /// A user task. Tagged requests (`[VISUAL EDIT]`, `[BUG FIX]`) are marked
    /// as direct edits automatically.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        let text = text.into();
        let direct_edit = DIRECT_EDIT_TAGS.iter().any(|tag| text.contains(tag));
        let mut turn = Self::build(Author::User, TurnBody::Text { text }, ControlSignal::Continue);
        turn.direct_edit = direct_edit;
        turn
    }

    /// Text from a role. The control signal is derived here and nowhere else.
    #[must_use]
    pub fn role_text(role: RoleId, text: impl Into<String>) -> Self {
        let text = text.into();
        let signal = ControlSignal::detect(&text);
        Self::build(role.into(), TurnBody::Text { text }, signal)
    }

    /// Tool calls from a role.
    #[must_use]
    pub fn tool_calls(role: RoleId, calls: Vec<ToolCall>, text: Option<String>) -> Self {
        Self::build(
            role.into(),
            TurnBody::ToolCalls { calls, text },
            ControlSignal::Continue,
        )
    }

    /// Results reported by the tool runtime.
    #[must_use]
    pub fn tool_results(results: Vec<ToolResult>) -> Self {
        Self::build(
            Author::ToolRuntime,
            TurnBody::ToolResults { results },
            ControlSignal::Continue,
        )
    }

    /// Mark this turn as a direct edit request.
    #[must_use]
    pub fn with_direct_edit(mut self, direct_edit: bool) -> Self {
        self.direct_edit = self.direct_edit || direct_edit;
        self
    }

    /// Coarse kind of the body.
    #[must_use]
    pub fn kind(&self) -> TurnKind {
        match self.body {
            TurnBody::Text { .. } => TurnKind::Text,
            TurnBody::ToolCalls { .. } => TurnKind::ToolCall,
            TurnBody::ToolResults { .. } => TurnKind::ToolResult,
        }
    }

    /// Text content, if the body carries any.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match &self.body {
            TurnBody::Text { text } => Some(text),
            TurnBody::ToolCalls { text, .. } => text.as_deref(),
            TurnBody::ToolResults { .. } => None,
        }
    }

    /// Whether the external user wrote this turn.
    #[must_use]
    pub fn is_user(&self) -> bool {
        self.author == Author::User
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(value: &bool) -> bool {
    !*value
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    #[test]
    fn detect_prefers_terminate() {
        assert_eq!(
            ControlSignal::detect("SUBTASK_DONE and TERMINATE"),
            ControlSignal::Terminate
        );
        assert_eq!(
            ControlSignal::detect("DELEGATE_TO_PLANNER after SUBTASK_DONE"),
            ControlSignal::Delegate
        );
        assert_eq!(ControlSignal::detect("SUBTASK_DONE"), ControlSignal::SubtaskDone);
        assert_eq!(ControlSignal::detect("Task completed"), ControlSignal::Continue);
        assert_eq!(ControlSignal::detect("writing the header"), ControlSignal::Continue);
    }

    #[test]
    fn role_text_sets_signal_once() {
        let turn = Turn::role_text(RoleId::Executor, "All good. TERMINATE");
        assert_eq!(turn.signal, ControlSignal::Terminate);
        assert_eq!(turn.author, Author::Executor);
        assert_eq!(turn.kind(), TurnKind::Text);
    }

    #[test]
    fn tagged_user_task_is_direct_edit() {
        assert!(Turn::user("[BUG FIX] the nav overlaps").direct_edit);
        assert!(Turn::user("[VISUAL EDIT] make it blue").direct_edit);
        assert!(!Turn::user("build a landing page").direct_edit);
        assert!(Turn::user("fix the bug").with_direct_edit(true).direct_edit);
    }

    #[test]
    fn author_round_trips_as_string() {
        for author in [
            Author::Planner,
            Author::Executor,
            Author::ToolRuntime,
            Author::User,
            Author::Other("Reviewer".into()),
        ] {
            let json = serde_json::to_string(&author).unwrap();
            let back: Author = serde_json::from_str(&json).unwrap();
            assert_eq!(back, author);
        }
        let legacy: Author = serde_json::from_str("\"Coder\"").unwrap();
        assert_eq!(legacy, Author::Executor);
    }

    #[test]
    fn turn_json_shape() {
        let turn = Turn::tool_calls(
            RoleId::Executor,
            vec![ToolCall {
                id: "call_1".into(),
                name: "write_file".into(),
                arguments: "{}".into(),
            }],
            None,
        );
        let value = serde_json::to_value(&turn).unwrap();
        assert_eq!(value["kind"], "tool_calls");
        assert_eq!(value["author"], "Executor");
        assert!(value.get("signal").is_none());
        assert!(value.get("direct_edit").is_none());

        let back: Turn = serde_json::from_value(value).unwrap();
        assert_matches!(back.body, TurnBody::ToolCalls { ref calls, .. } if calls.len() == 1);
    }

    #[test]
    fn text_reads_through_tool_calls() {
        let turn = Turn::tool_calls(RoleId::Executor, vec![], Some("checking".into()));
        assert_eq!(turn.text(), Some("checking"));
        assert_eq!(Turn::tool_results(vec![]).text(), None);
    }

    proptest! {
        #[test]
        fn terminate_marker_wins_anywhere(prefix in "[a-z .]{0,30}", suffix in "[a-z .]{0,30}") {
            let text = format!("{prefix}SUBTASK_DONE {prefix}TERMINATE{suffix}");
            prop_assert_eq!(ControlSignal::detect(&text), ControlSignal::Terminate);
        }

        #[test]
        fn lowercase_prose_never_signals(text in "[a-z ,.]{0,80}") {
            prop_assert_eq!(ControlSignal::detect(&text), ControlSignal::Continue);
        }
    }
}
