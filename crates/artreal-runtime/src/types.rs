//! Run inputs and outputs.

use std::pin::Pin;

use artreal_core::ApiKey;
use artreal_core::Turn;
use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::errors::{RuntimeError, StopReason};

/// A user request to run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Task {
    /// Request text.
    pub text: String,
    /// Skip planning and go straight to the executor.
    pub direct_edit: bool,
}

impl Task {
    /// A task; `[VISUAL EDIT]` / `[BUG FIX]` tags still mark it as a direct edit.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            direct_edit: false,
        }
    }

    /// Explicitly mark the task as a direct edit.
    #[must_use]
    pub fn with_direct_edit(mut self, direct_edit: bool) -> Self {
        self.direct_edit = direct_edit;
        self
    }
}

/// Per-run context passed explicitly down to the transport.
#[derive(Clone, Debug, Default)]
pub struct RunContext {
    /// Checked between turns.
    pub cancellation: CancellationToken,
    /// Caller-scoped key for every model call of this run.
    pub credential: Option<ApiKey>,
}

/// Last meaningful message of a run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalMessage {
    /// Message text.
    pub content: String,
    /// Author wire name.
    pub agent_name: String,
}

/// How a run ended.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    /// Why it stopped.
    pub stop_reason: StopReason,
    /// Last message with text, if any.
    pub last_message: Option<FinalMessage>,
}

/// Items yielded by [`SessionOrchestrator::run`](crate::SessionOrchestrator::run).
#[derive(Clone, Debug, PartialEq)]
pub enum RunEvent {
    /// A turn was appended to the history.
    Turn(Turn),
    /// The run is over. Always the last item of a successful run.
    Finished(RunOutcome),
}

/// Stream of run events.
pub type RunStream = Pin<Box<dyn Stream<Item = Result<RunEvent, RuntimeError>> + Send>>;
