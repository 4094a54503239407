//! Run termination rule.

use artreal_core::{ControlSignal, Turn};

use crate::errors::StopReason;

/// Stops a run on a terminate signal from a role, or once the run has
/// produced `max_messages` messages.
///
/// A message is the user's task or one finished role activation. Tool
/// requests and tool results inside an activation do not count, so an
/// executor chaining several tool calls still adds a single message.
#[derive(Clone, Copy, Debug)]
pub struct TerminationRule {
    max_messages: usize,
}

impl TerminationRule {
    /// Rule with the given message ceiling.
    pub fn new(max_messages: usize) -> Self {
        Self { max_messages }
    }

    /// Message ceiling.
    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    /// Check the newest turn of the run and the messages produced so far.
    pub fn check(&self, last: Option<&Turn>, messages: usize) -> Option<StopReason> {
        if last.is_some_and(|t| !t.is_user() && t.signal == ControlSignal::Terminate) {
            return Some(StopReason::Terminated);
        }
        (messages >= self.max_messages).then_some(StopReason::MaxMessages)
    }
}
