//! Next-speaker selection.
//!
//! [`select`] is a pure function of the history: no model call, no I/O. It
//! only reads the last turn's author, its typed [`ControlSignal`], and the
//! direct-edit flag on user turns.

use artreal_core::{Author, ControlSignal, RoleId, Turn};
use tracing::{debug, warn};

/// Pick the role that speaks next, or `None` when the conversation is over.
///
/// | last turn | next |
/// |---|---|
/// | none | executor |
/// | planner | executor |
/// | executor, terminate | none |
/// | executor, delegate or subtask done | planner |
/// | executor, anything else | executor |
/// | tool runtime | executor |
/// | user, direct edit | executor |
/// | user | planner |
/// | unknown author | executor |
pub fn select(history: &[Turn]) -> Option<RoleId> {
    let Some(last) = history.last() else {
        debug!("empty history, starting with executor");
        return Some(RoleId::Executor);
    };

    let next = match &last.author {
        Author::Planner => Some(RoleId::Executor),
        Author::Executor => match last.signal {
            ControlSignal::Terminate => None,
            ControlSignal::Delegate | ControlSignal::SubtaskDone => Some(RoleId::Planner),
            ControlSignal::Continue => Some(RoleId::Executor),
        },
        Author::ToolRuntime => Some(RoleId::Executor),
        Author::User if last.direct_edit => Some(RoleId::Executor),
        Author::User => Some(RoleId::Planner),
        Author::Other(name) => {
            warn!(author = %name, "unrecognized author, defaulting to executor");
            Some(RoleId::Executor)
        }
    };

    debug!(last = %last.author, signal = ?last.signal, next = ?next, "selected next speaker");
    next
}
