//! Runtime error types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Errors that end a run early.
///
/// Tool failures and persistence failures never show up here: the first
/// become error tool results, the second are logged and swallowed.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// Completion service failure.
    #[error("Provider error: {0}")]
    Provider(#[from] artreal_llm::ProviderError),

    /// The run was cancelled between turns.
    #[error("Operation cancelled")]
    Cancelled,

    /// The registry no longer hands out sessions.
    #[error("Session registry is shut down")]
    ShuttingDown,

    /// State could not be read or written.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Internal / unexpected error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RuntimeError {
    /// Whether the caller can simply try again.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Provider(e) => e.is_retryable(),
            Self::Cancelled => true,
            Self::ShuttingDown | Self::Persistence(_) | Self::Internal(_) => false,
        }
    }

    /// Error category string for logs and events.
    pub fn category(&self) -> &str {
        match self {
            Self::Provider(_) => "provider",
            Self::Cancelled => "cancelled",
            Self::ShuttingDown => "shutting_down",
            Self::Persistence(_) => "persistence",
            Self::Internal(_) => "internal",
        }
    }
}

/// Why a run stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// A role signalled that the task is complete.
    Terminated,
    /// The per-run message ceiling was reached.
    MaxMessages,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Terminated => write!(f, "terminated"),
            Self::MaxMessages => write!(f, "max_messages"),
        }
    }
}
