//! Tool error types.

use std::io;

use thiserror::Error;

/// Errors that can occur during tool execution.
///
/// The runtime folds every variant into an error tool result, so none of
/// these ever end a run.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Parameter validation failed.
    #[error("validation error: {message}")]
    Validation {
        /// Description of the validation failure.
        message: String,
    },

    /// File or path not found.
    #[error("file not found: {path}")]
    FileNotFound {
        /// The path that was not found.
        path: String,
    },

    /// The path is off limits to tools.
    #[error("forbidden path {path}: {reason}")]
    Forbidden {
        /// Offending path.
        path: String,
        /// Why it is blocked.
        reason: String,
    },

    /// Generic I/O error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// Operation was cancelled.
    #[error("cancelled")]
    Cancelled,

    /// No tool with this name is registered.
    #[error("unknown tool: {name}")]
    UnknownTool {
        /// Requested name.
        name: String,
    },

    /// Anything unexpected.
    #[error("internal error: {message}")]
    Internal {
        /// Description.
        message: String,
    },
}

impl ToolError {
    /// Short category label for logs.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::FileNotFound { .. } => "not_found",
            Self::Forbidden { .. } => "forbidden",
            Self::Io(_) => "io",
            Self::Cancelled => "cancelled",
            Self::UnknownTool { .. } => "unknown_tool",
            Self::Internal { .. } => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_category() {
        let err = ToolError::Forbidden {
            path: ".agent_state.json".into(),
            reason: "internal agent state".into(),
        };
        assert!(err.to_string().contains(".agent_state.json"));
        assert_eq!(err.category(), "forbidden");

        let io_err: ToolError = io::Error::new(io::ErrorKind::PermissionDenied, "denied").into();
        assert_eq!(io_err.category(), "io");
        assert_eq!(
            ToolError::UnknownTool { name: "bash".into() }.to_string(),
            "unknown tool: bash"
        );
    }
}
