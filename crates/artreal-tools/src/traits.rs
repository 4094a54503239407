//! Core tool trait and its dependency-injection seams.

use std::io;
use std::path::Path;

use artreal_core::{ToolDefinition, ToolOutput};
use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::errors::ToolError;

// ─────────────────────────────────────────────────────────────────────────────
// Tool context
// ─────────────────────────────────────────────────────────────────────────────

/// Execution context passed to every tool invocation.
#[derive(Clone, Debug)]
pub struct ToolContext {
    /// Id of the call being executed.
    pub tool_call_id: String,
    /// Project the call belongs to.
    pub project_id: String,
    /// Project workspace; relative paths resolve against it.
    pub working_directory: String,
    /// Cancellation token of the surrounding run.
    pub cancellation: CancellationToken,
}

// ─────────────────────────────────────────────────────────────────────────────
// AgentTool trait
// ─────────────────────────────────────────────────────────────────────────────

/// The trait every tool implements.
#[async_trait]
pub trait AgentTool: Send + Sync {
    /// Tool name, exactly as the model sees it.
    fn name(&self) -> &str;

    /// Whether a successful call leaves new file content in the workspace.
    fn writes_files(&self) -> bool {
        false
    }

    /// Schema offered to the model.
    fn definition(&self) -> ToolDefinition;

    /// Execute with JSON arguments.
    ///
    /// Invalid input should come back as an error [`ToolOutput`]; `Err` is for
    /// failures the tool could not describe itself.
    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<ToolOutput, ToolError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Filesystem seam
// ─────────────────────────────────────────────────────────────────────────────

/// Filesystem operations used by the file tools.
#[async_trait]
pub trait FileSystemOps: Send + Sync {
    /// Read the contents of a file.
    async fn read_file(&self, path: &Path) -> Result<Vec<u8>, io::Error>;
    /// Write content to a file, replacing it.
    async fn write_file(&self, path: &Path, content: &[u8]) -> Result<(), io::Error>;
    /// Create a directory and all parents.
    async fn create_dir_all(&self, path: &Path) -> Result<(), io::Error>;
    /// Delete a file.
    async fn remove_file(&self, path: &Path) -> Result<(), io::Error>;
    /// Whether a path exists.
    fn exists(&self, path: &Path) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_context_construction() {
        let ctx = ToolContext {
            tool_call_id: "call-1".into(),
            project_id: "42".into(),
            working_directory: "/tmp/project_42".into(),
            cancellation: CancellationToken::new(),
        };
        assert_eq!(ctx.tool_call_id, "call-1");
        assert!(!ctx.cancellation.is_cancelled());
    }
}
