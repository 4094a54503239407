//! `delete_file`: remove a file from the workspace.

use std::sync::Arc;

use artreal_core::tools::{ToolParameterSchema, error_result, text_result};
use artreal_core::{ToolDefinition, ToolOutput};
use async_trait::async_trait;
use serde_json::Value;

use crate::errors::ToolError;
use crate::fs::{PATH_KEYS, path_property};
use crate::traits::{AgentTool, FileSystemOps, ToolContext};
use crate::utils::fs_errors::format_fs_error;
use crate::utils::path::resolve_path;
use crate::utils::validation::{is_agent_state_file, required_string, state_file_blocked};

/// Deletes workspace files.
pub struct DeleteFileTool {
    fs: Arc<dyn FileSystemOps>,
}

impl DeleteFileTool {
    /// Create the tool over a filesystem.
    pub fn new(fs: Arc<dyn FileSystemOps>) -> Self {
        Self { fs }
    }
}

#[async_trait]
impl AgentTool for DeleteFileTool {
    fn name(&self) -> &str {
        "delete_file"
    }

    fn definition(&self) -> ToolDefinition {
        let mut props = serde_json::Map::new();
        let _ = props.insert("target_file".into(), path_property());
        ToolDefinition {
            name: "delete_file".into(),
            description: "Delete a file from the project.".into(),
            parameters: ToolParameterSchema::object(props, &["target_file"]),
        }
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let file_path = match required_string(&params, &PATH_KEYS, "path to the file") {
            Ok(p) => p,
            Err(e) => return Ok(e),
        };
        if is_agent_state_file(&file_path) {
            return Ok(state_file_blocked(&file_path, "deleted"));
        }

        let resolved = resolve_path(&file_path, &ctx.working_directory);
        if !self.fs.exists(&resolved) {
            return Ok(error_result(format!("File not found: {file_path}")));
        }
        match self.fs.remove_file(&resolved).await {
            Ok(()) => Ok(text_result(format!("Successfully deleted file: {file_path}"))),
            Err(e) => Ok(format_fs_error(&e, &file_path, "deleting")),
        }
    }
}
