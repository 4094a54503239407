//! `read_file`: return a file's text content.

use std::sync::Arc;

use artreal_core::tools::{ToolParameterSchema, text_result};
use artreal_core::{ToolDefinition, ToolOutput};
use async_trait::async_trait;
use serde_json::Value;

use crate::errors::ToolError;
use crate::fs::{PATH_KEYS, path_property};
use crate::traits::{AgentTool, FileSystemOps, ToolContext};
use crate::utils::fs_errors::format_fs_error;
use crate::utils::path::resolve_path;
use crate::utils::validation::required_string;

/// Reads a workspace file.
pub struct ReadFileTool {
    fs: Arc<dyn FileSystemOps>,
}

impl ReadFileTool {
    /// Create the tool over a filesystem.
    pub fn new(fs: Arc<dyn FileSystemOps>) -> Self {
        Self { fs }
    }
}

#[async_trait]
impl AgentTool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn definition(&self) -> ToolDefinition {
        let mut props = serde_json::Map::new();
        let _ = props.insert("target_file".into(), path_property());
        ToolDefinition {
            name: "read_file".into(),
            description: "Read the full text content of a file in the project.".into(),
            parameters: ToolParameterSchema::object(props, &["target_file"]),
        }
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let file_path = match required_string(&params, &PATH_KEYS, "path to the file") {
            Ok(p) => p,
            Err(e) => return Ok(e),
        };
        let resolved = resolve_path(&file_path, &ctx.working_directory);

        match self.fs.read_file(&resolved).await {
            Ok(bytes) => Ok(text_result(String::from_utf8_lossy(&bytes).into_owned())),
            Err(e) => Ok(format_fs_error(&e, &file_path, "reading")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockFs, make_ctx};
    use serde_json::json;

    #[tokio::test]
    async fn reads_relative_path() {
        let fs = Arc::new(MockFs::new().with_file("/projects/project_7/index.html", "<h1>Hi</h1>"));
        let tool = ReadFileTool::new(fs);
        let out = tool
            .execute(json!({"target_file": "index.html"}), &make_ctx())
            .await
            .unwrap();
        assert!(!out.is_error);
        assert_eq!(out.content, "<h1>Hi</h1>");
    }

    #[tokio::test]
    async fn missing_file_is_error_result() {
        let tool = ReadFileTool::new(Arc::new(MockFs::new()));
        let out = tool
            .execute(json!({"file_path": "nope.txt"}), &make_ctx())
            .await
            .unwrap();
        assert!(out.is_error);
        assert!(out.content.contains("nope.txt"));
    }
}
