//! `write_file`: create or replace a file.
//!
//! Creates parent directories automatically. Refuses agent state files, and
//! refuses to replace a large file with a tiny one, which is almost always a
//! truncated model output rather than an intended rewrite.

use std::sync::Arc;

use artreal_core::tools::{ToolParameterSchema, error_result, text_result};
use artreal_core::{ToolDefinition, ToolOutput};
use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::warn;

use crate::errors::ToolError;
use crate::fs::{CONTENT_KEYS, PATH_KEYS, path_property};
use crate::traits::{AgentTool, FileSystemOps, ToolContext};
use crate::utils::fs_errors::format_fs_error;
use crate::utils::path::resolve_path;
use crate::utils::validation::{is_agent_state_file, required_string, state_file_blocked};

/// Existing files above this many lines are protected from tiny rewrites.
const LARGE_FILE_LINES: usize = 1000;
/// Replacement content below this many lines counts as tiny.
const SMALL_CONTENT_LINES: usize = 100;

/// Creates or overwrites workspace files.
pub struct WriteFileTool {
    fs: Arc<dyn FileSystemOps>,
}

impl WriteFileTool {
    /// Create the tool over a filesystem.
    pub fn new(fs: Arc<dyn FileSystemOps>) -> Self {
        Self { fs }
    }
}

#[async_trait]
impl AgentTool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn writes_files(&self) -> bool {
        true
    }

    fn definition(&self) -> ToolDefinition {
        let mut props = serde_json::Map::new();
        let _ = props.insert("target_file".into(), path_property());
        let _ = props.insert(
            "file_content".into(),
            json!({"type": "string", "description": "Complete new content of the file"}),
        );
        ToolDefinition {
            name: "write_file".into(),
            description: "Write content to a file, creating parent folders as needed. \
                          Replaces the whole file; use edit_file for partial changes."
                .into(),
            parameters: ToolParameterSchema::object(props, &["target_file", "file_content"]),
        }
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let file_path = match required_string(&params, &PATH_KEYS, "path to the file") {
            Ok(p) => p,
            Err(e) => return Ok(e),
        };
        if is_agent_state_file(&file_path) {
            warn!(path = %file_path, "blocked write to agent state file");
            return Ok(state_file_blocked(&file_path, "written"));
        }
        let content = match required_string(&params, &CONTENT_KEYS, "the content to write") {
            Ok(c) => c,
            Err(e) => return Ok(e),
        };

        let resolved = resolve_path(&file_path, &ctx.working_directory);

        if let Some(parent) = resolved.parent() {
            if let Err(e) = self.fs.create_dir_all(parent).await {
                return Ok(format_fs_error(&e, &parent.to_string_lossy(), "creating directory"));
            }
        }

        // Unreadable (e.g. binary) files skip the check.
        if self.fs.exists(&resolved) {
            if let Ok(old) = self.fs.read_file(&resolved).await {
                let old_lines = String::from_utf8_lossy(&old).lines().count();
                let new_lines = content.lines().count();
                if old_lines > LARGE_FILE_LINES && new_lines < SMALL_CONTENT_LINES {
                    warn!(path = %file_path, old_lines, new_lines, "refused destructive overwrite");
                    return Ok(error_result(format!(
                        "Refusing to overwrite a large file ({old_lines} lines) with very little \
                         content ({new_lines} lines). Use edit_file for partial changes, or \
                         delete_file first if the file really should be replaced."
                    )));
                }
            }
        }

        if let Err(e) = self.fs.write_file(&resolved, content.as_bytes()).await {
            return Ok(format_fs_error(&e, &file_path, "writing"));
        }

        Ok(text_result(format!(
            "Successfully wrote {} characters to {file_path}",
            content.chars().count()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockFs, make_ctx};

    #[tokio::test]
    async fn creates_file() {
        let fs = Arc::new(MockFs::new());
        let tool = WriteFileTool::new(fs.clone());
        let out = tool
            .execute(
                json!({"target_file": "src/App.tsx", "file_content": "export {}"}),
                &make_ctx(),
            )
            .await
            .unwrap();
        assert!(!out.is_error, "{}", out.content);
        assert_eq!(
            fs.content("/projects/project_7/src/App.tsx").as_deref(),
            Some("export {}")
        );
    }

    #[tokio::test]
    async fn accepts_alternate_argument_names() {
        let fs = Arc::new(MockFs::new());
        let tool = WriteFileTool::new(fs.clone());
        let out = tool
            .execute(json!({"path": "a.txt", "content": "x"}), &make_ctx())
            .await
            .unwrap();
        assert!(!out.is_error);
        assert!(fs.content("/projects/project_7/a.txt").is_some());
    }

    #[tokio::test]
    async fn blocks_state_files() {
        let fs = Arc::new(MockFs::new());
        let tool = WriteFileTool::new(fs.clone());
        let out = tool
            .execute(
                json!({"target_file": ".agent_state.json", "file_content": "{}"}),
                &make_ctx(),
            )
            .await
            .unwrap();
        assert!(out.is_error);
        assert!(fs.content("/projects/project_7/.agent_state.json").is_none());
    }

    #[tokio::test]
    async fn refuses_demolishing_large_file() {
        let big = "line\n".repeat(1500);
        let fs = Arc::new(MockFs::new().with_file("/projects/project_7/big.js", big.clone()));
        let tool = WriteFileTool::new(fs.clone());
        let out = tool
            .execute(
                json!({"target_file": "big.js", "file_content": "tiny\n"}),
                &make_ctx(),
            )
            .await
            .unwrap();
        assert!(out.is_error);
        assert_eq!(fs.content("/projects/project_7/big.js"), Some(big));
    }

    #[tokio::test]
    async fn large_rewrite_of_large_file_allowed() {
        let fs = Arc::new(MockFs::new().with_file("/projects/project_7/big.js", "a\n".repeat(1500)));
        let tool = WriteFileTool::new(fs);
        let out = tool
            .execute(
                json!({"target_file": "big.js", "file_content": "b\n".repeat(200)}),
                &make_ctx(),
            )
            .await
            .unwrap();
        assert!(!out.is_error);
    }

    #[tokio::test]
    async fn missing_content() {
        let tool = WriteFileTool::new(Arc::new(MockFs::new()));
        let out = tool
            .execute(json!({"target_file": "a.txt"}), &make_ctx())
            .await
            .unwrap();
        assert!(out.is_error);
        assert!(out.content.contains("file_content"));
    }
}
