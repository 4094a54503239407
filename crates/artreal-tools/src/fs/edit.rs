//! `edit_file`: exact string replacement inside a file.

use std::sync::Arc;

use artreal_core::tools::{ToolParameterSchema, error_result, text_result};
use artreal_core::{ToolDefinition, ToolOutput};
use async_trait::async_trait;
use serde_json::{Value, json};

use crate::errors::ToolError;
use crate::fs::{PATH_KEYS, path_property};
use crate::traits::{AgentTool, FileSystemOps, ToolContext};
use crate::utils::fs_errors::format_fs_error;
use crate::utils::path::resolve_path;
use crate::utils::validation::{is_agent_state_file, required_string, state_file_blocked};

/// Replaces text in an existing file.
pub struct EditFileTool {
    fs: Arc<dyn FileSystemOps>,
}

impl EditFileTool {
    /// Create the tool over a filesystem.
    pub fn new(fs: Arc<dyn FileSystemOps>) -> Self {
        Self { fs }
    }
}

fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(50).collect();
    if text.chars().count() > 50 {
        out.push_str("...");
    }
    out
}

#[async_trait]
impl AgentTool for EditFileTool {
    fn name(&self) -> &str {
        "edit_file"
    }

    fn writes_files(&self) -> bool {
        true
    }

    fn definition(&self) -> ToolDefinition {
        let mut props = serde_json::Map::new();
        let _ = props.insert("target_file".into(), path_property());
        let _ = props.insert(
            "old_string".into(),
            json!({"type": "string", "description": "The exact text to find"}),
        );
        let _ = props.insert(
            "new_string".into(),
            json!({"type": "string", "description": "The replacement text"}),
        );
        let _ = props.insert(
            "replace_all".into(),
            json!({"type": "boolean", "description": "Replace every occurrence (default: false)"}),
        );
        ToolDefinition {
            name: "edit_file".into(),
            description: "Replace an exact piece of text in a file. old_string must match \
                          exactly once unless replace_all is set."
                .into(),
            parameters: ToolParameterSchema::object(
                props,
                &["target_file", "old_string", "new_string"],
            ),
        }
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<ToolOutput, ToolError> {
        let file_path = match required_string(&params, &PATH_KEYS, "path to the file") {
            Ok(p) => p,
            Err(e) => return Ok(e),
        };
        if is_agent_state_file(&file_path) {
            return Ok(state_file_blocked(&file_path, "edited"));
        }
        let old_string = match required_string(&params, &["old_string"], "the text to find") {
            Ok(s) => s,
            Err(e) => return Ok(e),
        };
        let new_string = match required_string(&params, &["new_string"], "the replacement text") {
            Ok(s) => s,
            Err(e) => return Ok(e),
        };
        if old_string.is_empty() {
            return Ok(error_result("old_string must not be empty"));
        }
        if old_string == new_string {
            return Ok(error_result(
                "old_string and new_string are identical, nothing would change",
            ));
        }
        let replace_all = params
            .get("replace_all")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let resolved = resolve_path(&file_path, &ctx.working_directory);
        let content = match self.fs.read_file(&resolved).await {
            Ok(b) => String::from_utf8_lossy(&b).into_owned(),
            Err(e) => return Ok(format_fs_error(&e, &file_path, "reading")),
        };

        let count = content.matches(old_string.as_str()).count();
        if count == 0 {
            return Ok(error_result(format!(
                "old_string not found in {file_path}: \"{}\"",
                preview(&old_string)
            )));
        }
        if count > 1 && !replace_all {
            return Ok(error_result(format!(
                "Found {count} occurrences of old_string. Set replace_all or make old_string more specific."
            )));
        }

        let updated = if replace_all {
            content.replace(old_string.as_str(), &new_string)
        } else {
            content.replacen(old_string.as_str(), &new_string, 1)
        };
        if let Err(e) = self.fs.write_file(&resolved, updated.as_bytes()).await {
            return Ok(format_fs_error(&e, &file_path, "writing"));
        }

        let replacements = if replace_all { count } else { 1 };
        Ok(text_result(format!(
            "Edited {file_path}: {replacements} replacement(s)"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockFs, make_ctx};

    const FILE: &str = "/projects/project_7/src/App.tsx";

    #[tokio::test]
    async fn single_replacement() {
        let fs = Arc::new(MockFs::new().with_file(FILE, "<h1 className=\"red\">Hi</h1>"));
        let tool = EditFileTool::new(fs.clone());
        let out = tool
            .execute(
                json!({"TargetFile": "src/App.tsx", "old_string": "red", "new_string": "blue"}),
                &make_ctx(),
            )
            .await
            .unwrap();
        assert!(!out.is_error, "{}", out.content);
        assert_eq!(fs.content(FILE).unwrap(), "<h1 className=\"blue\">Hi</h1>");
    }

    #[tokio::test]
    async fn ambiguous_match_needs_replace_all() {
        let fs = Arc::new(MockFs::new().with_file(FILE, "a a a"));
        let tool = EditFileTool::new(fs.clone());
        let out = tool
            .execute(
                json!({"target_file": "src/App.tsx", "old_string": "a", "new_string": "b"}),
                &make_ctx(),
            )
            .await
            .unwrap();
        assert!(out.is_error);
        assert!(out.content.contains("3 occurrences"));

        let out = tool
            .execute(
                json!({"target_file": "src/App.tsx", "old_string": "a", "new_string": "b", "replace_all": true}),
                &make_ctx(),
            )
            .await
            .unwrap();
        assert!(!out.is_error);
        assert_eq!(fs.content(FILE).unwrap(), "b b b");
    }

    #[tokio::test]
    async fn not_found_leaves_file() {
        let fs = Arc::new(MockFs::new().with_file(FILE, "hello"));
        let tool = EditFileTool::new(fs.clone());
        let out = tool
            .execute(
                json!({"target_file": "src/App.tsx", "old_string": "bye", "new_string": "x"}),
                &make_ctx(),
            )
            .await
            .unwrap();
        assert!(out.is_error);
        assert_eq!(fs.content(FILE).unwrap(), "hello");
    }

    #[tokio::test]
    async fn identical_strings_rejected() {
        let tool = EditFileTool::new(Arc::new(MockFs::new().with_file(FILE, "x")));
        let out = tool
            .execute(
                json!({"target_file": "src/App.tsx", "old_string": "x", "new_string": "x"}),
                &make_ctx(),
            )
            .await
            .unwrap();
        assert!(out.is_error);
    }
}
