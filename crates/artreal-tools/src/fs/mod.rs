//! Workspace file tools: read, write, edit, delete.

pub mod delete;
pub mod edit;
pub mod read;
pub mod write;

/// Argument names accepted for the target path, in lookup order.
pub const PATH_KEYS: [&str; 4] = ["target_file", "TargetFile", "file_path", "path"];

/// Argument names accepted for full file content, in lookup order.
pub const CONTENT_KEYS: [&str; 2] = ["file_content", "content"];

pub(crate) fn path_property() -> serde_json::Value {
    serde_json::json!({
        "type": "string",
        "description": "Path of the file, relative to the project root"
    })
}
