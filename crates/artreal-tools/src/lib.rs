//! # artreal-tools
//!
//! Tool trait and the workspace file tools the executor calls.
//!
//! - [`AgentTool`]: the trait every tool implements
//! - [`ToolRegistry`]: name → tool index, also produces the schema list
//! - **Filesystem**: `read_file`, `write_file`, `edit_file`, `delete_file`
//!
//! Tools resolve relative paths against [`ToolContext::working_directory`],
//! which is the project workspace. Bad input is reported as an error result
//! the model can read, not as a Rust error.

#![deny(unsafe_code)]

pub mod errors;
pub mod fs;
pub mod providers;
pub mod registry;
pub mod traits;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

pub use errors::ToolError;
pub use registry::ToolRegistry;
pub use traits::{AgentTool, FileSystemOps, ToolContext};

use std::sync::Arc;

/// Registry with every file tool backed by `fs`.
pub fn file_tools(fs: &Arc<dyn FileSystemOps>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(fs::read::ReadFileTool::new(Arc::clone(fs))));
    registry.register(Arc::new(fs::write::WriteFileTool::new(Arc::clone(fs))));
    registry.register(Arc::new(fs::edit::EditFileTool::new(Arc::clone(fs))));
    registry.register(Arc::new(fs::delete::DeleteFileTool::new(Arc::clone(fs))));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_tools_registers_all() {
        let fs: Arc<dyn FileSystemOps> = Arc::new(providers::RealFileSystem);
        let registry = file_tools(&fs);
        assert_eq!(
            registry.names(),
            vec!["delete_file", "edit_file", "read_file", "write_file"]
        );
        assert!(registry.get("write_file").unwrap().writes_files());
        assert!(!registry.get("read_file").unwrap().writes_files());
    }
}
