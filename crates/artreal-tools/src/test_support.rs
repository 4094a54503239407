//! In-memory filesystem for tool tests.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::traits::{FileSystemOps, ToolContext};

pub(crate) struct MockFs {
    files: Mutex<HashMap<PathBuf, Vec<u8>>>,
}

impl MockFs {
    pub(crate) fn new() -> Self {
        Self {
            files: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn with_file(self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) -> Self {
        let _ = self.files.lock().unwrap().insert(path.into(), content.into());
        self
    }

    pub(crate) fn content(&self, path: &str) -> Option<String> {
        self.files
            .lock()
            .unwrap()
            .get(Path::new(path))
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }
}

#[async_trait]
impl FileSystemOps for MockFs {
    async fn read_file(&self, path: &Path) -> Result<Vec<u8>, io::Error> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "not found"))
    }

    async fn write_file(&self, path: &Path, content: &[u8]) -> Result<(), io::Error> {
        let _ = self
            .files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), content.to_vec());
        Ok(())
    }

    async fn create_dir_all(&self, _path: &Path) -> Result<(), io::Error> {
        Ok(())
    }

    async fn remove_file(&self, path: &Path) -> Result<(), io::Error> {
        self.files
            .lock()
            .unwrap()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "not found"))
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }
}

pub(crate) fn make_ctx() -> ToolContext {
    ToolContext {
        tool_call_id: "call-1".into(),
        project_id: "7".into(),
        working_directory: "/projects/project_7".into(),
        cancellation: CancellationToken::new(),
    }
}
