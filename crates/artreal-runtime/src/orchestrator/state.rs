//! Persisted session state.
//!
//! One JSON document per project at
//! `<projects_dir>/project_<id>/<state_file_name>`. Unknown top-level keys
//! are carried through a load/save cycle untouched.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use artreal_core::{ProjectId, Turn};
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Current [`SessionState`] layout version.
pub const STATE_VERSION: u32 = 1;

/// Errors reading or writing session state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// Filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored document is not valid state JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Per-role memory snapshots.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleMemories {
    /// Planner buffer.
    #[serde(default)]
    pub planner: Vec<Turn>,
    /// Executor buffer.
    #[serde(default)]
    pub executor: Vec<Turn>,
}

/// Serializable snapshot of a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// Layout version.
    #[serde(default = "current_version")]
    pub version: u32,
    /// Conversation history, oldest first.
    #[serde(default)]
    pub history: Vec<Turn>,
    /// Role memories.
    #[serde(default)]
    pub roles: RoleMemories,
    /// Keys this version does not know about.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn current_version() -> u32 {
    STATE_VERSION
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            history: Vec::new(),
            roles: RoleMemories::default(),
            extra: Map::new(),
        }
    }
}

impl SessionState {
    /// Keep only the newest `limit` entries of the history and each role
    /// memory.
    #[must_use]
    pub fn truncated(mut self, limit: usize) -> Self {
        keep_tail(&mut self.history, limit);
        keep_tail(&mut self.roles.planner, limit);
        keep_tail(&mut self.roles.executor, limit);
        self
    }
}

fn keep_tail(turns: &mut Vec<Turn>, limit: usize) {
    if turns.len() > limit {
        let _ = turns.drain(..turns.len() - limit);
    }
}

/// Storage for session state, keyed by project.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load state. `Ok(None)` means nothing was ever saved.
    async fn load(&self, id: &ProjectId) -> Result<Option<SessionState>, StateError>;

    /// Save state, replacing what was there.
    async fn save(&self, id: &ProjectId, state: &SessionState) -> Result<(), StateError>;
}

/// Directory of a project's workspace.
pub fn project_dir(projects_dir: &Path, id: &ProjectId) -> PathBuf {
    projects_dir.join(format!("project_{id}"))
}

/// Write `bytes` to `path` through a sibling temp file and a rename, so a
/// crash never leaves a half-written document.
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!("{file_name}.tmp"));
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await
}

/// JSON files inside each project workspace.
#[derive(Clone, Debug)]
pub struct FileStateStore {
    projects_dir: PathBuf,
    file_name: String,
}

impl FileStateStore {
    /// Store rooted at `projects_dir`.
    pub fn new(projects_dir: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            projects_dir: projects_dir.into(),
            file_name: file_name.into(),
        }
    }

    /// Path of a project's state file.
    pub fn path_for(&self, id: &ProjectId) -> PathBuf {
        project_dir(&self.projects_dir, id).join(&self.file_name)
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn load(&self, id: &ProjectId) -> Result<Option<SessionState>, StateError> {
        let path = self.path_for(id);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let state: SessionState = serde_json::from_str(&content)?;
        debug!(?path, entries = state.history.len(), "loaded session state");
        Ok(Some(state))
    }

    async fn save(&self, id: &ProjectId, state: &SessionState) -> Result<(), StateError> {
        let path = self.path_for(id);
        let bytes = serde_json::to_vec_pretty(state)?;
        write_atomic(&path, &bytes).await?;
        debug!(?path, entries = state.history.len(), "saved session state");
        Ok(())
    }
}

/// In-process store that keeps serialized documents and counts calls.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    documents: DashMap<ProjectId, String>,
    loads: AtomicUsize,
    saves: AtomicUsize,
}

impl MemoryStateStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw document, as if a previous process had saved it.
    pub fn insert_raw(&self, id: &ProjectId, document: impl Into<String>) {
        let _ = self.documents.insert(id.clone(), document.into());
    }

    /// Raw document for a project.
    pub fn raw(&self, id: &ProjectId) -> Option<String> {
        self.documents.get(id).map(|d| d.value().clone())
    }

    /// Number of `load` calls so far.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Number of `save` calls so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self, id: &ProjectId) -> Result<Option<SessionState>, StateError> {
        let _ = self.loads.fetch_add(1, Ordering::SeqCst);
        match self.raw(id) {
            Some(doc) => Ok(Some(serde_json::from_str(&doc)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, id: &ProjectId, state: &SessionState) -> Result<(), StateError> {
        let _ = self.saves.fetch_add(1, Ordering::SeqCst);
        let doc = serde_json::to_string(state)?;
        let _ = self.documents.insert(id.clone(), doc);
        Ok(())
    }
}
