//! Interaction log storage.

use std::path::PathBuf;

use artreal_core::ProjectId;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::orchestrator::state::{StateError, write_atomic};
use crate::streaming::events::AgentInteraction;
use crate::types::FinalMessage;

/// Everything shown to the user during one run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractionLog {
    /// Message that started the run.
    pub user_message_id: String,
    /// Interactions so far, oldest first.
    pub interactions: Vec<AgentInteraction>,
    /// Set by the final checkpoint only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_message: Option<FinalMessage>,
}

/// Where checkpoints of the interaction log go.
#[async_trait]
pub trait InteractionStore: Send + Sync {
    /// Save the log, replacing any earlier checkpoint for the same message.
    async fn save(&self, project_id: &ProjectId, log: &InteractionLog) -> Result<(), StateError>;
}

/// One JSON file per run: `<dir>/project_<id>/<user_message_id>.json`.
#[derive(Clone, Debug)]
pub struct FileInteractionStore {
    dir: PathBuf,
}

impl FileInteractionStore {
    /// Store rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File holding the log of one run.
    pub fn path_for(&self, project_id: &ProjectId, user_message_id: &str) -> PathBuf {
        self.dir
            .join(format!("project_{project_id}"))
            .join(format!("{user_message_id}.json"))
    }
}

#[async_trait]
impl InteractionStore for FileInteractionStore {
    async fn save(&self, project_id: &ProjectId, log: &InteractionLog) -> Result<(), StateError> {
        let bytes = serde_json::to_vec_pretty(log)?;
        write_atomic(&self.path_for(project_id, &log.user_message_id), &bytes).await?;
        Ok(())
    }
}

/// Keeps every checkpoint in memory, in order.
#[derive(Debug, Default)]
pub struct MemoryInteractionStore {
    saved: Mutex<Vec<InteractionLog>>,
}

impl MemoryInteractionStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every checkpoint written so far.
    pub fn checkpoints(&self) -> Vec<InteractionLog> {
        self.saved.lock().clone()
    }
}

#[async_trait]
impl InteractionStore for MemoryInteractionStore {
    async fn save(&self, _project_id: &ProjectId, log: &InteractionLog) -> Result<(), StateError> {
        self.saved.lock().push(log.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_store_overwrites_per_message() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileInteractionStore::new(dir.path());
        let id = ProjectId::from("42");
        let mut log = InteractionLog {
            user_message_id: "m1".into(),
            ..InteractionLog::default()
        };

        store.save(&id, &log).await.unwrap();
        log.final_message = Some(FinalMessage {
            content: "done".into(),
            agent_name: "Planner".into(),
        });
        store.save(&id, &log).await.unwrap();

        let raw = std::fs::read_to_string(store.path_for(&id, "m1")).unwrap();
        let back: InteractionLog = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, log);
    }
}
