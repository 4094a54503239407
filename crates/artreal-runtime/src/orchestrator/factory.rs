//! Builds orchestrators for the registry.

use std::path::PathBuf;
use std::sync::Arc;

use artreal_core::ProjectId;
use artreal_llm::ChatCompletionsClient;
use artreal_settings::ArtrealSettings;
use artreal_tools::providers::RealFileSystem;
use artreal_tools::{FileSystemOps, file_tools};
use async_trait::async_trait;
use tracing::debug;

use crate::errors::RuntimeError;
use crate::orchestrator::session::{OrchestratorConfig, SessionOrchestrator};
use crate::orchestrator::state::{FileStateStore, StateStore, project_dir};

/// Creates a fresh, empty orchestrator for a project. The registry restores
/// saved state into it afterwards.
#[async_trait]
pub trait OrchestratorFactory: Send + Sync {
    /// Build an orchestrator for `id`.
    async fn create(&self, id: &ProjectId) -> Result<SessionOrchestrator, RuntimeError>;
}

/// Production wiring: Gemini client, workspace file tools, JSON state files.
pub struct DefaultOrchestratorFactory {
    settings: ArtrealSettings,
    store: Arc<dyn StateStore>,
    fs: Arc<dyn FileSystemOps>,
}

impl DefaultOrchestratorFactory {
    /// Factory storing state next to each project workspace.
    pub fn new(settings: ArtrealSettings) -> Self {
        let store: Arc<dyn StateStore> = Arc::new(FileStateStore::new(
            &settings.storage.projects_dir,
            &settings.storage.state_file_name,
        ));
        Self {
            settings,
            store,
            fs: Arc::new(RealFileSystem),
        }
    }

    /// Replace the state store.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.store = store;
        self
    }

    /// Workspace directory for a project.
    pub fn workspace_for(&self, id: &ProjectId) -> PathBuf {
        project_dir(PathBuf::from(&self.settings.storage.projects_dir).as_path(), id)
    }
}

#[async_trait]
impl OrchestratorFactory for DefaultOrchestratorFactory {
    async fn create(&self, id: &ProjectId) -> Result<SessionOrchestrator, RuntimeError> {
        let workspace = self.workspace_for(id);
        tokio::fs::create_dir_all(&workspace).await.map_err(|e| {
            RuntimeError::Persistence(format!("cannot create {}: {e}", workspace.display()))
        })?;
        let client = ChatCompletionsClient::from_settings(&self.settings.api.gemini)?;
        debug!(project_id = %id, workspace = %workspace.display(), "orchestrator created");
        Ok(SessionOrchestrator::new(
            id.clone(),
            workspace,
            Arc::new(client),
            file_tools(&self.fs),
            Arc::clone(&self.store),
            OrchestratorConfig::from(&self.settings.agents),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_workspace_and_tools() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = ArtrealSettings::default();
        settings.storage.projects_dir = dir.path().to_string_lossy().into_owned();
        let factory = DefaultOrchestratorFactory::new(settings);

        let orchestrator = factory.create(&ProjectId::from("7")).await.unwrap();
        assert!(dir.path().join("project_7").is_dir());
        assert_eq!(orchestrator.workspace(), dir.path().join("project_7"));
        assert_eq!(orchestrator.tools().len(), 4);
    }
}
