//! Session orchestration: the conversation owner, its persisted state, and
//! the per-project registry.

pub mod factory;
pub mod registry;
pub mod session;
pub mod state;
pub mod tool_executor;

pub use factory::{DefaultOrchestratorFactory, OrchestratorFactory};
pub use registry::{RegistryConfig, SessionRegistry};
pub use session::{OrchestratorConfig, SessionOrchestrator};
pub use state::{FileStateStore, MemoryStateStore, SessionState, StateError, StateStore};
