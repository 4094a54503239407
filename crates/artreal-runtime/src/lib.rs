//! # artreal-runtime
//!
//! Runs planner/executor conversations against per-project workspaces.
//!
//! - [`router`]: pure next-speaker selection from conversation history
//! - [`termination`]: stop rule (terminate signal or message ceiling)
//! - [`roles`]: the [`Planner`](roles::Planner) and [`Executor`](roles::Executor) roles
//! - [`orchestrator`]: [`SessionOrchestrator`], its persisted state, and the
//!   per-project [`SessionRegistry`]
//! - [`streaming`]: [`ExecutionStreamer`], which turns one run into the
//!   external event protocol with checkpointing

#![deny(unsafe_code)]

pub mod errors;
pub mod orchestrator;
pub mod roles;
pub mod router;
pub mod streaming;
pub mod termination;
pub mod testing;
pub mod types;

pub use errors::{RuntimeError, StopReason};
pub use orchestrator::{
    FileStateStore, OrchestratorConfig, OrchestratorFactory, SessionOrchestrator, SessionRegistry,
    SessionState, StateStore,
};
pub use streaming::{ExecutionStreamer, StreamEvent};
pub use types::{FinalMessage, RunContext, RunEvent, RunOutcome, RunStream, Task};
