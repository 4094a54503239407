//! # artreal-core
//!
//! Foundation types shared by every artreal crate.
//!
//! - **Branded IDs**: [`ProjectId`], [`TurnId`], [`SessionId`] as newtypes for type safety
//! - **Turns**: [`Turn`] with a typed [`TurnBody`] and an out-of-band [`ControlSignal`]
//! - **Roles**: [`RoleId`] naming the two cooperating actors
//! - **Credentials**: [`ApiKey`] with redacted `Debug`
//! - **Tools**: [`ToolDefinition`] schemas and [`ToolOutput`] results
//! - **Logging**: [`logging::init_subscriber`] for the `tracing` stack

#![deny(unsafe_code)]

pub mod credentials;
pub mod ids;
pub mod logging;
pub mod tools;
pub mod turns;

pub use credentials::ApiKey;
pub use ids::{ProjectId, SessionId, TurnId};
pub use tools::{ToolDefinition, ToolOutput};
pub use turns::{Author, ControlSignal, RoleId, ToolCall, ToolResult, Turn, TurnBody, TurnKind};
