//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` and `#[serde(default)]`
//! so a partial JSON file only overrides the keys it names.

mod api;
mod runtime;

pub use api::*;
pub use runtime::*;

use serde::{Deserialize, Serialize};

/// Root settings type.
///
/// ```json
/// {
///   "api": { "gemini": { "model": "gemini-3-flash-preview" } },
///   "registry": { "inactivityTimeoutSecs": 600 }
/// }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArtrealSettings {
    /// Completion service settings.
    pub api: ApiSettings,
    /// Planner/executor behavior.
    pub agents: AgentSettings,
    /// Session registry lifecycle.
    pub registry: RegistrySettings,
    /// Event streaming and checkpoint cadence.
    pub streaming: StreamingSettings,
    /// Project workspace and state files.
    pub storage: StorageSettings,
    /// Logging output.
    pub logging: LoggingSettings,
}
