//! Agent, registry, streaming, storage, and logging settings.

use serde::{Deserialize, Serialize};

/// Planner/executor behavior.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentSettings {
    /// Messages per run (the task plus one per role activation) before the
    /// run is stopped.
    pub max_messages: usize,
    /// Model calls the executor may chain in one activation.
    pub executor_tool_iterations: usize,
    /// Turns each role keeps in its buffered context.
    pub buffer_size: usize,
    /// History entries kept when a persisted session is restored.
    pub restore_history_limit: usize,
    /// System prompt for the planner.
    pub planner_prompt: String,
    /// System prompt for the executor.
    pub executor_prompt: String,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_messages: 50,
            executor_tool_iterations: 3,
            buffer_size: 100,
            restore_history_limit: 150,
            planner_prompt: "You are the Planner. Break the user's request into small \
                             subtasks for the Executor. You cannot call tools. When every \
                             subtask is done, reply with TERMINATE."
                .to_string(),
            executor_prompt: "You are the Executor. Carry out the current subtask with \
                              the available tools. Reply SUBTASK_DONE when it is finished, \
                              DELEGATE_TO_PLANNER when you need a new plan, or TERMINATE \
                              when the whole request is complete."
                .to_string(),
        }
    }
}

/// Session registry lifecycle.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrySettings {
    /// Seconds between inactivity sweeps.
    pub sweep_interval_secs: u64,
    /// Seconds of inactivity after which a session is released.
    pub inactivity_timeout_secs: u64,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            sweep_interval_secs: 60,
            inactivity_timeout_secs: 1200,
        }
    }
}

/// Event streaming and checkpoint cadence.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StreamingSettings {
    /// Interactions between interim checkpoints.
    pub checkpoint_every: usize,
    /// Narration shorter than this (after trimming) is not streamed.
    pub min_thought_chars: usize,
}

impl Default for StreamingSettings {
    fn default() -> Self {
        Self {
            checkpoint_every: 3,
            min_thought_chars: 10,
        }
    }
}

/// Project workspace and state files.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageSettings {
    /// Directory holding one `project_<id>` folder per project.
    pub projects_dir: String,
    /// File name of the persisted session state inside a project folder.
    pub state_file_name: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            projects_dir: "./projects".to_string(),
            state_file_name: ".agent_state.json".to_string(),
        }
    }
}

/// Logging output.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of compact text.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
