//! Settings loading.
//!
//! Compiled defaults are serialized to JSON, the user's file is merged over
//! them key by key, and the result is deserialized back. Environment
//! overrides apply last, then the values the runtime loops or divides by are
//! validated.

use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{Result, SettingsError};
use crate::types::ArtrealSettings;

/// `~/.artreal/settings.json`.
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".artreal").join("settings.json")
}

/// Load settings from `path` with process environment overrides.
///
/// A missing file yields defaults. Invalid JSON is an error.
pub fn load_settings_from_path(path: &Path) -> Result<ArtrealSettings> {
    let mut merged = serde_json::to_value(ArtrealSettings::default())?;
    match std::fs::read_to_string(path) {
        Ok(content) => {
            debug!(?path, "loading settings from file");
            merge_into(&mut merged, serde_json::from_str(&content)?);
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(?path, "settings file not found, using defaults");
        }
        Err(e) => return Err(e.into()),
    }

    let mut settings: ArtrealSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    validate(&settings)?;
    Ok(settings)
}

/// Merge `overlay` into `base`. Objects merge per key, `null` leaves the base
/// value alone, anything else replaces it.
pub fn merge_into(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                if value.is_null() {
                    continue;
                }
                match base.get_mut(&key) {
                    Some(slot) => merge_into(slot, value),
                    None => {
                        let _ = base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Apply environment overrides read through `lookup`.
///
/// Unset or blank variables leave the setting alone; values that do not
/// parse are ignored with a warning.
pub fn apply_env_overrides(settings: &mut ArtrealSettings, lookup: impl Fn(&str) -> Option<String>) {
    let var = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

    if let Some(v) = var("GEMINI_API_KEY") {
        settings.api.gemini.api_key = Some(v);
    }
    if let Some(v) = var("ARTREAL_MODEL") {
        settings.api.gemini.model = v;
    }
    if let Some(v) = var("ARTREAL_BASE_URL") {
        settings.api.gemini.base_url = v;
    }
    if let Some(v) = var("ARTREAL_PROJECTS_DIR") {
        settings.storage.projects_dir = v;
    }
    if let Some(v) = var("ARTREAL_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = var("ARTREAL_LOG_JSON") {
        match v.to_ascii_lowercase().parse::<bool>() {
            Ok(json) => settings.logging.json = json,
            Err(_) => warn!(key = "ARTREAL_LOG_JSON", value = %v, "ignoring invalid override"),
        }
    }
    if let Some(v) = var("ARTREAL_INACTIVITY_TIMEOUT_SECS") {
        match v.parse::<u64>() {
            Ok(secs) if secs > 0 => settings.registry.inactivity_timeout_secs = secs,
            _ => warn!(
                key = "ARTREAL_INACTIVITY_TIMEOUT_SECS",
                value = %v,
                "ignoring invalid override"
            ),
        }
    }
}

/// Reject values that would stall or break the runtime.
pub fn validate(settings: &ArtrealSettings) -> Result<()> {
    let positive = [
        (settings.agents.max_messages, "agents.maxMessages"),
        (
            settings.agents.executor_tool_iterations,
            "agents.executorToolIterations",
        ),
        (settings.agents.buffer_size, "agents.bufferSize"),
        (
            settings.agents.restore_history_limit,
            "agents.restoreHistoryLimit",
        ),
        (settings.streaming.checkpoint_every, "streaming.checkpointEvery"),
    ];
    if let Some((_, key)) = positive.iter().find(|(value, _)| *value == 0) {
        return Err(SettingsError::InvalidValue(format!("{key} must be positive")));
    }
    if settings.registry.sweep_interval_secs == 0 {
        return Err(SettingsError::InvalidValue(
            "registry.sweepIntervalSecs must be positive".into(),
        ));
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
