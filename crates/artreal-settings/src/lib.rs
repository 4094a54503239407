//! # artreal-settings
//!
//! Configuration with layered sources for the artreal agent.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`ArtrealSettings::default()`]
//! 2. **User file**: `~/.artreal/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `ARTREAL_*` and `GEMINI_API_KEY` overrides

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{apply_env_overrides, load_settings_from_path, merge_into, settings_path};
pub use types::*;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
