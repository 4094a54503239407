//! Completion service settings.

use serde::{Deserialize, Serialize};

/// API provider settings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiSettings {
    /// Gemini through its OpenAI-compatible endpoint.
    pub gemini: GeminiSettings,
}

/// Gemini chat-completions settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeminiSettings {
    /// Base URL of the OpenAI-compatible API (trailing slash expected).
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Output token ceiling per call.
    pub max_tokens: u32,
    /// Let the model request several tools in one response.
    pub parallel_tool_calls: bool,
    /// Whole-request timeout.
    pub request_timeout_secs: u64,
    /// TCP connect timeout.
    pub connect_timeout_secs: u64,
    /// Default API key. Usually supplied through `GEMINI_API_KEY`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta/openai/".to_string(),
            model: "gemini-3-flash-preview".to_string(),
            temperature: 0.7,
            max_tokens: 64_000,
            parallel_tool_calls: false,
            request_timeout_secs: 300,
            connect_timeout_secs: 30,
            api_key: None,
        }
    }
}

impl GeminiSettings {
    /// Full chat-completions endpoint.
    #[must_use]
    pub fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}
