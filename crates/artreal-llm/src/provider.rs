//! # Completion client trait
//!
//! The rest of the system talks to the model through [`CompletionClient`]:
//! one request in, one assembled response out. Signature repair and credential
//! selection happen underneath, so callers only ever see the standard chat
//! object model.

use async_trait::async_trait;
use artreal_core::{ApiKey, ToolCall, ToolDefinition};

use crate::chat::types::{ChatMessage, Usage};

/// Result type alias for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors that can occur during a completion call.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Authentication failed (missing or rejected key).
    #[error("Auth error: {message}")]
    Auth {
        /// Error description.
        message: String,
    },

    /// Rate limited by the provider.
    #[error("Rate limited: retry after {retry_after_ms}ms")]
    RateLimited {
        /// Suggested retry delay in milliseconds.
        retry_after_ms: u64,
        /// Error description.
        message: String,
    },

    /// Provider returned an API error.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error description.
        message: String,
        /// Provider-specific error code.
        code: Option<String>,
        /// Whether this error can be retried.
        retryable: bool,
    },

    /// The client was closed.
    #[error("completion client is closed")]
    Closed,

    /// Anything else.
    #[error("{message}")]
    Other {
        /// Error description.
        message: String,
    },
}

impl ProviderError {
    /// Whether this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().is_some_and(|s| {
                        s == reqwest::StatusCode::TOO_MANY_REQUESTS || s.is_server_error()
                    })
            }
            Self::RateLimited { .. } => true,
            Self::Api { retryable, .. } => *retryable,
            Self::Auth { .. } | Self::Closed | Self::Json(_) | Self::Other { .. } => false,
        }
    }

    /// Error category string for logs and events.
    pub fn category(&self) -> &str {
        match self {
            Self::Http(_) => "network",
            Self::Json(_) => "parse",
            Self::Auth { .. } => "auth",
            Self::RateLimited { .. } => "rate_limit",
            Self::Api { .. } => "api",
            Self::Closed => "closed",
            Self::Other { .. } => "unknown",
        }
    }
}

/// One model call.
#[derive(Clone, Debug, Default)]
pub struct CompletionRequest {
    /// Conversation as chat messages, system prompt first.
    pub messages: Vec<ChatMessage>,
    /// Tools offered for this call. Empty for text-only roles.
    pub tools: Vec<ToolDefinition>,
}

/// The assembled model response.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompletionResponse {
    /// Text content, if any.
    pub text: Option<String>,
    /// Requested tool calls.
    pub tool_calls: Vec<ToolCall>,
    /// Provider finish reason.
    pub finish_reason: Option<String>,
    /// Token usage, when reported.
    pub usage: Option<Usage>,
}

/// A chat-completion backend.
///
/// Implementors must be `Send + Sync` so one client can be shared by both
/// roles of a session.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Model identifier used for requests.
    fn model(&self) -> &str;

    /// Run one completion. `credential` overrides the default key for this
    /// call only.
    async fn complete(
        &self,
        request: &CompletionRequest,
        credential: Option<&ApiKey>,
    ) -> ProviderResult<CompletionResponse>;

    /// Release the underlying connection. Later calls fail with
    /// [`ProviderError::Closed`].
    async fn close(&self);
}
