//! OpenAI-compatible chat-completions client.
//!
//! Gemini is reached through its OpenAI-compatible endpoint. Every request
//! goes through [`SignaturePreservingTransport`], which is what keeps
//! multi-step tool calling working with thinking models.

pub mod types;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use artreal_core::{ApiKey, ToolCall};
use artreal_settings::GeminiSettings;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, error, instrument};

use crate::error_parsing::{parse_api_error, parse_retry_after_header};
use crate::provider::{
    CompletionClient, CompletionRequest, CompletionResponse, ProviderError, ProviderResult,
};
use crate::signatures::{MemorySignatureStore, SignatureStore};
use crate::transport::SignaturePreservingTransport;

use self::types::{ChatRequest, ChatResponse, ChatTool};

/// Request-shaping configuration.
#[derive(Clone, Debug)]
pub struct ChatConfig {
    /// Full `…/chat/completions` URL.
    pub endpoint: String,
    /// Model id.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Output token ceiling.
    pub max_tokens: u32,
    /// Allow several tool calls per response.
    pub parallel_tool_calls: bool,
}

impl From<&GeminiSettings> for ChatConfig {
    fn from(settings: &GeminiSettings) -> Self {
        Self {
            endpoint: settings.chat_completions_url(),
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            parallel_tool_calls: settings.parallel_tool_calls,
        }
    }
}

/// [`CompletionClient`] over the chat-completions HTTP API.
pub struct ChatCompletionsClient {
    config: ChatConfig,
    transport: SignaturePreservingTransport,
    closed: AtomicBool,
}

impl ChatCompletionsClient {
    /// Create a client over an existing transport.
    pub fn new(config: ChatConfig, transport: SignaturePreservingTransport) -> Self {
        Self {
            config,
            transport,
            closed: AtomicBool::new(false),
        }
    }

    /// Create a client from settings with a fresh in-memory signature cache.
    pub fn from_settings(settings: &GeminiSettings) -> ProviderResult<Self> {
        let http = SignaturePreservingTransport::build_client(
            Duration::from_secs(settings.request_timeout_secs),
            Duration::from_secs(settings.connect_timeout_secs),
        )?;
        let signatures: Arc<dyn SignatureStore> = Arc::new(MemorySignatureStore::new());
        let transport = SignaturePreservingTransport::new(
            http,
            signatures,
            settings.api_key.as_deref().map(ApiKey::new),
        );
        Ok(Self::new(ChatConfig::from(settings), transport))
    }

    /// The underlying transport.
    pub fn transport(&self) -> &SignaturePreservingTransport {
        &self.transport
    }
}

#[async_trait]
impl CompletionClient for ChatCompletionsClient {
    fn model(&self) -> &str {
        &self.config.model
    }

    #[instrument(skip_all, fields(model = %self.config.model))]
    async fn complete(
        &self,
        request: &CompletionRequest,
        credential: Option<&ApiKey>,
    ) -> ProviderResult<CompletionResponse> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ProviderError::Closed);
        }

        let tools: Vec<ChatTool> = request.tools.iter().map(ChatTool::from).collect();
        let body = ChatRequest {
            model: &self.config.model,
            messages: &request.messages,
            parallel_tool_calls: (!tools.is_empty()).then_some(self.config.parallel_tool_calls),
            tools,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        debug!(
            message_count = request.messages.len(),
            tool_count = request.tools.len(),
            "sending chat completion"
        );

        let http_request = self
            .transport
            .client()
            .post(&self.config.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .build()?;

        let response = self.transport.execute(http_request, credential).await?;

        let status = response.status.as_u16();
        if !response.status.is_success() {
            let body_text = String::from_utf8_lossy(&response.body);
            let info = parse_api_error(&body_text, status);
            error!(
                status,
                code = info.code.as_deref().unwrap_or("unknown"),
                retryable = info.retryable,
                "chat completion failed"
            );
            return Err(match status {
                401 | 403 => ProviderError::Auth {
                    message: info.message,
                },
                429 => ProviderError::RateLimited {
                    retry_after_ms: response
                        .headers
                        .get("retry-after")
                        .and_then(|v| v.to_str().ok())
                        .and_then(parse_retry_after_header)
                        .unwrap_or(0),
                    message: info.message,
                },
                _ => ProviderError::Api {
                    status,
                    message: info.message,
                    code: info.code,
                    retryable: info.retryable,
                },
            });
        }

        let parsed: ChatResponse = serde_json::from_slice(&response.body)?;
        let Some(choice) = parsed.choices.into_iter().next() else {
            return Err(ProviderError::Other {
                message: "response contained no choices".into(),
            });
        };

        let tool_calls: Vec<ToolCall> = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(ToolCall::from)
            .collect();
        let text = choice.message.content.filter(|t| !t.is_empty());

        debug!(
            tool_calls = tool_calls.len(),
            has_text = text.is_some(),
            finish_reason = choice.finish_reason.as_deref().unwrap_or(""),
            "chat completion received"
        );

        Ok(CompletionResponse {
            text,
            tool_calls,
            finish_reason: choice.finish_reason,
            usage: parsed.usage,
        })
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!(model = %self.config.model, "completion client closed");
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
