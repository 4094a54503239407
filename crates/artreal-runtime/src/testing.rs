//! Scripted completion client for exercising sessions without a network.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use artreal_core::{ApiKey, ToolCall};
use artreal_llm::{
    CompletionClient, CompletionRequest, CompletionResponse, ProviderError, ProviderResult,
};
use async_trait::async_trait;
use parking_lot::Mutex;

/// Text reply.
pub fn text(content: &str) -> CompletionResponse {
    CompletionResponse {
        text: Some(content.to_owned()),
        finish_reason: Some("stop".into()),
        ..CompletionResponse::default()
    }
}

/// Single tool call reply.
pub fn tool_call(id: &str, name: &str, arguments: &str) -> CompletionResponse {
    CompletionResponse {
        tool_calls: vec![ToolCall {
            id: id.to_owned(),
            name: name.to_owned(),
            arguments: arguments.to_owned(),
        }],
        finish_reason: Some("tool_calls".into()),
        ..CompletionResponse::default()
    }
}

/// Replays queued responses in order. Once the script runs out every call
/// answers `TERMINATE`, so runs always end.
#[derive(Default)]
pub struct ScriptedClient {
    script: Mutex<VecDeque<ProviderResult<CompletionResponse>>>,
    requests: Mutex<Vec<CompletionRequest>>,
    credentials: Mutex<Vec<Option<String>>>,
    closed: AtomicBool,
}

impl ScriptedClient {
    /// Client that replays `responses`.
    pub fn new(responses: impl IntoIterator<Item = CompletionResponse>) -> Self {
        Self {
            script: Mutex::new(responses.into_iter().map(Ok).collect()),
            ..Self::default()
        }
    }

    /// Queue a failure.
    pub fn push_error(&self, error: ProviderError) {
        self.script.lock().push_back(Err(error));
    }

    /// Queue a response.
    pub fn push(&self, response: CompletionResponse) {
        self.script.lock().push_back(Ok(response));
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }

    /// Exposed credential of every request, in order.
    pub fn credentials(&self) -> Vec<Option<String>> {
        self.credentials.lock().clone()
    }

    /// Whether `close` was called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    fn model(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        request: &CompletionRequest,
        credential: Option<&ApiKey>,
    ) -> ProviderResult<CompletionResponse> {
        if self.is_closed() {
            return Err(ProviderError::Closed);
        }
        self.requests.lock().push(request.clone());
        self.credentials
            .lock()
            .push(credential.map(|k| k.expose().to_owned()));
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(text("Nothing left to do. TERMINATE")))
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
