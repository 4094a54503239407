//! # Signature-preserving transport
//!
//! Wraps every HTTP exchange with the completion service:
//!
//! - **Outgoing**: `POST …/chat/completions` bodies are scanned for assistant
//!   tool calls whose id has a cached signature, and the signature is put back
//!   under `extra_content.google.thought_signature`.
//! - **Incoming**: 200 responses to those requests are scanned and any
//!   signatures are cached by call id.
//! - **Credentials**: an explicit per-call key replaces the default bearer
//!   token for that one request.
//!
//! Rewrite failures never fail the call. They are logged and the original
//! exchange goes through unmodified.

use std::sync::Arc;
use std::time::Duration;

use artreal_core::ApiKey;
use bytes::Bytes;
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::signatures::{SignatureStore, capture_signatures, inject_signatures};

/// Path fragment identifying requests that get rewritten.
const CHAT_COMPLETIONS_PATH: &str = "chat/completions";

/// Why a request body could not be rewritten.
#[derive(Debug, thiserror::Error)]
enum RewriteError {
    #[error("request body is a stream")]
    StreamingBody,
    #[error("request body is not JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A fully buffered response.
#[derive(Debug)]
pub struct TransportResponse {
    /// HTTP status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Raw body.
    pub body: Bytes,
}

/// HTTP interceptor that keeps thought signatures attached to tool calls.
pub struct SignaturePreservingTransport {
    client: reqwest::Client,
    signatures: Arc<dyn SignatureStore>,
    default_credential: Option<ApiKey>,
}

impl SignaturePreservingTransport {
    /// Wrap an HTTP client.
    pub fn new(
        client: reqwest::Client,
        signatures: Arc<dyn SignatureStore>,
        default_credential: Option<ApiKey>,
    ) -> Self {
        Self {
            client,
            signatures,
            default_credential,
        }
    }

    /// Build a `reqwest` client with the given timeouts.
    pub fn build_client(
        request_timeout: Duration,
        connect_timeout: Duration,
    ) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
    }

    /// The wrapped client, for building requests.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// The signature cache.
    pub fn signatures(&self) -> &Arc<dyn SignatureStore> {
        &self.signatures
    }

    /// Send one request through the interceptor and buffer the response.
    #[instrument(skip_all, fields(method = %request.method(), url = %request.url()))]
    pub async fn execute(
        &self,
        mut request: reqwest::Request,
        credential: Option<&ApiKey>,
    ) -> reqwest::Result<TransportResponse> {
        self.apply_credential(&mut request, credential);

        let intercept = is_chat_completions(&request);
        if intercept {
            match self.rewrite_request(&mut request) {
                Ok(0) => {}
                Ok(injected) => debug!(injected, "re-attached thought signatures"),
                Err(err) => warn!(error = %err, "signature injection failed, sending request as-is"),
            }
        }

        let response = self.client.execute(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        if intercept && status == StatusCode::OK {
            match serde_json::from_slice::<Value>(&body) {
                Ok(json) => {
                    let captured = capture_signatures(&json, self.signatures.as_ref());
                    if captured > 0 {
                        debug!(captured, cached = self.signatures.len(), "captured thought signatures");
                    }
                }
                Err(err) => warn!(error = %err, "could not scan response for thought signatures"),
            }
        }

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }

    fn apply_credential(&self, request: &mut reqwest::Request, credential: Option<&ApiKey>) {
        let Some(key) = credential.or(self.default_credential.as_ref()) else {
            return;
        };
        match HeaderValue::from_str(&format!("Bearer {}", key.expose())) {
            Ok(mut value) => {
                value.set_sensitive(true);
                let _ = request.headers_mut().insert(AUTHORIZATION, value);
            }
            Err(err) => warn!(error = %err, "credential is not a valid header value, skipping"),
        }
    }

    /// Replace the body only when something was injected, so untouched
    /// requests keep their exact bytes.
    fn rewrite_request(&self, request: &mut reqwest::Request) -> Result<usize, RewriteError> {
        let Some(body) = request.body() else {
            return Ok(0);
        };
        let bytes = body.as_bytes().ok_or(RewriteError::StreamingBody)?;
        let mut json: Value = serde_json::from_slice(bytes)?;

        let injected = inject_signatures(&mut json, self.signatures.as_ref());
        if injected > 0 {
            let rewritten = serde_json::to_vec(&json)?;
            let _ = request.headers_mut().remove(CONTENT_LENGTH);
            *request.body_mut() = Some(rewritten.into());
        }
        Ok(injected)
    }
}

fn is_chat_completions(request: &reqwest::Request) -> bool {
    request.method() == Method::POST && request.url().as_str().contains(CHAT_COMPLETIONS_PATH)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signatures::MemorySignatureStore;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport(default_key: Option<&str>) -> SignaturePreservingTransport {
        SignaturePreservingTransport::new(
            reqwest::Client::new(),
            Arc::new(MemorySignatureStore::new()),
            default_key.map(ApiKey::new),
        )
    }

    fn post(transport: &SignaturePreservingTransport, url: &str, body: &Value) -> reqwest::Request {
        transport.client().post(url).json(body).build().unwrap()
    }

    fn signed_response(id: &str, signature: &str) -> Value {
        json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "tool_calls": [{
                        "id": id,
                        "type": "function",
                        "function": {"name": "write_file", "arguments": "{\"path\":\"index.html\"}"},
                        "extra_content": {"google": {"thought_signature": signature}}
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        })
    }

    fn replay_request(id: &str) -> Value {
        json!({
            "model": "gemini-3-flash-preview",
            "messages": [
                {"role": "user", "content": "build it"},
                {"role": "assistant", "tool_calls": [{
                    "id": id,
                    "type": "function",
                    "function": {"name": "write_file", "arguments": "{\"path\":\"index.html\"}"}
                }]},
                {"role": "tool", "tool_call_id": id, "content": "written"}
            ]
        })
    }

    async fn chat_server(response: Value) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(response))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn signature_round_trips_across_requests() {
        let server = chat_server(signed_response("call_1", "opaque-sig")).await;
        let transport = transport(None);
        let url = format!("{}/chat/completions", server.uri());

        let first = post(&transport, &url, &json!({"messages": [{"role": "user", "content": "hi"}]}));
        let resp = transport.execute(first, None).await.unwrap();
        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(transport.signatures().get("call_1").as_deref(), Some("opaque-sig"));

        let second = post(&transport, &url, &replay_request("call_1"));
        let _ = transport.execute(second, None).await.unwrap();

        let received = server.received_requests().await.unwrap();
        let sent: Value = serde_json::from_slice(&received[1].body).unwrap();
        assert_eq!(
            sent["messages"][1]["tool_calls"][0]["extra_content"]["google"]["thought_signature"],
            "opaque-sig"
        );
    }

    #[tokio::test]
    async fn uncached_call_id_is_sent_unmodified() {
        let server = chat_server(json!({"choices": []})).await;
        let transport = transport(None);
        transport.signatures().put("call_1", "sig");
        let url = format!("{}/chat/completions", server.uri());

        let body = replay_request("call_7");
        let expected = serde_json::to_vec(&body).unwrap();
        let _ = transport.execute(post(&transport, &url, &body), None).await.unwrap();

        let received = server.received_requests().await.unwrap();
        assert_eq!(received[0].body, expected);
    }

    #[tokio::test]
    async fn other_endpoints_are_not_rewritten() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(signed_response("call_2", "s")))
            .mount(&server)
            .await;
        let transport = transport(None);
        transport.signatures().put("call_1", "sig");

        let body = replay_request("call_1");
        let url = format!("{}/embeddings", server.uri());
        let _ = transport.execute(post(&transport, &url, &body), None).await.unwrap();

        let received = server.received_requests().await.unwrap();
        let sent: Value = serde_json::from_slice(&received[0].body).unwrap();
        assert_eq!(sent, body);
        assert!(transport.signatures().get("call_2").is_none());
    }

    #[tokio::test]
    async fn malformed_body_still_goes_out() {
        let server = chat_server(json!({"choices": []})).await;
        let transport = transport(None);
        transport.signatures().put("call_1", "sig");

        let request = transport
            .client()
            .post(format!("{}/chat/completions", server.uri()))
            .body("not json")
            .build()
            .unwrap();
        let resp = transport.execute(request, None).await.unwrap();
        assert_eq!(resp.status, StatusCode::OK);

        let received = server.received_requests().await.unwrap();
        assert_eq!(received[0].body, b"not json");
    }

    #[tokio::test]
    async fn error_responses_are_not_captured() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_json(signed_response("call_3", "s")))
            .mount(&server)
            .await;
        let transport = transport(None);

        let url = format!("{}/chat/completions", server.uri());
        let resp = transport
            .execute(post(&transport, &url, &json!({"messages": []})), None)
            .await
            .unwrap();
        assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(transport.signatures().is_empty());
    }

    #[tokio::test]
    async fn per_call_credential_overrides_default_once() {
        let server = chat_server(json!({"choices": []})).await;
        let transport = transport(Some("AIzaDefault"));
        let url = format!("{}/chat/completions", server.uri());

        let caller = ApiKey::new("AIzaCaller");
        let _ = transport
            .execute(post(&transport, &url, &json!({})), Some(&caller))
            .await
            .unwrap();
        let _ = transport.execute(post(&transport, &url, &json!({})), None).await.unwrap();

        let received = server.received_requests().await.unwrap();
        assert_eq!(
            received[0].headers.get("authorization").unwrap().to_str().unwrap(),
            "Bearer AIzaCaller"
        );
        assert_eq!(
            received[1].headers.get("authorization").unwrap().to_str().unwrap(),
            "Bearer AIzaDefault"
        );
    }
}
