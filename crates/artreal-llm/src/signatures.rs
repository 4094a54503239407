//! Thought-signature cache and JSON rewriting.
//!
//! Gemini attaches an opaque `thought_signature` to every tool call it emits,
//! at `tool_calls[].extra_content.google.thought_signature`. A later request
//! that replays the call as history must carry the same value back, or the
//! service rejects it. Signatures are stored and replayed verbatim; nothing
//! here ever interprets them.

use dashmap::DashMap;
use serde_json::{Map, Value};

/// Key of the vendor extension object on a tool call.
pub const EXTRA_CONTENT_KEY: &str = "extra_content";
/// Vendor namespace inside `extra_content`.
pub const GOOGLE_KEY: &str = "google";
/// Signature field inside the vendor namespace.
pub const THOUGHT_SIGNATURE_KEY: &str = "thought_signature";

/// Storage for call id → signature.
///
/// The in-process [`MemorySignatureStore`] is the default; a shared store with
/// expiry can be slotted in when calls cross process boundaries.
pub trait SignatureStore: Send + Sync {
    /// Remember the signature for a call id.
    fn put(&self, call_id: &str, signature: &str);

    /// Look up a signature. Reading does not remove the entry.
    fn get(&self, call_id: &str) -> Option<String>;

    /// Number of cached signatures.
    fn len(&self) -> usize;

    /// Whether nothing is cached.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Unbounded process-local signature cache.
#[derive(Debug, Default)]
pub struct MemorySignatureStore {
    entries: DashMap<String, String>,
}

impl MemorySignatureStore {
    /// Empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SignatureStore for MemorySignatureStore {
    fn put(&self, call_id: &str, signature: &str) {
        let _ = self
            .entries
            .insert(call_id.to_owned(), signature.to_owned());
    }

    fn get(&self, call_id: &str) -> Option<String> {
        self.entries.get(call_id).map(|entry| entry.value().clone())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Read the signature off one wire tool call.
fn signature_of(tool_call: &Value) -> Option<&str> {
    tool_call
        .get(EXTRA_CONTENT_KEY)?
        .get(GOOGLE_KEY)?
        .get(THOUGHT_SIGNATURE_KEY)?
        .as_str()
}

/// Record every signature found in a chat-completions response body.
///
/// Returns how many were captured.
pub fn capture_signatures(response: &Value, store: &dyn SignatureStore) -> usize {
    let Some(choices) = response.get("choices").and_then(Value::as_array) else {
        return 0;
    };

    let mut captured = 0;
    for choice in choices {
        let Some(calls) = choice
            .pointer("/message/tool_calls")
            .and_then(Value::as_array)
        else {
            continue;
        };
        for call in calls {
            let id = call.get("id").and_then(Value::as_str);
            if let (Some(id), Some(signature)) = (id, signature_of(call)) {
                store.put(id, signature);
                captured += 1;
            }
        }
    }
    captured
}

/// Re-attach cached signatures to assistant tool calls in a request body.
///
/// Calls whose id has no cached signature are left untouched, as are calls
/// that already carry one. A signature present on the outgoing call can only
/// have come from the service for that same call id, so it is never replaced
/// with the cached copy. Returns how many were injected.
pub fn inject_signatures(request: &mut Value, store: &dyn SignatureStore) -> usize {
    let Some(messages) = request.get_mut("messages").and_then(Value::as_array_mut) else {
        return 0;
    };

    let mut injected = 0;
    for message in messages {
        if message.get("role").and_then(Value::as_str) != Some("assistant") {
            continue;
        }
        let Some(calls) = message.get_mut("tool_calls").and_then(Value::as_array_mut) else {
            continue;
        };
        for call in calls {
            if signature_of(call).is_some() {
                continue;
            }
            let Some(signature) = call.get("id").and_then(Value::as_str).and_then(|id| store.get(id))
            else {
                continue;
            };
            let Some(obj) = call.as_object_mut() else {
                continue;
            };
            let extra = obj
                .entry(EXTRA_CONTENT_KEY)
                .or_insert_with(|| Value::Object(Map::new()));
            if !extra.is_object() {
                *extra = Value::Object(Map::new());
            }
            if let Some(extra) = extra.as_object_mut() {
                let google = extra
                    .entry(GOOGLE_KEY)
                    .or_insert_with(|| Value::Object(Map::new()));
                if let Some(google) = google.as_object_mut() {
                    let _ = google.insert(THOUGHT_SIGNATURE_KEY.into(), Value::String(signature));
                    injected += 1;
                }
            }
        }
    }
    injected
}
