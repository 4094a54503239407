//! # artreal-llm
//!
//! Completion client layer.
//!
//! - [`provider`]: the [`CompletionClient`] trait and [`ProviderError`]
//! - [`chat`]: OpenAI-compatible chat-completions wire types and client
//! - [`transport`]: [`SignaturePreservingTransport`], which keeps Gemini
//!   thought signatures attached to tool calls across requests
//! - [`signatures`]: the signature cache and the JSON rewrite helpers

#![deny(unsafe_code)]

pub mod chat;
pub mod error_parsing;
pub mod provider;
pub mod signatures;
pub mod transport;

pub use chat::{ChatCompletionsClient, ChatConfig};
pub use provider::{
    CompletionClient, CompletionRequest, CompletionResponse, ProviderError, ProviderResult,
};
pub use signatures::{MemorySignatureStore, SignatureStore};
pub use transport::SignaturePreservingTransport;
