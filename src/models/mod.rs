/// Model module
///
/// This module holds the externally supplied "base" model capabilities (HTTP
/// clients speaking the OpenAI-compatible wire format) and the adapter
/// functions that convert them into the `Embedder` and `ChatLlm` interfaces
/// the retrieval pipeline and the conversations route expect.

mod adapters;
mod client;

use async_trait::async_trait;

use crate::error::ChatbotResult;
use crate::types::ChatMessage;

pub use adapters::{to_chat_llm, to_embedder, CHAT_ADAPTER_HANDSHAKE_TIMEOUT};
pub use client::{OpenAiChatModel, OpenAiEmbeddingModel};

/// Metadata reported by a base chat model during its handshake
#[derive(Debug, Clone)]
pub struct ChatModelMetadata {
    /// Model identifier as reported by the serving endpoint
    pub model: String,
    /// Maximum context window, when the endpoint reports one
    pub context_window: Option<u32>,
}

/// Externally supplied embedding capability
#[async_trait]
pub trait BaseEmbeddingModel: Send + Sync {
    /// Turn text into a fixed-length vector
    async fn embed(&self, text: &str) -> ChatbotResult<Vec<f32>>;
}

/// Externally supplied chat-completion capability
#[async_trait]
pub trait BaseChatModel: Send + Sync {
    /// Fetch model metadata. Called once during adaptation; a slow or
    /// unreachable endpoint surfaces here rather than at request time.
    async fn metadata(&self) -> ChatbotResult<ChatModelMetadata>;

    /// Produce a completion for the given message history
    async fn complete(&self, messages: &[ChatMessage]) -> ChatbotResult<ChatMessage>;
}

/// Capability expected by the retrieval pipeline: text in, vector out
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> ChatbotResult<Vec<f32>>;
}

/// Capability expected by the conversations route: history in, reply out
#[async_trait]
pub trait ChatLlm: Send + Sync {
    async fn answer(&self, messages: &[ChatMessage]) -> ChatbotResult<ChatMessage>;
}
