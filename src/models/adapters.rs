use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;
use tracing::info;

use crate::error::{ChatbotError, ChatbotResult};
use crate::models::{BaseChatModel, BaseEmbeddingModel, ChatLlm, ChatModelMetadata, Embedder};
use crate::types::ChatMessage;

/// Upper bound on the base chat model's metadata handshake. The original
/// composition awaited the handshake unbounded; a hung endpoint would have
/// blocked startup forever.
pub const CHAT_ADAPTER_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

struct EmbedderAdapter {
    base: Arc<dyn BaseEmbeddingModel>,
}

#[async_trait]
impl Embedder for EmbedderAdapter {
    async fn embed(&self, text: &str) -> ChatbotResult<Vec<f32>> {
        // No transformation of the underlying math; errors propagate unchanged
        self.base.embed(text).await
    }
}

/// Wrap a base embedding model so it satisfies the pipeline's `Embedder`
/// interface.
pub fn to_embedder(base: Arc<dyn BaseEmbeddingModel>) -> Arc<dyn Embedder> {
    Arc::new(EmbedderAdapter { base })
}

struct ChatLlmAdapter {
    base: Arc<dyn BaseChatModel>,
}

#[async_trait]
impl ChatLlm for ChatLlmAdapter {
    async fn answer(&self, messages: &[ChatMessage]) -> ChatbotResult<ChatMessage> {
        self.base.complete(messages).await
    }
}

/// Wrap a base chat model so it satisfies the `ChatLlm` interface.
///
/// Suspends while the base model's metadata handshake completes, bounded by
/// [`CHAT_ADAPTER_HANDSHAKE_TIMEOUT`]. A timeout or handshake failure is an
/// `AdapterError` carrying the original cause.
pub async fn to_chat_llm(base: Arc<dyn BaseChatModel>) -> ChatbotResult<Arc<dyn ChatLlm>> {
    let metadata = match timeout(CHAT_ADAPTER_HANDSHAKE_TIMEOUT, base.metadata()).await {
        Ok(Ok(metadata)) => metadata,
        Ok(Err(e)) => {
            return Err(ChatbotError::AdapterError(format!(
                "base chat model handshake failed: {}",
                e
            )))
        }
        Err(_) => {
            return Err(ChatbotError::AdapterError(format!(
                "base chat model handshake timed out after {:?}",
                CHAT_ADAPTER_HANDSHAKE_TIMEOUT
            )))
        }
    };

    info!(model = %metadata.model, context_window = ?metadata.context_window, "chat model adapted");

    Ok(Arc::new(ChatLlmAdapter { base }))
}
