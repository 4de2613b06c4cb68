/// Conversation store module
///
/// Persisted chat sessions keyed by conversation id. This crate only drives
/// the create/append/read surface; the MongoDB implementation owns the
/// document shape, and the in-memory implementation backs tests and local
/// development without a database.

mod memory;
mod mongodb_client;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::ChatbotResult;
use crate::types::{Conversation, Message};

pub use memory::MemoryConversations;
pub use mongodb_client::MongoDbConversations;

/// Create/append/read operations over persisted chat sessions
#[async_trait]
pub trait ConversationsService: Send + Sync {
    /// Create a new, empty conversation
    async fn create_conversation(&self) -> ChatbotResult<Conversation>;

    /// Append a message to an existing conversation
    async fn add_message(&self, conversation_id: Uuid, message: Message) -> ChatbotResult<Message>;

    /// Fetch a conversation by id
    async fn find_by_id(&self, conversation_id: Uuid) -> ChatbotResult<Option<Conversation>>;
}
