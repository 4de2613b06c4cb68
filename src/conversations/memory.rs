use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::conversations::ConversationsService;
use crate::error::{ChatbotError, ChatbotResult};
use crate::types::{Conversation, Message};

/// In-memory conversation store. Not persistent; conversations live for the
/// process lifetime only.
#[derive(Default)]
pub struct MemoryConversations {
    conversations: Mutex<HashMap<Uuid, Conversation>>,
}

impl MemoryConversations {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationsService for MemoryConversations {
    async fn create_conversation(&self) -> ChatbotResult<Conversation> {
        let conversation = Conversation {
            id: Uuid::new_v4(),
            messages: Vec::new(),
            created_at: Utc::now(),
        };

        self.conversations
            .lock()
            .map_err(|_| ChatbotError::ConnectionError("conversation store lock poisoned".into()))?
            .insert(conversation.id, conversation.clone());

        Ok(conversation)
    }

    async fn add_message(&self, conversation_id: Uuid, message: Message) -> ChatbotResult<Message> {
        let mut conversations = self
            .conversations
            .lock()
            .map_err(|_| ChatbotError::ConnectionError("conversation store lock poisoned".into()))?;

        let conversation = conversations.get_mut(&conversation_id).ok_or_else(|| {
            ChatbotError::NotFound(format!("conversation not found: {}", conversation_id))
        })?;

        conversation.messages.push(message.clone());
        Ok(message)
    }

    async fn find_by_id(&self, conversation_id: Uuid) -> ChatbotResult<Option<Conversation>> {
        let conversations = self
            .conversations
            .lock()
            .map_err(|_| ChatbotError::ConnectionError("conversation store lock poisoned".into()))?;

        Ok(conversations.get(&conversation_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MessageRole;

    #[tokio::test]
    async fn test_create_then_read_roundtrip() {
        let service = MemoryConversations::new();
        let created = service.create_conversation().await.unwrap();

        let found = service.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert!(found.messages.is_empty());
    }

    #[tokio::test]
    async fn test_add_message_appends_in_order() {
        let service = MemoryConversations::new();
        let conversation = service.create_conversation().await.unwrap();

        service
            .add_message(conversation.id, Message::new(MessageRole::User, "hello"))
            .await
            .unwrap();
        service
            .add_message(
                conversation.id,
                Message::new(MessageRole::Assistant, "hi there"),
            )
            .await
            .unwrap();

        let found = service.find_by_id(conversation.id).await.unwrap().unwrap();
        assert_eq!(found.messages.len(), 2);
        assert_eq!(found.messages[0].content, "hello");
        assert_eq!(found.messages[1].content, "hi there");
    }

    #[tokio::test]
    async fn test_add_message_to_unknown_conversation_fails() {
        let service = MemoryConversations::new();
        let err = service
            .add_message(Uuid::new_v4(), Message::new(MessageRole::User, "hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatbotError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_find_unknown_conversation_is_none() {
        let service = MemoryConversations::new();
        assert!(service.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }
}
