use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::{doc, to_bson};
use mongodb::{Collection, Database};
use tracing::debug;
use uuid::Uuid;

use crate::conversations::ConversationsService;
use crate::error::{ChatbotError, ChatbotResult};
use crate::types::{Conversation, Message};

const CONVERSATIONS_COLLECTION: &str = "conversations";

/// MongoDB-backed conversation store
pub struct MongoDbConversations {
    collection: Collection<Conversation>,
}

impl MongoDbConversations {
    pub fn new(database: Database) -> Self {
        Self {
            collection: database.collection(CONVERSATIONS_COLLECTION),
        }
    }
}

#[async_trait]
impl ConversationsService for MongoDbConversations {
    async fn create_conversation(&self) -> ChatbotResult<Conversation> {
        let conversation = Conversation {
            id: Uuid::new_v4(),
            messages: Vec::new(),
            created_at: Utc::now(),
        };

        self.collection.insert_one(&conversation, None).await?;
        debug!(conversation_id = %conversation.id, "Conversation created");

        Ok(conversation)
    }

    async fn add_message(&self, conversation_id: Uuid, message: Message) -> ChatbotResult<Message> {
        let message_bson = to_bson(&message).map_err(|e| {
            ChatbotError::ConnectionError(format!("could not encode message: {}", e))
        })?;

        let result = self
            .collection
            .update_one(
                doc! { "_id": conversation_id.to_string() },
                doc! { "$push": { "messages": message_bson } },
                None,
            )
            .await?;

        if result.matched_count == 0 {
            return Err(ChatbotError::NotFound(format!(
                "conversation not found: {}",
                conversation_id
            )));
        }

        debug!(conversation_id = %conversation_id, role = message.role.as_str(), "Message appended");
        Ok(message)
    }

    async fn find_by_id(&self, conversation_id: Uuid) -> ChatbotResult<Option<Conversation>> {
        let conversation = self
            .collection
            .find_one(doc! { "_id": conversation_id.to_string() }, None)
            .await?;

        Ok(conversation)
    }
}
