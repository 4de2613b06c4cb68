use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role tag carried by every chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// A single role-tagged message sent to or received from the chat model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// An embedded content chunk returned by the content store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedContent {
    /// Chunk text used for prompt assembly
    pub text: String,
    /// Source URL of the chunk, when the ingest pipeline recorded one
    #[serde(default)]
    pub url: Option<String>,
    /// Similarity score assigned by the vector search (0.0 to 1.0)
    #[serde(default)]
    pub score: f32,
}

/// A message persisted inside a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

/// A persisted chat session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
}

/// Request body for posting a message to a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRequest {
    pub message: String,
}

/// Reference to a content chunk that informed an answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentReference {
    pub url: String,
    pub score: f32,
}

/// Response body for a posted message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub references: Vec<ContentReference>,
    pub created_at: DateTime<Utc>,
}

/// Response body for conversation creation and retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationResponse {
    pub id: Uuid,
    pub messages: Vec<MessageView>,
    pub created_at: DateTime<Utc>,
}

/// Message shape exposed over the API (system messages are filtered out)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageView {
    pub id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Message> for MessageView {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id,
            role: message.role,
            content: message.content.clone(),
            created_at: message.created_at,
        }
    }
}

impl From<&Conversation> for ConversationResponse {
    fn from(conversation: &Conversation) -> Self {
        Self {
            id: conversation.id,
            messages: conversation
                .messages
                .iter()
                .filter(|m| m.role != MessageRole::System)
                .map(MessageView::from)
                .collect(),
            created_at: conversation.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serialization_is_lowercase() {
        let json = serde_json::to_string(&MessageRole::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }

    #[test]
    fn test_conversation_response_hides_system_messages() {
        let conversation = Conversation {
            id: Uuid::new_v4(),
            messages: vec![
                Message::new(MessageRole::System, "system prompt"),
                Message::new(MessageRole::User, "hello"),
                Message::new(MessageRole::Assistant, "hi"),
            ],
            created_at: Utc::now(),
        };

        let response = ConversationResponse::from(&conversation);
        assert_eq!(response.messages.len(), 2);
        assert!(response
            .messages
            .iter()
            .all(|m| m.role != MessageRole::System));
    }
}
