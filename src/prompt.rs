//! User-prompt assembly for the conversations route.
//!
//! Retrieved chunk texts are joined with a fixed separator inside an
//! instruction template, and the original user query is always appended
//! verbatim, even when retrieval came back empty. The system prompt is
//! prepended at the message-history level by the route handler, never here.

use crate::types::{ChatMessage, EmbeddedContent};

/// Token placed between content chunks in the assembled prompt
pub const CHUNK_SEPARATOR: &str = "~~~~~~";

/// Static system prompt prepended to every conversation
pub const SYSTEM_PROMPT: &str = "You are an assistant to users of the MongoDB Chatbot Framework.
Answer their questions about the framework in a friendly conversational tone.
Format your answers in Markdown.
Be concise in your answers.
If you do not know the answer to the question based on the information provided,
respond: \"I'm sorry, I don't know the answer to that question. Please try to rephrase it. Refer to the below information to see if it helps.\"";

/// Build the user message sent to the chat model from the retrieved content
/// and the original user query.
pub fn make_user_message(content: &[EmbeddedContent], original_user_message: &str) -> ChatMessage {
    let context = content
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join(&format!("\n{}\n", CHUNK_SEPARATOR));

    let body = format!(
        "Using the following information, answer the user query.\n\
         Different pieces of information are separated by \"{separator}\".\n\
         \n\
         Information:\n\
         {context}\n\
         \n\
         \n\
         User query: {original_user_message}",
        separator = CHUNK_SEPARATOR,
        context = context,
        original_user_message = original_user_message,
    );

    ChatMessage::user(body)
}
