//! RAG chatbot server over a MongoDB embedded-content store.
//!
//! The crate wires OpenAI-compatible model endpoints, an Atlas vector search
//! collection, and a conversation store into an HTTP API: create a
//! conversation, post a user message, get back a retrieval-augmented answer
//! with content references.

pub mod config;
pub mod conversations;
pub mod error;
pub mod models;
pub mod prompt;
pub mod retrieval;
pub mod server;
pub mod store;
pub mod types;

pub use config::Config;
pub use error::{ChatbotError, ChatbotResult};
pub use server::{ChatbotServer, ShutdownReport};
