use thiserror::Error;

/// Main error type for the chatbot server
#[derive(Debug, Error)]
pub enum ChatbotError {
    /// Missing or invalid environment values
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Wrapped-model construction or handshake failure
    #[error("Adapter error: {0}")]
    AdapterError(String),

    /// Database or content-store connect/close failure
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// HTTP bind/listen/close failure
    #[error("Server error: {0}")]
    ServerError(String),

    /// Runtime failure from a wrapped embedding or chat model
    #[error("Model error: {0}")]
    ModelError(String),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl ChatbotError {
    /// Check if error happened while wiring up components
    pub fn is_startup_error(&self) -> bool {
        matches!(
            self,
            ChatbotError::ConfigError(_)
                | ChatbotError::AdapterError(_)
                | ChatbotError::ConnectionError(_)
        )
    }

    /// Get HTTP status code for the error
    pub fn status_code(&self) -> u16 {
        match self {
            ChatbotError::InvalidRequest(_) => 400,
            ChatbotError::NotFound(_) => 404,
            ChatbotError::ModelError(_) => 503,
            ChatbotError::ConnectionError(_) => 503,
            ChatbotError::ConfigError(_) => 500,
            ChatbotError::AdapterError(_) => 500,
            ChatbotError::ServerError(_) => 500,
            ChatbotError::IoError(_) => 500,
            ChatbotError::SerializationError(_) => 500,
        }
    }
}

impl From<mongodb::error::Error> for ChatbotError {
    fn from(err: mongodb::error::Error) -> Self {
        ChatbotError::ConnectionError(err.to_string())
    }
}

impl From<reqwest::Error> for ChatbotError {
    fn from(err: reqwest::Error) -> Self {
        ChatbotError::ModelError(err.to_string())
    }
}

/// Result type alias for chatbot operations
pub type ChatbotResult<T> = Result<T, ChatbotError>;
