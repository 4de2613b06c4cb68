use std::collections::HashMap;
use std::env;
use std::path::Path;

use crate::error::{ChatbotError, ChatbotResult};

/// Default port the HTTP server binds to when `PORT` is unset
pub const DEFAULT_PORT: u16 = 9000;

/// Hard ceiling for a single conversation request
pub const DEFAULT_MAX_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Application configuration loaded from an env file plus process environment
#[derive(Debug, Clone)]
pub struct Config {
    /// MongoDB connection configuration
    pub database: DatabaseConfig,
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Base model endpoint configuration
    pub models: ModelConfig,
}

/// MongoDB connection configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Connection URI for both the content store and conversation storage
    pub connection_uri: String,
    /// Database holding the embedded content and conversations collections
    pub database_name: String,
    /// Atlas vector search index name used by the content store
    pub vector_index_name: String,
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,
    /// Request timeout in milliseconds
    pub max_request_timeout_ms: u64,
    /// Serve the bundled static site alongside the API
    pub serve_static_site: bool,
}

/// Base model endpoint configuration
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Base URL of the OpenAI-compatible chat completion endpoint
    pub chat_base_url: String,
    /// Chat model name
    pub chat_model: String,
    /// Base URL of the OpenAI-compatible embedding endpoint
    pub embedding_base_url: String,
    /// Embedding model name
    pub embedding_model: String,
    /// Optional bearer token sent to both endpoints
    pub api_key: Option<String>,
}

impl Config {
    /// Load configuration from the env file at `path`.
    ///
    /// The three connection values are required and never defaulted; the
    /// process fails to start without them. `PORT` and the model endpoints
    /// are read from the process environment with defaults.
    pub fn load(path: impl AsRef<Path>) -> ChatbotResult<Self> {
        let path = path.as_ref();
        let file_vars = read_env_file(path)?;

        let config = Config {
            database: DatabaseConfig {
                connection_uri: required_var(&file_vars, "MONGODB_CONNECTION_URI")?,
                database_name: required_var(&file_vars, "MONGODB_DATABASE_NAME")?,
                vector_index_name: required_var(&file_vars, "VECTOR_SEARCH_INDEX_NAME")?,
            },
            server: ServerConfig {
                port: env::var("PORT")
                    .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                    .parse()
                    .map_err(|e| ChatbotError::ConfigError(format!("Invalid PORT: {}", e)))?,
                max_request_timeout_ms: DEFAULT_MAX_REQUEST_TIMEOUT_MS,
                serve_static_site: true,
            },
            models: ModelConfig {
                chat_base_url: env::var("CHAT_MODEL_BASE_URL")
                    .unwrap_or_else(|_| "http://localhost:11434/v1".to_string()),
                chat_model: env::var("CHAT_MODEL_NAME")
                    .unwrap_or_else(|_| "llama3.1".to_string()),
                embedding_base_url: env::var("EMBEDDING_MODEL_BASE_URL")
                    .unwrap_or_else(|_| "http://localhost:11434/v1".to_string()),
                embedding_model: env::var("EMBEDDING_MODEL_NAME")
                    .unwrap_or_else(|_| "nomic-embed-text".to_string()),
                api_key: env::var("MODEL_API_KEY").ok(),
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> ChatbotResult<()> {
        if !self.database.connection_uri.starts_with("mongodb://")
            && !self.database.connection_uri.starts_with("mongodb+srv://")
        {
            return Err(ChatbotError::ConfigError(
                "MONGODB_CONNECTION_URI must start with mongodb:// or mongodb+srv://".to_string(),
            ));
        }

        if self.database.database_name.is_empty() {
            return Err(ChatbotError::ConfigError(
                "MONGODB_DATABASE_NAME cannot be empty".to_string(),
            ));
        }

        if self.database.vector_index_name.is_empty() {
            return Err(ChatbotError::ConfigError(
                "VECTOR_SEARCH_INDEX_NAME cannot be empty".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ChatbotError::ConfigError(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.server.max_request_timeout_ms == 0 {
            return Err(ChatbotError::ConfigError(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        if !self.models.chat_base_url.starts_with("http") {
            return Err(ChatbotError::ConfigError(
                "CHAT_MODEL_BASE_URL must be an http(s) URL".to_string(),
            ));
        }

        if !self.models.embedding_base_url.starts_with("http") {
            return Err(ChatbotError::ConfigError(
                "EMBEDDING_MODEL_BASE_URL must be an http(s) URL".to_string(),
            ));
        }

        Ok(())
    }
}

/// Parse the env file into a map without mutating the process environment
fn read_env_file(path: &Path) -> ChatbotResult<HashMap<String, String>> {
    let iter = dotenvy::from_path_iter(path).map_err(|e| {
        ChatbotError::ConfigError(format!("Could not read env file {}: {}", path.display(), e))
    })?;

    let mut vars = HashMap::new();
    for item in iter {
        let (key, value) = item.map_err(|e| {
            ChatbotError::ConfigError(format!("Malformed env file {}: {}", path.display(), e))
        })?;
        vars.insert(key, value);
    }

    Ok(vars)
}

/// Look up a required key in the env file, falling back to the process
/// environment. A missing key is a configuration error, never a default.
fn required_var(file_vars: &HashMap<String, String>, key: &str) -> ChatbotResult<String> {
    if let Some(value) = file_vars.get(key) {
        if !value.is_empty() {
            return Ok(value.clone());
        }
    }

    match env::var(key) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ChatbotError::ConfigError(format!("{} is required", key))),
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database: DatabaseConfig {
                connection_uri: "".to_string(),
                database_name: "".to_string(),
                vector_index_name: "".to_string(),
            },
            server: ServerConfig {
                port: DEFAULT_PORT,
                max_request_timeout_ms: DEFAULT_MAX_REQUEST_TIMEOUT_MS,
                serve_static_site: true,
            },
            models: ModelConfig {
                chat_base_url: "http://localhost:11434/v1".to_string(),
                chat_model: "llama3.1".to_string(),
                embedding_base_url: "http://localhost:11434/v1".to_string(),
                embedding_model: "nomic-embed-text".to_string(),
                api_key: None,
            },
        }
    }
}
