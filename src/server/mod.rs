/// HTTP server module
///
/// The app factory wires the assembled capabilities (chat llm, conversation
/// store, find-content pipeline, system prompt) into an axum router. The
/// bootstrap submodule owns startup, the listening loop, and graceful
/// shutdown.

mod bootstrap;


use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Request, State};
use axum::http::{Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use tokio::time::timeout;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tracing::{error, info};
use uuid::Uuid;

use crate::conversations::ConversationsService;
use crate::error::ChatbotError;
use crate::models::ChatLlm;
use crate::prompt::make_user_message;
use crate::retrieval::FindContentPipeline;
use crate::types::{
    ChatMessage, ContentReference, ConversationResponse, Message, MessageRequest, MessageResponse,
    MessageRole,
};

pub use bootstrap::{shutdown_resources, ChatbotServer, ServerState, ShutdownReport};

/// Maximum accepted user message length in characters
const MAX_MESSAGE_LENGTH: usize = 1000;

/// Maximum request body size in bytes
const MAX_REQUEST_BODY_BYTES: usize = 32 * 1024;

/// Directory served when the static site is enabled
const STATIC_SITE_DIR: &str = "static";

/// Configuration for the conversations router
#[derive(Clone)]
pub struct ConversationsRouterConfig {
    /// Adapted chat model answering user messages
    pub llm: Arc<dyn ChatLlm>,
    /// Conversation persistence service
    pub conversations: Arc<dyn ConversationsService>,
    /// Assembled retrieval pipeline
    pub find_content: Arc<FindContentPipeline>,
    /// Static system prompt prepended to every model call
    pub system_prompt: &'static str,
}

/// Aggregate configuration handed to the app factory once at startup
#[derive(Clone)]
pub struct AppConfig {
    pub conversations_router_config: ConversationsRouterConfig,
    /// Per-request ceiling in milliseconds
    pub max_request_timeout_ms: u64,
    /// Serve the bundled static site alongside the API
    pub serve_static_site: bool,
}

#[derive(Clone)]
struct AppState {
    router_config: Arc<ConversationsRouterConfig>,
    request_timeout: Duration,
}

/// Build the HTTP application from the assembled configuration
pub fn make_app(config: AppConfig) -> Router {
    let state = AppState {
        router_config: Arc::new(config.conversations_router_config),
        request_timeout: Duration::from_millis(config.max_request_timeout_ms),
    };

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .allow_origin(Any);

    let mut app = Router::new()
        .route("/api/v1/conversations", post(create_conversation_handler))
        .route(
            "/api/v1/conversations/:conversation_id",
            get(get_conversation_handler),
        )
        .route(
            "/api/v1/conversations/:conversation_id/messages",
            post(add_message_handler),
        )
        .route("/health", get(health_handler))
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_BYTES))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            timeout_middleware,
        ))
        .layer(cors)
        .with_state(state);

    if config.serve_static_site {
        app = app.fallback_service(ServeDir::new(STATIC_SITE_DIR));
    }

    app
}

/// Middleware enforcing the configured per-request ceiling
async fn timeout_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    match timeout(state.request_timeout, next.run(request)).await {
        Ok(response) => Ok(response),
        Err(_) => {
            error!("Request exceeded the {:?} ceiling", state.request_timeout);
            Err(ApiError {
                status: StatusCode::GATEWAY_TIMEOUT,
                message: "Request processing took too long".to_string(),
            })
        }
    }
}

/// Handler for `POST /api/v1/conversations`
async fn create_conversation_handler(
    State(state): State<AppState>,
) -> Result<Json<ConversationResponse>, ApiError> {
    let conversation = state
        .router_config
        .conversations
        .create_conversation()
        .await?;

    info!(conversation_id = %conversation.id, "Conversation created");
    Ok(Json(ConversationResponse::from(&conversation)))
}

/// Handler for `GET /api/v1/conversations/:conversation_id`
async fn get_conversation_handler(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
) -> Result<Json<ConversationResponse>, ApiError> {
    let conversation_id = parse_conversation_id(&conversation_id)?;

    let conversation = state
        .router_config
        .conversations
        .find_by_id(conversation_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("conversation not found: {}", conversation_id)))?;

    Ok(Json(ConversationResponse::from(&conversation)))
}

/// Handler for `POST /api/v1/conversations/:conversation_id/messages`
///
/// The RAG round trip: retrieve content for the user message, assemble the
/// templated user prompt, call the chat model with the system prompt plus
/// prior history plus the assembled prompt, persist the original user text
/// and the reply, and respond with the reply and its content references.
async fn add_message_handler(
    State(state): State<AppState>,
    Path(conversation_id): Path<String>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let conversation_id = parse_conversation_id(&conversation_id)?;
    validate_message(&request.message)?;

    let config = &state.router_config;

    let conversation = config
        .conversations
        .find_by_id(conversation_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("conversation not found: {}", conversation_id)))?;

    info!(conversation_id = %conversation_id, "Processing user message");

    let content = config.find_content.find_content(&request.message).await?;
    info!(chunks = content.len(), "Content retrieved for message");

    let assembled = make_user_message(&content, &request.message);

    let mut history: Vec<ChatMessage> = Vec::with_capacity(conversation.messages.len() + 2);
    history.push(ChatMessage::system(config.system_prompt));
    history.extend(
        conversation
            .messages
            .iter()
            .map(|m| ChatMessage {
                role: m.role,
                content: m.content.clone(),
            }),
    );
    history.push(assembled);

    let reply = config.llm.answer(&history).await?;

    // The conversation record keeps the user's original text, not the
    // assembled prompt.
    config
        .conversations
        .add_message(conversation_id, Message::new(MessageRole::User, &request.message))
        .await?;
    let stored_reply = config
        .conversations
        .add_message(
            conversation_id,
            Message::new(MessageRole::Assistant, &reply.content),
        )
        .await?;

    let references = content
        .iter()
        .filter_map(|c| {
            c.url.as_ref().map(|url| ContentReference {
                url: url.clone(),
                score: c.score,
            })
        })
        .collect();

    Ok(Json(MessageResponse {
        id: stored_reply.id,
        role: stored_reply.role,
        content: stored_reply.content,
        references,
        created_at: stored_reply.created_at,
    }))
}

/// Handler for the health check endpoint
async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now(),
    }))
}

fn parse_conversation_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError {
        status: StatusCode::BAD_REQUEST,
        message: format!("invalid conversation id: {}", raw),
    })
}

fn validate_message(message: &str) -> Result<(), ApiError> {
    if message.trim().is_empty() {
        return Err(ApiError {
            status: StatusCode::BAD_REQUEST,
            message: "Message cannot be empty".to_string(),
        });
    }

    if message.len() > MAX_MESSAGE_LENGTH {
        return Err(ApiError {
            status: StatusCode::BAD_REQUEST,
            message: format!(
                "Message too long (maximum {} characters allowed)",
                MAX_MESSAGE_LENGTH
            ),
        });
    }

    Ok(())
}

/// Error surfaced over the HTTP API
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn not_found(message: String) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message,
        }
    }
}

impl From<ChatbotError> for ApiError {
    fn from(err: ChatbotError) -> Self {
        error!("Request failed: {}", err);
        Self {
            status: StatusCode::from_u16(err.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}
