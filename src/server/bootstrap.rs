use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use mongodb::Client;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::conversations::MongoDbConversations;
use crate::error::{ChatbotError, ChatbotResult};
use crate::models::{to_chat_llm, to_embedder, OpenAiChatModel, OpenAiEmbeddingModel};
use crate::prompt::SYSTEM_PROMPT;
use crate::retrieval::FindContentPipeline;
use crate::server::{make_app, AppConfig, ConversationsRouterConfig};
use crate::store::{FindNearestNeighborsOptions, MongoDbContentStore, VectorStore};

/// Lifecycle phases of the server process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Initializing,
    Listening,
    ShuttingDown,
    Terminated,
}

/// Outcome of the resource teardown that follows request draining
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    /// The embedded content store connection released cleanly
    pub content_store_closed: bool,
    /// The conversation database connection released cleanly
    pub database_closed: bool,
}

impl ShutdownReport {
    pub fn is_clean(&self) -> bool {
        self.content_store_closed && self.database_closed
    }
}

/// Close the content store and the conversation database concurrently.
///
/// A failure on one side never prevents the other from closing; both
/// outcomes are reported so the caller can log a partial teardown.
pub async fn shutdown_resources<S, D>(store_close: S, database_close: D) -> ShutdownReport
where
    S: Future<Output = ChatbotResult<()>>,
    D: Future<Output = ChatbotResult<()>>,
{
    let (store_result, database_result) = tokio::join!(store_close, database_close);

    if let Err(e) = &store_result {
        error!("Content store close failed: {}", e);
    }
    if let Err(e) = &database_result {
        error!("Conversation database close failed: {}", e);
    }

    ShutdownReport {
        content_store_closed: store_result.is_ok(),
        database_closed: database_result.is_ok(),
    }
}

/// The fully wired chatbot server, ready to listen
pub struct ChatbotServer {
    port: u16,
    app: axum::Router,
    content_store: Arc<MongoDbContentStore>,
    conversations_client: Client,
    state: ServerState,
}

impl ChatbotServer {
    /// Assemble every capability from configuration: store connections, model
    /// adapters, the retrieval pipeline, and the HTTP application.
    pub async fn new(config: Config) -> ChatbotResult<Self> {
        info!(state = ?ServerState::Initializing, "Assembling server");

        let content_store = Arc::new(MongoDbContentStore::connect(&config.database).await?);

        // Conversations use their own client so the two stores can be
        // released independently during shutdown.
        let conversations_client = Client::with_uri_str(&config.database.connection_uri).await?;
        let conversations = Arc::new(MongoDbConversations::new(
            conversations_client.database(&config.database.database_name),
        ));

        let embedder = to_embedder(Arc::new(OpenAiEmbeddingModel::new(&config.models)));
        let llm = to_chat_llm(Arc::new(OpenAiChatModel::new(&config.models))).await?;

        let find_content = Arc::new(FindContentPipeline::new(
            embedder,
            content_store.clone(),
            FindNearestNeighborsOptions::new(&config.database.vector_index_name),
        ));

        let app = make_app(AppConfig {
            conversations_router_config: ConversationsRouterConfig {
                llm,
                conversations,
                find_content,
                system_prompt: SYSTEM_PROMPT,
            },
            max_request_timeout_ms: config.server.max_request_timeout_ms,
            serve_static_site: config.server.serve_static_site,
        });

        Ok(Self {
            port: config.server.port,
            app,
            content_store,
            conversations_client,
            state: ServerState::Initializing,
        })
    }

    /// Bind, serve until SIGINT, drain in-flight requests, then release
    /// database resources. Returns the teardown report once everything has
    /// settled.
    pub async fn run(mut self) -> ChatbotResult<ShutdownReport> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ChatbotError::ServerError(format!("could not bind {}: {}", addr, e)))?;

        self.state = ServerState::Listening;
        info!(state = ?self.state, %addr, "Server listening");

        let interrupt = async {
            match signal::ctrl_c().await {
                Ok(()) => info!("SIGINT received, starting graceful shutdown"),
                Err(e) => error!("Could not listen for SIGINT: {}", e),
            }
        };

        let content_store = self.content_store.clone();
        let conversations_client = self.conversations_client.clone();
        let report = serve_until_shutdown(
            listener,
            self.app,
            interrupt,
            async move { content_store.close().await },
            async move {
                conversations_client.shutdown().await;
                info!("Conversation database connection closed");
                Ok(())
            },
        )
        .await?;

        self.state = ServerState::Terminated;
        if report.is_clean() {
            info!(state = ?self.state, "Shutdown complete");
        } else {
            warn!(state = ?self.state, ?report, "Shutdown completed with errors");
        }

        Ok(report)
    }
}

/// Serve the application until `shutdown` resolves, drain in-flight
/// requests, then release both stores. The listener is fully closed before
/// either close future starts.
async fn serve_until_shutdown<F, S, D>(
    listener: TcpListener,
    app: axum::Router,
    shutdown: F,
    store_close: S,
    database_close: D,
) -> ChatbotResult<ShutdownReport>
where
    F: Future<Output = ()> + Send + 'static,
    S: Future<Output = ChatbotResult<()>>,
    D: Future<Output = ChatbotResult<()>>,
{
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ChatbotError::ServerError(format!("server error: {}", e)))?;

    info!(state = ?ServerState::ShuttingDown, "In-flight requests drained, releasing resources");

    Ok(shutdown_resources(store_close, database_close).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use axum::routing::get;
    use tokio::net::TcpStream;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_shutdown_resources_reports_clean_teardown() {
        let report = shutdown_resources(async { Ok(()) }, async { Ok(()) }).await;
        assert!(report.content_store_closed);
        assert!(report.database_closed);
        assert!(report.is_clean());
    }

    #[tokio::test]
    async fn test_shutdown_resources_one_failure_does_not_block_the_other() {
        let report = shutdown_resources(
            async { Err(ChatbotError::ConnectionError("store hung up".into())) },
            async { Ok(()) },
        )
        .await;

        assert!(!report.content_store_closed);
        assert!(report.database_closed);
        assert!(!report.is_clean());
    }

    #[tokio::test]
    async fn test_interrupt_drains_listener_before_releasing_resources() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = axum::Router::new().route("/health", get(|| async { "ok" }));

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let store_closed = Arc::new(AtomicBool::new(false));
        let database_closed = Arc::new(AtomicBool::new(false));

        // Each close asserts the listener is already gone before it runs
        let store_close = {
            let store_closed = store_closed.clone();
            async move {
                assert!(TcpStream::connect(addr).await.is_err());
                store_closed.store(true, Ordering::SeqCst);
                Ok(())
            }
        };
        let database_close = {
            let database_closed = database_closed.clone();
            async move {
                assert!(TcpStream::connect(addr).await.is_err());
                database_closed.store(true, Ordering::SeqCst);
                Ok(())
            }
        };

        let server = tokio::spawn(serve_until_shutdown(
            listener,
            app,
            async move {
                let _ = shutdown_rx.await;
            },
            store_close,
            database_close,
        ));

        // The listener accepts connections until the shutdown trigger fires
        let connection = TcpStream::connect(addr).await.unwrap();
        drop(connection);

        shutdown_tx.send(()).unwrap();
        let report = server.await.unwrap().unwrap();

        assert!(report.is_clean());
        assert!(store_closed.load(Ordering::SeqCst));
        assert!(database_closed.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_resources_closes_concurrently() {
        // With paused time, sequential closes would need 4s of virtual time;
        // concurrent closes finish after the 2s maximum.
        let started = tokio::time::Instant::now();
        let report = shutdown_resources(
            async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Ok(())
            },
            async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Ok(())
            },
        )
        .await;

        assert!(report.is_clean());
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }
}
