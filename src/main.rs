use std::env;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use rag_chatbot_server::{ChatbotResult, ChatbotServer, Config};

/// Env file read at startup when no path argument is given
const DEFAULT_ENV_FILE: &str = ".env";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run().await {
        Ok(()) => {
            info!("Server shut down");
        }
        Err(e) => {
            error!("Fatal error: {}", e);
        }
    }

    // The process reports failure on every exit path, clean shutdown
    // included. Supervisors restart it either way.
    std::process::exit(1);
}

async fn run() -> ChatbotResult<()> {
    let env_file = env::args().nth(1).unwrap_or_else(|| DEFAULT_ENV_FILE.to_string());
    info!(env_file = %env_file, "Loading configuration");

    let config = Config::load(&env_file)?;
    let server = ChatbotServer::new(config).await?;
    let report = server.run().await?;

    if !report.is_clean() {
        info!(?report, "Resources released with errors");
    }

    Ok(())
}
