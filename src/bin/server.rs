//! Gateway server binary
//!
//! Run with: cargo run --bin noddy-rag-server

use noddy_rag::{config::GatewayConfig, server::GatewayServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "noddy_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Optional TOML config; defaults otherwise
    let config = match std::env::var("NODDY_RAG_CONFIG") {
        Ok(path) => GatewayConfig::from_file(&path)?,
        Err(_) => GatewayConfig::default(),
    };

    tracing::info!("Configuration loaded");
    tracing::info!("  - Persona: {}", config.persona.name);
    tracing::info!("  - Embedding dimensions: {}", config.embeddings.dimensions);
    tracing::info!("  - Chunk size: {} chars", config.chunking.max_chars);
    tracing::info!("  - Daily quota: {} requests", config.quota.daily_limit);
    tracing::info!("  - Default model: {}", config.provider.default_model);

    let server = GatewayServer::new(config)?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/chat      - Run a chat turn");
    println!("  POST /api/ingest    - Ingest a document");
    println!("  GET  /api/documents - List documents");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
