//! citadel server entry point.
//!
//! Loads configuration, opens the character store and boots the MCP server
//! on stdio transport. Logging goes to stderr to avoid interfering with the
//! JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use citadel_client::{CharacterService, UpstreamClient, UpstreamConfig};
use citadel_core::{AppConfig, CharacterDb};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("loading configuration")?;
    tracing::info!(base_url = %config.base_url, db_path = %config.db_path.display(), "starting citadel server on stdio transport");

    let db = CharacterDb::open(&config.db_path)
        .await
        .with_context(|| format!("opening character store at {}", config.db_path.display()))?;
    let upstream = UpstreamClient::new(UpstreamConfig::from(&config)).context("building upstream client")?;
    let service = Arc::new(CharacterService::new(upstream, db, config.page_size));

    let handler = handler::CitadelServer::new(service);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
