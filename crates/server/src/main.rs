//! porchlight MCP server entry point.
//!
//! Boots the cache worker (install, then activate) and serves its tools on
//! stdio. Logging goes to stderr to avoid interfering with the JSON-RPC
//! protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use porchlight_client::{FetchClient, FetchConfig, Worker};
use porchlight_core::{AppConfig, CacheDb};
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

    let config = AppConfig::load()?;
    let db = CacheDb::open(&config.db_path).await?;
    let network = FetchClient::new(FetchConfig::from_app_config(&config))?;
    let worker = Worker::new(config.worker_config()?, db, Arc::new(network));

    tracing::info!(
        scope = %config.scope,
        db_path = %config.db_path.display(),
        "Starting porchlight server on stdio transport"
    );

    let install = worker.install().await;
    if !install.failed.is_empty() {
        tracing::warn!(failed = install.failed.len(), "some critical resources were not precached");
    }
    worker.activate().await?;

    let handler = handler::PorchlightServer::new(worker);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
