use std::env;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vidshift_static_server::{ServerConfig, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let rust_log = env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();
    let env_filter = match rust_log.is_empty() {
        true => EnvFilter::builder().parse_lossy("info,tower_http=debug"),
        false => EnvFilter::builder().parse_lossy(rust_log),
    };
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = ServerConfig::parse();

    let root = config
        .root
        .canonicalize()
        .with_context(|| format!("asset root {} is not accessible", config.root.display()))?;
    info!("Serving files from {}", root.display());

    let app = create_router(root);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("Server running on http://localhost:{}", config.port);
    info!("Make sure to access via this URL for SharedArrayBuffer support");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("🛑 Shutdown signal received.");
        })
        .await
        .context("server failed")?;

    Ok(())
}
