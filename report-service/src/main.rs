use anyhow::Result;
use report_service::{config::AppConfig, http, metrics_server, observability, store};
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    // Load configuration
    let cfg = AppConfig::load()?;

    // Start metrics server if configured
    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr).await?;
    }

    let store = store::open_store(&cfg).await?;
    let app = http::create_router(http::AppState::new(store), cfg.server.max_body_bytes);

    let addr: SocketAddr = cfg
        .server
        .bind_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid server.bind_addr: {e}"))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "report service listening");

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
