use std::net::SocketAddr;

use anyhow::Context;
use axum::{routing::get, Router};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static PROM_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder and serve `/metrics` on `bind_addr`.
pub async fn init(bind_addr: &str) -> anyhow::Result<()> {
    let addr: SocketAddr = bind_addr
        .parse()
        .with_context(|| format!("invalid metrics bind address {bind_addr}"))?;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install Prometheus metrics recorder")?;
    // Only the first call installs a recorder; a repeat would have failed above.
    let _ = PROM_HANDLE.set(handle);
    describe_metrics();

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {addr}"))?;

    tokio::spawn(async move {
        let app = Router::new().route("/metrics", get(metrics_handler));
        if let Err(e) = axum::serve(listener, app.into_make_service()).await {
            tracing::error!(error = %e, "metrics server error");
        }
    });

    tracing::info!(%addr, "metrics endpoint listening");
    Ok(())
}

fn describe_metrics() {
    metrics::describe_counter!("http_ingest_requests_total", "Feed documents received over HTTP");
    metrics::describe_counter!("feeds_ingested_total", "Feeds stored successfully");
    metrics::describe_counter!("feeds_rejected_total", "Feeds rejected, labelled by fault kind");
    metrics::describe_counter!(
        "interval_readings_ingested_total",
        "Interval readings written to the store"
    );
    metrics::describe_counter!("reports_generated_total", "Hourly reports produced");
    metrics::describe_counter!(
        "report_generation_failed_total",
        "Report requests that failed, labelled by fault kind"
    );
}

async fn metrics_handler() -> String {
    PROM_HANDLE.get().map(PrometheusHandle::render).unwrap_or_default()
}
