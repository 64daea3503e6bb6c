use anyhow::{bail, Result};
use report_service::{config::AppConfig, observability, services::IngestService, store};
use std::env;

/// Ingest feed documents from disk, one transaction per file.
#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let paths: Vec<String> = env::args().skip(1).collect();
    if paths.is_empty() {
        bail!("usage: ingest_feed <feed.json>...");
    }

    // Load configuration (can point REPORT_SERVICE_CONFIG to a backfill-specific file).
    let cfg = AppConfig::load()?;
    let ingest = IngestService::new(store::open_store(&cfg).await?);

    let mut failed = 0usize;
    for path in &paths {
        let raw = match tokio::fs::read(path).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(path = %path, error = %e, "failed to read feed file");
                failed += 1;
                continue;
            }
        };

        match ingest.ingest(&raw).await {
            Ok(summary) => tracing::info!(
                path = %path,
                meter_id = %summary.meter_id,
                readings = summary.readings_inserted,
                "ingested feed file"
            ),
            Err(e) => {
                tracing::error!(path = %path, error = %e, "failed to ingest feed file");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} feed files failed", paths.len());
    }

    Ok(())
}
