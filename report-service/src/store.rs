use std::sync::Arc;

use anyhow::Context;
use meter_client::{MemoryReadingStore, PgReadingStore, ReadingStore};

use crate::config::{AppConfig, StoreKind};

/// Build the configured reading store. Postgres stores get their schema
/// created on first use.
pub async fn open_store(cfg: &AppConfig) -> anyhow::Result<Arc<dyn ReadingStore>> {
    match cfg.store.kind {
        StoreKind::Memory => {
            tracing::warn!("using in-memory reading store; data is lost on restart");
            Ok(Arc::new(MemoryReadingStore::new()))
        }
        StoreKind::Postgres => {
            let db = cfg
                .database
                .as_ref()
                .context("store.kind = \"postgres\" requires a [database] section")?;
            let store = PgReadingStore::connect(&db.uri, db.max_connections)
                .await
                .context("failed to connect to Postgres")?;
            store
                .ensure_schema()
                .await
                .context("failed to create reading store schema")?;
            tracing::info!(max_connections = db.max_connections, "connected to Postgres");
            Ok(Arc::new(store))
        }
    }
}
