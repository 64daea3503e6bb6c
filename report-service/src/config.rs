use serde::Deserialize;
use std::fs;

fn default_max_body_bytes() -> usize {
    8 * 1024 * 1024
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub kind: StoreKind,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub uri: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub database: Option<DatabaseConfig>,
    pub metrics: Option<MetricsConfig>,
}

impl AppConfig {
    /// Read the TOML file named by `REPORT_SERVICE_CONFIG` (default
    /// `report-service.toml`). `DATABASE_URL` overrides `database.uri`.
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path = env::var("REPORT_SERVICE_CONFIG")
            .unwrap_or_else(|_| "report-service.toml".to_string());
        let contents = fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {path}: {e}"))?;
        let mut cfg = Self::from_toml_str(&contents)?;

        if let (Ok(url), Some(db)) = (env::var("DATABASE_URL"), cfg.database.as_mut()) {
            db.uri = url;
        }

        Ok(cfg)
    }

    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;

        if cfg.store.kind == StoreKind::Postgres && cfg.database.is_none() {
            anyhow::bail!("store.kind = \"postgres\" requires a [database] section");
        }

        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_postgres_config() {
        let cfg = AppConfig::from_toml_str(
            r#"
            [server]
            bind_addr = "0.0.0.0:8080"

            [store]
            kind = "postgres"

            [database]
            uri = "postgres://localhost/energy"
            max_connections = 4

            [metrics]
            bind_addr = "0.0.0.0:9100"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.store.kind, StoreKind::Postgres);
        assert_eq!(cfg.server.max_body_bytes, default_max_body_bytes());
        assert_eq!(cfg.database.unwrap().max_connections, 4);
        assert_eq!(cfg.metrics.unwrap().bind_addr, "0.0.0.0:9100");
    }

    #[test]
    fn memory_store_needs_no_database() {
        let cfg = AppConfig::from_toml_str(
            r#"
            [server]
            bind_addr = "127.0.0.1:8080"
            max_body_bytes = 1024

            [store]
            kind = "memory"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.store.kind, StoreKind::Memory);
        assert_eq!(cfg.server.max_body_bytes, 1024);
        assert!(cfg.database.is_none());
        assert!(cfg.metrics.is_none());
    }

    #[test]
    fn postgres_without_database_section_is_rejected() {
        let res = AppConfig::from_toml_str(
            r#"
            [server]
            bind_addr = "127.0.0.1:8080"

            [store]
            kind = "postgres"
            "#,
        );
        assert!(res.is_err());
    }
}
