use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::domain::{error::TransferError, models::CollisionStrategy};

/// Transfer configuration, read once from a flat JSON file at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// CARTO account username, i.e. the `{username}.carto.com` subdomain.
    pub username: String,
    /// CARTO API key with read access to the configured tables.
    pub api_key: String,
    /// Destination schema the tables are created under.
    pub schema: String,
    #[serde(default)]
    pub if_exists: CollisionStrategy,
    /// CARTO tables to transfer, in order.
    pub table_list: Vec<String>,

    pub host: String,
    pub database: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub user: String,
    pub password: String,
    pub sslmode: Option<String>,
    pub sslrootcert: Option<String>,
    pub sslcert: Option<String>,
    pub sslkey: Option<String>,
}

fn default_port() -> u16 {
    5432
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, TransferError> {
        debug!("Loading configuration from {}", path.display());

        let raw = std::fs::read_to_string(path).map_err(|e| {
            TransferError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let config: Config = serde_json::from_str(&raw).map_err(|e| {
            TransferError::Config(format!("Failed to parse config file {}: {}", path.display(), e))
        })?;

        if config.table_list.is_empty() {
            warn!("Configuration contains an empty table_list, nothing to transfer");
        }

        info!(
            "Loaded configuration: {} tables, destination {}:{}/{} schema '{}', if_exists={}",
            config.table_list.len(),
            config.host,
            config.port,
            config.database,
            config.schema,
            config.if_exists
        );

        Ok(config)
    }
}
