use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::{
    application::transfer_service::TransferService,
    config::Config,
    domain::error::TransferError,
    infrastructure::{
        carto::sql_api::CartoSqlClient, parsers::CsvParser,
        postgres::data_repo::PostgresDataRepository,
    },
};

/// Composition root: loads the configuration, wires the CARTO source, CSV
/// decoder and PostgreSQL sink together and drives the per-table loop.
pub struct EtlService {
    service: TransferService,
    config: Config,
}

impl EtlService {
    pub async fn new() -> Result<Self, TransferError> {
        debug!("Initializing transfer service");

        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.json".to_string());
        info!("Using configuration file: {}", config_path);
        let config = Config::load(Path::new(&config_path))?;

        let source = Arc::new(CartoSqlClient::new(&config.username, config.api_key.clone()));
        let parser = Arc::new(CsvParser::new());
        debug!("CARTO client and CSV decoder initialized");

        let sink = Arc::new(PostgresDataRepository::connect(&config).await?);
        debug!("PostgreSQL sink initialized");

        let service = TransferService::new(source, parser, sink);

        debug!("Transfer service initialization complete");
        Ok(Self { service, config })
    }

    pub async fn run(&self) -> Result<(), TransferError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let total = self.config.table_list.len();
        info!(
            "Starting transfer run {} at {}: {} tables into schema '{}'",
            run_id, started_at, total, self.config.schema
        );

        let mut rows_total = 0u64;
        for (i, table) in self.config.table_list.iter().enumerate() {
            info!("Transferring table {} of {}: {}", i + 1, total, table);

            rows_total += self
                .service
                .transfer_table(table, &self.config.schema, self.config.if_exists)
                .await
                .map_err(|e| {
                    error!("Transfer run {} failed on table {}: {}", run_id, table, e);
                    e
                })?;
        }

        let elapsed = Utc::now() - started_at;
        info!(
            "✅ Transfer run {} complete: {} tables, {} rows in {}s",
            run_id,
            total,
            rows_total,
            elapsed.num_seconds()
        );
        Ok(())
    }
}
