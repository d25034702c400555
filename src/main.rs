use carto_to_postgres::etl_service::EtlService;
use tracing::{info, debug};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize tracing with debug level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env()
            .add_directive("carto_to_postgres=debug".parse().unwrap())
            .add_directive("sqlx=warn".parse().unwrap())
            .add_directive("reqwest=info".parse().unwrap()))
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    info!("Starting CARTO to PostgreSQL transfer");
    debug!("Environment variables: CONFIG_PATH={}",
        std::env::var("CONFIG_PATH").unwrap_or_else(|_| "not set".to_string())
    );

    let service = EtlService::new().await?;
    info!("Transfer service initialized successfully");

    service.run().await?;
    info!("All tables transferred");
    Ok(())
}
