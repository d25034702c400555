use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("CARTO source error: {0}")]
    Source(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Destination table '{0}' already exists and if_exists is 'fail'")]
    TableExists(String),
}
