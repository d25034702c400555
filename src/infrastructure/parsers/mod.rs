pub mod csv_parser;

use async_trait::async_trait;
use tracing::debug;
use crate::domain::{error::TransferError, models::Dataset, ports::DatasetParser};

/// Decodes CARTO CSV exports into datasets.
pub struct CsvParser;

impl CsvParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CsvParser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatasetParser for CsvParser {
    async fn parse(&self, bytes: &[u8], table: &str) -> Result<Dataset, TransferError> {
        debug!("Parsing {} bytes of CSV for table {}", bytes.len(), table);
        csv_parser::parse_csv(bytes, table)
    }
}
