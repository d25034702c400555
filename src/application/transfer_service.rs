use std::sync::Arc;
use tracing::{debug, error, info};
use crate::domain::{
    error::TransferError,
    models::CollisionStrategy,
    ports::{DatasetParser, DatasetSink, DatasetSource},
};

pub struct TransferService {
    source: Arc<dyn DatasetSource>,
    parser: Arc<dyn DatasetParser>,
    sink: Arc<dyn DatasetSink>,
}

impl TransferService {
    pub fn new(
        source: Arc<dyn DatasetSource>,
        parser: Arc<dyn DatasetParser>,
        sink: Arc<dyn DatasetSink>,
    ) -> Self {
        Self {
            source,
            parser,
            sink,
        }
    }

    /// Copies one table from the source into the destination schema.
    /// Returns the number of rows written.
    pub async fn transfer_table(
        &self,
        table: &str,
        schema: &str,
        if_exists: CollisionStrategy,
    ) -> Result<u64, TransferError> {
        info!("Starting transfer of table: {}", table);

        // Step 1: Download the dataset from the CARTO SQL API
        debug!("Step 1: Downloading {} from CARTO", table);
        let bytes = self.source.fetch_table(table).await
            .map_err(|e| {
                error!("Failed to download {}: {}", table, e);
                e
            })?;
        info!("Successfully fetched {}, size: {} bytes", table, bytes.len());

        // Step 2: Decode the CSV payload into a dataset
        debug!("Step 2: Decoding CSV payload for {}", table);
        let dataset = self.parser.parse(&bytes, table).await
            .map_err(|e| {
                error!("Failed to decode {}: {}", table, e);
                e
            })?;
        info!(
            "Successfully decoded {} rows, {} columns from {}",
            dataset.rows.len(),
            dataset.columns.len(),
            table
        );

        // Step 3: Write the dataset to the destination
        debug!(
            "Step 3: Writing {} to schema {} (if_exists={})",
            table, schema, if_exists
        );
        let written = self.sink.write_dataset(schema, &dataset, if_exists).await
            .map_err(|e| {
                error!("Failed to write {}: {}", table, e);
                e
            })?;

        info!(
            "✅ Successfully transferred {} - {} rows written to schema {}",
            table, written, schema
        );
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use crate::domain::models::{ColumnKind, Dataset};
    use crate::infrastructure::parsers::CsvParser;

    struct StaticSource {
        payload: Vec<u8>,
    }

    #[async_trait]
    impl DatasetSource for StaticSource {
        async fn fetch_table(&self, _table: &str) -> Result<Vec<u8>, TransferError> {
            Ok(self.payload.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl DatasetSource for FailingSource {
        async fn fetch_table(&self, table: &str) -> Result<Vec<u8>, TransferError> {
            Err(TransferError::Source(format!("no such table {}", table)))
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        written: Mutex<Vec<(String, Dataset)>>,
    }

    #[async_trait]
    impl DatasetSink for RecordingSink {
        async fn write_dataset(
            &self,
            schema: &str,
            dataset: &Dataset,
            _if_exists: CollisionStrategy,
        ) -> Result<u64, TransferError> {
            let rows = dataset.rows.len() as u64;
            self.written
                .lock()
                .unwrap()
                .push((schema.to_string(), dataset.clone()));
            Ok(rows)
        }
    }

    #[tokio::test]
    async fn dataset_round_trips_into_the_sink() {
        let csv = b"cartodb_id,name,the_geom\n\
                    1,alpha,0101000020E610000000000000000000000000000000000000\n\
                    2,beta,\n"
            .to_vec();
        let sink = Arc::new(RecordingSink::default());
        let service = TransferService::new(
            Arc::new(StaticSource { payload: csv }),
            Arc::new(CsvParser::new()),
            sink.clone(),
        );

        let written = service
            .transfer_table("places", "public", CollisionStrategy::Replace)
            .await
            .unwrap();
        assert_eq!(written, 2);

        let written = sink.written.lock().unwrap();
        let (schema, dataset) = &written[0];
        assert_eq!(schema, "public");
        assert_eq!(dataset.table, "places");
        assert_eq!(dataset.rows.len(), 2);
        assert_eq!(dataset.columns[0].kind, ColumnKind::Integer);
        assert_eq!(dataset.columns[2].kind, ColumnKind::Geometry);
        assert_eq!(dataset.rows[0][1].as_deref(), Some("alpha"));
        assert_eq!(dataset.rows[1][2], None);
    }

    #[tokio::test]
    async fn source_errors_propagate() {
        let service = TransferService::new(
            Arc::new(FailingSource),
            Arc::new(CsvParser::new()),
            Arc::new(RecordingSink::default()),
        );

        let err = service
            .transfer_table("missing", "public", CollisionStrategy::Replace)
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::Source(_)));
    }
}
