use async_trait::async_trait;
use crate::domain::{
    error::TransferError,
    models::{CollisionStrategy, Dataset},
};

#[async_trait]
pub trait DatasetSource: Send + Sync {
    async fn fetch_table(&self, table: &str) -> Result<Vec<u8>, TransferError>;
}

#[async_trait]
pub trait DatasetParser: Send + Sync {
    async fn parse(&self, bytes: &[u8], table: &str) -> Result<Dataset, TransferError>;
}

#[async_trait]
pub trait DatasetSink: Send + Sync {
    async fn write_dataset(
        &self,
        schema: &str,
        dataset: &Dataset,
        if_exists: CollisionStrategy,
    ) -> Result<u64, TransferError>;
}
