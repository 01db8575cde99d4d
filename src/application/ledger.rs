use crate::domain::ports::FileStorageRef;
use crate::domain::transaction::{BatchSummary, Transaction};
use crate::error::{BulkError, Result};
use crate::interfaces::csv::transaction_reader::TransactionReader;

/// Loads a batch's transaction rows from object storage and derives the batch
/// aggregates.
///
/// Storage failures propagate as [`BulkError::StorageUnavailable`] without
/// retrying; a single malformed row fails the whole load so callers never see
/// a partial transaction list.
#[derive(Clone)]
pub struct LedgerLoader {
    storage: FileStorageRef,
    bucket: String,
}

impl LedgerLoader {
    pub fn new(storage: FileStorageRef, bucket: impl Into<String>) -> Self {
        Self {
            storage,
            bucket: bucket.into(),
        }
    }

    pub async fn load(&self, file_name: &str) -> Result<Vec<Transaction>> {
        let bytes = self.storage.download_file(file_name, &self.bucket).await?;
        TransactionReader::new(bytes.as_slice()).read_all()
    }

    pub async fn summarize(&self, file_name: &str) -> Result<BatchSummary> {
        let transactions = self.load(file_name).await?;
        BatchSummary::from_transactions(&transactions)
            .ok_or_else(|| BulkError::EmptyBatch(file_name.to_string()))
    }
}
