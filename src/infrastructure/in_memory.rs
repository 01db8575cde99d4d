use crate::domain::batch::BatchState;
use crate::domain::phase::Phase;
use crate::domain::ports::{FileStorage, PhaseHandler, StageReport};
use crate::error::{BulkError, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory object store for batch files.
///
/// Uses `Arc<RwLock<HashMap<..>>>` keyed by `(bucket, file name)`, so clones
/// share the same contents. Suitable for tests and local runs where files do
/// not need to outlive the process.
#[derive(Default, Clone)]
pub struct InMemoryFileStorage {
    files: Arc<RwLock<HashMap<(String, String), Vec<u8>>>>,
}

impl InMemoryFileStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FileStorage for InMemoryFileStorage {
    async fn download_file(&self, file_name: &str, bucket: &str) -> Result<Vec<u8>> {
        let files = self.files.read().await;
        files
            .get(&(bucket.to_string(), file_name.to_string()))
            .cloned()
            .ok_or_else(|| {
                BulkError::StorageUnavailable(format!("{bucket}/{file_name} not found"))
            })
    }

    async fn upload_file(
        &self,
        file_name: &str,
        content: Vec<u8>,
        bucket: &str,
    ) -> Result<String> {
        let mut files = self.files.write().await;
        files.insert((bucket.to_string(), file_name.to_string()), content);
        Ok(file_name.to_string())
    }
}

/// Stage handler for local runs: does no work of its own and reports a fixed
/// completion rate.
#[derive(Debug, Clone, Copy)]
pub struct PassThroughHandler {
    completion_rate: Decimal,
}

impl PassThroughHandler {
    pub fn new(completion_rate: Decimal) -> Self {
        Self { completion_rate }
    }
}

#[async_trait]
impl PhaseHandler for PassThroughHandler {
    async fn handle(&self, phase: Phase, state: &BatchState) -> Result<StageReport> {
        tracing::debug!(batch_id = %state.batch_id, %phase, "pass-through stage");
        Ok(StageReport {
            completion_rate: Some(self.completion_rate),
        })
    }
}
