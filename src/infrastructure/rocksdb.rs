use crate::domain::ports::FileStorage;
use crate::error::{BulkError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;

/// Column Family holding batch file contents.
pub const CF_FILES: &str = "files";

/// A persistent file store backed by RocksDB.
///
/// Objects live in a single column family keyed `bucket/file name`. Cloning
/// shares the underlying `Arc<DB>`.
#[derive(Clone)]
pub struct RocksDbFileStorage {
    db: Arc<DB>,
}

impl RocksDbFileStorage {
    /// Opens or creates a RocksDB instance at `path` with the files column family.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_files = ColumnFamilyDescriptor::new(CF_FILES, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_files]).map_err(unavailable)?;

        Ok(Self { db: Arc::new(db) })
    }

    fn key(bucket: &str, file_name: &str) -> Vec<u8> {
        format!("{bucket}/{file_name}").into_bytes()
    }
}

fn unavailable(e: rocksdb::Error) -> BulkError {
    BulkError::StorageUnavailable(format!("rocksdb: {e}"))
}

#[async_trait]
impl FileStorage for RocksDbFileStorage {
    async fn download_file(&self, file_name: &str, bucket: &str) -> Result<Vec<u8>> {
        let cf = self.db.cf_handle(CF_FILES).ok_or_else(|| {
            BulkError::StorageUnavailable("files column family not found".to_string())
        })?;

        self.db
            .get_cf(&cf, Self::key(bucket, file_name))
            .map_err(unavailable)?
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
        let cf = self.db.cf_handle(CF_FILES).ok_or_else(|| {
            BulkError::StorageUnavailable("files column family not found".to_string())
        })?;

        self.db
            .put_cf(&cf, Self::key(bucket, file_name), content)
            .map_err(unavailable)?;
        Ok(file_name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rocksdb_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = RocksDbFileStorage::open(dir.path()).unwrap();

        storage
            .upload_file("batch.csv", b"header\n".to_vec(), "bulk")
            .await
            .unwrap();
        let bytes = storage.download_file("batch.csv", "bulk").await.unwrap();
        assert_eq!(bytes, b"header\n");

        let missing = storage.download_file("batch.csv", "elsewhere").await;
        assert!(matches!(missing, Err(BulkError::StorageUnavailable(_))));
    }

    #[tokio::test]
    async fn test_rocksdb_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let storage = RocksDbFileStorage::open(dir.path()).unwrap();
            storage
                .upload_file("kept.csv", b"1".to_vec(), "bulk")
                .await
                .unwrap();
        }

        let reopened = RocksDbFileStorage::open(dir.path()).unwrap();
        assert_eq!(reopened.download_file("kept.csv", "bulk").await.unwrap(), b"1");
    }
}
