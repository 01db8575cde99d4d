use crate::config::Config;
use crate::domain::batch::BatchState;
use crate::domain::ports::FileStorageRef;
use crate::error::{BulkError, Result};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub const DEFAULT_PURPOSE: &str = "test payment";

/// An uploaded batch file together with the caller's metadata.
#[derive(Debug, Clone, Default)]
pub struct BatchRequest {
    pub request_id: String,
    pub file_name: String,
    pub purpose: Option<String>,
    pub tenant_id: Option<String>,
    pub callback_url: Option<String>,
    pub content: Vec<u8>,
}

/// Stores an uploaded file and builds the initial variable bag of its batch.
pub struct BatchIntake {
    storage: FileStorageRef,
    config: Arc<Config>,
}

impl BatchIntake {
    pub fn new(storage: FileStorageRef, config: Arc<Config>) -> Self {
        Self { storage, config }
    }

    pub async fn start(&self, request: BatchRequest) -> Result<BatchState> {
        let tenant_id = self.validate_tenant(request.tenant_id.as_deref())?;
        let purpose = request
            .purpose
            .filter(|purpose| !purpose.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PURPOSE.to_string());

        let file_name = format!("{}_{}", Utc::now().timestamp_millis(), request.file_name);
        let stored_name = self
            .storage
            .upload_file(&file_name, request.content, &self.config.bucket_name)
            .await?;
        let batch_id = Uuid::new_v4().to_string();
        info!(%batch_id, file_name = %stored_name, tenant = %tenant_id, "batch file stored");

        Ok(BatchState {
            batch_id,
            file_name: stored_name,
            request_id: request.request_id,
            purpose,
            tenant_id,
            toggles: self.config.phases,
            max_threshold_retry: self.config.threshold.max_retry,
            success_threshold: Some(self.config.threshold.success_threshold),
            threshold_delay: self.config.threshold.delay,
            callback_retry: 0,
            max_callback_retry: self.config.callback.max_retry,
            callback_url: request.callback_url,
            ..Default::default()
        })
    }

    fn validate_tenant(&self, tenant: Option<&str>) -> Result<String> {
        let tenant = tenant
            .map(str::trim)
            .filter(|tenant| !tenant.is_empty())
            .ok_or_else(|| BulkError::InvalidTenant("tenant is missing".to_string()))?;

        if !self.config.tenants.is_empty() && !self.config.tenants.iter().any(|t| t == tenant) {
            return Err(BulkError::InvalidTenant(tenant.to_string()));
        }
        Ok(tenant.to_string())
    }
}
