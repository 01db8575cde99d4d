use crate::domain::batch::BatchState;
use crate::domain::callback::CallbackPayload;
use crate::domain::phase::Phase;
use crate::error::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;

/// Status and body of an HTTP answer, whatever its status class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: String,
}

impl UpstreamResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Payload of the batch authorization call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationRequest {
    pub batch_id: String,
    pub payer_identifier: String,
    pub currency: String,
    /// Plain decimal string of the batch total.
    pub amount: String,
}

/// Object storage holding uploaded batch files.
#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn download_file(&self, file_name: &str, bucket: &str) -> Result<Vec<u8>>;
    /// Stores `content` and returns the name it was stored under.
    async fn upload_file(&self, file_name: &str, content: Vec<u8>, bucket: &str)
    -> Result<String>;
}

/// External batch authorization API.
#[async_trait]
pub trait AuthorizationApi: Send + Sync {
    async fn authorize(
        &self,
        request: &AuthorizationRequest,
        correlation_id: &str,
    ) -> Result<UpstreamResponse>;
}

/// Delivers completion notifications to a caller-supplied URL.
#[async_trait]
pub trait CallbackSender: Send + Sync {
    async fn send(&self, url: &str, payload: &CallbackPayload) -> Result<UpstreamResponse>;
}

/// Outcome of a stage phase's domain work.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StageReport {
    /// New aggregate completion rate, if the stage measured one.
    pub completion_rate: Option<Decimal>,
}

/// Performs the domain work of the stage phases (party lookup, approval,
/// ordering, splitting, formatting, merge-back).
#[async_trait]
pub trait PhaseHandler: Send + Sync {
    async fn handle(&self, phase: Phase, state: &BatchState) -> Result<StageReport>;
}

pub type FileStorageRef = Arc<dyn FileStorage>;
pub type AuthorizationApiRef = Arc<dyn AuthorizationApi>;
pub type CallbackSenderRef = Arc<dyn CallbackSender>;
pub type PhaseHandlerRef = Arc<dyn PhaseHandler>;
