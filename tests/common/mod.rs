#![allow(dead_code)]

use async_trait::async_trait;
use bulk_processor::application::ledger::LedgerLoader;
use bulk_processor::domain::batch::BatchState;
use bulk_processor::domain::callback::CallbackPayload;
use bulk_processor::domain::phase::Phase;
use bulk_processor::domain::ports::{
    AuthorizationApi, AuthorizationRequest, CallbackSender, FileStorage, UpstreamResponse,
};
use bulk_processor::error::Result;
use bulk_processor::infrastructure::in_memory::InMemoryFileStorage;
use std::collections::VecDeque;
use std::fs::File;
use std::io::Error;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub const BUCKET: &str = "bulk-processor";
pub const FILE_NAME: &str = "batch.csv";

pub const HEADER: [&str; 10] = [
    "id",
    "request_id",
    "payment_mode",
    "payer_identifier_type",
    "payer_identifier",
    "payee_identifier_type",
    "payee_identifier",
    "amount",
    "currency",
    "note",
];

/// Renders a batch file with one row per amount, all from the same payer.
pub fn batch_csv(amounts: &[&str]) -> Vec<u8> {
    let mut wtr = csv::WriterBuilder::new().from_writer(Vec::new());
    wtr.write_record(HEADER).unwrap();
    for (i, amount) in amounts.iter().enumerate() {
        let id = (i + 1).to_string();
        wtr.write_record([
            id.as_str(),
            "req-1",
            "mojaloop",
            "MSISDN",
            "24450000000",
            "MSISDN",
            "27710101999",
            *amount,
            "USD",
            "test",
        ])
        .unwrap();
    }
    wtr.into_inner().unwrap()
}

pub fn generate_csv(path: &Path, amounts: &[&str]) -> std::result::Result<(), Error> {
    use std::io::Write;
    let mut file = File::create(path)?;
    file.write_all(&batch_csv(amounts))?;
    Ok(())
}

/// In-memory storage holding `content` as [`FILE_NAME`] in [`BUCKET`].
pub async fn ledger_with(content: Vec<u8>) -> LedgerLoader {
    let storage = InMemoryFileStorage::new();
    storage
        .upload_file(FILE_NAME, content, BUCKET)
        .await
        .unwrap();
    LedgerLoader::new(Arc::new(storage), BUCKET)
}

pub fn batch_state() -> BatchState {
    BatchState {
        batch_id: "b-1".to_string(),
        file_name: FILE_NAME.to_string(),
        request_id: "req-1".to_string(),
        purpose: "test payment".to_string(),
        tenant_id: "gorilla".to_string(),
        max_threshold_retry: 3,
        success_threshold: Some(rust_decimal::Decimal::new(95, 2)),
        max_callback_retry: 3,
        callback_url: Some("http://caller.example/cb".to_string()),
        ..Default::default()
    }
}

/// Bag with every phase disabled except `phase`.
pub fn only_enabled(mut state: BatchState, phase: Phase) -> BatchState {
    for other in Phase::ALL {
        state.toggles.set(other, other == phase);
    }
    state
}

/// Authorization API answering every request with the same status.
#[derive(Default)]
pub struct RecordingAuthorization {
    pub status: u16,
    pub requests: Mutex<Vec<(AuthorizationRequest, String)>>,
}

impl RecordingAuthorization {
    pub fn answering(status: u16) -> Arc<Self> {
        Arc::new(Self {
            status,
            ..Default::default()
        })
    }
}

#[async_trait]
impl AuthorizationApi for RecordingAuthorization {
    async fn authorize(
        &self,
        request: &AuthorizationRequest,
        correlation_id: &str,
    ) -> Result<UpstreamResponse> {
        self.requests
            .lock()
            .unwrap()
            .push((request.clone(), correlation_id.to_string()));
        Ok(UpstreamResponse {
            status: self.status,
            body: String::new(),
        })
    }
}

/// Callback sender replaying a fixed sequence of statuses; the last one
/// repeats once the script runs out.
pub struct ScriptedCallback {
    statuses: Mutex<VecDeque<u16>>,
    last: u16,
    pub sent: Mutex<Vec<CallbackPayload>>,
}

impl ScriptedCallback {
    pub fn new(statuses: &[u16]) -> Arc<Self> {
        Arc::new(Self {
            statuses: Mutex::new(statuses.iter().copied().collect()),
            last: statuses.last().copied().unwrap_or(200),
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn attempts(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl CallbackSender for ScriptedCallback {
    async fn send(&self, _url: &str, payload: &CallbackPayload) -> Result<UpstreamResponse> {
        self.sent.lock().unwrap().push(payload.clone());
        let status = self
            .statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.last);
        Ok(UpstreamResponse {
            status,
            body: String::new(),
        })
    }
}
