use thiserror::Error;

/// Errors raised while staging a batch through its phases.
///
/// Phase workers decide per variant whether a failure is captured into the
/// batch's own success/error fields or fails the invoking job outright; see
/// [`BulkError::fails_job`].
#[derive(Error, Debug)]
pub enum BulkError {
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("malformed row at line {line}: {reason}")]
    MalformedRow { line: u64, reason: String },
    #[error("batch file {0} contains no transactions")]
    EmptyBatch(String),
    #[error("upstream rejected request with status {status}")]
    UpstreamRejected { status: u16, body: String },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid batch state: {0}")]
    InvalidState(String),
    #[error("invalid tenant: {0}")]
    InvalidTenant(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BulkError>;

impl BulkError {
    /// Value written to the batch's `errorCode` variable.
    pub fn code(&self) -> String {
        match self {
            BulkError::UpstreamRejected { status, .. } => status.to_string(),
            BulkError::StorageUnavailable(_) => "STORAGE_UNAVAILABLE".to_string(),
            BulkError::MalformedRow { .. } => "MALFORMED_ROW".to_string(),
            BulkError::EmptyBatch(_) => "EMPTY_BATCH".to_string(),
            BulkError::Transport(_) => "TRANSPORT_ERROR".to_string(),
            BulkError::InvalidState(_) => "INVALID_STATE".to_string(),
            BulkError::InvalidTenant(_) => "INVALID_TENANT".to_string(),
            BulkError::Config(_) => "CONFIG_ERROR".to_string(),
            BulkError::Csv(_) => "CSV_ERROR".to_string(),
            BulkError::Io(_) => "IO_ERROR".to_string(),
            BulkError::Serialization(_) => "SERIALIZATION_ERROR".to_string(),
        }
    }

    /// Whether the invoking job must fail instead of recording the error
    /// into the batch state.
    ///
    /// Transport failures and upstream rejections are phase-local outcomes;
    /// everything else means the input or the environment is unusable and
    /// the substrate's redelivery policy takes over.
    pub fn fails_job(&self) -> bool {
        !matches!(
            self,
            BulkError::Transport(_) | BulkError::UpstreamRejected { .. }
        )
    }

    /// Human readable detail written to `errorDescription`.
    pub fn description(&self) -> String {
        match self {
            BulkError::UpstreamRejected { status, body } if body.trim().is_empty() => {
                format!("upstream responded with status {status}")
            }
            BulkError::UpstreamRejected { body, .. } => body.clone(),
            other => other.to_string(),
        }
    }
}
