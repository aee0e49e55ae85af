use mcenter_core::McenterError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Configuration error: {key} — {reason}")]
    Config { key: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Script endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Script rejected the request: {0}")]
    Rejected(String),

    #[error("Backup I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Validation(#[from] McenterError),
}
