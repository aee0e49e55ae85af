pub mod backup;
pub mod client;
pub mod config;
pub mod error;
pub mod payload;
pub mod response;

pub use backup::{BackupEntry, BackupStore};
pub use client::{ScriptClient, SubmissionOutcome};
pub use config::AppConfig;
pub use error::ClientError;
pub use payload::{Action, ConsultationForm, DiagnosisResultUpdate};
pub use response::ScriptResponse;

pub type ClientResult<T> = Result<T, ClientError>;
