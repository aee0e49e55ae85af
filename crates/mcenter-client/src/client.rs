use mcenter_core::diagnosis::form::{self, DiagnosisForm};
use mcenter_core::diagnosis::scoring::DiagnosisResult;
use mcenter_core::ComputationOutput;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::backup::BackupStore;
use crate::config::AppConfig;
use crate::error::ClientError;
use crate::payload::{
    envelope, Action, ConsultationForm, DiagnosisResultUpdate, DiagnosisSubmission,
};
use crate::response::ScriptResponse;
use crate::ClientResult;

const UA: &str = concat!("mcenter/", env!("CARGO_PKG_VERSION"));

/// Result of a submission that falls back to a local backup
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    Delivered(ScriptResponse),
    BackedUp { path: PathBuf, reason: String },
}

impl SubmissionOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, SubmissionOutcome::Delivered(_))
    }

    /// Message shown to the person who filled in the form
    pub fn user_message(&self) -> String {
        match self {
            SubmissionOutcome::Delivered(resp) => {
                let mut msg = String::from("신청이 정상적으로 접수되었습니다.");
                if resp.data.auto_reply_sent {
                    msg.push_str(" 확인 메일을 발송했습니다.");
                }
                msg
            }
            SubmissionOutcome::BackedUp { .. } => "일시적인 오류로 전송하지 못해 입력하신 내용을 임시 저장했습니다. \
                 잠시 후 다시 시도하시거나 전화로 문의해 주세요."
                .to_string(),
        }
    }
}

/// HTTP client for the Google Apps Script web app
#[derive(Debug, Clone)]
pub struct ScriptClient {
    http: reqwest::blocking::Client,
    url: String,
}

impl ScriptClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> ClientResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(UA)
            .build()?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    pub fn from_config(cfg: &AppConfig) -> ClientResult<Self> {
        Self::new(cfg.script_url.clone(), cfg.timeout)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST `payload` tagged with `action`.
    ///
    /// Fails on transport errors, non-2xx statuses, unparseable bodies and
    /// `success: false` responses.
    pub fn submit(&self, action: Action, payload: &impl Serialize) -> ClientResult<ScriptResponse> {
        let body = envelope(action, payload)?;
        self.post(&body)
    }

    fn post(&self, body: &Value) -> ClientResult<ScriptResponse> {
        debug!(url = %self.url, action = ?body.get("action"), "posting to script");
        let resp = self.http.post(&self.url).json(body).send()?;
        let status = resp.status();
        let text = resp.text()?;
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: text.chars().take(200).collect(),
            });
        }

        let parsed: ScriptResponse = serde_json::from_str(&text)?;
        if !parsed.success {
            return Err(ClientError::Rejected(parsed.failure_reason()));
        }
        info!(
            sheet_saved = parsed.data.sheet_saved,
            auto_reply_sent = parsed.data.auto_reply_sent,
            admin_notified = parsed.data.admin_notified,
            "script accepted submission"
        );
        Ok(parsed)
    }

    /// Submit once; on any failure keep the payload in `store` instead of
    /// surfacing the error. Only backup write failures are returned as errors.
    pub fn submit_with_backup(
        &self,
        store: &BackupStore,
        action: Action,
        payload: &impl Serialize,
    ) -> ClientResult<SubmissionOutcome> {
        let body = envelope(action, payload)?;
        match self.post(&body) {
            Ok(resp) => Ok(SubmissionOutcome::Delivered(resp)),
            Err(e) => {
                let reason = e.to_string();
                warn!(action = %action, error = %reason, "submission failed; writing backup");
                let path = store.save(action, &body, &reason)?;
                Ok(SubmissionOutcome::BackedUp { path, reason })
            }
        }
    }

    /// Validate and score a diagnosis form, then send it with its result.
    pub fn submit_diagnosis(
        &self,
        store: &BackupStore,
        form: &DiagnosisForm,
    ) -> ClientResult<(ComputationOutput<DiagnosisResult>, SubmissionOutcome)> {
        let scored = form::diagnose(form)?;
        let submission = DiagnosisSubmission::new(form, &scored.result);
        let outcome = self.submit_with_backup(store, Action::SaveDiagnosis, &submission)?;
        Ok((scored, outcome))
    }

    pub fn submit_consultation(
        &self,
        store: &BackupStore,
        form: &ConsultationForm,
    ) -> ClientResult<SubmissionOutcome> {
        form.validate()?;
        self.submit_with_backup(store, Action::SaveConsultation, form)
    }

    pub fn update_diagnosis_result(
        &self,
        store: &BackupStore,
        update: &DiagnosisResultUpdate,
    ) -> ClientResult<SubmissionOutcome> {
        self.submit_with_backup(store, Action::UpdateDiagnosisResult, update)
    }

    /// Re-send a backed-up payload and delete the entry once accepted.
    pub fn resend_backup(&self, store: &BackupStore, path: &Path) -> ClientResult<ScriptResponse> {
        let entry = store.load(path)?;
        let resp = self.post(&entry.payload)?;
        store.remove(path)?;
        Ok(resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_mentions_auto_reply() {
        let mut resp = ScriptResponse {
            success: true,
            ..Default::default()
        };
        resp.data.auto_reply_sent = true;
        let msg = SubmissionOutcome::Delivered(resp).user_message();
        assert!(msg.contains("확인 메일"));
    }

    #[test]
    fn test_backed_up_outcome_serialises_with_status_tag() {
        let outcome = SubmissionOutcome::BackedUp {
            path: PathBuf::from("b.json"),
            reason: "timeout".into(),
        };
        let v = serde_json::to_value(&outcome).unwrap();
        assert_eq!(v["status"], "backed_up");
        assert!(!outcome.is_delivered());
    }
}
