use chrono::Utc;
use mcenter_core::diagnosis::form::{is_valid_email, is_valid_phone, require, DiagnosisForm};
use mcenter_core::diagnosis::scoring::DiagnosisResult;
use mcenter_core::McenterError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::ClientError;
use crate::ClientResult;

/// Request discriminator understood by the Apps Script `doPost` handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    SaveDiagnosis,
    SaveConsultation,
    UpdateDiagnosisResult,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::SaveDiagnosis => "saveDiagnosis",
            Action::SaveConsultation => "saveConsultation",
            Action::UpdateDiagnosisResult => "updateDiagnosisResult",
        }
    }

    /// Segment used in backup entry names
    pub fn backup_type(self) -> &'static str {
        match self {
            Action::SaveDiagnosis => "diagnosis",
            Action::SaveConsultation => "consultation",
            Action::UpdateDiagnosisResult => "diagnosis_result",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flatten `payload` into a single JSON object tagged with `action` and a
/// submission timestamp.
pub fn envelope(action: Action, payload: &impl Serialize) -> ClientResult<Value> {
    let mut body = match serde_json::to_value(payload)? {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            return Err(ClientError::Validation(McenterError::InvalidInput {
                field: "payload".into(),
                reason: format!("expected a JSON object, got {other}"),
            }))
        }
    };
    body.insert("action".into(), Value::String(action.as_str().into()));
    body.entry("submittedAt")
        .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));
    Ok(Value::Object(body))
}

/// Consultation request from the contact page
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationForm {
    pub name: String,
    pub phone: String,
    pub email: String,
    #[serde(default)]
    pub company: String,
    pub consultation_type: String,
    #[serde(default)]
    pub consultation_area: String,
    pub content: String,
    #[serde(default)]
    pub preferred_time: String,
    #[serde(default)]
    pub privacy_consent: bool,
}

impl ConsultationForm {
    pub fn validate(&self) -> Result<(), McenterError> {
        require("name", &self.name)?;
        require("phone", &self.phone)?;
        require("email", &self.email)?;
        require("consultationType", &self.consultation_type)?;
        require("content", &self.content)?;
        if !is_valid_phone(&self.phone) {
            return Err(McenterError::InvalidInput {
                field: "phone".into(),
                reason: format!("올바른 연락처 형식이 아닙니다: {}", self.phone),
            });
        }
        if !is_valid_email(&self.email) {
            return Err(McenterError::InvalidInput {
                field: "email".into(),
                reason: format!("올바른 이메일 형식이 아닙니다: {}", self.email),
            });
        }
        if !self.privacy_consent {
            return Err(McenterError::InvalidInput {
                field: "privacyConsent".into(),
                reason: "개인정보 수집·이용에 동의해야 합니다".into(),
            });
        }
        Ok(())
    }
}

/// A diagnosis form together with the headline of its scored result, as
/// stored in the sheet by `saveDiagnosis`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisSubmission<'a> {
    #[serde(flatten)]
    pub form: &'a DiagnosisForm,
    pub total_score: String,
    pub grade: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
}

impl<'a> DiagnosisSubmission<'a> {
    pub fn new(form: &'a DiagnosisForm, result: &DiagnosisResult) -> Self {
        DiagnosisSubmission {
            form,
            total_score: result.total_score.to_string(),
            grade: format!("{:?}", result.grade),
            strengths: result.strengths.iter().map(|f| f.label.clone()).collect(),
            weaknesses: result.weaknesses.iter().map(|f| f.label.clone()).collect(),
        }
    }
}

/// Scored result written back to an existing sheet row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisResultUpdate {
    pub company_name: String,
    pub email: String,
    pub total_score: String,
    pub grade: String,
    pub category_scores: Map<String, Value>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendations: Vec<String>,
}

impl DiagnosisResultUpdate {
    pub fn from_result(company_name: &str, email: &str, result: &DiagnosisResult) -> Self {
        let category_scores = result
            .categories
            .iter()
            .map(|c| (c.label.clone(), Value::String(c.average.round_dp(2).to_string())))
            .collect();
        DiagnosisResultUpdate {
            company_name: company_name.to_string(),
            email: email.to_string(),
            total_score: result.total_score.to_string(),
            grade: format!("{:?}", result.grade),
            category_scores,
            strengths: result.strengths.iter().map(|f| f.label.clone()).collect(),
            weaknesses: result.weaknesses.iter().map(|f| f.label.clone()).collect(),
            recommendations: result.recommendations.clone(),
        }
    }
}
