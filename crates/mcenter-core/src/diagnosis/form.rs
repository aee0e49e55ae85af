use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::diagnosis::scoring::{self, DiagnosisAnswers, DiagnosisResult};
use crate::error::McenterError;
use crate::types::ComputationOutput;
use crate::McenterResult;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

// Mobile (010-1234-5678) and landline (02-123-4567) numbers, hyphens optional
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0\d{1,2}-?\d{3,4}-?\d{4}$").expect("valid phone regex"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone.trim())
}

/// Fail with `InvalidInput` when a required text field is blank.
pub fn require(field: &str, value: &str) -> McenterResult<()> {
    if value.trim().is_empty() {
        return Err(McenterError::InvalidInput {
            field: field.into(),
            reason: "필수 입력 항목입니다".into(),
        });
    }
    Ok(())
}

/// Contact details plus the 20 answers, as submitted from the diagnosis page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisForm {
    pub company_name: String,
    pub contact_name: String,
    pub phone: String,
    pub email: String,
    pub industry: String,
    #[serde(default)]
    pub employee_count: String,
    #[serde(default)]
    pub business_years: String,
    #[serde(default)]
    pub annual_revenue: String,
    #[serde(default)]
    pub main_concerns: String,
    #[serde(default)]
    pub expected_benefits: String,
    #[serde(default)]
    pub privacy_consent: bool,
    #[serde(flatten)]
    pub answers: DiagnosisAnswers,
}

impl DiagnosisForm {
    pub fn validate(&self) -> McenterResult<()> {
        require("companyName", &self.company_name)?;
        require("contactName", &self.contact_name)?;
        require("phone", &self.phone)?;
        require("email", &self.email)?;
        require("industry", &self.industry)?;
        if !is_valid_email(&self.email) {
            return Err(McenterError::InvalidInput {
                field: "email".into(),
                reason: format!("올바른 이메일 형식이 아닙니다: {}", self.email),
            });
        }
        if !is_valid_phone(&self.phone) {
            return Err(McenterError::InvalidInput {
                field: "phone".into(),
                reason: format!("올바른 연락처 형식이 아닙니다: {}", self.phone),
            });
        }
        if !self.privacy_consent {
            return Err(McenterError::InvalidInput {
                field: "privacyConsent".into(),
                reason: "개인정보 수집·이용에 동의해야 합니다".into(),
            });
        }
        self.answers.validate()
    }
}

/// Validate a submitted form and score its answers.
pub fn diagnose(form: &DiagnosisForm) -> McenterResult<ComputationOutput<DiagnosisResult>> {
    form.validate()?;
    scoring::score_diagnosis(&form.answers)
}
