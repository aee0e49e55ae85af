use clap::Args;
use serde_json::{json, Value};
use tracing::info;

use mcenter_client::{ConsultationForm, DiagnosisResultUpdate, SubmissionOutcome};
use mcenter_core::diagnosis::form::{self, DiagnosisForm};

use super::ClientOpts;
use crate::input;

/// Arguments for submitting a diagnosis form
#[derive(Args)]
pub struct SubmitDiagnosisArgs {
    /// Path to the diagnosis form (JSON/YAML); stdin when omitted
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for submitting a consultation request
#[derive(Args)]
pub struct SubmitConsultationArgs {
    /// Path to the consultation form (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub phone: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long, default_value = "")]
    pub company: String,

    /// e.g. 정책자금, 경영진단, 마케팅
    #[arg(long = "type")]
    pub consultation_type: Option<String>,

    #[arg(long, default_value = "")]
    pub area: String,

    /// Free-text description of the request
    #[arg(long)]
    pub content: Option<String>,

    #[arg(long, default_value = "")]
    pub preferred_time: String,

    /// Confirms consent to the collection of personal information
    #[arg(long)]
    pub agree: bool,
}

/// Arguments for writing a scored result back to the sheet
#[derive(Args)]
pub struct UpdateResultArgs {
    /// Path to the diagnosis form to score (JSON/YAML); stdin when omitted
    #[arg(long)]
    pub input: Option<String>,
}

fn outcome_value(outcome: &SubmissionOutcome) -> Result<Value, Box<dyn std::error::Error>> {
    let mut value = serde_json::to_value(outcome)?;
    if let Value::Object(map) = &mut value {
        map.insert("user_message".into(), json!(outcome.user_message()));
    }
    Ok(value)
}

fn load_form(path: Option<&str>) -> Result<DiagnosisForm, Box<dyn std::error::Error>> {
    input::load(path)?.ok_or_else(|| "a diagnosis form is required (--input or stdin)".into())
}

pub fn run_submit_diagnosis(
    args: SubmitDiagnosisArgs,
    opts: &ClientOpts,
) -> Result<Value, Box<dyn std::error::Error>> {
    let form = load_form(args.input.as_deref())?;
    let (client, store) = opts.connect()?;
    let (scored, outcome) = client.submit_diagnosis(&store, &form)?;
    info!(company = %form.company_name, delivered = outcome.is_delivered(), "diagnosis submitted");

    let mut value = outcome_value(&outcome)?;
    if let Value::Object(map) = &mut value {
        map.insert("diagnosis".into(), serde_json::to_value(&scored)?);
    }
    Ok(value)
}

pub fn run_submit_consultation(
    args: SubmitConsultationArgs,
    opts: &ClientOpts,
) -> Result<Value, Box<dyn std::error::Error>> {
    let form: ConsultationForm = match input::load(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => ConsultationForm {
            name: input::required(args.name, "name")?,
            phone: input::required(args.phone, "phone")?,
            email: input::required(args.email, "email")?,
            company: args.company,
            consultation_type: input::required(args.consultation_type, "type")?,
            consultation_area: args.area,
            content: input::required(args.content, "content")?,
            preferred_time: args.preferred_time,
            privacy_consent: args.agree,
        },
    };
    let (client, store) = opts.connect()?;
    let outcome = client.submit_consultation(&store, &form)?;
    outcome_value(&outcome)
}

pub fn run_update_result(
    args: UpdateResultArgs,
    opts: &ClientOpts,
) -> Result<Value, Box<dyn std::error::Error>> {
    let form = load_form(args.input.as_deref())?;
    let scored = form::diagnose(&form)?;
    let update =
        DiagnosisResultUpdate::from_result(&form.company_name, &form.email, &scored.result);

    let (client, store) = opts.connect()?;
    let outcome = client.update_diagnosis_result(&store, &update)?;
    outcome_value(&outcome)
}
