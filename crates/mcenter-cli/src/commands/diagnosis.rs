use clap::Args;
use serde_json::Value;

use mcenter_core::diagnosis::form::{self, DiagnosisForm};
use mcenter_core::diagnosis::scoring::{self, DiagnosisAnswers};

use crate::input;

/// Arguments for scoring a self-diagnosis
#[derive(Args)]
pub struct DiagnoseArgs {
    /// Path to a diagnosis form or bare answers (JSON/YAML)
    #[arg(long)]
    pub input: Option<String>,

    /// Five 1-5 answers, comma separated
    #[arg(long, value_delimiter = ',')]
    pub product_service: Vec<u8>,

    /// Four 1-5 answers, comma separated
    #[arg(long, value_delimiter = ',')]
    pub customer_service: Vec<u8>,

    /// Five 1-5 answers, comma separated
    #[arg(long, value_delimiter = ',')]
    pub marketing: Vec<u8>,

    /// Three 1-5 answers, comma separated
    #[arg(long, value_delimiter = ',')]
    pub procurement: Vec<u8>,

    /// Three 1-5 answers, comma separated
    #[arg(long, value_delimiter = ',')]
    pub store_management: Vec<u8>,
}

pub fn run_diagnose(args: DiagnoseArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let output = match input::load::<Value>(args.input.as_deref())? {
        // A full form carries contact details and is validated as a whole
        Some(doc) if doc.get("companyName").is_some() => {
            let form: DiagnosisForm = serde_json::from_value(doc)?;
            form::diagnose(&form)?
        }
        Some(doc) => {
            let answers: DiagnosisAnswers = serde_json::from_value(doc)?;
            scoring::score_diagnosis(&answers)?
        }
        None => scoring::score_diagnosis(&DiagnosisAnswers {
            product_service: args.product_service,
            customer_service: args.customer_service,
            marketing: args.marketing,
            procurement: args.procurement,
            store_management: args.store_management,
        })?,
    };
    Ok(serde_json::to_value(output)?)
}
