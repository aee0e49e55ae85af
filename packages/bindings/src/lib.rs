use napi::Result as NapiResult;
use napi_derive::napi;
use serde::de::DeserializeOwned;
use serde::Serialize;

use mcenter_core::diagnosis::scoring;
use mcenter_core::policy_fund::{amortization, investment};
use mcenter_core::tax::{corporate_tax, income_tax, vat};
use mcenter_core::McenterResult;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Parse `input_json`, run `calc`, and serialise its output envelope.
fn call<I, O>(input_json: &str, calc: impl FnOnce(&I) -> McenterResult<O>) -> NapiResult<String>
where
    I: DeserializeOwned,
    O: Serialize,
{
    let input: I = serde_json::from_str(input_json).map_err(to_napi_error)?;
    let output = calc(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Policy fund
// ---------------------------------------------------------------------------

#[napi]
pub fn analyze_investment(input_json: String) -> NapiResult<String> {
    call(&input_json, investment::analyze_investment)
}

#[napi]
pub fn analyze_scenarios(input_json: String) -> NapiResult<String> {
    call(&input_json, investment::analyze_scenarios)
}

#[napi]
pub fn loan_schedule(input_json: String) -> NapiResult<String> {
    call(&input_json, amortization::build_loan_schedule)
}

// ---------------------------------------------------------------------------
// Diagnosis
// ---------------------------------------------------------------------------

/// Accepts the bare answers object (`productService`, `customerService`,
/// `marketing`, `procurement`, `storeManagement`).
#[napi]
pub fn score_diagnosis(input_json: String) -> NapiResult<String> {
    call(&input_json, scoring::score_diagnosis)
}

// ---------------------------------------------------------------------------
// Tax
// ---------------------------------------------------------------------------

#[napi]
pub fn income_tax(input_json: String) -> NapiResult<String> {
    call(&input_json, income_tax::calculate_income_tax)
}

#[napi]
pub fn corporate_tax(input_json: String) -> NapiResult<String> {
    call(&input_json, corporate_tax::calculate_corporate_tax)
}

#[napi]
pub fn vat(input_json: String) -> NapiResult<String> {
    call(&input_json, vat::calculate_vat)
}
