use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use mcenter_core::tax::corporate_tax::{self, CorporateTaxInput};
use mcenter_core::tax::income_tax::{self, IncomeTaxInput};
use mcenter_core::tax::vat::{self, IndustryGroup, TaxpayerType, VatInput};

use crate::input;

/// Arguments for comprehensive income tax
#[derive(Args)]
pub struct IncomeTaxArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Gross business income (KRW)
    #[arg(long)]
    pub gross_income: Option<Decimal>,

    /// Necessary expenses (KRW)
    #[arg(long, alias = "expenses")]
    pub necessary_expenses: Option<Decimal>,

    /// Income deductions (KRW)
    #[arg(long)]
    pub income_deductions: Option<Decimal>,

    /// Tax credits and reductions (KRW)
    #[arg(long)]
    pub tax_credits: Option<Decimal>,
}

/// Arguments for corporate income tax
#[derive(Args)]
pub struct CorporateTaxArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    #[arg(long)]
    pub revenue: Option<Decimal>,

    /// Deductible expenses (KRW)
    #[arg(long, alias = "expenses")]
    pub deductible_expenses: Option<Decimal>,

    /// Losses carried forward (KRW)
    #[arg(long)]
    pub loss_carryforward: Option<Decimal>,

    #[arg(long)]
    pub tax_credits: Option<Decimal>,

    /// Treat the company as a non-SME (loss offset capped at 80%)
    #[arg(long)]
    pub non_sme: bool,
}

/// Arguments for VAT
#[derive(Args)]
pub struct VatArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// general or simplified
    #[arg(long, value_parser = parse_enum::<TaxpayerType>)]
    pub taxpayer_type: Option<TaxpayerType>,

    /// Taxable supplies excluding VAT (KRW)
    #[arg(long)]
    pub supply_amount: Option<Decimal>,

    /// Purchases excluding VAT (KRW)
    #[arg(long)]
    pub purchase_amount: Option<Decimal>,

    /// retail_restaurant, manufacturing_lodging, other_services or professional
    #[arg(long, value_parser = parse_enum::<IndustryGroup>)]
    pub industry: Option<IndustryGroup>,
}

fn parse_enum<T: serde::de::DeserializeOwned>(raw: &str) -> Result<T, String> {
    let key = raw.trim().to_ascii_lowercase().replace('-', "_");
    serde_json::from_value(Value::String(key)).map_err(|_| format!("unrecognised value '{raw}'"))
}

pub fn run_income_tax(args: IncomeTaxArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let tax_input: IncomeTaxInput = match input::load(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => IncomeTaxInput {
            gross_income: input::required(args.gross_income, "gross-income")?,
            necessary_expenses: args.necessary_expenses.unwrap_or(Decimal::ZERO),
            income_deductions: args.income_deductions.unwrap_or(Decimal::ZERO),
            tax_credits: args.tax_credits.unwrap_or(Decimal::ZERO),
        },
    };
    let result = income_tax::calculate_income_tax(&tax_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_corporate_tax(args: CorporateTaxArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let tax_input: CorporateTaxInput = match input::load(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => CorporateTaxInput {
            revenue: input::required(args.revenue, "revenue")?,
            deductible_expenses: args.deductible_expenses.unwrap_or(Decimal::ZERO),
            loss_carryforward: args.loss_carryforward.unwrap_or(Decimal::ZERO),
            tax_credits: args.tax_credits.unwrap_or(Decimal::ZERO),
            is_sme: !args.non_sme,
        },
    };
    let result = corporate_tax::calculate_corporate_tax(&tax_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_vat(args: VatArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let vat_input: VatInput = match input::load(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => VatInput {
            taxpayer_type: args.taxpayer_type.unwrap_or_default(),
            supply_amount: input::required(args.supply_amount, "supply-amount")?,
            purchase_amount: args.purchase_amount.unwrap_or(Decimal::ZERO),
            industry: args.industry.unwrap_or_default(),
        },
    };
    let result = vat::calculate_vat(&vat_input)?;
    Ok(serde_json::to_value(result)?)
}
