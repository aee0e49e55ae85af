use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::McenterError;
use crate::tax::{apply_brackets, Bracket, BracketSlice, LOCAL_TAX_RATE};
use crate::types::*;
use crate::McenterResult;

/// Comprehensive income tax (종합소득세) brackets, tax years 2023 onward
pub const INCOME_TAX_BRACKETS: &[Bracket] = &[
    Bracket {
        upper: Some(dec!(14_000_000)),
        rate: dec!(0.06),
        progressive_deduction: dec!(0),
    },
    Bracket {
        upper: Some(dec!(50_000_000)),
        rate: dec!(0.15),
        progressive_deduction: dec!(1_260_000),
    },
    Bracket {
        upper: Some(dec!(88_000_000)),
        rate: dec!(0.24),
        progressive_deduction: dec!(5_760_000),
    },
    Bracket {
        upper: Some(dec!(150_000_000)),
        rate: dec!(0.35),
        progressive_deduction: dec!(15_440_000),
    },
    Bracket {
        upper: Some(dec!(300_000_000)),
        rate: dec!(0.38),
        progressive_deduction: dec!(19_940_000),
    },
    Bracket {
        upper: Some(dec!(500_000_000)),
        rate: dec!(0.40),
        progressive_deduction: dec!(25_940_000),
    },
    Bracket {
        upper: Some(dec!(1_000_000_000)),
        rate: dec!(0.42),
        progressive_deduction: dec!(35_940_000),
    },
    Bracket {
        upper: None,
        rate: dec!(0.45),
        progressive_deduction: dec!(65_940_000),
    },
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomeTaxInput {
    /// Gross business income (총수입금액)
    pub gross_income: Money,
    /// Necessary expenses (필요경비)
    pub necessary_expenses: Money,
    /// Income deductions (종합소득공제), e.g. the 1.5M basic deduction
    #[serde(default)]
    pub income_deductions: Money,
    /// Tax credits and reductions (세액공제·감면)
    #[serde(default)]
    pub tax_credits: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomeTaxOutput {
    pub business_income: Money,
    pub taxable_income: Money,
    pub calculated_tax: Money,
    pub national_tax: Money,
    pub local_income_tax: Money,
    pub total_tax: Money,
    pub marginal_rate: Rate,
    /// Total tax over business income; zero when there is no income
    pub effective_rate: Rate,
    pub brackets: Vec<BracketSlice>,
}

/// Korean comprehensive income tax for a sole proprietor.
pub fn calculate_income_tax(
    input: &IncomeTaxInput,
) -> McenterResult<ComputationOutput<IncomeTaxOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    for (field, value) in [
        ("gross_income", input.gross_income),
        ("necessary_expenses", input.necessary_expenses),
        ("income_deductions", input.income_deductions),
        ("tax_credits", input.tax_credits),
    ] {
        if value < Decimal::ZERO {
            return Err(McenterError::InvalidInput {
                field: field.into(),
                reason: "Amount cannot be negative".into(),
            });
        }
    }

    let business_income = input.gross_income - input.necessary_expenses;
    if business_income < Decimal::ZERO {
        warnings.push("Business loss; no income tax due".into());
    }
    let taxable_income = (business_income - input.income_deductions).max(Decimal::ZERO);

    let (calculated_tax, marginal_rate, brackets) =
        apply_brackets(taxable_income, INCOME_TAX_BRACKETS);
    if input.tax_credits > calculated_tax {
        warnings.push("Tax credits exceed calculated tax; excess is not refundable".into());
    }
    let national_tax = (calculated_tax - input.tax_credits).max(Decimal::ZERO).floor();
    let local_income_tax = (national_tax * LOCAL_TAX_RATE).floor();
    let total_tax = national_tax + local_income_tax;

    let effective_rate = if business_income > Decimal::ZERO {
        total_tax / business_income
    } else {
        Decimal::ZERO
    };

    let output = IncomeTaxOutput {
        business_income,
        taxable_income,
        calculated_tax,
        national_tax,
        local_income_tax,
        total_tax,
        marginal_rate,
        effective_rate,
        brackets,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Korean comprehensive income tax (8 progressive brackets, 6-45%)",
        &serde_json::json!({
            "tax_year": "2023+",
            "local_income_tax": "10% of national tax",
            "rounding": "truncated to whole won",
        }),
        warnings,
        elapsed,
        output,
    ))
}
