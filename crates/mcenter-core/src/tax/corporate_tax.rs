use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::McenterError;
use crate::tax::{apply_brackets, Bracket, BracketSlice, LOCAL_TAX_RATE};
use crate::types::*;
use crate::McenterResult;

/// Corporate tax (법인세) brackets, fiscal years from 2023
pub const CORPORATE_TAX_BRACKETS: &[Bracket] = &[
    Bracket {
        upper: Some(dec!(200_000_000)),
        rate: dec!(0.09),
        progressive_deduction: dec!(0),
    },
    Bracket {
        upper: Some(dec!(20_000_000_000)),
        rate: dec!(0.19),
        progressive_deduction: dec!(20_000_000),
    },
    Bracket {
        upper: Some(dec!(300_000_000_000)),
        rate: dec!(0.21),
        progressive_deduction: dec!(420_000_000),
    },
    Bracket {
        upper: None,
        rate: dec!(0.24),
        progressive_deduction: dec!(9_420_000_000),
    },
];

/// Share of current income that carried-forward losses may offset for
/// companies that are not SMEs
const NON_SME_LOSS_OFFSET_LIMIT: Rate = dec!(0.80);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorporateTaxInput {
    pub revenue: Money,
    pub deductible_expenses: Money,
    /// Losses carried forward from prior years (이월결손금)
    #[serde(default)]
    pub loss_carryforward: Money,
    #[serde(default)]
    pub tax_credits: Money,
    /// SMEs may offset 100% of income with carried-forward losses
    #[serde(default = "default_true")]
    pub is_sme: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorporateTaxOutput {
    pub income: Money,
    pub loss_used: Money,
    pub loss_remaining: Money,
    pub tax_base: Money,
    pub calculated_tax: Money,
    pub national_tax: Money,
    pub local_income_tax: Money,
    pub total_tax: Money,
    pub marginal_rate: Rate,
    pub effective_rate: Rate,
    pub brackets: Vec<BracketSlice>,
}

pub fn calculate_corporate_tax(
    input: &CorporateTaxInput,
) -> McenterResult<ComputationOutput<CorporateTaxOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    for (field, value) in [
        ("revenue", input.revenue),
        ("deductible_expenses", input.deductible_expenses),
        ("loss_carryforward", input.loss_carryforward),
        ("tax_credits", input.tax_credits),
    ] {
        if value < Decimal::ZERO {
            return Err(McenterError::InvalidInput {
                field: field.into(),
                reason: "Amount cannot be negative".into(),
            });
        }
    }

    let income = input.revenue - input.deductible_expenses;
    let positive_income = income.max(Decimal::ZERO);
    let offset_cap = if input.is_sme {
        positive_income
    } else {
        positive_income * NON_SME_LOSS_OFFSET_LIMIT
    };
    let loss_used = input.loss_carryforward.min(offset_cap);
    let loss_remaining = input.loss_carryforward - loss_used
        + if income < Decimal::ZERO { -income } else { Decimal::ZERO };
    if income < Decimal::ZERO {
        warnings.push(format!("Current-year loss of {} added to carryforward", -income));
    }

    let tax_base = positive_income - loss_used;
    let (calculated_tax, marginal_rate, brackets) =
        apply_brackets(tax_base, CORPORATE_TAX_BRACKETS);
    let national_tax = (calculated_tax - input.tax_credits).max(Decimal::ZERO).floor();
    let local_income_tax = (national_tax * LOCAL_TAX_RATE).floor();
    let total_tax = national_tax + local_income_tax;
    let effective_rate = if positive_income > Decimal::ZERO {
        total_tax / positive_income
    } else {
        Decimal::ZERO
    };

    let output = CorporateTaxOutput {
        income,
        loss_used,
        loss_remaining,
        tax_base,
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
        "Korean corporate tax (9/19/21/24%)",
        &serde_json::json!({
            "is_sme": input.is_sme,
            "loss_offset_limit": if input.is_sme { "100%" } else { "80%" },
            "local_income_tax": "10% of national tax",
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(revenue: Decimal, expenses: Decimal) -> CorporateTaxInput {
        CorporateTaxInput {
            revenue,
            deductible_expenses: expenses,
            loss_carryforward: Decimal::ZERO,
            tax_credits: Decimal::ZERO,
            is_sme: true,
        }
    }

    #[test]
    fn test_small_company() {
        let out = calculate_corporate_tax(&input(dec!(500_000_000), dec!(400_000_000))).unwrap();
        assert_eq!(out.result.national_tax, dec!(9_000_000));
        assert_eq!(out.result.total_tax, dec!(9_900_000));
    }

    #[test]
    fn test_second_bracket() {
        let out = calculate_corporate_tax(&input(dec!(1_000_000_000), dec!(500_000_000))).unwrap();
        // 500M * 19% - 20M = 75M
        assert_eq!(out.result.national_tax, dec!(75_000_000));
        assert_eq!(out.result.marginal_rate, dec!(0.19));
    }

    #[test]
    fn test_bracket_boundaries_continuous() {
        let (at_boundary, _, _) = apply_brackets(dec!(20_000_000_000), CORPORATE_TAX_BRACKETS);
        assert_eq!(at_boundary, dec!(3_780_000_000));
    }

    #[test]
    fn test_non_sme_loss_offset_limited() {
        let mut i = input(dec!(300_000_000), dec!(200_000_000));
        i.loss_carryforward = dec!(500_000_000);
        i.is_sme = false;
        let out = calculate_corporate_tax(&i).unwrap();
        assert_eq!(out.result.loss_used, dec!(80_000_000));
        assert_eq!(out.result.tax_base, dec!(20_000_000));
        assert_eq!(out.result.loss_remaining, dec!(420_000_000));
    }

    #[test]
    fn test_current_loss_rolls_forward() {
        let out = calculate_corporate_tax(&input(dec!(100), dec!(300))).unwrap();
        assert_eq!(out.result.total_tax, Decimal::ZERO);
        assert_eq!(out.result.loss_remaining, dec!(200));
    }
}
