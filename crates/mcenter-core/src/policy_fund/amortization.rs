use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::McenterError;
use crate::types::*;
use crate::McenterResult;

/// Longest loan horizon (grace + repayment) accepted, in years.
pub const MAX_LOAN_YEARS: u32 = 50;

/// Largest principal accepted per tranche (10^20 KRW), keeping yearly
/// payments and schedule totals inside the `Decimal` range.
pub const MAX_PRINCIPAL: Money = dec!(100_000_000_000_000_000_000);

/// DSCR values above this are reported as this value.
pub const DSCR_CAP: Decimal = dec!(100);

/// Phase of a grace-then-equal-principal loan in a given year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanPhase {
    /// Interest only
    Grace,
    /// Equal principal installments plus interest on the declining balance
    Repayment,
    /// Fully repaid
    Completed,
}

/// A debt tranche repaid with a grace period followed by equal principal
/// installments (원금균등분할상환).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanTranche {
    #[serde(default)]
    pub name: String,
    pub principal: Money,
    /// Annual interest rate in percent (2.5 = 2.5%)
    pub annual_rate: Percent,
    pub grace_years: u32,
    pub repayment_years: u32,
}

/// Debt service for one tranche in one year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanPayment {
    pub year: u32,
    pub phase: LoanPhase,
    pub opening_balance: Money,
    pub principal_payment: Money,
    pub interest: Money,
    pub total_payment: Money,
    pub remaining_balance: Money,
}

impl LoanPayment {
    fn zero(year: u32) -> Self {
        LoanPayment {
            year,
            phase: LoanPhase::Completed,
            opening_balance: Decimal::ZERO,
            principal_payment: Decimal::ZERO,
            interest: Decimal::ZERO,
            total_payment: Decimal::ZERO,
            remaining_balance: Decimal::ZERO,
        }
    }
}

/// Input for a stand-alone loan schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanScheduleInput {
    pub tranche: LoanTranche,
    /// Number of years to tabulate; defaults to grace + repayment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years: Option<u32>,
}

/// Year-by-year schedule for one tranche
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanScheduleOutput {
    pub tranche_name: String,
    pub periods: Vec<LoanPayment>,
    pub total_interest_paid: Money,
    pub total_principal_paid: Money,
    pub total_debt_service: Money,
}

/// A debt service coverage ratio after the zero guard and cap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dscr {
    pub value: Decimal,
    /// The raw ratio exceeded [`DSCR_CAP`]
    pub clamped: bool,
}

pub fn validate_tranche(field: &str, tranche: &LoanTranche) -> McenterResult<()> {
    if tranche.principal < Decimal::ZERO {
        return Err(McenterError::invalid(
            &format!("{field}.principal"),
            "Loan principal cannot be negative",
        ));
    }
    if tranche.principal > MAX_PRINCIPAL {
        return Err(McenterError::invalid(
            &format!("{field}.principal"),
            format!("Loan principal cannot exceed {MAX_PRINCIPAL}"),
        ));
    }
    check_percent(
        &format!("{field}.annual_rate"),
        tranche.annual_rate,
        Decimal::ZERO,
        dec!(100),
    )?;
    if tranche.principal > Decimal::ZERO && tranche.repayment_years == 0 {
        return Err(McenterError::invalid(
            &format!("{field}.repayment_years"),
            "Repayment period must be at least 1 year",
        ));
    }
    if tranche.grace_years + tranche.repayment_years > MAX_LOAN_YEARS {
        return Err(McenterError::invalid(
            &format!("{field}.grace_years"),
            format!("Grace plus repayment period cannot exceed {MAX_LOAN_YEARS} years"),
        ));
    }
    Ok(())
}

/// Debt service due in `year` (1-based).
///
/// During grace only interest is due. During repayment the principal is
/// repaid in equal installments with interest on the balance before the
/// year's installment; the last installment takes whatever remains so the
/// installments sum to the principal exactly. After that nothing is due.
pub fn payment_for_year(tranche: &LoanTranche, year: u32) -> LoanPayment {
    let rate = pct(tranche.annual_rate);
    let grace = tranche.grace_years;
    let repay = tranche.repayment_years;

    if tranche.principal.is_zero() || year == 0 {
        return LoanPayment::zero(year);
    }

    if year <= grace {
        let interest = tranche.principal * rate;
        return LoanPayment {
            year,
            phase: LoanPhase::Grace,
            opening_balance: tranche.principal,
            principal_payment: Decimal::ZERO,
            interest,
            total_payment: interest,
            remaining_balance: tranche.principal,
        };
    }

    if repay == 0 || year > grace + repay {
        return LoanPayment::zero(year);
    }

    let installment = tranche.principal / Decimal::from(repay);
    let paid_before = installment * Decimal::from(year - grace - 1);
    let opening = tranche.principal - paid_before;
    let principal_payment = if year == grace + repay {
        opening
    } else {
        installment
    };
    let interest = opening * rate;

    LoanPayment {
        year,
        phase: LoanPhase::Repayment,
        opening_balance: opening,
        principal_payment,
        interest,
        total_payment: principal_payment + interest,
        remaining_balance: opening - principal_payment,
    }
}

/// Operating profit over total debt service, 0 when nothing is due, capped
/// at [`DSCR_CAP`].
pub fn dscr(operating_profit: Money, total_debt_service: Money) -> Dscr {
    if total_debt_service.is_zero() {
        return Dscr {
            value: Decimal::ZERO,
            clamped: false,
        };
    }
    let raw = operating_profit / total_debt_service;
    if raw > DSCR_CAP {
        Dscr {
            value: DSCR_CAP,
            clamped: true,
        }
    } else {
        Dscr {
            value: raw,
            clamped: false,
        }
    }
}

/// Build a year-by-year schedule for a single tranche.
pub fn build_loan_schedule(
    input: &LoanScheduleInput,
) -> McenterResult<ComputationOutput<LoanScheduleOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let tranche = &input.tranche;

    validate_tranche("tranche", tranche)?;

    let full_term = tranche.grace_years + tranche.repayment_years;
    let years = input.years.unwrap_or(full_term);
    if years == 0 {
        return Err(McenterError::invalid("years", "Schedule must cover at least 1 year"));
    }
    if years < full_term {
        warnings.push(format!(
            "Schedule truncated at year {years}; loan runs {full_term} years"
        ));
    }

    let periods: Vec<LoanPayment> = (1..=years).map(|y| payment_for_year(tranche, y)).collect();
    let total_interest_paid: Money = periods.iter().map(|p| p.interest).sum();
    let total_principal_paid: Money = periods.iter().map(|p| p.principal_payment).sum();

    let output = LoanScheduleOutput {
        tranche_name: tranche.name.clone(),
        periods,
        total_interest_paid,
        total_principal_paid,
        total_debt_service: total_interest_paid + total_principal_paid,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Grace period + equal principal amortisation",
        &serde_json::json!({
            "tranche": tranche.name,
            "principal": tranche.principal.to_string(),
            "annual_rate_pct": tranche.annual_rate.to_string(),
            "grace_years": tranche.grace_years,
            "repayment_years": tranche.repayment_years,
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn policy_loan() -> LoanTranche {
        LoanTranche {
            name: "정책자금".into(),
            principal: dec!(100_000_000),
            annual_rate: dec!(2.5),
            grace_years: 2,
            repayment_years: 3,
        }
    }

    #[test]
    fn test_grace_period_interest_only() {
        let loan = policy_loan();
        for year in 1..=2 {
            let p = payment_for_year(&loan, year);
            assert_eq!(p.phase, LoanPhase::Grace);
            assert_eq!(p.principal_payment, Decimal::ZERO);
            assert_eq!(p.interest, dec!(2_500_000));
            assert_eq!(p.remaining_balance, dec!(100_000_000));
        }
    }

    #[test]
    fn test_repayment_interest_on_declining_balance() {
        let loan = LoanTranche {
            principal: dec!(90_000_000),
            ..policy_loan()
        };
        let y3 = payment_for_year(&loan, 3);
        assert_eq!(y3.phase, LoanPhase::Repayment);
        assert_eq!(y3.principal_payment, dec!(30_000_000));
        assert_eq!(y3.interest, dec!(2_250_000));
        assert_eq!(y3.remaining_balance, dec!(60_000_000));

        let y4 = payment_for_year(&loan, 4);
        assert_eq!(y4.opening_balance, dec!(60_000_000));
        assert_eq!(y4.interest, dec!(1_500_000));

        let y5 = payment_for_year(&loan, 5);
        assert_eq!(y5.remaining_balance, Decimal::ZERO);
    }

    #[test]
    fn test_after_maturity_nothing_due() {
        let p = payment_for_year(&policy_loan(), 6);
        assert_eq!(p.phase, LoanPhase::Completed);
        assert_eq!(p.total_payment, Decimal::ZERO);
        assert_eq!(p.remaining_balance, Decimal::ZERO);
    }

    #[test]
    fn test_installments_sum_to_principal_with_uneven_division() {
        let loan = policy_loan(); // 100M over 3 years does not divide evenly
        let total: Decimal = (1..=5)
            .map(|y| payment_for_year(&loan, y).principal_payment)
            .sum();
        assert_eq!(total, loan.principal);
    }

    #[test]
    fn test_dscr_zero_service_and_cap() {
        assert_eq!(dscr(dec!(1000), Decimal::ZERO).value, Decimal::ZERO);
        let capped = dscr(dec!(1_000_000), dec!(1));
        assert_eq!(capped.value, DSCR_CAP);
        assert!(capped.clamped);
        assert_eq!(dscr(dec!(150), dec!(100)).value, dec!(1.5));
    }

    #[test]
    fn test_schedule_defaults_to_full_term() {
        let input = LoanScheduleInput {
            tranche: policy_loan(),
            years: None,
        };
        let out = build_loan_schedule(&input).unwrap();
        assert_eq!(out.result.periods.len(), 5);
        assert_eq!(out.result.total_principal_paid, dec!(100_000_000));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_validation_errors() {
        let mut loan = policy_loan();
        loan.repayment_years = 0;
        assert!(validate_tranche("policy_loan", &loan).is_err());

        let mut loan = policy_loan();
        loan.annual_rate = dec!(120);
        assert!(validate_tranche("policy_loan", &loan).is_err());

        let mut loan = policy_loan();
        loan.principal = dec!(-1);
        assert!(validate_tranche("policy_loan", &loan).is_err());
    }
}
