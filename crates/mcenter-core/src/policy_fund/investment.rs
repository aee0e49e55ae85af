use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::warn;

use crate::error::McenterError;
use crate::policy_fund::amortization::{self, LoanPayment, LoanPhase, LoanTranche};
use crate::time_value;
use crate::types::*;
use crate::McenterResult;

/// Longest analysis horizon accepted, in years.
pub const MAX_ANALYSIS_YEARS: u32 = 30;

/// Minimum DSCR considered comfortable by lenders
const COMFORTABLE_DSCR: Decimal = dec!(1.25);

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Revenue scenario applied on top of the base plan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    Pessimistic,
    #[default]
    Base,
    Optimistic,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [Scenario::Pessimistic, Scenario::Base, Scenario::Optimistic];

    /// Revenue adjustment in percent used when none is supplied.
    pub fn default_adjustment(self) -> Percent {
        match self {
            Scenario::Pessimistic => dec!(-20),
            Scenario::Base => Decimal::ZERO,
            Scenario::Optimistic => dec!(20),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentInput {
    pub initial_investment: Money,
    pub policy_loan: LoanTranche,
    /// Other borrowings serviced alongside the policy loan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_debt: Option<LoanTranche>,
    /// First-year revenue before scenario adjustment
    pub annual_revenue: Money,
    pub operating_profit_rate: Percent,
    pub discount_rate: Percent,
    pub analysis_years: u32,
    pub tax_rate: Percent,
    #[serde(default)]
    pub revenue_growth_rate: Percent,
    #[serde(default)]
    pub scenario: Scenario,
    /// Overrides the scenario's default revenue adjustment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_adjustment: Option<Percent>,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearlyCashFlow {
    pub year: u32,
    pub revenue: Money,
    pub operating_profit: Money,
    pub interest_expense: Money,
    pub tax: Money,
    pub net_cash_flow: Money,
    pub discounted_cash_flow: Money,
    pub cumulative_discounted_cash_flow: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearlyDscr {
    pub year: u32,
    pub operating_profit: Money,
    pub policy_loan: LoanPayment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_debt: Option<LoanPayment>,
    pub total_debt_service: Money,
    pub dscr: Decimal,
    pub is_grace_period: bool,
    pub is_repayment_period: bool,
    pub other_debt_in_repayment: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentGrade {
    Excellent,
    Good,
    Fair,
    Poor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentResult {
    pub scenario: Scenario,
    pub npv: Money,
    /// Percent; absent when the cash flows have no IRR
    pub irr: Option<Percent>,
    pub simple_payback_years: Option<Decimal>,
    pub discounted_payback_years: Option<Decimal>,
    /// Percent
    pub roi: Percent,
    pub profitability_index: Decimal,
    pub total_net_cash_flow: Money,
    pub present_value_of_cash_flows: Money,
    /// Over years with debt service due
    pub average_dscr: Option<Decimal>,
    pub minimum_dscr: Option<Decimal>,
    pub grade: InvestmentGrade,
    pub cash_flows: Vec<YearlyCashFlow>,
    pub dscr: Vec<YearlyDscr>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioComparison {
    pub pessimistic: InvestmentResult,
    pub base: InvestmentResult,
    pub optimistic: InvestmentResult,
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

/// Analyse a policy-fund backed investment: yearly cash flows, NPV, IRR,
/// payback, DSCR by year, ROI and profitability index.
pub fn analyze_investment(
    input: &InvestmentInput,
) -> McenterResult<ComputationOutput<InvestmentResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;
    let adjustment = input
        .scenario_adjustment
        .unwrap_or_else(|| input.scenario.default_adjustment());
    let result = run_analysis(input, input.scenario, adjustment, &mut warnings)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Policy-fund investment DCF (NPV/IRR/DSCR)",
        &assumptions(input, adjustment),
        warnings,
        elapsed,
        result,
    ))
}

/// Run the pessimistic, base and optimistic scenarios side by side using
/// each scenario's default revenue adjustment.
pub fn analyze_scenarios(
    input: &InvestmentInput,
) -> McenterResult<ComputationOutput<ScenarioComparison>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    let mut run = |scenario: Scenario| {
        let mut scoped = Vec::new();
        let result = run_analysis(input, scenario, scenario.default_adjustment(), &mut scoped);
        warnings.extend(scoped.into_iter().map(|w| format!("[{scenario:?}] {w}")));
        result
    };
    let comparison = ScenarioComparison {
        pessimistic: run(Scenario::Pessimistic)?,
        base: run(Scenario::Base)?,
        optimistic: run(Scenario::Optimistic)?,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Policy-fund investment scenario comparison",
        &assumptions(input, Decimal::ZERO),
        warnings,
        elapsed,
        comparison,
    ))
}

fn assumptions(input: &InvestmentInput, adjustment: Percent) -> serde_json::Value {
    serde_json::json!({
        "initial_investment": input.initial_investment.to_string(),
        "discount_rate_pct": input.discount_rate.to_string(),
        "tax_rate_pct": input.tax_rate.to_string(),
        "analysis_years": input.analysis_years,
        "revenue_growth_pct": input.revenue_growth_rate.to_string(),
        "scenario_adjustment_pct": adjustment.to_string(),
        "net_cash_flow": "operating profit - interest - tax",
    })
}

fn validate_input(input: &InvestmentInput) -> McenterResult<()> {
    if input.initial_investment <= Decimal::ZERO {
        return Err(McenterError::invalid(
            "initial_investment",
            "Initial investment must be positive",
        ));
    }
    if input.annual_revenue < Decimal::ZERO {
        return Err(McenterError::invalid(
            "annual_revenue",
            "Revenue cannot be negative",
        ));
    }
    if input.analysis_years == 0 || input.analysis_years > MAX_ANALYSIS_YEARS {
        return Err(McenterError::invalid(
            "analysis_years",
            format!("Analysis period must be between 1 and {MAX_ANALYSIS_YEARS} years"),
        ));
    }
    check_percent("operating_profit_rate", input.operating_profit_rate, dec!(-100), dec!(100))?;
    check_percent("discount_rate", input.discount_rate, Decimal::ZERO, dec!(100))?;
    check_percent("tax_rate", input.tax_rate, Decimal::ZERO, dec!(100))?;
    check_percent("revenue_growth_rate", input.revenue_growth_rate, dec!(-100), dec!(100))?;
    if let Some(adj) = input.scenario_adjustment {
        check_percent("scenario_adjustment", adj, dec!(-100), dec!(100))?;
    }
    amortization::validate_tranche("policy_loan", &input.policy_loan)?;
    if let Some(other) = &input.other_debt {
        amortization::validate_tranche("other_debt", other)?;
    }
    Ok(())
}

fn out_of_range(what: &str) -> McenterError {
    McenterError::FinancialImpossibility(format!("{what} exceeds the representable range"))
}

fn run_analysis(
    input: &InvestmentInput,
    scenario: Scenario,
    adjustment: Percent,
    warnings: &mut Vec<String>,
) -> McenterResult<InvestmentResult> {
    let discount_rate = pct(input.discount_rate);
    let growth = Decimal::ONE + pct(input.revenue_growth_rate);
    let margin = pct(input.operating_profit_rate);
    let tax_rate = pct(input.tax_rate);

    let years = input.analysis_years as usize;
    let mut cash_flows: Vec<YearlyCashFlow> = Vec::with_capacity(years);
    let mut dscr_rows: Vec<YearlyDscr> = Vec::with_capacity(years);
    let mut net_flows: Vec<Money> = Vec::with_capacity(years);

    let mut revenue = input
        .annual_revenue
        .checked_mul(Decimal::ONE + pct(adjustment))
        .ok_or_else(|| out_of_range("Adjusted revenue"))?;
    let mut discount = Decimal::ONE;
    let mut cumulative = -input.initial_investment;

    for year in 1..=input.analysis_years {
        if year > 1 {
            revenue = revenue
                .checked_mul(growth)
                .ok_or_else(|| out_of_range(&format!("Year {year} revenue")))?;
        }
        let operating_profit = revenue * margin;

        let policy = amortization::payment_for_year(&input.policy_loan, year);
        let other = input
            .other_debt
            .as_ref()
            .map(|t| amortization::payment_for_year(t, year));

        let interest = policy.interest + other.as_ref().map_or(Decimal::ZERO, |p| p.interest);
        let total_debt_service =
            policy.total_payment + other.as_ref().map_or(Decimal::ZERO, |p| p.total_payment);

        let taxable = operating_profit
            .checked_sub(interest)
            .ok_or_else(|| out_of_range(&format!("Year {year} taxable profit")))?
            .max(Decimal::ZERO);
        let tax = taxable * tax_rate;
        let net_cash_flow = operating_profit
            .checked_sub(interest)
            .and_then(|v| v.checked_sub(tax))
            .ok_or_else(|| out_of_range(&format!("Year {year} net cash flow")))?;

        discount = discount
            .checked_mul(Decimal::ONE + discount_rate)
            .ok_or_else(|| out_of_range("Discount factor"))?;
        let discounted = net_cash_flow / discount;
        cumulative = cumulative
            .checked_add(discounted)
            .ok_or_else(|| out_of_range("Cumulative discounted cash flow"))?;

        if operating_profit < Decimal::ZERO {
            warnings.push(format!(
                "Year {year}: operating loss of {}",
                operating_profit.round_dp(0)
            ));
        }

        let coverage = amortization::dscr(operating_profit, total_debt_service);
        if coverage.clamped {
            warn!(year, "DSCR exceeded cap and was clamped");
            warnings.push(format!(
                "Year {year}: DSCR above {} clamped",
                amortization::DSCR_CAP
            ));
        }

        cash_flows.push(YearlyCashFlow {
            year,
            revenue,
            operating_profit,
            interest_expense: interest,
            tax,
            net_cash_flow,
            discounted_cash_flow: discounted,
            cumulative_discounted_cash_flow: cumulative,
        });
        dscr_rows.push(YearlyDscr {
            year,
            operating_profit,
            is_grace_period: policy.phase == LoanPhase::Grace,
            is_repayment_period: policy.phase == LoanPhase::Repayment,
            other_debt_in_repayment: other
                .as_ref()
                .is_some_and(|p| p.phase == LoanPhase::Repayment),
            policy_loan: policy,
            other_debt: other,
            total_debt_service,
            dscr: coverage.value,
        });
        net_flows.push(net_cash_flow);
    }

    // t=0 outlay followed by yearly net cash flows
    let mut project_flows: Vec<Money> = Vec::with_capacity(years + 1);
    project_flows.push(-input.initial_investment);
    project_flows.extend(net_flows.iter().copied());

    let npv = time_value::npv(discount_rate, &project_flows)?;
    let present_value_of_cash_flows = npv
        .checked_add(input.initial_investment)
        .ok_or_else(|| out_of_range("Present value of cash flows"))?;

    let irr = match time_value::irr(&project_flows, discount_rate) {
        Ok(r) => Some(r * dec!(100)),
        Err(e) => {
            warn!(error = %e, "IRR unavailable");
            warnings.push(format!("IRR not computed: {e}"));
            None
        }
    };

    let simple_payback_years = time_value::simple_payback(input.initial_investment, &net_flows);
    let discounted_payback_years =
        time_value::discounted_payback(input.initial_investment, &net_flows, discount_rate);
    if discounted_payback_years.is_none() {
        warnings.push(format!(
            "Discounted payback not reached within {} years",
            input.analysis_years
        ));
    }

    let total_net_cash_flow = net_flows
        .iter()
        .try_fold(Decimal::ZERO, |acc, cf| acc.checked_add(*cf))
        .ok_or_else(|| out_of_range("Total net cash flow"))?;
    let roi = total_net_cash_flow
        .checked_sub(input.initial_investment)
        .and_then(|gain| gain.checked_div(input.initial_investment))
        .and_then(|r| r.checked_mul(dec!(100)))
        .ok_or_else(|| out_of_range("ROI"))?;
    let profitability_index = present_value_of_cash_flows
        .checked_div(input.initial_investment)
        .ok_or_else(|| out_of_range("Profitability index"))?;

    let serviced: Vec<Decimal> = dscr_rows
        .iter()
        .filter(|r| r.total_debt_service > Decimal::ZERO)
        .map(|r| r.dscr)
        .collect();
    let average_dscr = if serviced.is_empty() {
        None
    } else {
        Some(serviced.iter().copied().sum::<Decimal>() / Decimal::from(serviced.len() as i64))
    };
    let minimum_dscr = serviced.iter().copied().min();

    let grade = grade_investment(npv, irr, input.discount_rate, minimum_dscr);

    Ok(InvestmentResult {
        scenario,
        npv,
        irr,
        simple_payback_years,
        discounted_payback_years,
        roi,
        profitability_index,
        total_net_cash_flow,
        present_value_of_cash_flows,
        average_dscr,
        minimum_dscr,
        grade,
        cash_flows,
        dscr: dscr_rows,
    })
}

/// Overall verdict from NPV sign, IRR against the hurdle rate and the
/// weakest year's debt coverage. No debt means coverage never binds.
pub fn grade_investment(
    npv: Money,
    irr: Option<Percent>,
    discount_rate: Percent,
    minimum_dscr: Option<Decimal>,
) -> InvestmentGrade {
    let coverage = minimum_dscr.unwrap_or(amortization::DSCR_CAP);
    let beats_hurdle = irr.is_some_and(|r| r > discount_rate);
    let positive = npv > Decimal::ZERO;

    if positive && beats_hurdle && coverage >= COMFORTABLE_DSCR {
        InvestmentGrade::Excellent
    } else if positive && coverage >= Decimal::ONE {
        InvestmentGrade::Good
    } else if positive || coverage >= Decimal::ONE {
        InvestmentGrade::Fair
    } else {
        InvestmentGrade::Poor
    }
}
