use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use mcenter_core::policy_fund::amortization::{self, LoanScheduleInput, LoanTranche};
use mcenter_core::policy_fund::investment::{self, InvestmentInput, Scenario};

use crate::input;

/// Arguments shared by `invest` and `scenarios`
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct InvestArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Initial investment (KRW)
    #[arg(long)]
    pub initial_investment: Option<Decimal>,

    /// Policy loan principal (KRW)
    #[arg(long)]
    pub loan_amount: Option<Decimal>,

    /// Policy loan interest rate in percent
    #[arg(long)]
    pub loan_rate: Option<Decimal>,

    /// Interest-only years before repayment starts
    #[arg(long, default_value_t = 0)]
    pub grace_years: u32,

    /// Equal-principal repayment years
    #[arg(long)]
    pub repayment_years: Option<u32>,

    /// First-year revenue (KRW)
    #[arg(long)]
    pub annual_revenue: Option<Decimal>,

    /// Operating profit margin in percent
    #[arg(long, alias = "margin")]
    pub operating_profit_rate: Option<Decimal>,

    /// Discount rate in percent
    #[arg(long)]
    pub discount_rate: Option<Decimal>,

    /// Number of years analysed
    #[arg(long, alias = "years")]
    pub analysis_years: Option<u32>,

    /// Tax rate on profit after interest, in percent
    #[arg(long)]
    pub tax_rate: Option<Decimal>,

    /// Annual revenue growth in percent
    #[arg(long)]
    pub revenue_growth_rate: Option<Decimal>,

    /// pessimistic, base or optimistic
    #[arg(long, value_parser = parse_scenario)]
    pub scenario: Option<Scenario>,

    /// Revenue adjustment in percent, replacing the scenario default
    #[arg(long)]
    pub scenario_adjustment: Option<Decimal>,
}

/// Arguments for a stand-alone loan schedule
#[derive(Args)]
pub struct LoanScheduleArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Label for the loan
    #[arg(long, default_value = "정책자금")]
    pub name: String,

    /// Principal (KRW)
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate in percent
    #[arg(long)]
    pub rate: Option<Decimal>,

    #[arg(long, default_value_t = 0)]
    pub grace_years: u32,

    #[arg(long)]
    pub repayment_years: Option<u32>,

    /// Rows to print; defaults to the full term
    #[arg(long)]
    pub years: Option<u32>,
}

fn parse_scenario(raw: &str) -> Result<Scenario, String> {
    serde_json::from_value(Value::String(raw.to_ascii_lowercase()))
        .map_err(|_| format!("unknown scenario '{raw}' (expected pessimistic, base or optimistic)"))
}

fn investment_input(args: InvestArgs) -> Result<InvestmentInput, Box<dyn std::error::Error>> {
    match input::load(args.input.as_deref())? {
        Some(parsed) => Ok(parsed),
        None => from_flags(args),
    }
}

fn from_flags(args: InvestArgs) -> Result<InvestmentInput, Box<dyn std::error::Error>> {
    Ok(InvestmentInput {
        initial_investment: input::required(args.initial_investment, "initial-investment")?,
        policy_loan: LoanTranche {
            name: "정책자금".into(),
            principal: input::required(args.loan_amount, "loan-amount")?,
            annual_rate: input::required(args.loan_rate, "loan-rate")?,
            grace_years: args.grace_years,
            repayment_years: input::required(args.repayment_years, "repayment-years")?,
        },
        other_debt: None,
        annual_revenue: input::required(args.annual_revenue, "annual-revenue")?,
        operating_profit_rate: input::required(
            args.operating_profit_rate,
            "operating-profit-rate",
        )?,
        discount_rate: input::required(args.discount_rate, "discount-rate")?,
        analysis_years: input::required(args.analysis_years, "analysis-years")?,
        tax_rate: input::required(args.tax_rate, "tax-rate")?,
        revenue_growth_rate: args.revenue_growth_rate.unwrap_or(Decimal::ZERO),
        scenario: args.scenario.unwrap_or_default(),
        scenario_adjustment: args.scenario_adjustment,
    })
}

pub fn run_invest(args: InvestArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let inv = investment_input(args)?;
    let result = investment::analyze_investment(&inv)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_scenarios(args: InvestArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let inv = investment_input(args)?;
    let result = investment::analyze_scenarios(&inv)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_loan_schedule(args: LoanScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let schedule_input: LoanScheduleInput = match input::load(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => LoanScheduleInput {
            tranche: LoanTranche {
                name: args.name,
                principal: input::required(args.principal, "principal")?,
                annual_rate: input::required(args.rate, "rate")?,
                grace_years: args.grace_years,
                repayment_years: input::required(args.repayment_years, "repayment-years")?,
            },
            years: args.years,
        },
    };
    let result = amortization::build_loan_schedule(&schedule_input)?;
    Ok(serde_json::to_value(result)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn flags() -> InvestArgs {
        InvestArgs {
            input: None,
            initial_investment: Some(dec!(300_000_000)),
            loan_amount: Some(dec!(200_000_000)),
            loan_rate: Some(dec!(2.5)),
            grace_years: 2,
            repayment_years: Some(5),
            annual_revenue: Some(dec!(500_000_000)),
            operating_profit_rate: Some(dec!(15)),
            discount_rate: Some(dec!(8)),
            analysis_years: Some(7),
            tax_rate: Some(dec!(22)),
            revenue_growth_rate: None,
            scenario: Some(Scenario::Optimistic),
            scenario_adjustment: None,
        }
    }

    #[test]
    fn test_flags_build_input() {
        let inv = from_flags(flags()).unwrap();
        assert_eq!(inv.policy_loan.principal, dec!(200_000_000));
        assert_eq!(inv.policy_loan.grace_years, 2);
        assert_eq!(inv.revenue_growth_rate, Decimal::ZERO);
        assert_eq!(inv.scenario, Scenario::Optimistic);
        assert!(investment::analyze_investment(&inv).is_ok());
    }

    #[test]
    fn test_missing_flag_is_named() {
        let mut args = flags();
        args.discount_rate = None;
        let err = from_flags(args).unwrap_err();
        assert!(err.to_string().contains("--discount-rate"));
    }

    #[test]
    fn test_parse_scenario_is_case_insensitive() {
        assert_eq!(parse_scenario("Optimistic").unwrap(), Scenario::Optimistic);
        assert_eq!(parse_scenario("base").unwrap(), Scenario::Base);
        assert!(parse_scenario("worst").is_err());
    }
}
