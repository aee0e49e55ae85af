//! Government policy-fund (정책자금) loan schedules and investment analysis.

pub mod amortization;
pub mod investment;
