//! Korean tax calculators: comprehensive income tax, corporate tax and VAT.

pub mod corporate_tax;
pub mod income_tax;
pub mod vat;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate};

/// Local income tax (지방소득세) as a share of the national tax
pub const LOCAL_TAX_RATE: Rate = dec!(0.10);

/// A progressive bracket expressed with the quick-calculation deduction
/// (누진공제) used on Korean tax tables.
#[derive(Debug, Clone, Copy)]
pub struct Bracket {
    /// Inclusive upper bound of the bracket; `None` for the top bracket
    pub upper: Option<Money>,
    pub rate: Rate,
    pub progressive_deduction: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BracketSlice {
    pub lower: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper: Option<Money>,
    pub rate: Rate,
    pub taxable_in_bracket: Money,
    pub tax_in_bracket: Money,
}

/// Tax on `base` under `brackets`, the marginal rate, and the per-bracket
/// breakdown. `brackets` must be ordered by ascending upper bound.
pub fn apply_brackets(base: Money, brackets: &[Bracket]) -> (Money, Rate, Vec<BracketSlice>) {
    if base <= Decimal::ZERO {
        let first = brackets.first().map_or(Decimal::ZERO, |b| b.rate);
        return (Decimal::ZERO, first, Vec::new());
    }

    let mut slices = Vec::new();
    let mut lower = Decimal::ZERO;
    let mut marginal = Decimal::ZERO;
    let mut tax = Decimal::ZERO;

    for b in brackets {
        let top = b.upper.map_or(base, |u| u.min(base));
        if top > lower {
            let amount = top - lower;
            slices.push(BracketSlice {
                lower,
                upper: b.upper,
                rate: b.rate,
                taxable_in_bracket: amount,
                tax_in_bracket: amount * b.rate,
            });
        }
        if b.upper.map_or(true, |u| base <= u) {
            marginal = b.rate;
            tax = base * b.rate - b.progressive_deduction;
            break;
        }
        lower = b.upper.unwrap_or(lower);
    }

    (tax.max(Decimal::ZERO), marginal, slices)
}
