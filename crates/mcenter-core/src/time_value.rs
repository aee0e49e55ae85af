use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::McenterError;
use crate::types::{Money, Rate};
use crate::McenterResult;

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000001);
const MAX_IRR_ITERATIONS: u32 = 100;
const MAX_BISECTION_ITERATIONS: u32 = 200;
const IRR_FLOOR: Decimal = dec!(-0.99);
const IRR_CEILING: Decimal = dec!(5.0);

/// Net Present Value of a series of cash flows, the first at t=0.
///
/// Discount factors that overflow `Decimal` make the remaining terms
/// negligible, so summation stops there. A rate close to -100% can push the
/// discounted terms past `Decimal::MAX`; that is reported as
/// `FinancialImpossibility`.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> McenterResult<Money> {
    if rate <= dec!(-1) {
        return Err(McenterError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }
    npv_checked(rate, cash_flows).ok_or_else(|| {
        McenterError::FinancialImpossibility(format!(
            "NPV at rate {rate} exceeds the representable range"
        ))
    })
}

/// NPV with every operation checked; `None` when a term or the running sum
/// leaves the `Decimal` range.
fn npv_checked(rate: Rate, cash_flows: &[Money]) -> Option<Money> {
    let one_plus_r = Decimal::ONE + rate;
    if one_plus_r <= Decimal::ZERO {
        return None;
    }
    let mut result = Decimal::ZERO;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = match discount.checked_mul(one_plus_r) {
                Some(d) => d,
                None => break,
            };
        }
        if discount.is_zero() {
            return None;
        }
        result = result.checked_add(cf.checked_div(discount)?)?;
    }
    Some(result)
}

/// NPV and its first derivative with respect to the rate.
fn npv_with_derivative(rate: Rate, cash_flows: &[Money]) -> Option<(Decimal, Decimal)> {
    let one_plus_r = Decimal::ONE + rate;
    if one_plus_r <= Decimal::ZERO {
        return None;
    }
    let mut npv_val = Decimal::ZERO;
    let mut dnpv = Decimal::ZERO;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount.checked_mul(one_plus_r)?;
        }
        if discount.is_zero() {
            return None;
        }
        npv_val = npv_val.checked_add(cf.checked_div(discount)?)?;
        if t > 0 {
            let next = discount.checked_mul(one_plus_r)?;
            if next.is_zero() {
                return None;
            }
            let term = Decimal::from(t as i64).checked_mul(*cf)?.checked_div(next)?;
            dnpv = dnpv.checked_sub(term)?;
        }
    }
    Some((npv_val, dnpv))
}

/// NPV for root bracketing. Where the exact value overflows (rates close to
/// -100%) the latest non-zero flow dominates, so only its sign is returned,
/// scaled to `Decimal::MAX`.
fn npv_or_dominant(rate: Rate, cash_flows: &[Money]) -> Decimal {
    npv_checked(rate, cash_flows).unwrap_or_else(|| {
        match cash_flows.iter().rev().find(|cf| !cf.is_zero()) {
            Some(cf) if cf.is_sign_negative() => Decimal::MIN,
            _ => Decimal::MAX,
        }
    })
}

fn has_sign_change(cash_flows: &[Money]) -> bool {
    let has_pos = cash_flows.iter().any(|cf| *cf > Decimal::ZERO);
    let has_neg = cash_flows.iter().any(|cf| *cf < Decimal::ZERO);
    has_pos && has_neg
}

/// Internal Rate of Return.
///
/// Newton-Raphson from `guess`; if that stalls (flat derivative, divergence,
/// iteration limit) the root is bracketed on [-99%, 500%] and bisected.
pub fn irr(cash_flows: &[Money], guess: Rate) -> McenterResult<Rate> {
    if cash_flows.len() < 2 {
        return Err(McenterError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }
    if !has_sign_change(cash_flows) {
        return Err(McenterError::InsufficientData(
            "IRR requires at least one positive and one negative cash flow".into(),
        ));
    }

    let mut rate = guess;
    for _ in 0..MAX_IRR_ITERATIONS {
        let Some((npv_val, dnpv)) = npv_with_derivative(rate, cash_flows) else {
            break;
        };

        if npv_val.abs() < CONVERGENCE_THRESHOLD {
            return Ok(rate);
        }
        if dnpv.is_zero() {
            break;
        }

        rate -= npv_val / dnpv;

        // Guard against divergence
        if rate < IRR_FLOOR {
            rate = IRR_FLOOR;
        } else if rate > IRR_CEILING {
            rate = IRR_CEILING;
        }
    }

    irr_bisection(cash_flows)
}

fn irr_bisection(cash_flows: &[Money]) -> McenterResult<Rate> {
    let mut lo = IRR_FLOOR;
    let mut hi = IRR_CEILING;
    let mut f_lo = npv_or_dominant(lo, cash_flows);
    let f_hi = npv_or_dominant(hi, cash_flows);

    if f_lo.is_sign_positive() == f_hi.is_sign_positive() {
        return Err(McenterError::ConvergenceFailure {
            function: "IRR".into(),
            iterations: MAX_IRR_ITERATIONS,
            last_delta: f_lo,
        });
    }

    let mut mid = lo;
    let mut f_mid = f_lo;
    for _ in 0..MAX_BISECTION_ITERATIONS {
        mid = (lo + hi) / dec!(2);
        f_mid = npv_or_dominant(mid, cash_flows);
        if f_mid.abs() < CONVERGENCE_THRESHOLD || (hi - lo) < CONVERGENCE_THRESHOLD {
            return Ok(mid);
        }
        if f_mid.is_sign_positive() == f_lo.is_sign_positive() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }

    if f_mid.abs() < dec!(0.01) {
        return Ok(mid);
    }
    Err(McenterError::ConvergenceFailure {
        function: "IRR (bisection)".into(),
        iterations: MAX_BISECTION_ITERATIONS,
        last_delta: f_mid,
    })
}

/// Years until cumulative undiscounted cash flow recovers `initial`.
///
/// `flows[0]` is year 1. The crossing year is interpolated linearly.
pub fn simple_payback(initial: Money, flows: &[Money]) -> Option<Decimal> {
    payback(initial, flows.iter().copied())
}

/// Years until cumulative discounted cash flow recovers `initial`.
pub fn discounted_payback(initial: Money, flows: &[Money], rate: Rate) -> Option<Decimal> {
    let one_plus_r = Decimal::ONE + rate;
    if one_plus_r <= Decimal::ZERO {
        return None;
    }
    let mut discount = Decimal::ONE;
    let mut discounted = Vec::with_capacity(flows.len());
    for cf in flows {
        discount = discount.checked_mul(one_plus_r)?;
        if discount.is_zero() {
            return None;
        }
        discounted.push(cf.checked_div(discount)?);
    }
    payback(initial, discounted.into_iter())
}

fn payback(initial: Money, flows: impl Iterator<Item = Money>) -> Option<Decimal> {
    if initial <= Decimal::ZERO {
        return Some(Decimal::ZERO);
    }
    let mut cumulative = -initial;
    for (i, cf) in flows.enumerate() {
        let next = cumulative.checked_add(cf)?;
        if cumulative < Decimal::ZERO && next >= Decimal::ZERO && cf > Decimal::ZERO {
            let fraction = (-cumulative).checked_div(cf)?;
            return Some(Decimal::from(i as i64) + fraction);
        }
        cumulative = next;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_npv_basic() {
        let cfs = vec![dec!(-1000), dec!(300), dec!(400), dec!(500)];
        let result = npv(dec!(0.10), &cfs).unwrap();
        // NPV at 10%: -1000 + 300/1.1 + 400/1.21 + 500/1.331 ≈ -21.04
        assert!((result - dec!(-21.04)).abs() < dec!(1.0));
    }

    #[test]
    fn test_npv_zero_rate() {
        let cfs = vec![dec!(-100), dec!(50), dec!(50), dec!(50)];
        let result = npv(dec!(0.0), &cfs).unwrap();
        assert_eq!(result, dec!(50));
    }

    #[test]
    fn test_npv_rejects_rate_below_minus_one() {
        assert!(npv(dec!(-1), &[dec!(-1), dec!(2)]).is_err());
    }

    #[test]
    fn test_irr_basic() {
        let cfs = vec![dec!(-1000), dec!(400), dec!(400), dec!(400)];
        let result = irr(&cfs, dec!(0.10)).unwrap();
        // IRR should be ~9.7%
        assert!((result - dec!(0.097)).abs() < dec!(0.01));
        let at_irr = npv(result, &cfs).unwrap();
        assert!(at_irr.abs() < dec!(0.001));
    }

    #[test]
    fn test_irr_bad_guess_still_converges() {
        let cfs = vec![dec!(-100), dec!(10), dec!(10), dec!(10), dec!(110)];
        let result = irr(&cfs, dec!(4.5)).unwrap();
        assert!((result - dec!(0.10)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_irr_requires_sign_change() {
        let cfs = vec![dec!(100), dec!(50)];
        assert!(matches!(
            irr(&cfs, dec!(0.1)),
            Err(McenterError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_irr_of_deeply_unprofitable_project() {
        // Recovers only 12M of a 500M outlay; discounting near -99% overflows
        let mut cfs = vec![dec!(-500_000_000)];
        cfs.extend(std::iter::repeat(dec!(1_000_000)).take(12));
        let result = irr(&cfs, dec!(0.05)).unwrap();
        assert!(result > dec!(-0.40) && result < dec!(-0.30), "irr = {result}");
        let at_irr = npv(result, &cfs).unwrap();
        assert!(at_irr.abs() < dec!(100_000), "npv at irr = {at_irr}");
    }

    #[test]
    fn test_npv_overflow_is_an_error() {
        let cfs = vec![dec!(-1), dec!(1_000_000_000_000_000_000_000_000)];
        assert!(matches!(
            npv(dec!(-0.999999), &cfs),
            Err(McenterError::FinancialImpossibility(_))
        ));
    }

    #[test]
    fn test_simple_payback_interpolates() {
        let flows = vec![dec!(400), dec!(400), dec!(400)];
        // 1000 recovered after 2 full years + 200/400 of year 3
        assert_eq!(simple_payback(dec!(1000), &flows), Some(dec!(2.5)));
    }

    #[test]
    fn test_payback_never_reached() {
        let flows = vec![dec!(100), dec!(100)];
        assert_eq!(simple_payback(dec!(1000), &flows), None);
        assert_eq!(discounted_payback(dec!(1000), &flows, dec!(0.05)), None);
    }

    #[test]
    fn test_discounted_payback_longer_than_simple() {
        let flows = vec![dec!(500), dec!(500), dec!(500)];
        let simple = simple_payback(dec!(1000), &flows).unwrap();
        let disc = discounted_payback(dec!(1000), &flows, dec!(0.10)).unwrap();
        assert!(disc > simple);
    }
}
