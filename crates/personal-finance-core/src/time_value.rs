use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::FinanceError;
use crate::types::{Money, Percent, Rate};
use crate::FinanceResult;

pub const MONTHS_PER_YEAR: u32 = 12;

/// Decimal places money is carried at inside iterative schedules, so that
/// additions and subtractions between portions stay exact.
pub const MONEY_DP: u32 = 12;

/// Convert an annual percentage into a per-period decimal rate.
pub fn periodic_rate(annual_pct: Percent, periods_per_year: u32) -> Rate {
    annual_pct / dec!(100) / Decimal::from(periods_per_year)
}

/// Monthly decimal rate for an annual percentage (8.5 -> 0.0070833..).
pub fn monthly_rate(annual_pct: Percent) -> Rate {
    periodic_rate(annual_pct, MONTHS_PER_YEAR)
}

/// Compute (1 + r)^n via iterative multiplication (avoids Decimal::powd drift).
pub fn compound(rate: Rate, n: u32) -> FinanceResult<Decimal> {
    let factor = Decimal::ONE + rate;
    let mut result = Decimal::ONE;
    for _ in 0..n {
        result = result
            .checked_mul(factor)
            .ok_or_else(|| FinanceError::overflow(format!("(1 + {rate})^{n}")))?;
    }
    Ok(result)
}

/// (1 + r)^t for a possibly fractional number of periods.
pub fn compound_factor(rate: Rate, periods: Decimal) -> FinanceResult<Decimal> {
    if periods.fract().is_zero() {
        if let Some(n) = periods.to_u32() {
            return compound(rate, n);
        }
    }
    (Decimal::ONE + rate)
        .checked_powd(periods)
        .ok_or_else(|| FinanceError::overflow(format!("(1 + {rate})^{periods}")))
}

/// Level payment that retires `present_value` over `nper` periods.
///
/// Returned as a positive amount, unlike the spreadsheet PMT convention.
pub fn pmt(rate: Rate, nper: u32, present_value: Money) -> FinanceResult<Money> {
    if nper == 0 {
        return Err(FinanceError::InvalidInput {
            field: "nper".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }

    if rate.is_zero() {
        return Ok(present_value / Decimal::from(nper));
    }

    let factor = compound(rate, nper)?;
    let denominator = factor - Decimal::ONE;
    if denominator.is_zero() {
        return Err(FinanceError::DivisionByZero {
            context: "PMT annuity factor".into(),
        });
    }

    present_value
        .checked_mul(rate)
        .and_then(|v| v.checked_mul(factor))
        .map(|v| v / denominator)
        .ok_or_else(|| FinanceError::overflow("PMT numerator"))
}

/// Balance left after `periods` of fixed `payment` on `balance` at `rate`.
///
/// `B(1+r)^t - P((1+r)^t - 1)/r`, or `B - P*t` at zero rate. May go negative
/// when the payment would have retired the balance earlier.
pub fn balance_after(
    balance: Money,
    rate: Rate,
    payment: Money,
    periods: Decimal,
) -> FinanceResult<Money> {
    if rate.is_zero() {
        return Ok(balance - payment * periods);
    }
    let growth = compound_factor(rate, periods)?;
    let grown = balance
        .checked_mul(growth)
        .ok_or_else(|| FinanceError::overflow("balance growth"))?;
    let paid = payment
        .checked_mul(growth - Decimal::ONE)
        .ok_or_else(|| FinanceError::overflow("payment accumulation"))?
        / rate;
    Ok(grown - paid)
}

/// Periods needed to retire `balance` with a fixed `payment`.
///
/// `-ln(1 - B*r/P) / ln(1 + r)`, or `B/P` at zero rate. Returns `None` when the
/// payment never catches up with the interest (`P <= B*r`) or is not positive.
pub fn periods_to_repay(balance: Money, rate: Rate, payment: Money) -> Option<Decimal> {
    if balance <= Decimal::ZERO {
        return Some(Decimal::ZERO);
    }
    if payment <= Decimal::ZERO {
        return None;
    }
    if rate.is_zero() {
        return Some(balance / payment);
    }

    let interest = balance.checked_mul(rate)?;
    if payment <= interest {
        return None;
    }

    let numerator = (Decimal::ONE - interest / payment).checked_ln()?;
    let denominator = (Decimal::ONE + rate).checked_ln()?;
    if denominator.is_zero() {
        return None;
    }
    Some(-numerator / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_monthly_rate() {
        assert_eq!(monthly_rate(dec!(12)), dec!(0.01));
        assert_eq!(periodic_rate(dec!(8), 4), dec!(0.02));
    }

    #[test]
    fn test_compound_integer_matches_powd() {
        let iterative = compound(dec!(0.05), 10).unwrap();
        // 1.05^10 = 1.628894626777...
        assert!((iterative - dec!(1.6288946267774)).abs() < dec!(0.0000001));
        let generic = compound_factor(dec!(0.05), dec!(10)).unwrap();
        assert_eq!(iterative, generic);
    }

    #[test]
    fn test_compound_factor_fractional() {
        let half = compound_factor(dec!(0.21), dec!(0.5)).unwrap();
        assert!((half - dec!(1.1)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_compound_overflow_is_an_error() {
        let result = compound(dec!(10), 100);
        assert!(matches!(result, Err(FinanceError::Overflow { .. })));
    }

    #[test]
    fn test_pmt_basic() {
        // 100,000 over 12 months at 1% per month ≈ 8,884.88
        let payment = pmt(dec!(0.01), 12, dec!(100_000)).unwrap();
        assert!((payment - dec!(8884.88)).abs() < dec!(0.01));
    }

    #[test]
    fn test_pmt_zero_rate() {
        assert_eq!(pmt(Decimal::ZERO, 120, dec!(120_000)).unwrap(), dec!(1000));
    }

    #[test]
    fn test_pmt_zero_periods() {
        assert!(matches!(
            pmt(dec!(0.01), 0, dec!(1000)),
            Err(FinanceError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_periods_to_repay_inverts_pmt() {
        let payment = pmt(dec!(0.01), 24, dec!(10_000)).unwrap();
        let n = periods_to_repay(dec!(10_000), dec!(0.01), payment).unwrap();
        assert!((n - dec!(24)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_periods_to_repay_non_terminating() {
        // 1% of 10,000 is 100 of interest per month; 100 never reduces it.
        assert_eq!(periods_to_repay(dec!(10_000), dec!(0.01), dec!(100)), None);
        assert_eq!(periods_to_repay(dec!(10_000), dec!(0.01), dec!(0)), None);
    }

    #[test]
    fn test_balance_after_reaches_zero_at_payoff_time() {
        let n = periods_to_repay(dec!(5000), dec!(0.015), dec!(300)).unwrap();
        let left = balance_after(dec!(5000), dec!(0.015), dec!(300), n).unwrap();
        assert!(left.abs() < dec!(0.05));
    }

    #[test]
    fn test_balance_after_zero_rate() {
        let left = balance_after(dec!(1000), Decimal::ZERO, dec!(100), dec!(2.5)).unwrap();
        assert_eq!(left, dec!(750));
    }
}
