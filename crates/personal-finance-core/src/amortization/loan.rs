use chrono::{Months, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::FinanceError;
use crate::time_value::{self, MONEY_DP, MONTHS_PER_YEAR};
use crate::types::{with_metadata, ComputationOutput, Money, Percent, Years};
use crate::FinanceResult;

/// Longest loan the calculator accepts (100 years of monthly payments).
pub const MAX_TENURE_MONTHS: u32 = 1200;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Loan products offered on the EMI page, each with a typical annual rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanKind {
    Home,
    Car,
    Personal,
}

impl LoanKind {
    pub fn default_rate_pct(self) -> Percent {
        match self {
            LoanKind::Home => dec!(8.5),
            LoanKind::Car => dec!(9.0),
            LoanKind::Personal => dec!(12.0),
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            LoanKind::Home => "Tax benefits available under Section 80C & 24(b)",
            LoanKind::Car => "Shorter tenure recommended for better rates",
            LoanKind::Personal => "No collateral required, higher interest rates",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanInput {
    pub principal: Money,
    pub annual_rate_pct: Percent,
    pub tenure_years: Years,
    /// Date of the loan disbursement. When present, each schedule entry is
    /// dated one month after the previous one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationEntry {
    pub month: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    pub payment: Money,
    pub principal_portion: Money,
    pub interest_portion: Money,
    pub remaining_balance: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationOutput {
    pub emi: Money,
    pub total_payment: Money,
    pub total_interest: Money,
    pub principal_share_pct: Percent,
    pub interest_share_pct: Percent,
    pub schedule: Vec<AmortizationEntry>,
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

/// Compute the equated monthly instalment of a loan and its full
/// month-by-month amortization schedule.
///
/// The final entry absorbs any rounding drift so the balance ends at exactly
/// zero; every entry keeps `principal_portion + interest_portion == payment`.
pub fn compute_amortization(
    input: &LoanInput,
) -> FinanceResult<ComputationOutput<AmortizationOutput>> {
    let mut warnings: Vec<String> = Vec::new();

    let periods = validate_loan_input(input)?;
    let rate = time_value::monthly_rate(input.annual_rate_pct);
    debug!(
        principal = %input.principal,
        annual_rate_pct = %input.annual_rate_pct,
        periods,
        "computing amortization"
    );

    if rate.is_zero() {
        debug!("zero-interest loan, EMI is principal / periods");
        warnings.push(
            "Zero interest rate: EMI is the principal divided evenly across all months.".into(),
        );
    }

    let emi = time_value::pmt(rate, periods, input.principal)?.round_dp(MONEY_DP);

    let mut schedule = Vec::with_capacity(periods as usize);
    let mut balance = input.principal;

    for month in 1..=periods {
        let interest_portion = balance
            .checked_mul(rate)
            .ok_or_else(|| FinanceError::overflow("monthly interest"))?
            .round_dp(MONEY_DP);
        let principal_portion = emi - interest_portion;
        balance -= principal_portion;

        if month == periods {
            balance = Decimal::ZERO;
        }

        let date = match input.start_date {
            Some(start) => Some(start.checked_add_months(Months::new(month)).ok_or_else(
                || FinanceError::invalid("start_date", "Schedule runs past the supported date range"),
            )?),
            None => None,
        };

        schedule.push(AmortizationEntry {
            month,
            date,
            payment: emi,
            principal_portion,
            interest_portion,
            remaining_balance: balance.max(Decimal::ZERO),
        });
    }

    let total_payment = emi
        .checked_mul(Decimal::from(periods))
        .ok_or_else(|| FinanceError::overflow("total payment"))?;
    let total_interest = total_payment - input.principal;
    let principal_share_pct = share_pct(input.principal, total_payment)?;
    let interest_share_pct = share_pct(total_interest, total_payment)?;

    if total_interest > input.principal {
        warnings.push(format!(
            "Total interest ({}) exceeds the amount borrowed; consider a shorter tenure.",
            total_interest.round_dp(2)
        ));
    }

    let output = AmortizationOutput {
        emi,
        total_payment,
        total_interest,
        principal_share_pct,
        interest_share_pct,
        schedule,
    };

    Ok(with_metadata(
        "Equated Monthly Instalment: P*r*(1+r)^n / ((1+r)^n - 1), reducing-balance amortization",
        &serde_json::json!({
            "principal": input.principal.to_string(),
            "annual_rate_pct": input.annual_rate_pct.to_string(),
            "tenure_years": input.tenure_years.to_string(),
            "periods": periods,
            "monthly_rate": rate.to_string(),
        }),
        warnings,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn share_pct(part: Money, total: Money) -> FinanceResult<Percent> {
    part.checked_div(total)
        .ok_or_else(|| FinanceError::DivisionByZero {
            context: "share of total payment".into(),
        })?
        .checked_mul(dec!(100))
        .ok_or_else(|| FinanceError::overflow("share of total payment"))
}

/// Validate the loan and return its number of monthly periods.
fn validate_loan_input(input: &LoanInput) -> FinanceResult<u32> {
    if input.principal <= Decimal::ZERO {
        return Err(FinanceError::InvalidInput {
            field: "principal".into(),
            reason: "Principal must be positive".into(),
        });
    }
    if input.annual_rate_pct < Decimal::ZERO {
        return Err(FinanceError::InvalidInput {
            field: "annual_rate_pct".into(),
            reason: "Annual rate cannot be negative".into(),
        });
    }
    if input.tenure_years <= Decimal::ZERO {
        return Err(FinanceError::InvalidInput {
            field: "tenure_years".into(),
            reason: "Tenure must be positive".into(),
        });
    }

    let months = input.tenure_years * Decimal::from(MONTHS_PER_YEAR);
    if !months.fract().is_zero() {
        return Err(FinanceError::InvalidInput {
            field: "tenure_years".into(),
            reason: "Tenure must be a whole number of months".into(),
        });
    }
    match months.to_u32() {
        Some(n) if n > 0 && n <= MAX_TENURE_MONTHS => Ok(n),
        _ => Err(FinanceError::InvalidInput {
            field: "tenure_years".into(),
            reason: format!("Tenure must be between 1 and {MAX_TENURE_MONTHS} months"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn home_loan() -> LoanInput {
        LoanInput {
            principal: dec!(2_500_000),
            annual_rate_pct: dec!(8.5),
            tenure_years: dec!(20),
            start_date: None,
        }
    }

    #[test]
    fn test_emi_home_loan() {
        let result = compute_amortization(&home_loan()).unwrap();
        let out = &result.result;
        // 25 lakh at 8.5% over 20 years ≈ 21,695.58 per month
        assert!((out.emi - dec!(21695.58)).abs() < dec!(0.01));
        assert_eq!(out.schedule.len(), 240);
        assert!((out.total_interest - dec!(2706939.40)).abs() < dec!(1));
    }

    #[test]
    fn test_zero_rate_loan() {
        let input = LoanInput {
            principal: dec!(120_000),
            annual_rate_pct: Decimal::ZERO,
            tenure_years: dec!(10),
            start_date: None,
        };
        let result = compute_amortization(&input).unwrap();
        assert_eq!(result.result.emi, dec!(1000));
        assert!(result
            .result
            .schedule
            .iter()
            .all(|e| e.interest_portion.is_zero()));
        assert_eq!(result.result.total_interest, Decimal::ZERO);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_schedule_portions_sum_to_payment() {
        let result = compute_amortization(&home_loan()).unwrap();
        for entry in &result.result.schedule {
            assert_eq!(entry.principal_portion + entry.interest_portion, entry.payment);
        }
    }

    #[test]
    fn test_schedule_balance_monotone_and_ends_at_zero() {
        let result = compute_amortization(&home_loan()).unwrap();
        let schedule = &result.result.schedule;
        let mut previous = dec!(2_500_000);
        for entry in schedule {
            assert!(entry.remaining_balance <= previous);
            previous = entry.remaining_balance;
        }
        assert_eq!(schedule.last().unwrap().remaining_balance, Decimal::ZERO);
    }

    #[test]
    fn test_shares_sum_to_hundred() {
        let out = compute_amortization(&home_loan()).unwrap().result;
        assert!((out.principal_share_pct + out.interest_share_pct - dec!(100)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_dated_schedule() {
        let input = LoanInput {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 31),
            tenure_years: dec!(1),
            ..home_loan()
        };
        let out = compute_amortization(&input).unwrap().result;
        assert_eq!(out.schedule[0].date, NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(out.schedule[11].date, NaiveDate::from_ymd_opt(2025, 1, 31));
    }

    #[test]
    fn test_fractional_years_allowed_when_whole_months() {
        let input = LoanInput {
            tenure_years: dec!(1.5),
            ..home_loan()
        };
        let out = compute_amortization(&input).unwrap().result;
        assert_eq!(out.schedule.len(), 18);
    }

    #[test]
    fn test_invalid_principal() {
        let input = LoanInput {
            principal: Decimal::ZERO,
            ..home_loan()
        };
        match compute_amortization(&input) {
            Err(FinanceError::InvalidInput { field, .. }) => assert_eq!(field, "principal"),
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_tenure() {
        for years in [dec!(0), dec!(-1), dec!(0.01), dec!(101)] {
            let input = LoanInput {
                tenure_years: years,
                ..home_loan()
            };
            assert!(
                matches!(
                    compute_amortization(&input),
                    Err(FinanceError::InvalidInput { .. })
                ),
                "tenure {years} should be rejected"
            );
        }
    }

    #[test]
    fn test_negative_rate_rejected() {
        let input = LoanInput {
            annual_rate_pct: dec!(-1),
            ..home_loan()
        };
        assert!(compute_amortization(&input).is_err());
    }

    #[test]
    fn test_loan_kind_defaults() {
        assert_eq!(LoanKind::Home.default_rate_pct(), dec!(8.5));
        assert_eq!(LoanKind::Car.default_rate_pct(), dec!(9.0));
        assert_eq!(LoanKind::Personal.default_rate_pct(), dec!(12.0));
    }

    #[test]
    fn test_rate_above_hundred_percent() {
        let input = LoanInput {
            principal: dec!(10_000),
            annual_rate_pct: dec!(150),
            tenure_years: dec!(1),
            start_date: None,
        };
        let out = compute_amortization(&input).unwrap().result;
        assert!((out.emi - dec!(1651.94)).abs() < dec!(0.01));
        assert_eq!(out.schedule.last().map(|e| e.remaining_balance), Some(Decimal::ZERO));
        assert!((out.principal_share_pct + out.interest_share_pct - dec!(100)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_unrepresentable_growth_is_overflow() {
        let input = LoanInput {
            annual_rate_pct: dec!(1000),
            tenure_years: dec!(100),
            ..home_loan()
        };
        assert!(matches!(
            compute_amortization(&input),
            Err(FinanceError::Overflow { .. })
        ));
    }
}
