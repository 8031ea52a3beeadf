use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::error::FinanceError;
use crate::time_value;
use crate::types::{with_metadata, ComputationOutput, Money, Percent, Years};
use crate::FinanceResult;

const MAX_DEPOSIT_YEARS: Decimal = dec!(100);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How often interest is credited to the deposit.
///
/// Deserializes from either the name (`"quarterly"`) or the number of
/// periods per year (`4`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "FrequencyRepr")]
pub enum CompoundingFrequency {
    Annually,
    HalfYearly,
    Quarterly,
    Monthly,
}

impl CompoundingFrequency {
    pub fn periods_per_year(self) -> u32 {
        match self {
            CompoundingFrequency::Annually => 1,
            CompoundingFrequency::HalfYearly => 2,
            CompoundingFrequency::Quarterly => 4,
            CompoundingFrequency::Monthly => 12,
        }
    }
}

impl TryFrom<u32> for CompoundingFrequency {
    type Error = FinanceError;

    fn try_from(periods: u32) -> Result<Self, Self::Error> {
        match periods {
            1 => Ok(CompoundingFrequency::Annually),
            2 => Ok(CompoundingFrequency::HalfYearly),
            4 => Ok(CompoundingFrequency::Quarterly),
            12 => Ok(CompoundingFrequency::Monthly),
            other => Err(FinanceError::invalid(
                "compounding",
                format!("Compounding must be 1, 2, 4 or 12 periods per year, got {other}"),
            )),
        }
    }
}

impl fmt::Display for CompoundingFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CompoundingFrequency::Annually => "annually",
            CompoundingFrequency::HalfYearly => "half_yearly",
            CompoundingFrequency::Quarterly => "quarterly",
            CompoundingFrequency::Monthly => "monthly",
        };
        f.write_str(label)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FrequencyRepr {
    Periods(u32),
    Name(String),
}

impl TryFrom<FrequencyRepr> for CompoundingFrequency {
    type Error = FinanceError;

    fn try_from(repr: FrequencyRepr) -> Result<Self, Self::Error> {
        match repr {
            FrequencyRepr::Periods(n) => CompoundingFrequency::try_from(n),
            FrequencyRepr::Name(name) => match name.to_ascii_lowercase().replace('-', "_").as_str() {
                "annually" | "annual" | "yearly" => Ok(CompoundingFrequency::Annually),
                "half_yearly" | "halfyearly" | "semi_annually" => {
                    Ok(CompoundingFrequency::HalfYearly)
                }
                "quarterly" => Ok(CompoundingFrequency::Quarterly),
                "monthly" => Ok(CompoundingFrequency::Monthly),
                _ => Err(FinanceError::invalid(
                    "compounding",
                    format!("Unknown compounding frequency '{name}'"),
                )),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositInput {
    pub principal: Money,
    pub annual_rate_pct: Percent,
    pub years: Years,
    pub compounding: CompoundingFrequency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositResult {
    pub maturity_amount: Money,
    pub total_interest: Money,
    pub effective_annual_rate_pct: Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyBreakdownRow {
    pub year: u32,
    pub opening_balance: Money,
    pub interest_earned: Money,
    pub closing_balance: Money,
}

/// The same deposit under simple and compound interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterestComparison {
    pub simple_interest: Money,
    pub simple_maturity: Money,
    pub compound_interest: Money,
    pub compound_maturity: Money,
    pub compounding_advantage: Money,
}

// ---------------------------------------------------------------------------
// Core functions
// ---------------------------------------------------------------------------

/// Maturity value and effective annual rate of a fixed deposit.
pub fn compute_deposit(input: &DepositInput) -> FinanceResult<ComputationOutput<DepositResult>> {
    let mut warnings: Vec<String> = Vec::new();
    validate_deposit_input(input)?;

    let periods_per_year = input.compounding.periods_per_year();
    let rate = time_value::periodic_rate(input.annual_rate_pct, periods_per_year);

    if rate.is_zero() {
        debug!("zero-rate deposit, maturity equals principal");
        warnings.push("Zero interest rate: the deposit matures at its principal.".into());
    }

    let maturity_amount = maturity_after(input, input.years)?;
    let total_interest = maturity_amount - input.principal;
    let effective_annual_rate_pct =
        (time_value::compound(rate, periods_per_year)? - Decimal::ONE) * dec!(100);

    let output = DepositResult {
        maturity_amount,
        total_interest,
        effective_annual_rate_pct,
    };

    Ok(with_metadata(
        "Compound interest: A = P(1 + r/n)^(n*t); effective rate = (1 + r/n)^n - 1",
        &serde_json::json!({
            "principal": input.principal.to_string(),
            "annual_rate_pct": input.annual_rate_pct.to_string(),
            "years": input.years.to_string(),
            "compounding": input.compounding.to_string(),
            "periods_per_year": periods_per_year,
        }),
        warnings,
        output,
    ))
}

/// Year-by-year growth of the deposit.
///
/// Each closing balance is recomputed from the principal rather than rolled
/// forward, so the last row always closes at the maturity amount. A
/// fractional final year gets its own row.
pub fn yearly_breakdown(input: &DepositInput) -> FinanceResult<Vec<YearlyBreakdownRow>> {
    validate_deposit_input(input)?;

    let whole_years = input
        .years
        .trunc()
        .to_u32()
        .ok_or_else(|| FinanceError::invalid("years", "Too many years"))?;

    let mut rows = Vec::with_capacity(whole_years as usize + 1);
    let mut opening = input.principal;

    for year in 1..=whole_years {
        let closing = maturity_after(input, Decimal::from(year))?;
        rows.push(YearlyBreakdownRow {
            year,
            opening_balance: opening,
            interest_earned: closing - opening,
            closing_balance: closing,
        });
        opening = closing;
    }

    if !input.years.fract().is_zero() {
        let closing = maturity_after(input, input.years)?;
        rows.push(YearlyBreakdownRow {
            year: whole_years + 1,
            opening_balance: opening,
            interest_earned: closing - opening,
            closing_balance: closing,
        });
    }

    Ok(rows)
}

/// Compare compound growth with simple interest on the same principal.
pub fn compare_simple_interest(input: &DepositInput) -> FinanceResult<InterestComparison> {
    validate_deposit_input(input)?;

    let simple_interest = (input.annual_rate_pct / dec!(100))
        .checked_mul(input.years)
        .and_then(|growth| input.principal.checked_mul(growth))
        .ok_or_else(|| FinanceError::overflow("simple interest"))?;
    let compound_maturity = maturity_after(input, input.years)?;
    let compound_interest = compound_maturity - input.principal;

    Ok(InterestComparison {
        simple_interest,
        simple_maturity: input.principal + simple_interest,
        compound_interest,
        compound_maturity,
        compounding_advantage: compound_interest - simple_interest,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn maturity_after(input: &DepositInput, years: Years) -> FinanceResult<Money> {
    let periods_per_year = input.compounding.periods_per_year();
    let rate = time_value::periodic_rate(input.annual_rate_pct, periods_per_year);
    let factor = time_value::compound_factor(rate, years * Decimal::from(periods_per_year))?;
    input
        .principal
        .checked_mul(factor)
        .ok_or_else(|| FinanceError::overflow("deposit maturity"))
}

fn validate_deposit_input(input: &DepositInput) -> FinanceResult<()> {
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
    if input.years <= Decimal::ZERO || input.years > MAX_DEPOSIT_YEARS {
        return Err(FinanceError::InvalidInput {
            field: "years".into(),
            reason: format!("Years must be positive and at most {MAX_DEPOSIT_YEARS}"),
        });
    }
    Ok(())
}
