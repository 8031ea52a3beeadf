//! Tax regimes as data.
//!
//! A regime is an ordered, contiguous bracket table plus a cess rate and a
//! flag saying whether itemised deductions reduce taxable income. Adding a
//! fiscal year or a new regime means adding a table, never new branches in
//! the calculator.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::FinanceError;
use crate::types::{Money, Percent};
use crate::FinanceResult;

/// One income band. The lower bound is the previous band's upper bound
/// (zero for the first band); `None` marks the open-ended top band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub upper_bound: Option<Money>,
    pub rate_pct: Percent,
}

impl TaxBracket {
    pub fn up_to(upper_bound: Money, rate_pct: Percent) -> Self {
        TaxBracket {
            upper_bound: Some(upper_bound),
            rate_pct,
        }
    }

    pub fn above(rate_pct: Percent) -> Self {
        TaxBracket {
            upper_bound: None,
            rate_pct,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRegime {
    pub name: String,
    pub brackets: Vec<TaxBracket>,
    pub cess_rate_pct: Percent,
    pub allows_deductions: bool,
}

impl TaxRegime {
    /// India, new regime, FY 2023-24.
    pub fn india_new() -> Self {
        TaxRegime {
            name: "new".into(),
            brackets: vec![
                TaxBracket::up_to(dec!(300_000), dec!(0)),
                TaxBracket::up_to(dec!(600_000), dec!(5)),
                TaxBracket::up_to(dec!(900_000), dec!(10)),
                TaxBracket::up_to(dec!(1_200_000), dec!(15)),
                TaxBracket::up_to(dec!(1_500_000), dec!(20)),
                TaxBracket::above(dec!(30)),
            ],
            cess_rate_pct: dec!(4),
            allows_deductions: false,
        }
    }

    /// India, old regime with Chapter VI-A deductions.
    pub fn india_old() -> Self {
        TaxRegime {
            name: "old".into(),
            brackets: vec![
                TaxBracket::up_to(dec!(250_000), dec!(0)),
                TaxBracket::up_to(dec!(500_000), dec!(5)),
                TaxBracket::up_to(dec!(1_000_000), dec!(20)),
                TaxBracket::above(dec!(30)),
            ],
            cess_rate_pct: dec!(4),
            allows_deductions: true,
        }
    }

    /// Check the table is ascending, contiguous and covers `[0, ∞)`.
    pub fn validate(&self) -> FinanceResult<()> {
        if self.name.trim().is_empty() {
            return Err(FinanceError::invalid("name", "Regime name must not be empty"));
        }
        if self.brackets.is_empty() {
            return Err(FinanceError::invalid(
                "brackets",
                format!("Regime '{}' has no brackets", self.name),
            ));
        }
        if self.cess_rate_pct < Decimal::ZERO || self.cess_rate_pct > dec!(100) {
            return Err(FinanceError::invalid(
                "cess_rate_pct",
                "Cess rate must be between 0 and 100 percent",
            ));
        }

        let last = self.brackets.len() - 1;
        let mut lower = Decimal::ZERO;
        for (i, bracket) in self.brackets.iter().enumerate() {
            if bracket.rate_pct < Decimal::ZERO || bracket.rate_pct > dec!(100) {
                return Err(FinanceError::invalid(
                    format!("brackets[{i}].rate_pct"),
                    "Bracket rate must be between 0 and 100 percent",
                ));
            }
            match bracket.upper_bound {
                Some(upper) if i == last => {
                    return Err(FinanceError::invalid(
                        format!("brackets[{i}].upper_bound"),
                        format!("Top bracket must be open-ended, found upper bound {upper}"),
                    ));
                }
                Some(upper) if upper <= lower => {
                    return Err(FinanceError::invalid(
                        format!("brackets[{i}].upper_bound"),
                        format!("Upper bound {upper} must exceed the previous bound {lower}"),
                    ));
                }
                Some(upper) => lower = upper,
                None if i != last => {
                    return Err(FinanceError::invalid(
                        format!("brackets[{i}].upper_bound"),
                        "Only the top bracket may be open-ended",
                    ));
                }
                None => {}
            }
        }
        Ok(())
    }
}

/// The regimes shipped with the library.
pub fn builtin_regimes() -> Vec<TaxRegime> {
    vec![TaxRegime::india_new(), TaxRegime::india_old()]
}

/// Look a regime up by name, preferring caller-supplied tables over the
/// built-in ones.
pub fn find_regime(name: &str, custom: &[TaxRegime]) -> FinanceResult<TaxRegime> {
    custom
        .iter()
        .cloned()
        .chain(builtin_regimes())
        .find(|r| r.name.eq_ignore_ascii_case(name.trim()))
        .ok_or_else(|| FinanceError::UnknownRegime(name.to_string()))
}
