use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::FinanceError;
use crate::tax::regime::{find_regime, TaxRegime};
use crate::types::{with_metadata, ComputationOutput, Money, Percent};
use crate::FinanceResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// An itemised deduction (e.g. 80C, 80D, 24(b), NPS).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deduction {
    pub label: String,
    pub amount: Money,
}

/// Request shape used by the CLI and bindings: the regime is chosen by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxInput {
    pub gross_income: Money,
    pub regime: String,
    #[serde(default)]
    pub deductions: Vec<Deduction>,
    /// Extra regime tables; a custom table shadows a built-in of the same name.
    #[serde(default)]
    pub custom_regimes: Vec<TaxRegime>,
}

/// Regime comparison request: every named regime (all built-ins plus any
/// custom tables when `regimes` is empty) is evaluated on the same income.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeComparisonInput {
    pub gross_income: Money,
    #[serde(default)]
    pub regimes: Vec<String>,
    #[serde(default)]
    pub deductions: Vec<Deduction>,
    #[serde(default)]
    pub custom_regimes: Vec<TaxRegime>,
}

/// Tax attributable to a single band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BracketTax {
    pub lower_bound: Money,
    pub upper_bound: Option<Money>,
    pub rate_pct: Percent,
    pub taxed_amount: Money,
    pub tax: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxResult {
    pub regime: String,
    pub gross_income: Money,
    pub deductions_applied: Money,
    pub taxable_income: Money,
    pub base_tax: Money,
    pub cess: Money,
    pub total_tax: Money,
    pub net_income: Money,
    pub effective_rate_pct: Percent,
    pub marginal_rate_pct: Percent,
    pub bracket_breakdown: Vec<BracketTax>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeComparison {
    pub results: Vec<TaxResult>,
    pub cheapest_regime: String,
    pub savings_vs_costliest: Money,
}

// ---------------------------------------------------------------------------
// Core functions
// ---------------------------------------------------------------------------

/// Progressive income tax under `regime`.
///
/// Each band's slice of taxable income is taxed at that band's rate only.
/// `deductions` are ignored (with a warning) when the regime does not allow
/// them.
pub fn compute_tax(
    gross_income: Money,
    regime: &TaxRegime,
    deductions: Money,
) -> FinanceResult<ComputationOutput<TaxResult>> {
    let mut warnings: Vec<String> = Vec::new();
    validate_tax_input(gross_income, regime, deductions)?;

    if !regime.allows_deductions && deductions > Decimal::ZERO {
        debug!(regime = %regime.name, %deductions, "regime ignores deductions");
        warnings.push(format!(
            "Regime '{}' does not allow deductions; {} ignored.",
            regime.name, deductions
        ));
    }
    if regime.allows_deductions && deductions > gross_income {
        warn!(%gross_income, %deductions, "deductions exceed gross income");
        warnings.push("Deductions exceed gross income; taxable income floored at zero.".into());
    }

    let result = tax_under_regime(gross_income, regime, deductions);

    Ok(with_metadata(
        "Progressive slab taxation: each band taxed at its own rate, cess levied on base tax",
        &serde_json::json!({
            "regime": regime.name,
            "gross_income": gross_income.to_string(),
            "deductions": deductions.to_string(),
            "cess_rate_pct": regime.cess_rate_pct.to_string(),
            "allows_deductions": regime.allows_deductions,
        }),
        warnings,
        result,
    ))
}

/// Resolve the regime by name and compute the tax for a [`TaxInput`].
pub fn calculate_tax(input: &TaxInput) -> FinanceResult<ComputationOutput<TaxResult>> {
    let regime = find_regime(&input.regime, &input.custom_regimes)?;
    let deductions = total_deductions(&input.deductions)?;
    compute_tax(input.gross_income, &regime, deductions)
}

/// Evaluate the same income under several regimes and report the cheapest.
pub fn compare_regimes(
    gross_income: Money,
    regimes: &[TaxRegime],
    deductions: Money,
) -> FinanceResult<ComputationOutput<RegimeComparison>> {
    if regimes.is_empty() {
        return Err(FinanceError::invalid(
            "regimes",
            "At least one regime is required for a comparison",
        ));
    }

    let mut warnings: Vec<String> = Vec::new();
    let mut results = Vec::with_capacity(regimes.len());
    for regime in regimes {
        let output = compute_tax(gross_income, regime, deductions)?;
        warnings.extend(output.warnings);
        results.push(output.result);
    }

    // min_by_key keeps the first of equal totals, so ties go to the earlier regime
    let cheapest = results
        .iter()
        .min_by_key(|r| r.total_tax)
        .map(|r| (r.regime.clone(), r.total_tax))
        .unwrap_or_default();
    let costliest = results
        .iter()
        .map(|r| r.total_tax)
        .max()
        .unwrap_or_default();

    let comparison = RegimeComparison {
        results,
        cheapest_regime: cheapest.0,
        savings_vs_costliest: costliest - cheapest.1,
    };

    Ok(with_metadata(
        "Side-by-side progressive tax under each regime on identical income and deductions",
        &serde_json::json!({
            "gross_income": gross_income.to_string(),
            "deductions": deductions.to_string(),
            "regimes": regimes.iter().map(|r| r.name.clone()).collect::<Vec<_>>(),
        }),
        warnings,
        comparison,
    ))
}

/// Resolve names and run [`compare_regimes`] for a [`RegimeComparisonInput`].
pub fn calculate_regime_comparison(
    input: &RegimeComparisonInput,
) -> FinanceResult<ComputationOutput<RegimeComparison>> {
    let regimes: Vec<TaxRegime> = if input.regimes.is_empty() {
        let mut all = input.custom_regimes.clone();
        for builtin in crate::tax::regime::builtin_regimes() {
            if !all.iter().any(|r| r.name.eq_ignore_ascii_case(&builtin.name)) {
                all.push(builtin);
            }
        }
        all
    } else {
        input
            .regimes
            .iter()
            .map(|name| find_regime(name, &input.custom_regimes))
            .collect::<FinanceResult<_>>()?
    };
    let deductions = total_deductions(&input.deductions)?;
    compare_regimes(input.gross_income, &regimes, deductions)
}

/// Sum itemised deductions, rejecting negative amounts.
pub fn total_deductions(items: &[Deduction]) -> FinanceResult<Money> {
    items.iter().try_fold(Decimal::ZERO, |acc, item| {
        if item.amount < Decimal::ZERO {
            Err(FinanceError::invalid(
                format!("deductions.{}", item.label),
                "Deduction amounts cannot be negative",
            ))
        } else {
            Ok(acc + item.amount)
        }
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn tax_under_regime(gross_income: Money, regime: &TaxRegime, deductions: Money) -> TaxResult {
    let deductions_applied = if regime.allows_deductions {
        deductions.min(gross_income)
    } else {
        Decimal::ZERO
    };
    let taxable_income = (gross_income - deductions_applied).max(Decimal::ZERO);

    let mut base_tax = Decimal::ZERO;
    let mut marginal_rate_pct = regime
        .brackets
        .first()
        .map(|b| b.rate_pct)
        .unwrap_or_default();
    let mut bracket_breakdown = Vec::new();
    let mut lower = Decimal::ZERO;

    for bracket in &regime.brackets {
        if taxable_income <= lower {
            break;
        }
        let top = match bracket.upper_bound {
            Some(upper) => taxable_income.min(upper),
            None => taxable_income,
        };
        let taxed_amount = top - lower;
        let tax = taxed_amount * bracket.rate_pct / dec!(100);
        base_tax += tax;
        marginal_rate_pct = bracket.rate_pct;
        bracket_breakdown.push(BracketTax {
            lower_bound: lower,
            upper_bound: bracket.upper_bound,
            rate_pct: bracket.rate_pct,
            taxed_amount,
            tax,
        });

        match bracket.upper_bound {
            Some(upper) => lower = upper,
            None => break,
        }
    }

    let cess = base_tax * regime.cess_rate_pct / dec!(100);
    let total_tax = base_tax + cess;
    let effective_rate_pct = if gross_income.is_zero() {
        Decimal::ZERO
    } else {
        total_tax / gross_income * dec!(100)
    };

    TaxResult {
        regime: regime.name.clone(),
        gross_income,
        deductions_applied,
        taxable_income,
        base_tax,
        cess,
        total_tax,
        net_income: gross_income - total_tax,
        effective_rate_pct,
        marginal_rate_pct,
        bracket_breakdown,
    }
}

fn validate_tax_input(
    gross_income: Money,
    regime: &TaxRegime,
    deductions: Money,
) -> FinanceResult<()> {
    if gross_income < Decimal::ZERO {
        return Err(FinanceError::InvalidInput {
            field: "gross_income".into(),
            reason: "Gross income cannot be negative".into(),
        });
    }
    if deductions < Decimal::ZERO {
        return Err(FinanceError::InvalidInput {
            field: "deductions".into(),
            reason: "Deductions cannot be negative".into(),
        });
    }
    regime.validate()
}
