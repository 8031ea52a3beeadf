use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use personal_finance_core::tax::income_tax::{self, Deduction, RegimeComparisonInput, TaxInput};
use personal_finance_core::tax::regime;

use crate::input;

/// Parse `label=amount`, e.g. `80C=150000`.
fn parse_deduction(s: &str) -> Result<Deduction, String> {
    let (label, amount) = s
        .split_once('=')
        .ok_or_else(|| format!("expected LABEL=AMOUNT, got '{s}'"))?;
    let amount: Decimal = amount
        .trim()
        .parse()
        .map_err(|e| format!("invalid amount in '{s}': {e}"))?;
    Ok(Deduction {
        label: label.trim().to_string(),
        amount,
    })
}

/// Arguments for a single-regime tax calculation
#[derive(Args)]
pub struct TaxArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Gross annual income
    #[arg(long)]
    pub income: Option<Decimal>,

    /// Regime name
    #[arg(long, default_value = "new")]
    pub regime: String,

    /// Itemised deduction as LABEL=AMOUNT (repeatable)
    #[arg(long = "deduction", value_parser = parse_deduction)]
    pub deductions: Vec<Deduction>,
}

/// Arguments for a regime comparison
#[derive(Args)]
pub struct TaxCompareArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Gross annual income
    #[arg(long)]
    pub income: Option<Decimal>,

    /// Regime to include (repeatable; all built-in regimes when omitted)
    #[arg(long = "regime")]
    pub regimes: Vec<String>,

    /// Itemised deduction as LABEL=AMOUNT (repeatable)
    #[arg(long = "deduction", value_parser = parse_deduction)]
    pub deductions: Vec<Deduction>,
}

/// Arguments for listing regimes
#[derive(Args)]
pub struct RegimesArgs {
    /// Show only this regime
    #[arg(long)]
    pub name: Option<String>,
}

pub fn run_tax(args: TaxArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let tax_input: TaxInput = match input::load(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => TaxInput {
            gross_income: args.income.ok_or("--income is required (or provide --input)")?,
            regime: args.regime,
            deductions: args.deductions,
            custom_regimes: Vec::new(),
        },
    };

    let result = income_tax::calculate_tax(&tax_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_tax_compare(args: TaxCompareArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let compare_input: RegimeComparisonInput = match input::load(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => RegimeComparisonInput {
            gross_income: args.income.ok_or("--income is required (or provide --input)")?,
            regimes: args.regimes,
            deductions: args.deductions,
            custom_regimes: Vec::new(),
        },
    };

    let result = income_tax::calculate_regime_comparison(&compare_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_regimes(args: RegimesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    match args.name {
        Some(name) => Ok(serde_json::to_value(regime::find_regime(&name, &[])?)?),
        None => Ok(serde_json::to_value(regime::builtin_regimes())?),
    }
}
