use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use personal_finance_core::deposit::fixed_deposit::{self, CompoundingFrequency, DepositInput};

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FrequencyArg {
    Annually,
    HalfYearly,
    Quarterly,
    Monthly,
}

impl From<FrequencyArg> for CompoundingFrequency {
    fn from(f: FrequencyArg) -> Self {
        match f {
            FrequencyArg::Annually => CompoundingFrequency::Annually,
            FrequencyArg::HalfYearly => CompoundingFrequency::HalfYearly,
            FrequencyArg::Quarterly => CompoundingFrequency::Quarterly,
            FrequencyArg::Monthly => CompoundingFrequency::Monthly,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum DepositView {
    /// Maturity amount, interest and effective annual rate
    #[default]
    Maturity,
    /// Year-by-year opening, interest and closing balances
    Breakdown,
    /// Compound growth against simple interest
    Compare,
}

/// Arguments for fixed-deposit calculations
#[derive(Args)]
pub struct DepositArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Amount deposited
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate in percent
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Term in years (fractions allowed)
    #[arg(long)]
    pub years: Option<Decimal>,

    /// How often interest is credited
    #[arg(long, default_value = "quarterly")]
    pub compounding: FrequencyArg,

    /// What to report
    #[arg(long, default_value = "maturity")]
    pub view: DepositView,
}

pub fn run_deposit(args: DepositArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let deposit_input: DepositInput = match input::load(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => DepositInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_rate_pct: args.rate.ok_or("--rate is required (or provide --input)")?,
            years: args.years.ok_or("--years is required (or provide --input)")?,
            compounding: args.compounding.into(),
        },
    };

    let value = match args.view {
        DepositView::Maturity => serde_json::to_value(fixed_deposit::compute_deposit(&deposit_input)?)?,
        DepositView::Breakdown => serde_json::to_value(fixed_deposit::yearly_breakdown(&deposit_input)?)?,
        DepositView::Compare => {
            serde_json::to_value(fixed_deposit::compare_simple_interest(&deposit_input)?)?
        }
    };
    Ok(value)
}
