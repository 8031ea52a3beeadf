use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use personal_finance_core::market::fx::{self, ConversionInput};
use personal_finance_core::Currency;

use crate::input;

/// Arguments for currency conversion
#[derive(Args)]
pub struct FxArgs {
    /// Path to JSON/YAML input file, optionally carrying its own rate table
    #[arg(long)]
    pub input: Option<String>,

    /// Amount to convert
    #[arg(long)]
    pub amount: Option<Decimal>,

    /// Source currency code
    #[arg(long)]
    pub from: Option<Currency>,

    /// Target currency code
    #[arg(long)]
    pub to: Option<Currency>,
}

pub fn run_fx(args: FxArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let conversion_input: ConversionInput = match input::load(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => ConversionInput {
            amount: args.amount.ok_or("--amount is required (or provide --input)")?,
            from: args.from.ok_or("--from is required (or provide --input)")?,
            to: args.to.ok_or("--to is required (or provide --input)")?,
            rates: None,
        },
    };

    let result = fx::calculate_conversion(&conversion_input)?;
    Ok(serde_json::to_value(result)?)
}
