use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use personal_finance_core::amortization::loan::{self, LoanInput, LoanKind};

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LoanKindArg {
    Home,
    Car,
    Personal,
}

impl From<LoanKindArg> for LoanKind {
    fn from(kind: LoanKindArg) -> Self {
        match kind {
            LoanKindArg::Home => LoanKind::Home,
            LoanKindArg::Car => LoanKind::Car,
            LoanKindArg::Personal => LoanKind::Personal,
        }
    }
}

/// Arguments for the EMI calculation
#[derive(Args)]
pub struct EmiArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Amount borrowed
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate in percent (8.5 = 8.5%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Loan tenure in years
    #[arg(long, alias = "tenure")]
    pub years: Option<Decimal>,

    /// Loan product; supplies its typical rate when --rate is omitted
    #[arg(long)]
    pub kind: Option<LoanKindArg>,

    /// Disbursement date (YYYY-MM-DD); dates every schedule entry
    #[arg(long)]
    pub start_date: Option<chrono::NaiveDate>,

    /// Include the month-by-month schedule in the output
    #[arg(long)]
    pub schedule: bool,
}

pub fn run_emi(args: EmiArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan_input: LoanInput = match input::load(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => {
            let rate = match (args.rate, args.kind) {
                (Some(rate), _) => rate,
                (None, Some(kind)) => LoanKind::from(kind).default_rate_pct(),
                (None, None) => return Err("--rate or --kind is required (or provide --input)".into()),
            };
            LoanInput {
                principal: args
                    .principal
                    .ok_or("--principal is required (or provide --input)")?,
                annual_rate_pct: rate,
                tenure_years: args.years.ok_or("--years is required (or provide --input)")?,
                start_date: args.start_date,
            }
        }
    };

    let result = loan::compute_amortization(&loan_input)?;
    let mut value = serde_json::to_value(result)?;
    if !args.schedule {
        if let Some(result) = value.get_mut("result").and_then(Value::as_object_mut) {
            result.remove("schedule");
        }
    }
    Ok(value)
}
