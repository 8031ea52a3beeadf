use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use personal_finance_core::debt::payoff::{
    self, Debt, PayoffInput, PayoffMethod, PayoffStrategy,
};

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StrategyArg {
    Minimum,
    Snowball,
    Avalanche,
}

impl From<StrategyArg> for PayoffStrategy {
    fn from(s: StrategyArg) -> Self {
        match s {
            StrategyArg::Minimum => PayoffStrategy::Minimum,
            StrategyArg::Snowball => PayoffStrategy::Snowball,
            StrategyArg::Avalanche => PayoffStrategy::Avalanche,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MethodArg {
    /// Annuity formula between payoff events (fractional months)
    ClosedForm,
    /// Discrete monthly simulation (whole months)
    MonthByMonth,
}

impl From<MethodArg> for PayoffMethod {
    fn from(m: MethodArg) -> Self {
        match m {
            MethodArg::ClosedForm => PayoffMethod::ClosedForm,
            MethodArg::MonthByMonth => PayoffMethod::MonthByMonth,
        }
    }
}

/// Parse `id:balance:rate:minimum`, e.g. `card:5000:18:150`.
fn parse_debt(s: &str) -> Result<Debt, String> {
    let parts: Vec<&str> = s.split(':').map(str::trim).collect();
    let [id, balance, rate, minimum] = parts.as_slice() else {
        return Err(format!("expected ID:BALANCE:RATE:MINIMUM, got '{s}'"));
    };
    let number = |field: &str, raw: &str| -> Result<Decimal, String> {
        raw.parse()
            .map_err(|e| format!("invalid {field} '{raw}' in '{s}': {e}"))
    };
    Ok(Debt {
        id: id.to_string(),
        balance: number("balance", *balance)?,
        annual_rate_pct: number("rate", *rate)?,
        minimum_payment: number("minimum", *minimum)?,
    })
}

/// Debts and budget shared by `debt` and `debt-compare`
#[derive(Args)]
pub struct DebtPlanArgs {
    /// Path to JSON/YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Debt as ID:BALANCE:RATE:MINIMUM (repeatable)
    #[arg(long = "debt", value_parser = parse_debt)]
    pub debts: Vec<Debt>,

    /// Extra amount available each month on top of the minimums
    #[arg(long, default_value = "0")]
    pub extra: Decimal,

    /// How payoff time is computed
    #[arg(long, default_value = "closed-form")]
    pub method: MethodArg,

    /// First payment month (YYYY-MM-DD); enables the debt-free date
    #[arg(long)]
    pub start_date: Option<chrono::NaiveDate>,
}

/// Arguments for a single-strategy payoff simulation
#[derive(Args)]
pub struct DebtArgs {
    #[command(flatten)]
    pub plan: DebtPlanArgs,

    /// Payoff ordering
    #[arg(long, default_value = "avalanche")]
    pub strategy: StrategyArg,
}

/// Arguments for a strategy comparison
#[derive(Args)]
pub struct DebtCompareArgs {
    #[command(flatten)]
    pub plan: DebtPlanArgs,
}

fn payoff_input(
    plan: DebtPlanArgs,
    strategy: PayoffStrategy,
) -> Result<PayoffInput, Box<dyn std::error::Error>> {
    if let Some(parsed) = input::load::<PayoffInput>(plan.input.as_deref())? {
        return Ok(parsed);
    }
    if plan.debts.is_empty() {
        return Err("at least one --debt is required (or provide --input)".into());
    }
    Ok(PayoffInput {
        debts: plan.debts,
        extra_monthly_budget: plan.extra,
        strategy,
        method: plan.method.into(),
        start_date: plan.start_date,
    })
}

pub fn run_debt(args: DebtArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let payoff_input = payoff_input(args.plan, args.strategy.into())?;
    let result = payoff::simulate_with(&payoff_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_debt_compare(args: DebtCompareArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let payoff_input = payoff_input(args.plan, PayoffStrategy::default())?;
    let result = payoff::compare_strategies(&payoff_input)?;
    Ok(serde_json::to_value(result)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_debt() {
        let d = parse_debt("card:5000:18:150").unwrap();
        assert_eq!(d.id, "card");
        assert_eq!(d.balance, dec!(5000));
        assert_eq!(d.annual_rate_pct, dec!(18));
        assert_eq!(d.minimum_payment, dec!(150));
    }

    #[test]
    fn test_parse_debt_rejects_bad_shapes() {
        assert!(parse_debt("card:5000:18").is_err());
        assert!(parse_debt("card:5000:18:150:1").is_err());
        assert!(parse_debt("card:lots:18:150").is_err());
    }
}
