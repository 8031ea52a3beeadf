use chrono::{Months, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, warn};

use crate::debt::schedule;
use crate::error::FinanceError;
use crate::time_value;
use crate::types::{with_metadata, ComputationOutput, Money, Percent, Rate};
use crate::FinanceResult;

/// Longest payoff horizon either method will simulate (100 years).
pub const MAX_PAYOFF_MONTHS: u32 = 1200;

/// Remaining payoff times closer than this are treated as simultaneous.
const SIMULTANEOUS_PAYOFF: Decimal = dec!(0.000000001);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Debt {
    pub id: String,
    pub balance: Money,
    pub annual_rate_pct: Percent,
    pub minimum_payment: Money,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoffStrategy {
    /// Pay only the minimum on every debt; no extra budget, no rollover.
    #[default]
    Minimum,
    /// Smallest balance first.
    Snowball,
    /// Highest interest rate first.
    Avalanche,
}

impl PayoffStrategy {
    pub const ALL: [PayoffStrategy; 3] = [
        PayoffStrategy::Minimum,
        PayoffStrategy::Snowball,
        PayoffStrategy::Avalanche,
    ];

    /// Whether freed payments and the extra budget move down the ordering.
    pub fn rolls_over(self) -> bool {
        !matches!(self, PayoffStrategy::Minimum)
    }

    /// Indices of `debts` in the order this strategy attacks them. Ties keep
    /// the caller's order.
    pub fn order(self, debts: &[Debt]) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..debts.len()).collect();
        match self {
            PayoffStrategy::Minimum => {}
            PayoffStrategy::Snowball => {
                indices.sort_by(|&a, &b| debts[a].balance.cmp(&debts[b].balance))
            }
            PayoffStrategy::Avalanche => indices
                .sort_by(|&a, &b| debts[b].annual_rate_pct.cmp(&debts[a].annual_rate_pct)),
        }
        indices
    }
}

impl fmt::Display for PayoffStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PayoffStrategy::Minimum => "minimum",
            PayoffStrategy::Snowball => "snowball",
            PayoffStrategy::Avalanche => "avalanche",
        };
        f.write_str(label)
    }
}

/// How payoff time is computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoffMethod {
    /// Closed-form annuity formula between payoff events, fractional months.
    #[default]
    ClosedForm,
    /// Discrete monthly simulation with a partial final payment.
    MonthByMonth,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoffInput {
    pub debts: Vec<Debt>,
    #[serde(default)]
    pub extra_monthly_budget: Money,
    #[serde(default)]
    pub strategy: PayoffStrategy,
    #[serde(default)]
    pub method: PayoffMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

/// Outcome for one debt under a strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtPayoff {
    pub id: String,
    /// 1-based position in which the debt was cleared.
    pub payoff_order: u32,
    pub months_to_payoff: Decimal,
    pub interest_paid: Money,
    pub total_paid: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoffResult {
    pub strategy: PayoffStrategy,
    pub method: PayoffMethod,
    pub total_interest_paid: Money,
    pub months_to_payoff: Decimal,
    pub monthly_outlay: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debt_free_date: Option<NaiveDate>,
    /// Per-debt outcomes, in the strategy's attack order.
    pub debts: Vec<DebtPayoff>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyComparison {
    pub strategies: Vec<PayoffResult>,
    pub least_interest: PayoffStrategy,
    pub fastest: PayoffStrategy,
    pub interest_saved_vs_minimum: Money,
}

/// A debt being paid down inside a simulation. Built from a [`Debt`] so the
/// caller's values are never touched.
#[derive(Debug, Clone)]
pub(crate) struct WorkingDebt {
    pub id: String,
    pub original_balance: Money,
    pub balance: Money,
    pub monthly_rate: Rate,
    pub minimum_payment: Money,
    pub total_paid: Money,
    pub payoff_month: Option<Decimal>,
    pub payoff_order: Option<u32>,
}

impl WorkingDebt {
    fn new(debt: &Debt) -> Self {
        WorkingDebt {
            id: debt.id.clone(),
            original_balance: debt.balance,
            balance: debt.balance,
            monthly_rate: time_value::monthly_rate(debt.annual_rate_pct),
            minimum_payment: debt.minimum_payment,
            total_paid: Decimal::ZERO,
            payoff_month: None,
            payoff_order: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.payoff_month.is_none()
    }

    /// Interest the current balance accrues in one month; `None` when it
    /// does not fit in a `Decimal`.
    pub fn monthly_interest(&self) -> Option<Money> {
        self.balance.checked_mul(self.monthly_rate)
    }
}

// ---------------------------------------------------------------------------
// Core functions
// ---------------------------------------------------------------------------

/// Simulate paying off `debts` under `strategy` with the closed-form method.
pub fn simulate(
    debts: &[Debt],
    extra_monthly_budget: Money,
    strategy: PayoffStrategy,
) -> FinanceResult<ComputationOutput<PayoffResult>> {
    simulate_with(&PayoffInput {
        debts: debts.to_vec(),
        extra_monthly_budget,
        strategy,
        method: PayoffMethod::ClosedForm,
        start_date: None,
    })
}

/// Simulate a [`PayoffInput`] with its chosen strategy and method.
pub fn simulate_with(input: &PayoffInput) -> FinanceResult<ComputationOutput<PayoffResult>> {
    let mut warnings: Vec<String> = Vec::new();
    validate_payoff_input(input)?;

    if input.strategy == PayoffStrategy::Minimum && input.extra_monthly_budget > Decimal::ZERO {
        warnings.push(format!(
            "The minimum-payment strategy does not use the extra budget of {}.",
            input.extra_monthly_budget
        ));
    }

    let result = run_strategy(input, input.strategy)?;

    Ok(with_metadata(
        methodology(input.method),
        &assumptions(input),
        warnings,
        result,
    ))
}

/// Run all three strategies on the same debts and budget.
pub fn compare_strategies(
    input: &PayoffInput,
) -> FinanceResult<ComputationOutput<StrategyComparison>> {
    validate_payoff_input(input)?;

    let strategies = PayoffStrategy::ALL
        .iter()
        .map(|&s| run_strategy(input, s))
        .collect::<FinanceResult<Vec<_>>>()?;

    let least_interest = strategies
        .iter()
        .min_by_key(|r| r.total_interest_paid)
        .map(|r| r.strategy)
        .unwrap_or_default();
    let fastest = strategies
        .iter()
        .min_by_key(|r| r.months_to_payoff)
        .map(|r| r.strategy)
        .unwrap_or_default();
    let minimum_interest = strategies
        .iter()
        .find(|r| r.strategy == PayoffStrategy::Minimum)
        .map(|r| r.total_interest_paid)
        .unwrap_or_default();
    let best_interest = strategies
        .iter()
        .map(|r| r.total_interest_paid)
        .min()
        .unwrap_or_default();

    let mut warnings = Vec::new();
    if input.extra_monthly_budget.is_zero() {
        warnings.push(
            "No extra budget: snowball and avalanche differ from minimum payments only \
             through rollover of cleared minimums."
                .to_string(),
        );
    }

    let comparison = StrategyComparison {
        strategies,
        least_interest,
        fastest,
        interest_saved_vs_minimum: minimum_interest - best_interest,
    };

    Ok(with_metadata(
        methodology(input.method),
        &assumptions(input),
        warnings,
        comparison,
    ))
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

fn run_strategy(input: &PayoffInput, strategy: PayoffStrategy) -> FinanceResult<PayoffResult> {
    let mut working: Vec<WorkingDebt> = strategy
        .order(&input.debts)
        .into_iter()
        .map(|i| WorkingDebt::new(&input.debts[i]))
        .collect();

    let extra = if strategy.rolls_over() {
        input.extra_monthly_budget
    } else {
        Decimal::ZERO
    };
    debug!(%strategy, method = ?input.method, debts = working.len(), %extra, "simulating payoff");

    match input.method {
        PayoffMethod::ClosedForm => closed_form(&mut working, extra, strategy.rolls_over())?,
        PayoffMethod::MonthByMonth => {
            schedule::month_by_month(&mut working, extra, strategy.rolls_over())?
        }
    }

    let monthly_outlay = input
        .debts
        .iter()
        .try_fold(extra, |acc, d| acc.checked_add(d.minimum_payment))
        .ok_or_else(|| FinanceError::overflow("monthly outlay"))?;
    let months_to_payoff = working
        .iter()
        .filter_map(|d| d.payoff_month)
        .max()
        .unwrap_or_default();

    let debt_free_date = match input.start_date {
        Some(start) => {
            let whole = months_to_payoff.ceil().to_u32().unwrap_or(MAX_PAYOFF_MONTHS);
            start.checked_add_months(Months::new(whole))
        }
        None => None,
    };

    let debts: Vec<DebtPayoff> = working
        .iter()
        .map(|d| DebtPayoff {
            id: d.id.clone(),
            payoff_order: d.payoff_order.unwrap_or_default(),
            months_to_payoff: d.payoff_month.unwrap_or_default(),
            interest_paid: d.total_paid - d.original_balance,
            total_paid: d.total_paid,
        })
        .collect();

    Ok(PayoffResult {
        strategy,
        method: input.method,
        total_interest_paid: debts.iter().map(|d| d.interest_paid).sum(),
        months_to_payoff,
        monthly_outlay,
        debt_free_date,
        debts,
    })
}

/// Event-driven closed form. Between payoff events every active debt follows
/// the fixed-payment annuity path; at each event the cleared debt's payment
/// is released and, when rolling over, added to the first active debt.
fn closed_form(working: &mut [WorkingDebt], extra: Money, rolls_over: bool) -> FinanceResult<()> {
    let mut payments: Vec<Money> = working.iter().map(|d| d.minimum_payment).collect();
    if let Some(head) = payments.first_mut() {
        *head = head
            .checked_add(extra)
            .ok_or_else(|| FinanceError::overflow("monthly outlay"))?;
    }

    let mut now = Decimal::ZERO;
    let mut cleared = 0u32;

    while working.iter().any(WorkingDebt::is_active) {
        let horizons: Vec<Option<Decimal>> = working
            .iter()
            .zip(&payments)
            .map(|(d, &p)| {
                if d.is_active() {
                    time_value::periods_to_repay(d.balance, d.monthly_rate, p)
                } else {
                    None
                }
            })
            .collect();

        let step = match horizons.iter().flatten().min() {
            Some(&step) => step,
            None => return Err(non_terminating(working, &payments)),
        };
        if now + step > Decimal::from(MAX_PAYOFF_MONTHS) {
            return Err(too_long());
        }

        let mut freed = Decimal::ZERO;
        for (i, debt) in working.iter_mut().enumerate() {
            if !debt.is_active() {
                continue;
            }
            debt.total_paid = payments[i]
                .checked_mul(step)
                .and_then(|paid| debt.total_paid.checked_add(paid))
                .ok_or_else(|| FinanceError::overflow("payments between payoff events"))?;
            let finishes = horizons[i].is_some_and(|h| h - step < SIMULTANEOUS_PAYOFF);
            if finishes {
                cleared += 1;
                debt.balance = Decimal::ZERO;
                debt.payoff_month = Some(now + step);
                debt.payoff_order = Some(cleared);
                freed += payments[i];
            } else {
                debt.balance =
                    time_value::balance_after(debt.balance, debt.monthly_rate, payments[i], step)?;
            }
        }
        now += step;

        if rolls_over {
            if let Some(head) = working.iter().position(WorkingDebt::is_active) {
                payments[head] += freed;
            }
        }
    }

    Ok(())
}

pub(crate) fn non_terminating(working: &[WorkingDebt], payments: &[Money]) -> FinanceError {
    let stuck = working
        .iter()
        .zip(payments)
        .find(|(d, _)| d.is_active());
    match stuck {
        Some((debt, payment)) => {
            warn!(debt = %debt.id, %payment, "payment never covers accruing interest");
            let interest = debt
                .monthly_interest()
                .map_or_else(|| "beyond range".to_string(), |i| i.round_dp(2).to_string());
            FinanceError::InvalidInput {
                field: format!("debts[{}].minimum_payment", debt.id),
                reason: format!(
                    "Payment of {} does not cover monthly interest of {interest}; the balance never reaches zero",
                    payment.round_dp(2),
                ),
            }
        }
        None => FinanceError::invalid("debts", "No payable debt remains"),
    }
}

pub(crate) fn too_long() -> FinanceError {
    FinanceError::InvalidInput {
        field: "debts".into(),
        reason: format!("Payoff would take longer than {MAX_PAYOFF_MONTHS} months"),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn methodology(method: PayoffMethod) -> &'static str {
    match method {
        PayoffMethod::ClosedForm => {
            "Debt payoff: n = -ln(1 - B*r/P) / ln(1 + r) between payoff events, \
             freed payments rolled to the next debt in strategy order"
        }
        PayoffMethod::MonthByMonth => {
            "Debt payoff: monthly interest accrual, minimums first, remaining budget \
             cascaded down the strategy order"
        }
    }
}

fn assumptions(input: &PayoffInput) -> serde_json::Value {
    serde_json::json!({
        "num_debts": input.debts.len(),
        "total_balance": input.debts.iter().map(|d| d.balance).sum::<Decimal>().to_string(),
        "total_minimums": input.debts.iter().map(|d| d.minimum_payment).sum::<Decimal>().to_string(),
        "extra_monthly_budget": input.extra_monthly_budget.to_string(),
        "strategy": input.strategy.to_string(),
        "method": input.method,
    })
}

fn validate_payoff_input(input: &PayoffInput) -> FinanceResult<()> {
    if input.debts.is_empty() {
        return Err(FinanceError::InvalidInput {
            field: "debts".into(),
            reason: "At least one debt is required".into(),
        });
    }
    if input.extra_monthly_budget < Decimal::ZERO {
        return Err(FinanceError::InvalidInput {
            field: "extra_monthly_budget".into(),
            reason: "Extra budget cannot be negative".into(),
        });
    }

    let mut seen = HashSet::new();
    for debt in &input.debts {
        if !seen.insert(debt.id.as_str()) {
            return Err(FinanceError::invalid(
                format!("debts[{}].id", debt.id),
                "Debt ids must be unique",
            ));
        }
        if debt.balance <= Decimal::ZERO {
            return Err(FinanceError::invalid(
                format!("debts[{}].balance", debt.id),
                "Balance must be positive",
            ));
        }
        if debt.annual_rate_pct < Decimal::ZERO {
            return Err(FinanceError::invalid(
                format!("debts[{}].annual_rate_pct", debt.id),
                "Annual rate cannot be negative",
            ));
        }
        if debt.minimum_payment <= Decimal::ZERO {
            return Err(FinanceError::invalid(
                format!("debts[{}].minimum_payment", debt.id),
                "Minimum payment must be positive",
            ));
        }
    }
    Ok(())
}
