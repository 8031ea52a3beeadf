//! Discrete month-by-month payoff simulation.
//!
//! Each month interest accrues on every open balance, every debt receives its
//! minimum (or whatever is left of it), and when the strategy rolls over the
//! rest of the fixed monthly outlay cascades down the strategy's ordering.
//! The last payment on a debt is partial, so payoff times are whole months.

use rust_decimal::Decimal;
use tracing::trace;

use crate::debt::payoff::{non_terminating, too_long, WorkingDebt, MAX_PAYOFF_MONTHS};
use crate::time_value::MONEY_DP;
use crate::error::FinanceError;
use crate::types::Money;
use crate::FinanceResult;

pub(crate) fn month_by_month(
    working: &mut [WorkingDebt],
    extra: Money,
    rolls_over: bool,
) -> FinanceResult<()> {
    let minimums: Vec<Money> = working.iter().map(|d| d.minimum_payment).collect();
    let outlay = minimums
        .iter()
        .try_fold(extra, |acc, m| acc.checked_add(*m))
        .ok_or_else(|| FinanceError::overflow("monthly outlay"))?;

    check_progress(working, &minimums, outlay, rolls_over)?;

    let mut month = 0u32;
    let mut cleared = 0u32;

    while working.iter().any(WorkingDebt::is_active) {
        month += 1;
        if month > MAX_PAYOFF_MONTHS {
            return Err(too_long());
        }

        let opening: Vec<Money> = working.iter().map(|d| d.balance).collect();
        for debt in working.iter_mut().filter(|d| d.is_active()) {
            debt.balance = debt
                .monthly_interest()
                .and_then(|interest| debt.balance.checked_add(interest.round_dp(MONEY_DP)))
                .ok_or_else(|| FinanceError::overflow("monthly interest accrual"))?;
        }

        let mut paid = vec![Decimal::ZERO; working.len()];
        let mut budget = outlay;
        for (debt, sent) in working.iter_mut().zip(paid.iter_mut()) {
            if debt.is_active() {
                let minimum = debt.minimum_payment;
                *sent = pay(debt, minimum);
                budget -= *sent;
            }
        }
        if rolls_over {
            for (debt, sent) in working.iter_mut().zip(paid.iter_mut()) {
                if budget <= Decimal::ZERO {
                    break;
                }
                if debt.is_active() {
                    let top_up = pay(debt, budget);
                    *sent += top_up;
                    budget -= top_up;
                }
            }
        }

        let mut cleared_this_month = false;
        for debt in working.iter_mut().filter(|d| d.is_active()) {
            if debt.balance.is_zero() {
                cleared += 1;
                cleared_this_month = true;
                debt.payoff_month = Some(Decimal::from(month));
                debt.payoff_order = Some(cleared);
                trace!(debt = %debt.id, month, "debt cleared");
            }
        }

        // With nothing cleared the allocation repeats next month, so balances
        // that all grew keep growing.
        if !cleared_this_month {
            check_growth(working, &opening, &paid)?;
        }
    }

    Ok(())
}

/// Fail once every open balance grew over a month in which no debt cleared.
fn check_growth(working: &[WorkingDebt], opening: &[Money], paid: &[Money]) -> FinanceResult<()> {
    let mut open = working
        .iter()
        .zip(opening)
        .enumerate()
        .filter(|(_, (d, _))| d.is_active());
    let all_grew = open.clone().all(|(_, (d, before))| d.balance > *before);
    match open.next() {
        Some((i, _)) if all_grew => Err(non_terminating(&working[i..=i], &paid[i..=i])),
        _ => Ok(()),
    }
}

/// Pay up to `amount` towards `debt`, returning what was actually paid.
fn pay(debt: &mut WorkingDebt, amount: Money) -> Money {
    let paid = amount.min(debt.balance);
    debt.balance -= paid;
    debt.total_paid += paid;
    paid
}

/// Reject inputs whose balances would never shrink, before simulating
/// 1200 months of growth.
fn check_progress(
    working: &[WorkingDebt],
    minimums: &[Money],
    outlay: Money,
    rolls_over: bool,
) -> FinanceResult<()> {
    if rolls_over {
        let interest = working
            .iter()
            .try_fold(Decimal::ZERO, |acc, d| acc.checked_add(d.monthly_interest()?));
        // Interest too large to represent is larger than any outlay.
        if interest.map_or(true, |i| outlay <= i) {
            return Err(non_terminating(working, minimums));
        }
        return Ok(());
    }

    match working
        .iter()
        .position(|d| d.monthly_interest().map_or(true, |i| d.minimum_payment <= i))
    {
        Some(i) => Err(non_terminating(&working[i..=i], &minimums[i..=i])),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use crate::debt::payoff::{
        simulate_with, Debt, PayoffInput, PayoffMethod, PayoffResult, PayoffStrategy,
    };
    use crate::error::FinanceError;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn debt(id: &str, balance: Decimal, rate: Decimal, min: Decimal) -> Debt {
        Debt {
            id: id.into(),
            balance,
            annual_rate_pct: rate,
            minimum_payment: min,
        }
    }

    fn run(debts: Vec<Debt>, strategy: PayoffStrategy, method: PayoffMethod) -> PayoffResult {
        simulate_with(&PayoffInput {
            debts,
            extra_monthly_budget: dec!(500),
            strategy,
            method,
            start_date: None,
        })
        .unwrap()
        .result
    }

    fn diverging_debts() -> Vec<Debt> {
        vec![
            debt("card", dec!(5000), dec!(10), dec!(150)),
            debt("loan", dec!(20000), dec!(18), dec!(400)),
        ]
    }

    #[test]
    fn test_whole_months() {
        let r = run(
            diverging_debts(),
            PayoffStrategy::Avalanche,
            PayoffMethod::MonthByMonth,
        );
        assert_eq!(r.months_to_payoff, dec!(29));
        assert!(r.debts.iter().all(|d| d.months_to_payoff.fract().is_zero()));
        assert!((r.total_interest_paid - dec!(5318.13)).abs() < dec!(0.01));
    }

    #[test]
    fn test_snowball_month_by_month() {
        let r = run(
            diverging_debts(),
            PayoffStrategy::Snowball,
            PayoffMethod::MonthByMonth,
        );
        assert_eq!(r.months_to_payoff, dec!(30));
        assert_eq!(r.debts[0].id, "card");
        assert_eq!(r.debts[0].months_to_payoff, dec!(8));
        assert!((r.total_interest_paid - dec!(5936.44)).abs() < dec!(0.01));
    }

    #[test]
    fn test_minimum_month_by_month() {
        let r = run(
            diverging_debts(),
            PayoffStrategy::Minimum,
            PayoffMethod::MonthByMonth,
        );
        assert_eq!(r.months_to_payoff, dec!(94));
        assert_eq!(r.monthly_outlay, dec!(550));
    }

    #[test]
    fn test_methods_agree_within_a_month() {
        for strategy in PayoffStrategy::ALL {
            let closed = run(diverging_debts(), strategy, PayoffMethod::ClosedForm);
            let monthly = run(diverging_debts(), strategy, PayoffMethod::MonthByMonth);
            let gap = monthly.months_to_payoff - closed.months_to_payoff;
            assert!(
                gap >= Decimal::ZERO && gap < Decimal::ONE,
                "{strategy}: closed {} vs monthly {}",
                closed.months_to_payoff,
                monthly.months_to_payoff
            );
            assert!((monthly.total_interest_paid - closed.total_interest_paid).abs() < dec!(5));
        }
    }

    #[test]
    fn test_total_paid_covers_balance_plus_interest() {
        let r = run(
            diverging_debts(),
            PayoffStrategy::Snowball,
            PayoffMethod::MonthByMonth,
        );
        for (payoff, original) in r.debts.iter().zip([dec!(5000), dec!(20000)]) {
            assert_eq!(payoff.total_paid - payoff.interest_paid, original);
            assert!(payoff.interest_paid > Decimal::ZERO);
        }
    }

    #[test]
    fn test_stuck_minimum_rejected_up_front() {
        let debts = vec![
            debt("ok", dec!(1000), dec!(12), dec!(100)),
            debt("stuck", dec!(20_000), dec!(24), dec!(100)),
        ];
        let result = simulate_with(&PayoffInput {
            debts,
            extra_monthly_budget: Decimal::ZERO,
            strategy: PayoffStrategy::Minimum,
            method: PayoffMethod::MonthByMonth,
            start_date: None,
        });
        match result {
            Err(FinanceError::InvalidInput { field, .. }) => {
                assert_eq!(field, "debts[stuck].minimum_payment")
            }
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_outlay_below_interest_rejected() {
        let debts = vec![debt("big", dec!(100_000), dec!(24), dec!(1000))];
        let result = simulate_with(&PayoffInput {
            debts,
            extra_monthly_budget: dec!(500),
            strategy: PayoffStrategy::Avalanche,
            method: PayoffMethod::MonthByMonth,
            start_date: None,
        });
        assert!(matches!(result, Err(FinanceError::InvalidInput { .. })));
    }

    fn growing_after_rollover() -> PayoffInput {
        PayoffInput {
            debts: vec![
                debt("zero", dec!(900), Decimal::ZERO, dec!(0.01)),
                debt("hot", dec!(1000), dec!(100), dec!(0.01)),
            ],
            extra_monthly_budget: dec!(84),
            strategy: PayoffStrategy::Snowball,
            method: PayoffMethod::MonthByMonth,
            start_date: None,
        }
    }

    fn stuck_field(result: crate::FinanceResult<impl std::fmt::Debug>) -> String {
        match result {
            Err(FinanceError::InvalidInput { field, .. }) => field,
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_growth_after_rollover_is_an_error() {
        // Covers interest at month 0, but once "zero" clears the whole
        // outlay of 84.02 meets about 200 of monthly interest on "hot".
        let field = stuck_field(simulate_with(&growing_after_rollover()));
        assert_eq!(field, "debts[hot].minimum_payment");
    }

    #[test]
    fn test_methods_agree_on_non_terminating_rollover() {
        for method in [PayoffMethod::ClosedForm, PayoffMethod::MonthByMonth] {
            let input = PayoffInput {
                method,
                ..growing_after_rollover()
            };
            assert_eq!(
                stuck_field(simulate_with(&input)),
                "debts[hot].minimum_payment",
                "{method:?}"
            );
        }
    }

    #[test]
    fn test_same_debts_terminate_when_hot_goes_first() {
        let input = PayoffInput {
            strategy: PayoffStrategy::Avalanche,
            ..growing_after_rollover()
        };
        let r = simulate_with(&input).unwrap().result;
        assert_eq!(r.debts[0].id, "hot");
        assert!(r.months_to_payoff < dec!(1200));
    }

    #[test]
    fn test_rate_above_hundred_percent_pays_off() {
        let payday = || vec![debt("payday", dec!(500), dec!(150), dec!(200))];
        let monthly = simulate_with(&PayoffInput {
            debts: payday(),
            extra_monthly_budget: Decimal::ZERO,
            strategy: PayoffStrategy::Minimum,
            method: PayoffMethod::MonthByMonth,
            start_date: None,
        })
        .unwrap()
        .result;
        assert_eq!(monthly.months_to_payoff, dec!(4));
        assert!((monthly.total_interest_paid - dec!(138.01)).abs() < dec!(0.01));

        let closed = run(payday(), PayoffStrategy::Minimum, PayoffMethod::ClosedForm);
        assert!(closed.months_to_payoff > dec!(3) && closed.months_to_payoff < dec!(4));
    }

    #[test]
    fn test_unrepresentable_interest_is_an_error() {
        let balance = Decimal::from_i128_with_scale(10i128.pow(27), 0);
        for method in [PayoffMethod::ClosedForm, PayoffMethod::MonthByMonth] {
            let input = PayoffInput {
                debts: vec![debt("huge", balance, dec!(1_000_000), dec!(1))],
                extra_monthly_budget: Decimal::ZERO,
                strategy: PayoffStrategy::Avalanche,
                method,
                start_date: None,
            };
            assert_eq!(
                stuck_field(simulate_with(&input)),
                "debts[huge].minimum_payment",
                "{method:?}"
            );
        }
    }
}
