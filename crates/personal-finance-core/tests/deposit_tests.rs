#![cfg(feature = "deposit")]

use personal_finance_core::deposit::fixed_deposit::{self, CompoundingFrequency, DepositInput};
use personal_finance_core::FinanceError;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use proptest::sample::select;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn deposit(principal: Decimal, rate: Decimal, years: Decimal, f: CompoundingFrequency) -> DepositInput {
    DepositInput {
        principal,
        annual_rate_pct: rate,
        years,
        compounding: f,
    }
}

#[test]
fn test_annual_compounding_matches_hand_calculation() {
    let input = deposit(dec!(10_000), dec!(10), dec!(2), CompoundingFrequency::Annually);
    let out = fixed_deposit::compute_deposit(&input).unwrap().result;
    assert_eq!(out.maturity_amount, dec!(12_100));
    assert_eq!(out.total_interest, dec!(2_100));
    assert_eq!(out.effective_annual_rate_pct, dec!(10));
}

#[test]
fn test_more_frequent_compounding_earns_more() {
    let mut previous = Decimal::ZERO;
    for f in [
        CompoundingFrequency::Annually,
        CompoundingFrequency::HalfYearly,
        CompoundingFrequency::Quarterly,
        CompoundingFrequency::Monthly,
    ] {
        let out = fixed_deposit::compute_deposit(&deposit(dec!(50_000), dec!(8), dec!(3), f))
            .unwrap()
            .result;
        assert!(out.maturity_amount > previous, "{f} should beat the previous frequency");
        previous = out.maturity_amount;
    }
}

#[test]
fn test_breakdown_with_partial_year() {
    let input = deposit(dec!(100_000), dec!(6), dec!(2.5), CompoundingFrequency::Quarterly);
    let rows = fixed_deposit::yearly_breakdown(&input).unwrap();
    let maturity = fixed_deposit::compute_deposit(&input).unwrap().result.maturity_amount;

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2].year, 3);
    assert_eq!(rows[2].closing_balance, maturity);
    assert!(rows[2].interest_earned < rows[1].interest_earned);
}

#[test]
fn test_simple_vs_compound() {
    let input = deposit(dec!(100_000), dec!(7.5), dec!(5), CompoundingFrequency::Quarterly);
    let cmp = fixed_deposit::compare_simple_interest(&input).unwrap();
    assert_eq!(cmp.simple_interest, dec!(37_500));
    assert!(cmp.compounding_advantage > Decimal::ZERO);
    assert_eq!(cmp.compound_maturity - cmp.simple_maturity, cmp.compounding_advantage);
}

#[test]
fn test_frequency_accepts_name_or_periods() {
    let by_name: DepositInput = serde_json::from_str(
        r#"{"principal": "1000", "annual_rate_pct": "5", "years": "1", "compounding": "half_yearly"}"#,
    )
    .unwrap();
    let by_number: DepositInput = serde_json::from_str(
        r#"{"principal": "1000", "annual_rate_pct": "5", "years": "1", "compounding": 2}"#,
    )
    .unwrap();
    assert_eq!(by_name, by_number);
    assert!(serde_json::from_str::<CompoundingFrequency>("3").is_err());
}

#[test]
fn test_rejects_non_positive_principal() {
    let input = deposit(dec!(-5), dec!(5), dec!(1), CompoundingFrequency::Monthly);
    assert!(matches!(
        fixed_deposit::compute_deposit(&input),
        Err(FinanceError::InvalidInput { .. })
    ));
}

#[test]
fn test_identical_inputs_serialize_identically() {
    let input = deposit(dec!(250_000), dec!(7.1), dec!(3), CompoundingFrequency::Monthly);
    let a = serde_json::to_vec(&fixed_deposit::compute_deposit(&input).unwrap()).unwrap();
    let b = serde_json::to_vec(&fixed_deposit::compute_deposit(&input).unwrap()).unwrap();
    assert_eq!(a, b);
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(64))]

    #[test]
    fn prop_breakdown_grows_and_closes_at_maturity(
        principal in 1_000u32..5_000_000,
        rate_hundredths in 1u32..2_000,
        years in 1u32..31,
        compounding in select(vec![
            CompoundingFrequency::Annually,
            CompoundingFrequency::HalfYearly,
            CompoundingFrequency::Quarterly,
            CompoundingFrequency::Monthly,
        ]),
    ) {
        let input = deposit(
            Decimal::from(principal),
            Decimal::new(i64::from(rate_hundredths), 2),
            Decimal::from(years),
            compounding,
        );
        let rows = fixed_deposit::yearly_breakdown(&input).unwrap();
        let maturity = fixed_deposit::compute_deposit(&input).unwrap().result.maturity_amount;

        prop_assert_eq!(rows.len() as u32, years);
        let mut previous = input.principal;
        for row in &rows {
            prop_assert!(row.closing_balance > previous);
            previous = row.closing_balance;
        }
        prop_assert_eq!(previous, maturity);
    }
}
