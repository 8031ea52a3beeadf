use napi::Result as NapiResult;
use napi_derive::napi;
use serde::de::DeserializeOwned;
use serde::Serialize;

use personal_finance_core::amortization::loan;
use personal_finance_core::debt::payoff;
use personal_finance_core::deposit::fixed_deposit;
use personal_finance_core::market::fx;
use personal_finance_core::tax::{income_tax, regime};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse<T: DeserializeOwned>(input_json: &str) -> NapiResult<T> {
    serde_json::from_str(input_json).map_err(to_napi_error)
}

fn render<T: Serialize>(output: &T) -> NapiResult<String> {
    serde_json::to_string(output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Loans
// ---------------------------------------------------------------------------

#[napi]
pub fn compute_emi(input_json: String) -> NapiResult<String> {
    let input: loan::LoanInput = parse(&input_json)?;
    let output = loan::compute_amortization(&input).map_err(to_napi_error)?;
    render(&output)
}

// ---------------------------------------------------------------------------
// Deposits
// ---------------------------------------------------------------------------

#[napi]
pub fn compute_deposit(input_json: String) -> NapiResult<String> {
    let input: fixed_deposit::DepositInput = parse(&input_json)?;
    let output = fixed_deposit::compute_deposit(&input).map_err(to_napi_error)?;
    render(&output)
}

#[napi]
pub fn deposit_yearly_breakdown(input_json: String) -> NapiResult<String> {
    let input: fixed_deposit::DepositInput = parse(&input_json)?;
    let output = fixed_deposit::yearly_breakdown(&input).map_err(to_napi_error)?;
    render(&output)
}

#[napi]
pub fn compare_simple_interest(input_json: String) -> NapiResult<String> {
    let input: fixed_deposit::DepositInput = parse(&input_json)?;
    let output = fixed_deposit::compare_simple_interest(&input).map_err(to_napi_error)?;
    render(&output)
}

// ---------------------------------------------------------------------------
// Income tax
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_tax(input_json: String) -> NapiResult<String> {
    let input: income_tax::TaxInput = parse(&input_json)?;
    let output = income_tax::calculate_tax(&input).map_err(to_napi_error)?;
    render(&output)
}

#[napi]
pub fn compare_tax_regimes(input_json: String) -> NapiResult<String> {
    let input: income_tax::RegimeComparisonInput = parse(&input_json)?;
    let output = income_tax::calculate_regime_comparison(&input).map_err(to_napi_error)?;
    render(&output)
}

#[napi]
pub fn list_tax_regimes() -> NapiResult<String> {
    render(&regime::builtin_regimes())
}

// ---------------------------------------------------------------------------
// Debt payoff
// ---------------------------------------------------------------------------

#[napi]
pub fn simulate_debt_payoff(input_json: String) -> NapiResult<String> {
    let input: payoff::PayoffInput = parse(&input_json)?;
    let output = payoff::simulate_with(&input).map_err(to_napi_error)?;
    render(&output)
}

#[napi]
pub fn compare_debt_strategies(input_json: String) -> NapiResult<String> {
    let input: payoff::PayoffInput = parse(&input_json)?;
    let output = payoff::compare_strategies(&input).map_err(to_napi_error)?;
    render(&output)
}

// ---------------------------------------------------------------------------
// Currency
// ---------------------------------------------------------------------------

#[napi]
pub fn convert_currency(input_json: String) -> NapiResult<String> {
    let input: fx::ConversionInput = parse(&input_json)?;
    let output = fx::calculate_conversion(&input).map_err(to_napi_error)?;
    render(&output)
}
