use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::FinanceError;
use crate::market::provider::{DataSource, MarketDataProvider, Quote, Sourced};
use crate::types::{with_metadata, ComputationOutput, Currency, Money};
use crate::FinanceResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Reference exchange rates quoted against a single base currency, plus any
/// fixed quotes the caller wants to serve offline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticRateTable {
    pub base: Currency,
    /// Units of each currency per one unit of `base`.
    pub rates: BTreeMap<Currency, Decimal>,
    #[serde(default)]
    pub quotes: BTreeMap<String, Quote>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionInput {
    pub amount: Money,
    pub from: Currency,
    pub to: Currency,
    /// Replaces the built-in reference table when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rates: Option<StaticRateTable>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversion {
    pub amount: Money,
    pub from: Currency,
    pub to: Currency,
    pub rate: Decimal,
    pub inverse_rate: Decimal,
    pub converted_amount: Money,
    pub source: DataSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl StaticRateTable {
    /// USD-based reference rates used when no live feed is configured.
    pub fn reference() -> Self {
        let rates = [
            (Currency::USD, dec!(1)),
            (Currency::EUR, dec!(0.85)),
            (Currency::GBP, dec!(0.73)),
            (Currency::JPY, dec!(110)),
            (Currency::INR, dec!(82.5)),
            (Currency::CAD, dec!(1.25)),
            (Currency::AUD, dec!(1.35)),
            (Currency::CHF, dec!(0.92)),
            (Currency::CNY, dec!(6.45)),
            (Currency::SGD, dec!(1.35)),
        ]
        .into_iter()
        .collect();

        StaticRateTable {
            base: Currency::USD,
            rates,
            quotes: BTreeMap::new(),
        }
    }

    pub fn with_quote(mut self, quote: Quote) -> Self {
        self.quotes.insert(quote.symbol.to_ascii_uppercase(), quote);
        self
    }

    pub fn currencies(&self) -> impl Iterator<Item = &Currency> {
        self.rates.keys()
    }

    fn rate_against_base(&self, currency: &Currency) -> FinanceResult<Decimal> {
        if *currency == self.base {
            return Ok(Decimal::ONE);
        }
        match self.rates.get(currency) {
            Some(rate) if *rate > Decimal::ZERO => Ok(*rate),
            Some(_) => Err(FinanceError::InvalidInput {
                field: format!("rates.{currency}"),
                reason: "Exchange rates must be positive".into(),
            }),
            None => Err(FinanceError::MarketData(format!(
                "No reference rate for {currency} against {}",
                self.base
            ))),
        }
    }
}

impl Default for StaticRateTable {
    fn default() -> Self {
        StaticRateTable::reference()
    }
}

impl MarketDataProvider for StaticRateTable {
    fn quote(&self, symbol: &str) -> FinanceResult<Quote> {
        self.quotes
            .get(&symbol.trim().to_ascii_uppercase())
            .cloned()
            .ok_or_else(|| FinanceError::MarketData(format!("No stored quote for {symbol}")))
    }

    /// Cross rate through the base currency: `rate(to) / rate(from)`.
    fn fx_rate(&self, from: &Currency, to: &Currency) -> FinanceResult<Decimal> {
        if from == to {
            return Ok(Decimal::ONE);
        }
        let from_rate = self.rate_against_base(from)?;
        let to_rate = self.rate_against_base(to)?;
        to_rate
            .checked_div(from_rate)
            .ok_or_else(|| FinanceError::DivisionByZero {
                context: format!("{from}/{to} cross rate"),
            })
    }

    fn quote_sourced(&self, symbol: &str) -> FinanceResult<Sourced<Quote>> {
        self.quote(symbol)
            .map(|q| Sourced::fallback(q, "Stored quote, not live market data"))
    }

    fn fx_rate_sourced(&self, from: &Currency, to: &Currency) -> FinanceResult<Sourced<Decimal>> {
        self.fx_rate(from, to)
            .map(|r| Sourced::fallback(r, "Static reference rates, not live market data"))
    }
}

// ---------------------------------------------------------------------------
// Core functions
// ---------------------------------------------------------------------------

/// Convert `amount` of `from` into `to` using whatever `provider` returns.
pub fn convert_currency<P>(
    provider: &P,
    amount: Money,
    from: &Currency,
    to: &Currency,
) -> FinanceResult<ComputationOutput<Conversion>>
where
    P: MarketDataProvider + ?Sized,
{
    if amount < Decimal::ZERO {
        return Err(FinanceError::InvalidInput {
            field: "amount".into(),
            reason: "Amount to convert cannot be negative".into(),
        });
    }

    let sourced = provider.fx_rate_sourced(from, to)?;
    let rate = sourced.value;
    if rate <= Decimal::ZERO {
        return Err(FinanceError::MarketData(format!(
            "Provider returned non-positive rate {rate} for {from}/{to}"
        )));
    }
    debug!(%from, %to, %rate, source = ?sourced.source, "converting currency");

    let mut warnings = Vec::new();
    if let Some(note) = &sourced.note {
        warnings.push(note.clone());
    }

    let conversion = Conversion {
        amount,
        from: from.clone(),
        to: to.clone(),
        rate,
        inverse_rate: Decimal::ONE / rate,
        converted_amount: amount * rate,
        source: sourced.source,
        note: sourced.note,
    };

    Ok(with_metadata(
        "Currency conversion: amount * rate(from -> to)",
        &serde_json::json!({
            "amount": amount.to_string(),
            "from": from,
            "to": to,
        }),
        warnings,
        conversion,
    ))
}

/// Convert a [`ConversionInput`], using its own rate table or the built-in
/// reference table.
pub fn calculate_conversion(input: &ConversionInput) -> FinanceResult<ComputationOutput<Conversion>> {
    match &input.rates {
        Some(table) => convert_currency(table, input.amount, &input.from, &input.to),
        None => convert_currency(
            &StaticRateTable::reference(),
            input.amount,
            &input.from,
            &input.to,
        ),
    }
}
