//! Market data seam.
//!
//! Calculators never talk to the network. They ask a [`MarketDataProvider`]
//! for prices and exchange rates, and every answer can be tagged with where
//! it came from so that substitute data is never presented as live.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::{Currency, Money, Percent};
use crate::FinanceResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Latest price of a listed instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub price: Money,
    pub currency: Currency,
    /// Change against the previous close.
    pub change: Money,
    pub change_pct: Percent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<NaiveDate>,
}

impl Quote {
    /// Build a quote from the last two closes.
    pub fn from_closes(
        symbol: impl Into<String>,
        currency: Currency,
        previous_close: Money,
        price: Money,
    ) -> Self {
        let change = price - previous_close;
        let change_pct = if previous_close > Decimal::ZERO {
            change / previous_close * Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };
        Quote {
            symbol: symbol.into().to_ascii_uppercase(),
            price,
            currency,
            change,
            change_pct,
            as_of: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Live,
    Fallback,
}

/// A value together with the kind of source that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sourced<T> {
    pub value: T,
    pub source: DataSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl<T> Sourced<T> {
    pub fn live(value: T) -> Self {
        Sourced {
            value,
            source: DataSource::Live,
            note: None,
        }
    }

    pub fn fallback(value: T, note: impl Into<String>) -> Self {
        Sourced {
            value,
            source: DataSource::Fallback,
            note: Some(note.into()),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == DataSource::Fallback
    }
}

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// Source of quotes and exchange rates.
pub trait MarketDataProvider: Send + Sync {
    /// Latest quote for `symbol`.
    fn quote(&self, symbol: &str) -> FinanceResult<Quote>;

    /// Units of `to` bought by one unit of `from`.
    fn fx_rate(&self, from: &Currency, to: &Currency) -> FinanceResult<Decimal>;

    /// [`quote`](Self::quote) tagged with its source. Providers that serve
    /// anything other than live data must override this.
    fn quote_sourced(&self, symbol: &str) -> FinanceResult<Sourced<Quote>> {
        self.quote(symbol).map(Sourced::live)
    }

    /// [`fx_rate`](Self::fx_rate) tagged with its source.
    fn fx_rate_sourced(&self, from: &Currency, to: &Currency) -> FinanceResult<Sourced<Decimal>> {
        self.fx_rate(from, to).map(Sourced::live)
    }
}

/// Ask `primary` first and, when it fails, answer from `fallback` with the
/// result tagged [`DataSource::Fallback`] and the primary's error as the note.
#[derive(Debug, Clone)]
pub struct FallbackProvider<P, F> {
    primary: P,
    fallback: F,
}

impl<P, F> FallbackProvider<P, F>
where
    P: MarketDataProvider,
    F: MarketDataProvider,
{
    pub fn new(primary: P, fallback: F) -> Self {
        FallbackProvider { primary, fallback }
    }
}

impl<P, F> MarketDataProvider for FallbackProvider<P, F>
where
    P: MarketDataProvider,
    F: MarketDataProvider,
{
    fn quote(&self, symbol: &str) -> FinanceResult<Quote> {
        self.quote_sourced(symbol).map(|s| s.value)
    }

    fn fx_rate(&self, from: &Currency, to: &Currency) -> FinanceResult<Decimal> {
        self.fx_rate_sourced(from, to).map(|s| s.value)
    }

    fn quote_sourced(&self, symbol: &str) -> FinanceResult<Sourced<Quote>> {
        match self.primary.quote_sourced(symbol) {
            Ok(quote) => Ok(quote),
            Err(e) => {
                warn!(symbol, error = %e, "primary quote failed, using fallback");
                let backup = self.fallback.quote_sourced(symbol)?;
                Ok(Sourced::fallback(backup.value, e.to_string()))
            }
        }
    }

    fn fx_rate_sourced(&self, from: &Currency, to: &Currency) -> FinanceResult<Sourced<Decimal>> {
        match self.primary.fx_rate_sourced(from, to) {
            Ok(rate) => Ok(rate),
            Err(e) => {
                warn!(%from, %to, error = %e, "primary fx rate failed, using fallback");
                let backup = self.fallback.fx_rate_sourced(from, to)?;
                Ok(Sourced::fallback(backup.value, e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FinanceError;
    use rust_decimal_macros::dec;

    struct Offline;

    impl MarketDataProvider for Offline {
        fn quote(&self, symbol: &str) -> FinanceResult<Quote> {
            Err(FinanceError::MarketData(format!("{symbol}: provider offline")))
        }

        fn fx_rate(&self, _from: &Currency, _to: &Currency) -> FinanceResult<Decimal> {
            Err(FinanceError::MarketData("provider offline".into()))
        }
    }

    struct Fixed;

    impl MarketDataProvider for Fixed {
        fn quote(&self, symbol: &str) -> FinanceResult<Quote> {
            Ok(Quote::from_closes(symbol, Currency::USD, dec!(100), dec!(105)))
        }

        fn fx_rate(&self, _from: &Currency, _to: &Currency) -> FinanceResult<Decimal> {
            Ok(dec!(2))
        }
    }

    #[test]
    fn test_quote_from_closes() {
        let q = Quote::from_closes("aapl", Currency::USD, dec!(100), dec!(105));
        assert_eq!(q.symbol, "AAPL");
        assert_eq!(q.change, dec!(5));
        assert_eq!(q.change_pct, dec!(5));
    }

    #[test]
    fn test_quote_without_previous_close() {
        let q = Quote::from_closes("NEW", Currency::INR, Decimal::ZERO, dec!(10));
        assert_eq!(q.change_pct, Decimal::ZERO);
    }

    #[test]
    fn test_primary_answers_are_live() {
        let provider = FallbackProvider::new(Fixed, Offline);
        let rate = provider
            .fx_rate_sourced(&Currency::USD, &Currency::EUR)
            .unwrap();
        assert_eq!(rate, Sourced::live(dec!(2)));
    }

    #[test]
    fn test_fallback_answers_are_tagged() {
        let provider = FallbackProvider::new(Offline, Fixed);
        let quote = provider.quote_sourced("msft").unwrap();
        assert!(quote.is_fallback());
        assert_eq!(quote.value.price, dec!(105));
        assert!(quote.note.unwrap().contains("offline"));

        let rate = provider
            .fx_rate_sourced(&Currency::USD, &Currency::EUR)
            .unwrap();
        assert_eq!(rate.source, DataSource::Fallback);
        assert_eq!(provider.fx_rate(&Currency::USD, &Currency::EUR).unwrap(), dec!(2));
    }

    #[test]
    fn test_both_failing_is_an_error() {
        let provider = FallbackProvider::new(Offline, Offline);
        assert!(matches!(
            provider.quote("X"),
            Err(FinanceError::MarketData(_))
        ));
    }
}
