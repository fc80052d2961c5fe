//! Exchange-rate tables and display-time currency conversion.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use rust_decimal::RoundingStrategy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{Currency, Money};

/// Rates installed when the live source cannot be reached.
pub const FALLBACK_RATES: [(Currency, f64); 7] = [
    (Currency::USD, 1.0),
    (Currency::EUR, 0.92),
    (Currency::INR, 83.14),
    (Currency::GBP, 0.79),
    (Currency::JPY, 151.35),
    (Currency::AUD, 1.55),
    (Currency::CAD, 1.38),
];

const BASE_CODE: &str = "USD";

// ---------------------------------------------------------------------------
// Rate table
// ---------------------------------------------------------------------------

/// Where a rate table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateTableSource {
    Live,
    Fallback,
}

/// Units of each currency per 1 USD. The live source may carry many more
/// codes than [`Currency`] covers; all of them are kept for the listing view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRateTable {
    rates: BTreeMap<String, f64>,
    pub source: RateTableSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ExchangeRateTable {
    /// Build a live table. USD is pinned to 1 regardless of the payload.
    pub fn live(rates: BTreeMap<String, f64>, updated_at: Option<DateTime<Utc>>) -> Self {
        let mut rates = rates;
        rates.insert(BASE_CODE.to_string(), 1.0);
        Self {
            rates,
            source: RateTableSource::Live,
            updated_at,
        }
    }

    /// The fixed table used when fetching fails.
    pub fn fallback() -> Self {
        let rates = FALLBACK_RATES
            .iter()
            .map(|(c, r)| (c.code().to_string(), *r))
            .collect();
        Self {
            rates,
            source: RateTableSource::Fallback,
            updated_at: None,
        }
    }

    /// Rate for any three-letter code present in the table.
    pub fn get(&self, code: &str) -> Option<f64> {
        self.rates.get(code).copied()
    }

    pub fn rate(&self, currency: Currency) -> Option<f64> {
        self.get(currency.code())
    }

    /// All (code, rate) pairs sorted by code.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.rates.iter().map(|(c, r)| (c.as_str(), *r))
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn is_fallback(&self) -> bool {
        self.source == RateTableSource::Fallback
    }
}

// ---------------------------------------------------------------------------
// Conversion
// ---------------------------------------------------------------------------

/// Scale a USD amount by a rate.
pub fn convert(amount_usd: Money, rate: f64) -> Money {
    amount_usd * rate
}

/// Effective multiplier for a currency: 1 for USD, for a missing table, or
/// for a currency absent from the table.
pub fn effective_rate(currency: Currency, table: Option<&ExchangeRateTable>) -> f64 {
    if currency.is_base() {
        return 1.0;
    }
    table.and_then(|t| t.rate(currency)).unwrap_or(1.0)
}

/// Convert a USD amount into `currency` using `table`.
pub fn convert_to(amount_usd: Money, currency: Currency, table: Option<&ExchangeRateTable>) -> Money {
    convert(amount_usd, effective_rate(currency, table))
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Two fractional digits followed by the currency code, e.g. `"2051.65 USD"`.
/// Midpoints round away from zero.
pub fn format_money(value: Money, currency: Currency) -> String {
    format!("{} {}", format_amount(value, 2), currency.code())
}

/// Listing-view rate with four fractional digits.
pub fn format_rate(rate: f64) -> String {
    format_amount(rate, 4)
}

fn format_amount(value: f64, dp: u32) -> String {
    match Decimal::from_f64(value) {
        Some(d) => {
            let rounded = d.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
            format!("{:.*}", dp as usize, rounded)
        }
        // NaN, infinities and values beyond Decimal's range
        None => format!("{:.*}", dp as usize, value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fallback_table_contents() {
        let table = ExchangeRateTable::fallback();
        assert_eq!(table.len(), 7);
        assert_eq!(table.get("USD"), Some(1.0));
        assert_eq!(table.rate(Currency::INR), Some(83.14));
        assert_eq!(table.rate(Currency::JPY), Some(151.35));
        assert!(table.is_fallback());
    }

    #[test]
    fn test_live_table_pins_usd() {
        let mut rates = BTreeMap::new();
        rates.insert("USD".to_string(), 1.02);
        rates.insert("EUR".to_string(), 0.9);
        let table = ExchangeRateTable::live(rates, None);
        assert_eq!(table.get("USD"), Some(1.0));
        assert_eq!(table.source, RateTableSource::Live);
    }

    #[test]
    fn test_convert_identity_cases() {
        let table = ExchangeRateTable::fallback();
        assert_eq!(convert_to(123.45, Currency::USD, Some(&table)), 123.45);
        assert_eq!(convert_to(123.45, Currency::EUR, None), 123.45);

        let mut only_eur = BTreeMap::new();
        only_eur.insert("EUR".to_string(), 0.9);
        let sparse = ExchangeRateTable::live(only_eur, None);
        assert_eq!(convert_to(50.0, Currency::CAD, Some(&sparse)), 50.0);
    }

    #[test]
    fn test_convert_scales_by_rate() {
        let table = ExchangeRateTable::fallback();
        let inr = convert_to(100.0, Currency::INR, Some(&table));
        assert!((inr - 8314.0).abs() < 1e-9);
    }

    #[test]
    fn test_convert_round_trip() {
        for &(x, r) in &[(2051.65, 0.92), (1.0, 151.35), (99_999.99, 83.14)] {
            let back = convert(convert(x, r), 1.0 / r);
            assert!((back - x).abs() <= x.abs() * 1e-12, "{x} via {r} -> {back}");
        }
    }

    #[test]
    fn test_format_money_two_decimals() {
        assert_eq!(format_money(2051.653132705126, Currency::USD), "2051.65 USD");
        assert_eq!(format_money(0.0, Currency::JPY), "0.00 JPY");
        assert_eq!(format_money(0.125, Currency::EUR), "0.13 EUR");
        assert_eq!(format_money(12.5, Currency::GBP), "12.50 GBP");
    }

    #[test]
    fn test_format_rate_four_decimals() {
        assert_eq!(format_rate(83.14), "83.1400");
        assert_eq!(format_rate(1.0), "1.0000");
    }
}
