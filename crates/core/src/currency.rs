//! Currency conversion collaborator.
//!
//! Rate storage and refresh live outside the floor engine; the engine only
//! needs [`Conversions::rate`]. [`RateTable`] is a static in-memory table
//! used by the service binary and tests.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::FloorError;

/// Source of conversion rates.
pub trait Conversions: Send + Sync {
    /// Multiplier converting an amount in `from` into `to`.
    fn rate(&self, from: &str, to: &str) -> Result<f64, FloorError>;
}

/// Static rate table keyed `from -> to -> rate`.
///
/// Inverse rates are derived on lookup, so `USD -> INR` also answers
/// `INR -> USD`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateTable {
    rates: HashMap<String, HashMap<String, f64>>,
}

impl RateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with_rate(mut self, from: &str, to: &str, rate: f64) -> Self {
        self.insert(from, to, rate);
        self
    }

    pub fn insert(&mut self, from: &str, to: &str, rate: f64) {
        self.rates
            .entry(from.to_uppercase())
            .or_default()
            .insert(to.to_uppercase(), rate);
    }

    fn direct(&self, from: &str, to: &str) -> Option<f64> {
        self.rates.get(from)?.get(to).copied()
    }
}

impl Conversions for RateTable {
    fn rate(&self, from: &str, to: &str) -> Result<f64, FloorError> {
        let from_key = from.to_uppercase();
        let to_key = to.to_uppercase();

        if from_key == to_key {
            return Ok(1.0);
        }
        if let Some(rate) = self.direct(&from_key, &to_key) {
            return Ok(rate);
        }
        match self.direct(&to_key, &from_key) {
            Some(rate) if rate != 0.0 => Ok(1.0 / rate),
            _ => Err(FloorError::MissingRate {
                from: from.to_string(),
                to: to.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn same_currency_is_identity() {
        assert_eq!(RateTable::new().rate("USD", "usd").unwrap(), 1.0);
    }

    #[test]
    fn direct_and_inverse_rates() {
        let table = RateTable::new().with_rate("USD", "INR", 70.0);
        assert_eq!(table.rate("USD", "INR").unwrap(), 70.0);
        assert!((table.rate("INR", "USD").unwrap() - 1.0 / 70.0).abs() < 1e-12);
    }

    #[test]
    fn missing_rate_is_an_error() {
        let table = RateTable::new().with_rate("USD", "INR", 70.0);
        assert_matches!(
            table.rate("EUR", "USD"),
            Err(FloorError::MissingRate { from, to }) if from == "EUR" && to == "USD"
        );
    }

    #[test]
    fn deserializes_from_nested_map() {
        let table: RateTable =
            serde_json::from_value(serde_json::json!({"USD": {"EUR": 0.9}})).unwrap();
        assert_eq!(table.rate("USD", "EUR").unwrap(), 0.9);
    }
}
