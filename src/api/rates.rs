//! Exchange rates against USD.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{ApiError, get_json, trim_base};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    #[serde(default = "usd")]
    pub base: String,
    pub rates: HashMap<String, f64>,
    /// Unix seconds, when the service reports it.
    #[serde(default)]
    pub time_last_updated: Option<i64>,
}

fn usd() -> String {
    "USD".to_string()
}

impl RateTable {
    /// Units of `code` per one unit of the base currency.
    pub fn rate(&self, code: &str) -> Option<f64> {
        self.rates.get(code).copied().filter(|r| *r > 0.0)
    }

    /// Value of one `from` in `to`.
    pub fn cross_rate(&self, from: &str, to: &str) -> Option<f64> {
        Some(self.rate(to)? / self.rate(from)?)
    }

    /// Convert through the base currency.
    pub fn convert(&self, amount: f64, from: &str, to: &str) -> Option<f64> {
        let in_base = amount / self.rate(from)?;
        Some(in_base * self.rate(to)?)
    }
}

pub struct RatesClient {
    client: reqwest::Client,
    base_url: String,
}

impl RatesClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: trim_base(base_url),
        }
    }

    pub async fn latest_usd(&self) -> Result<RateTable, ApiError> {
        let request = self.client.get(format!("{}/latest/USD", self.base_url));
        let table: RateTable = get_json(request).await?;
        if table.rates.is_empty() {
            return Err(ApiError::Parse("no rates in response".to_string()));
        }
        Ok(table)
    }
}

/// Used when the rate service is unreachable.
pub fn fallback_rates() -> RateTable {
    let rates = [
        ("USD", 1.0),
        ("EUR", 0.92),
        ("GBP", 0.79),
        ("JPY", 149.50),
        ("AUD", 1.52),
        ("CAD", 1.36),
        ("CHF", 0.88),
        ("CNY", 7.24),
        ("INR", 83.12),
        ("MXN", 17.08),
        ("BRL", 4.97),
        ("ZAR", 18.85),
        ("SGD", 1.34),
        ("HKD", 7.83),
        ("SEK", 10.48),
        ("NOK", 10.63),
        ("KRW", 1320.50),
        ("TRY", 30.15),
        ("RUB", 92.50),
        ("THB", 35.20),
    ];
    RateTable {
        base: usd(),
        rates: rates
            .into_iter()
            .map(|(code, rate)| (code.to_string(), rate))
            .collect(),
        time_last_updated: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_through_base() {
        let table = fallback_rates();
        let eur = table.convert(100.0, "USD", "EUR").unwrap();
        assert!((eur - 92.0).abs() < 1e-9);
        let gbp = table.convert(92.0, "EUR", "GBP").unwrap();
        assert!((gbp - 79.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_currency_is_none() {
        let table = fallback_rates();
        assert!(table.convert(1.0, "USD", "XYZ").is_none());
        assert!(table.cross_rate("XYZ", "USD").is_none());
    }

    #[test]
    fn test_cross_rate() {
        let table = fallback_rates();
        assert_eq!(format!("{:.4}", table.cross_rate("USD", "JPY").unwrap()), "149.5000");
    }

    #[test]
    fn test_parses_api_shape() {
        let json = r#"{"provider":"x","base":"USD","date":"2026-01-01","time_last_updated":1767225600,"rates":{"USD":1,"EUR":0.9}}"#;
        let table: RateTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.rate("EUR"), Some(0.9));
        assert_eq!(table.time_last_updated, Some(1_767_225_600));
    }
}
