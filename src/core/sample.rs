//! Raw observations from the sentiment feed

use crate::core::error::{Error, Result};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One 30-second snapshot of BTC sentiment and price.
///
/// Only `timestamp`, `mean` and `btc_price` feed the time series; the remaining
/// descriptive statistics are carried along untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Seconds since the unix epoch.
    pub timestamp: f64,
    /// Mean sentiment score over the snapshot.
    pub mean: f64,
    /// Decimal price encoded as a string, e.g. `"29089.35"`.
    pub btc_price: String,
    #[serde(default)]
    pub last: Option<f64>,
    #[serde(default)]
    pub rate: Option<f64>,
    #[serde(default)]
    pub median: Option<f64>,
    #[serde(default)]
    pub sum: Option<f64>,
    #[serde(default)]
    pub count: Option<f64>,
}

impl Sample {
    pub fn new(timestamp: f64, mean: f64, btc_price: impl Into<String>) -> Self {
        Self {
            timestamp,
            mean,
            btc_price: btc_price.into(),
            last: None,
            rate: None,
            median: None,
            sum: None,
            count: None,
        }
    }

    /// Store timestamp in whole milliseconds, rounded down.
    pub fn timestamp_ms(&self) -> i64 {
        (self.timestamp * 1000.0).floor() as i64
    }

    pub fn price(&self) -> Result<f64> {
        let decimal = Decimal::from_str(self.btc_price.trim()).map_err(|e| self.invalid(e))?;
        decimal
            .to_f64()
            .ok_or_else(|| self.invalid(format!("price {decimal} out of range")))
    }

    fn invalid(&self, reason: impl ToString) -> Error {
        Error::InvalidSample {
            timestamp: self.timestamp,
            reason: reason.to_string(),
        }
    }
}
