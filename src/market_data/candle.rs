use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::Granularity;

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// A single OHLCV candle.
///
/// `open_time` is the UTC start of the interval in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn new(open_time: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            open_time,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// `true` when the candle is internally consistent: finite values,
    /// `high >= max(open, close)`, `low <= min(open, close)`, `volume >= 0`.
    pub fn is_consistent(&self) -> bool {
        let finite = [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .all(|v| v.is_finite());
        finite
            && self.high >= self.open.max(self.close)
            && self.low <= self.open.min(self.close)
            && self.volume >= 0.0
    }
}

/// Ordered candles for one symbol at one granularity.
///
/// Candles are ascending by `open_time` with no duplicate timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolSeries {
    pub symbol: String,
    pub granularity: Granularity,
    pub candles: Vec<Candle>,
}

impl SymbolSeries {
    pub fn empty(symbol: impl Into<String>, granularity: Granularity) -> Self {
        Self {
            symbol: symbol.into(),
            granularity,
            candles: Vec::new(),
        }
    }

    /// Build a series from candles in arbitrary order, possibly overlapping.
    /// Sorts by `open_time` and keeps the first occurrence of each timestamp.
    pub fn from_unordered(
        symbol: impl Into<String>,
        granularity: Granularity,
        mut candles: Vec<Candle>,
    ) -> Self {
        candles.sort_by_key(|c| c.open_time);
        candles.dedup_by_key(|c| c.open_time);
        Self {
            symbol: symbol.into(),
            granularity,
            candles,
        }
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Close prices, oldest first.
    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    pub fn first_open_time(&self) -> Option<i64> {
        self.candles.first().map(|c| c.open_time)
    }

    pub fn last_open_time(&self) -> Option<i64> {
        self.candles.last().map(|c| c.open_time)
    }
}

// ---------------------------------------------------------------------------
// Wire decoding
// ---------------------------------------------------------------------------

/// Decode a klines response body (array of fixed-width arrays).
///
/// Array indices:
///   [0] openTime, [1] open, [2] high, [3] low, [4] close, [5] volume,
///   [6] closeTime, [7] quoteAssetVolume, [8] numberOfTrades,
///   [9] takerBuyBaseVolume, [10] takerBuyQuoteVolume, [11] ignore
///
/// Rows that are malformed or violate the candle invariants are skipped with a
/// warning; a body that is not an array at all is an error.
pub fn decode_klines(symbol: &str, body: &serde_json::Value) -> Result<Vec<Candle>> {
    let rows = body.as_array().context("klines response is not an array")?;

    let mut candles = Vec::with_capacity(rows.len());
    for row in rows {
        match decode_kline_row(row) {
            Ok(candle) if candle.is_consistent() => candles.push(candle),
            Ok(candle) => {
                warn!(symbol, open_time = candle.open_time, "skipping inconsistent kline row");
            }
            Err(e) => {
                warn!(symbol, error = %e, "skipping malformed kline row");
            }
        }
    }
    Ok(candles)
}

fn decode_kline_row(row: &serde_json::Value) -> Result<Candle> {
    let arr = row.as_array().context("kline entry is not an array")?;
    if arr.len() < 6 {
        anyhow::bail!("kline entry has {} elements, expected at least 6", arr.len());
    }

    let open_time = arr[0].as_i64().context("kline openTime is not an integer")?;

    Ok(Candle::new(
        open_time,
        parse_string_f64(&arr[1], "open")?,
        parse_string_f64(&arr[2], "high")?,
        parse_string_f64(&arr[3], "low")?,
        parse_string_f64(&arr[4], "close")?,
        parse_string_f64(&arr[5], "volume")?,
    ))
}

/// Binance sends numeric values as JSON strings inside kline rows.
fn parse_string_f64(val: &serde_json::Value, name: &str) -> Result<f64> {
    match val {
        serde_json::Value::String(s) => s
            .parse::<f64>()
            .with_context(|| format!("failed to parse {name} as f64: {s}")),
        serde_json::Value::Number(n) => n
            .as_f64()
            .with_context(|| format!("field {name} is not a valid f64")),
        _ => anyhow::bail!("field {name} has unexpected JSON type"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(open_time: i64, close: f64) -> Candle {
        Candle::new(open_time, close, close + 1.0, close - 1.0, close, 10.0)
    }

    #[test]
    fn from_unordered_sorts_and_dedups() {
        let series = SymbolSeries::from_unordered(
            "BTCUSDT",
            Granularity::Hourly,
            vec![candle(3, 103.0), candle(1, 101.0), candle(2, 102.0), candle(3, 103.0)],
        );
        let times: Vec<i64> = series.candles.iter().map(|c| c.open_time).collect();
        assert_eq!(times, vec![1, 2, 3]);
        assert_eq!(series.closes(), vec![101.0, 102.0, 103.0]);
    }

    #[test]
    fn consistency_rules() {
        assert!(candle(0, 10.0).is_consistent());
        assert!(!Candle::new(0, 10.0, 9.0, 8.0, 9.5, 1.0).is_consistent());
        assert!(!Candle::new(0, 10.0, 11.0, 10.5, 10.2, 1.0).is_consistent());
        assert!(!Candle::new(0, 10.0, 11.0, 9.0, 10.0, -1.0).is_consistent());
        assert!(!Candle::new(0, f64::NAN, 11.0, 9.0, 10.0, 1.0).is_consistent());
    }

    #[test]
    fn decode_binance_rows() {
        let body = serde_json::json!([
            [1700000000000_i64, "37000.00", "37050.00", "36990.00", "37020.00", "123.456",
             1700003599999_i64, "4567890.12", 1500, "60.123", "2224455.66", "0"],
            [1700003600000_i64, "37020.00", "37100.00", "37000.00", "37090.00", "80.0",
             1700007199999_i64, "0", 10, "0", "0", "0"]
        ]);
        let candles = decode_klines("BTCUSDT", &body).expect("should decode");
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].open_time, 1_700_000_000_000);
        assert!((candles[0].close - 37020.0).abs() < f64::EPSILON);
        assert!((candles[1].volume - 80.0).abs() < f64::EPSILON);
    }

    #[test]
    fn decode_skips_bad_rows() {
        let body = serde_json::json!([
            [1_i64, "1.0", "2.0", "0.5", "1.5", "3.0"],
            [2_i64, "oops", "2.0", "0.5", "1.5", "3.0"],
            [3_i64, "1.0", "0.9", "0.5", "1.5", "3.0"],
            "not-a-row"
        ]);
        let candles = decode_klines("ETHUSDT", &body).unwrap();
        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0].open_time, 1);
    }

    #[test]
    fn decode_rejects_non_array_body() {
        let body = serde_json::json!({ "code": -1121, "msg": "Invalid symbol." });
        assert!(decode_klines("NOPE", &body).is_err());
    }
}
