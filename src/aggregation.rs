// =============================================================================
// Multi-granularity resampling of the hourly base series
// =============================================================================
//
// Buckets are contiguous, non-overlapping calendar windows in UTC:
//   hourly  — pass-through of the base series
//   daily   — [00:00, 24:00) of each calendar day
//   weekly  — ISO week, Monday 00:00 through Sunday 23:59:59
//
// Each non-empty bucket becomes one candle stamped with the bucket start:
//   open = first open, high = max high, low = min low,
//   close = last close, volume = sum of volumes.
//
// Note for consumers of older exports: pandas `resample("1W")` anchors weeks
// on Sunday and labels them by the right edge (the closing Sunday).  Weekly
// rows here cover Monday..Sunday and carry the opening Monday's timestamp.
//
// Pure functions: same input, same output.
// =============================================================================

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveTime, Weekday};

use crate::market_data::candle::{Candle, SymbolSeries};
use crate::types::Granularity;

/// One symbol's candles at every requested granularity.
pub type AggregatedSeries = BTreeMap<Granularity, SymbolSeries>;

/// Start of the bucket that contains `open_time` (epoch ms, UTC).
///
/// Timestamps outside chrono's representable range are returned unchanged.
pub fn bucket_start(granularity: Granularity, open_time: i64) -> i64 {
    if granularity == Granularity::Hourly {
        return open_time;
    }
    let Some(dt) = DateTime::from_timestamp_millis(open_time) else {
        return open_time;
    };

    let day = dt.date_naive();
    let first_day = match granularity {
        Granularity::Weekly => day.week(Weekday::Mon).first_day(),
        _ => day,
    };
    first_day.and_time(NaiveTime::MIN).and_utc().timestamp_millis()
}

/// Resample a base series into `granularity`.
///
/// The input must be ordered by `open_time` (the `SymbolSeries` invariant).
pub fn resample(series: &SymbolSeries, granularity: Granularity) -> SymbolSeries {
    if granularity == Granularity::Hourly {
        return SymbolSeries {
            granularity,
            ..series.clone()
        };
    }

    let mut buckets: Vec<Candle> = Vec::new();
    for candle in &series.candles {
        let start = bucket_start(granularity, candle.open_time);
        match buckets.last_mut() {
            Some(bucket) if bucket.open_time == start => {
                bucket.high = bucket.high.max(candle.high);
                bucket.low = bucket.low.min(candle.low);
                bucket.close = candle.close;
                bucket.volume += candle.volume;
            }
            _ => buckets.push(Candle {
                open_time: start,
                ..*candle
            }),
        }
    }

    SymbolSeries {
        symbol: series.symbol.clone(),
        granularity,
        candles: buckets,
    }
}

/// Resample one base series into every granularity in `granularities`.
///
/// An empty base series yields an empty series at every granularity.
pub fn aggregate(series: &SymbolSeries, granularities: &[Granularity]) -> AggregatedSeries {
    granularities
        .iter()
        .map(|&g| (g, resample(series, g)))
        .collect()
}
