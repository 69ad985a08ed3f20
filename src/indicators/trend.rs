// =============================================================================
// Trend classifier — SMA(10) versus SMA(50) at the latest close
// =============================================================================
//
//   SMA10 > SMA50  => Bullish
//   SMA10 < SMA50  => Bearish
//   SMA10 == SMA50 => Range
//   < 50 closes    => Unknown (both averages None)
// =============================================================================

use serde::{Deserialize, Serialize};

use super::sma::last_sma;
use crate::types::TrendState;

pub const SHORT_WINDOW: usize = 10;
pub const LONG_WINDOW: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    pub state: TrendState,
    pub sma_short: Option<f64>,
    pub sma_long: Option<f64>,
}

impl TrendResult {
    pub fn unknown() -> Self {
        Self {
            state: TrendState::Unknown,
            sma_short: None,
            sma_long: None,
        }
    }
}

/// Classify the trend of a close series (oldest first).
pub fn analyze_trend(closes: &[f64]) -> TrendResult {
    let (Some(short), Some(long)) = (
        last_sma(closes, SHORT_WINDOW),
        last_sma(closes, LONG_WINDOW),
    ) else {
        return TrendResult::unknown();
    };

    let state = if short > long {
        TrendState::Bullish
    } else if short < long {
        TrendState::Bearish
    } else if short == long {
        TrendState::Range
    } else {
        // NaN in the input: neither comparison holds.
        return TrendResult::unknown();
    };

    TrendResult {
        state,
        sma_short: Some(short),
        sma_long: Some(long),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increasing_closes_are_bullish() {
        let closes: Vec<f64> = (1..=50).map(|x| x as f64).collect();
        let trend = analyze_trend(&closes);
        assert_eq!(trend.state, TrendState::Bullish);
        assert_eq!(trend.sma_short, Some(45.5));
        assert_eq!(trend.sma_long, Some(25.5));
    }

    #[test]
    fn decreasing_closes_are_bearish() {
        let closes: Vec<f64> = (1..=120).rev().map(|x| x as f64).collect();
        assert_eq!(analyze_trend(&closes).state, TrendState::Bearish);
    }

    #[test]
    fn constant_closes_are_range() {
        for level in [250.0, 0.1, 0.3, 1.1, 27_123.37] {
            let trend = analyze_trend(&vec![level; 60]);
            assert_eq!(trend.state, TrendState::Range, "level {level}");
            assert_eq!(trend.sma_short, Some(level));
            assert_eq!(trend.sma_long, Some(level));
        }
    }

    #[test]
    fn short_series_is_unknown() {
        let closes: Vec<f64> = (1..=49).map(|x| x as f64).collect();
        assert_eq!(analyze_trend(&closes), TrendResult::unknown());
        assert_eq!(analyze_trend(&[]), TrendResult::unknown());
    }

    #[test]
    fn nan_close_is_unknown() {
        let mut closes: Vec<f64> = (1..=60).map(|x| x as f64).collect();
        closes[55] = f64::NAN;
        assert_eq!(analyze_trend(&closes).state, TrendState::Unknown);
    }
}
