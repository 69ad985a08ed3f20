// =============================================================================
// Momentum classifier — RSI(14) zone + MACD(12, 26, 9) crossover state
// =============================================================================
//
//   RSI  > 70 Overbought, < 30 Oversold, else Neutral; Unknown below 15 closes
//        or when the RSI is undefined (flat window).
//   MACD line > signal Bullish, < Bearish, == Neutral; Unknown below 26 closes.
//
// The composite label "RSI: <state> MACD: <state>" is what gets written back.
// =============================================================================

use serde::{Deserialize, Serialize};

use super::macd::current_macd;
use super::rsi::current_rsi;
use crate::types::{MacdState, RsiState};

pub const RSI_PERIOD: usize = 14;
pub const RSI_OVERBOUGHT: f64 = 70.0;
pub const RSI_OVERSOLD: f64 = 30.0;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MomentumResult {
    pub rsi: Option<f64>,
    pub macd_line: Option<f64>,
    pub signal_line: Option<f64>,
    pub rsi_state: RsiState,
    pub macd_state: MacdState,
}

impl MomentumResult {
    pub fn overview(&self) -> String {
        format!("RSI: {} MACD: {}", self.rsi_state, self.macd_state)
    }
}

/// Classify momentum of a close series (oldest first).
pub fn analyze_momentum(closes: &[f64]) -> MomentumResult {
    let rsi = current_rsi(closes, RSI_PERIOD);
    let rsi_state = match rsi {
        Some(v) if v > RSI_OVERBOUGHT => RsiState::Overbought,
        Some(v) if v < RSI_OVERSOLD => RsiState::Oversold,
        Some(_) => RsiState::Neutral,
        None => RsiState::Unknown,
    };

    let macd = current_macd(closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL);
    let macd_state = match macd {
        Some(p) if p.macd > p.signal => MacdState::Bullish,
        Some(p) if p.macd < p.signal => MacdState::Bearish,
        Some(p) if p.macd == p.signal => MacdState::Neutral,
        _ => MacdState::Unknown,
    };

    MomentumResult {
        rsi,
        macd_line: macd.map(|p| p.macd),
        signal_line: macd.map(|p| p.signal),
        rsi_state,
        macd_state,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_gains_saturate_rsi_and_are_overbought() {
        let closes: Vec<f64> = (1..=15).map(|x| x as f64).collect();
        let m = analyze_momentum(&closes);
        assert_eq!(m.rsi, Some(100.0));
        assert_eq!(m.rsi_state, RsiState::Overbought);
        // 15 closes are not enough for MACD.
        assert_eq!(m.macd_state, MacdState::Unknown);
        assert_eq!(m.macd_line, None);
        assert_eq!(m.overview(), "RSI: Overbought MACD: Unknown");
    }

    #[test]
    fn fourteen_closes_are_unknown() {
        let closes: Vec<f64> = (1..=14).map(|x| x as f64).collect();
        let m = analyze_momentum(&closes);
        assert_eq!(m.rsi, None);
        assert_eq!(m.rsi_state, RsiState::Unknown);
    }

    #[test]
    fn falling_series_is_oversold_and_bearish() {
        let closes: Vec<f64> = (1..=80).rev().map(|x| x as f64).collect();
        let m = analyze_momentum(&closes);
        assert_eq!(m.rsi_state, RsiState::Oversold);
        assert_eq!(m.macd_state, MacdState::Bearish);
        assert_eq!(m.overview(), "RSI: Oversold MACD: Bearish");
        assert!(m.signal_line.is_some());
    }

    #[test]
    fn rising_series_is_bullish() {
        let closes: Vec<f64> = (1..=80).map(|x| x as f64).collect();
        let m = analyze_momentum(&closes);
        assert_eq!(m.macd_state, MacdState::Bullish);
        assert_eq!(m.overview(), "RSI: Overbought MACD: Bullish");
    }

    #[test]
    fn balanced_oscillation_is_neutral_rsi() {
        // Equal-sized alternating moves => RSI 50.
        let closes: Vec<f64> = (0..40).map(|i| if i % 2 == 0 { 100.0 } else { 101.0 }).collect();
        let m = analyze_momentum(&closes);
        assert_eq!(m.rsi, Some(50.0));
        assert_eq!(m.rsi_state, RsiState::Neutral);
    }

    #[test]
    fn flat_series_has_unknown_rsi() {
        let m = analyze_momentum(&[64.0; 40]);
        assert_eq!(m.rsi_state, RsiState::Unknown);
        assert!(m.macd_line.is_some());
    }

    #[test]
    fn flat_series_at_market_price_is_macd_neutral() {
        for level in [27_123.37, 0.1, 1.1] {
            let m = analyze_momentum(&vec![level; 60]);
            assert_eq!(m.macd_line, Some(0.0), "level {level}");
            assert_eq!(m.signal_line, Some(0.0), "level {level}");
            assert_eq!(m.macd_state, MacdState::Neutral, "level {level}");
            assert_eq!(m.overview(), "RSI: Unknown MACD: Neutral");
        }
    }

    #[test]
    fn empty_series_is_all_unknown() {
        let m = analyze_momentum(&[]);
        assert_eq!(m.overview(), "RSI: Unknown MACD: Unknown");
    }
}
