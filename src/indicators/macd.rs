// =============================================================================
// MACD — Moving Average Convergence Divergence
// =============================================================================
//
//   MACD line   = EMA(fast) - EMA(slow)
//   Signal line = EMA(signal) of the MACD line
//
// All EMAs use the recursive form seeded from the first value (see ema.rs).
// =============================================================================

use super::ema::calculate_ema;

/// Latest MACD line / signal line pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdPoint {
    pub macd: f64,
    pub signal: f64,
}

/// Compute the most recent MACD point.
///
/// Returns `None` with fewer than `slow` closes or when any EMA stops early on
/// non-finite input.
pub fn current_macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> Option<MacdPoint> {
    if slow == 0 || closes.len() < slow {
        return None;
    }

    let ema_fast = calculate_ema(closes, fast);
    let ema_slow = calculate_ema(closes, slow);
    if ema_fast.len() != closes.len() || ema_slow.len() != closes.len() {
        return None;
    }

    let macd_line: Vec<f64> = ema_fast.iter().zip(&ema_slow).map(|(f, s)| f - s).collect();
    let signal_line = calculate_ema(&macd_line, signal);

    Some(MacdPoint {
        macd: *macd_line.last()?,
        signal: *signal_line.last()?,
    })
}
