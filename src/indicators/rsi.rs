// =============================================================================
// Relative Strength Index (RSI) — simple rolling averages
// =============================================================================
//
// Step 1 — delta_t = close_t - close_{t-1}
// Step 2 — avg_gain = mean of max(delta, 0) over the trailing `period` deltas
//          avg_loss = mean of max(-delta, 0) over the trailing `period` deltas
// Step 3 — RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS)
//
// Zero average loss:
//   avg_gain > 0  => RSI saturates at 100
//   avg_gain == 0 => undefined (flat window), reported as `None`
// =============================================================================

/// Compute the RSI series for `closes`.
///
/// Element `i` corresponds to close index `i + period`; elements are `None`
/// where the window is flat.  Empty when fewer than `period + 1` closes.
pub fn calculate_rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 || closes.len() < period + 1 {
        return Vec::new();
    }

    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();

    deltas
        .windows(period)
        .map(|window| {
            let (gain, loss) = window.iter().fold((0.0_f64, 0.0_f64), |(g, l), &d| {
                if d > 0.0 {
                    (g + d, l)
                } else {
                    (g, l - d)
                }
            });
            rsi_from_averages(gain / period as f64, loss / period as f64)
        })
        .collect()
}

/// Most recent RSI value, if defined.
pub fn current_rsi(closes: &[f64], period: usize) -> Option<f64> {
    calculate_rsi(closes, period).last().copied().flatten()
}

/// Convert average gain / average loss into an RSI value in [0, 100].
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    let rsi = if avg_loss == 0.0 {
        if avg_gain > 0.0 {
            100.0
        } else {
            return None;
        }
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    };

    rsi.is_finite().then_some(rsi)
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rsi_empty_input() {
        assert!(calculate_rsi(&[], 14).is_empty());
    }

    #[test]
    fn rsi_period_zero() {
        assert!(calculate_rsi(&[1.0, 2.0, 3.0], 0).is_empty());
    }

    #[test]
    fn rsi_insufficient_data() {
        // 14 closes => 13 deltas < 14.
        let closes: Vec<f64> = (1..=14).map(|x| x as f64).collect();
        assert!(calculate_rsi(&closes, 14).is_empty());
        assert_eq!(current_rsi(&closes, 14), None);
    }

    #[test]
    fn rsi_all_gains_saturates() {
        let closes: Vec<f64> = (1..=15).map(|x| x as f64).collect();
        let series = calculate_rsi(&closes, 14);
        assert_eq!(series, vec![Some(100.0)]);
    }

    #[test]
    fn rsi_all_losses_is_zero() {
        let closes: Vec<f64> = (1..=30).rev().map(|x| x as f64).collect();
        for v in calculate_rsi(&closes, 14) {
            assert!(v.unwrap().abs() < 1e-10);
        }
    }

    #[test]
    fn rsi_flat_window_is_undefined() {
        assert_eq!(current_rsi(&[100.0; 30], 14), None);
    }

    #[test]
    fn rsi_uses_trailing_window_only() {
        // Early losses fall out of the window once 14 gains follow them.
        let mut closes: Vec<f64> = vec![50.0, 40.0, 30.0];
        closes.extend((1..=14).map(|x| 30.0 + x as f64));
        assert_eq!(current_rsi(&closes, 14), Some(100.0));
    }

    #[test]
    fn rsi_known_value() {
        // 7 gains of 2 and 7 losses of 1 => RS = 2 => RSI = 66.67
        let mut closes = vec![100.0];
        for i in 0..14 {
            let last = *closes.last().unwrap();
            closes.push(if i % 2 == 0 { last + 2.0 } else { last - 1.0 });
        }
        let rsi = current_rsi(&closes, 14).unwrap();
        assert!((rsi - 200.0 / 3.0).abs() < 1e-9, "got {rsi}");
    }

    #[test]
    fn rsi_range_check() {
        let closes = vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08,
            45.89, 46.03, 44.18, 44.22, 44.57, 43.42, 42.66, 43.13,
        ];
        for v in calculate_rsi(&closes, 14).into_iter().flatten() {
            assert!((0.0..=100.0).contains(&v), "RSI {v} out of range");
        }
    }
}
