/// Mean of the last `period` values, if there are that many.
///
/// A window of identical values returns that value exactly; otherwise the sum
/// is compensated (Kahan) so windows of different lengths over the same level
/// agree to the last bit as often as possible.
pub fn last_sma(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    Some(window_mean(&values[values.len() - period..]))
}

fn window_mean(window: &[f64]) -> f64 {
    let first = window[0];
    if window.iter().all(|&v| v == first) {
        return first;
    }

    let mut sum = 0.0_f64;
    let mut carry = 0.0_f64;
    for &v in window {
        let y = v - carry;
        let t = sum + y;
        carry = (t - sum) - y;
        sum = t;
    }
    sum / window.len() as f64
}
