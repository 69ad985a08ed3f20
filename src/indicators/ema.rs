// =============================================================================
// Exponential Moving Average (EMA) — recursive, not-adjusted form
// =============================================================================
//
// Formula:
//   alpha  = 2 / (span + 1)
//   EMA_0  = x_0
//   EMA_t  = alpha * x_t + (1 - alpha) * EMA_{t-1}
//
// The series is seeded from the first value, so the output has one element per
// input element.  Callers decide how many leading values they trust.
//
// An input equal to the running average leaves it untouched, so a flat series
// yields an exactly flat EMA.
// =============================================================================

/// Compute the EMA series of `values` for the given `span`.
///
/// Returns an empty `Vec` when the input is empty or `span == 0`.
/// Stops at the first non-finite intermediate value.
pub fn calculate_ema(values: &[f64], span: usize) -> Vec<f64> {
    let Some(&first) = values.first() else {
        return Vec::new();
    };
    if span == 0 || !first.is_finite() {
        return Vec::new();
    }

    let alpha = 2.0 / (span as f64 + 1.0);

    let mut result = Vec::with_capacity(values.len());
    result.push(first);

    let mut prev = first;
    for &value in &values[1..] {
        if value == prev {
            result.push(prev);
            continue;
        }
        let ema = alpha * value + (1.0 - alpha) * prev;
        if !ema.is_finite() {
            break;
        }
        result.push(ema);
        prev = ema;
    }

    result
}
