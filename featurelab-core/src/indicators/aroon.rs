//! Aroon: time since highest high and lowest low as a percentage.
//!
//! Aroon Up = 100 * (period - bars_since_highest_high) / period
//! Aroon Down = 100 * (period - bars_since_lowest_low) / period
//! The window spans `period + 1` bars; ties resolve to the most recent bar.
//! Lookback: period.

/// Returns `(down, up)`.
pub fn aroon(high: &[f64], low: &[f64], period: usize) -> (Vec<f64>, Vec<f64>) {
    let n = high.len().min(low.len());
    let mut up = vec![f64::NAN; n];
    let mut down = vec![f64::NAN; n];

    if period == 0 || n <= period {
        return (down, up);
    }

    for i in period..n {
        let start = i - period;
        let highs = &high[start..=i];
        let lows = &low[start..=i];

        if !highs.iter().any(|v| v.is_nan()) {
            let offset = extreme_offset(highs, |a, b| a >= b);
            up[i] = 100.0 * offset as f64 / period as f64;
        }
        if !lows.iter().any(|v| v.is_nan()) {
            let offset = extreme_offset(lows, |a, b| a <= b);
            down[i] = 100.0 * offset as f64 / period as f64;
        }
    }

    (down, up)
}

/// Offset of the (latest) extreme within `window`.
fn extreme_offset(window: &[f64], better_or_equal: fn(f64, f64) -> bool) -> usize {
    let mut best = window[0];
    let mut offset = 0;
    for (j, &v) in window.iter().enumerate().skip(1) {
        if better_or_equal(v, best) {
            best = v;
            offset = j;
        }
    }
    offset
}
