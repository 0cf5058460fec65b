//! Bollinger Bands: moving average +/- standard deviation multiplier.
//!
//! - Middle: SMA(values, period)
//! - Upper: middle + dev_up * stddev(values, period)
//! - Lower: middle - dev_down * stddev(values, period)
//!
//! Uses population stddev (divide by N).
//! Lookback: period - 1.

/// Returns `(upper, middle, lower)`.
pub fn bollinger(
    values: &[f64],
    period: usize,
    dev_up: f64,
    dev_down: f64,
) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let n = values.len();
    let mut upper = vec![f64::NAN; n];
    let mut middle = vec![f64::NAN; n];
    let mut lower = vec![f64::NAN; n];

    if period == 0 || n < period {
        return (upper, middle, lower);
    }

    for i in (period - 1)..n {
        let window = &values[i + 1 - period..=i];
        if window.iter().any(|v| v.is_nan()) {
            continue;
        }

        let mean = window.iter().sum::<f64>() / period as f64;
        let variance = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / period as f64;
        let stddev = variance.sqrt();

        middle[i] = mean;
        upper[i] = mean + dev_up * stddev;
        lower[i] = mean - dev_down * stddev;
    }

    (upper, middle, lower)
}
