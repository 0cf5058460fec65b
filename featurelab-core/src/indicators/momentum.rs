//! Momentum and rate of change.
//!
//! momentum[t] = x[t] - x[t-period]
//! roc[t] = (x[t] - x[t-period]) / x[t-period] * 100
//! Lookback: period.

pub fn momentum(values: &[f64], period: usize) -> Vec<f64> {
    lagged(values, period, |curr, prev| curr - prev)
}

pub fn roc(values: &[f64], period: usize) -> Vec<f64> {
    lagged(values, period, |curr, prev| {
        if prev == 0.0 {
            f64::NAN
        } else {
            (curr - prev) / prev * 100.0
        }
    })
}

fn lagged(values: &[f64], period: usize, f: impl Fn(f64, f64) -> f64) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    for i in period..n {
        let (curr, prev) = (values[i], values[i - period]);
        if !curr.is_nan() && !prev.is_nan() {
            result[i] = f(curr, prev);
        }
    }
    result
}
