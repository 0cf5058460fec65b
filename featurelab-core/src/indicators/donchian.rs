//! Donchian Channel: highest high / lowest low over a lookback window.
//!
//! - Upper: max(high[t-upper_period+1..=t])
//! - Lower: min(low[t-lower_period+1..=t])
//! - Middle: (upper + lower) / 2
//!
//! Lookback: max(lower_period, upper_period) - 1 for the middle line.

use crate::domain::series::{rolling_max, rolling_min};

/// Returns `(lower, middle, upper)`. The two bands may use different windows.
pub fn donchian(
    high: &[f64],
    low: &[f64],
    lower_period: usize,
    upper_period: usize,
) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let upper = rolling_max(high, upper_period);
    let lower = rolling_min(low, lower_period);
    let middle = upper.iter().zip(&lower).map(|(u, l)| (u + l) / 2.0).collect();
    (lower, middle, upper)
}
