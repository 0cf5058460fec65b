//! Keltner Channel: EMA +/- ATR multiplier.
//!
//! - Basis: EMA(close, period)
//! - Upper: basis + mult * ATR(period)
//! - Lower: basis - mult * ATR(period)
//!
//! Lookback: period.

use super::atr::atr;
use super::moving_average::ema;

/// Returns `(lower, basis, upper)`.
pub fn keltner(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    period: usize,
    multiplier: f64,
) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let basis = ema(close, period);
    let range = atr(high, low, close, period);

    let upper = basis
        .iter()
        .zip(&range)
        .map(|(b, r)| b + multiplier * r)
        .collect();
    let lower = basis
        .iter()
        .zip(&range)
        .map(|(b, r)| b - multiplier * r)
        .collect();
    (lower, basis, upper)
}
