//! Bounded oscillators and volume accumulators: Williams %R, stochastic,
//! MACD, CCI, OBV.

use super::moving_average::{ema, sma};
use crate::domain::series::{rolling_max, rolling_min};

/// Williams %R over `period` bars, in `[-100, 0]`. A flat window reads 0.
pub fn willr(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Vec<f64> {
    let hh = rolling_max(high, period);
    let ll = rolling_min(low, period);
    (0..close.len().min(hh.len()))
        .map(|i| {
            let range = hh[i] - ll[i];
            if range.is_nan() || close[i].is_nan() {
                f64::NAN
            } else if range == 0.0 {
                0.0
            } else {
                (hh[i] - close[i]) / range * -100.0
            }
        })
        .collect()
}

/// Slow stochastic. Returns `(slow_k, slow_d)`.
///
/// The raw %K over `fastk_period` is smoothed by an SMA of `slowk_period`,
/// and %D is an SMA of `slowd_period` over the smoothed %K.
pub fn stoch(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    fastk_period: usize,
    slowk_period: usize,
    slowd_period: usize,
) -> (Vec<f64>, Vec<f64>) {
    let hh = rolling_max(high, fastk_period);
    let ll = rolling_min(low, fastk_period);
    let fast_k: Vec<f64> = (0..close.len().min(hh.len()))
        .map(|i| {
            let range = hh[i] - ll[i];
            if range.is_nan() || close[i].is_nan() {
                f64::NAN
            } else if range == 0.0 {
                0.0
            } else {
                (close[i] - ll[i]) / range * 100.0
            }
        })
        .collect();
    let slow_k = sma(&fast_k, slowk_period);
    let slow_d = sma(&slow_k, slowd_period);
    (slow_k, slow_d)
}

/// MACD line, signal line and histogram.
pub fn macd(
    values: &[f64],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let fast = ema(values, fast_period);
    let slow = ema(values, slow_period);
    let line: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
    let signal = ema(&line, signal_period);
    let hist = line.iter().zip(&signal).map(|(m, s)| m - s).collect();
    (line, signal, hist)
}

/// Commodity channel index on the typical price, constant 0.015.
pub fn cci(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Vec<f64> {
    let n = high.len().min(low.len()).min(close.len());
    let tp: Vec<f64> = (0..n).map(|i| (high[i] + low[i] + close[i]) / 3.0).collect();
    let mean = sma(&tp, period);
    let mut result = vec![f64::NAN; n];
    if period == 0 {
        return result;
    }
    for i in 0..n {
        if mean[i].is_nan() || i + 1 < period {
            continue;
        }
        let window = &tp[i + 1 - period..=i];
        let deviation = window.iter().map(|v| (v - mean[i]).abs()).sum::<f64>() / period as f64;
        result[i] = if deviation == 0.0 {
            0.0
        } else {
            (tp[i] - mean[i]) / (0.015 * deviation)
        };
    }
    result
}

/// On-balance volume, starting from the first bar's volume.
pub fn obv(close: &[f64], volume: &[f64]) -> Vec<f64> {
    let n = close.len().min(volume.len());
    let mut result = vec![f64::NAN; n];
    if n == 0 {
        return result;
    }
    let mut acc = volume[0];
    result[0] = acc;
    for i in 1..n {
        if close[i].is_nan() || close[i - 1].is_nan() || volume[i].is_nan() {
            result[i] = acc;
            continue;
        }
        if close[i] > close[i - 1] {
            acc += volume[i];
        } else if close[i] < close[i - 1] {
            acc -= volume[i];
        }
        result[i] = acc;
    }
    result
}
