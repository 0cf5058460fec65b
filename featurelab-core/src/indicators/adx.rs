//! ADX: Average Directional Index (Wilder).
//!
//! Steps:
//! 1. Compute +DM and -DM from consecutive bars
//! 2. Smooth +DM, -DM, and TR using Wilder smoothing (alpha = 1/period)
//! 3. +DI = 100 * smoothed(+DM) / smoothed(TR)
//! 4. -DI = 100 * smoothed(-DM) / smoothed(TR)
//! 5. DX = 100 * |+DI - -DI| / (+DI + -DI)
//! 6. ADX = Wilder-smoothed DX
//!
//! Lookback: 2 * period (period for DI smoothing, then period for ADX smoothing).

use super::atr::{true_range, wilder_smooth};

pub fn adx(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Vec<f64> {
    let n = high.len().min(low.len()).min(close.len());
    let result = vec![f64::NAN; n];

    if n < 2 || period == 0 {
        return result;
    }

    let mut plus_dm = vec![f64::NAN; n];
    let mut minus_dm = vec![f64::NAN; n];

    for i in 1..n {
        if high[i].is_nan() || low[i].is_nan() || high[i - 1].is_nan() || low[i - 1].is_nan() {
            continue;
        }
        let high_diff = high[i] - high[i - 1];
        let low_diff = low[i - 1] - low[i];

        plus_dm[i] = if high_diff > low_diff && high_diff > 0.0 {
            high_diff
        } else {
            0.0
        };
        minus_dm[i] = if low_diff > high_diff && low_diff > 0.0 {
            low_diff
        } else {
            0.0
        };
    }

    let mut tr = true_range(high, low, close);
    tr[0] = f64::NAN;
    let smooth_tr = wilder_smooth(&tr, period);
    let smooth_plus_dm = wilder_smooth(&plus_dm, period);
    let smooth_minus_dm = wilder_smooth(&minus_dm, period);

    let mut dx = vec![f64::NAN; n];
    for i in 0..n {
        if smooth_tr[i].is_nan()
            || smooth_plus_dm[i].is_nan()
            || smooth_minus_dm[i].is_nan()
            || smooth_tr[i] == 0.0
        {
            continue;
        }

        let plus_di = 100.0 * smooth_plus_dm[i] / smooth_tr[i];
        let minus_di = 100.0 * smooth_minus_dm[i] / smooth_tr[i];
        let di_sum = plus_di + minus_di;

        dx[i] = if di_sum == 0.0 {
            0.0
        } else {
            100.0 * (plus_di - minus_di).abs() / di_sum
        };
    }

    wilder_smooth(&dx, period)
}
