//! Average True Range (ATR) and its normalized form.
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|)
//! ATR uses Wilder smoothing (EMA with alpha = 1/period).
//! Lookback: period (needs period+1 bars for TR series, then average).

/// Compute the True Range series.
/// TR[0] = high[0] - low[0] (no previous close).
/// TR[t] = max(high[t]-low[t], |high[t]-close[t-1]|, |low[t]-close[t-1]|).
pub fn true_range(high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
    let n = high.len().min(low.len()).min(close.len());
    let mut tr = vec![f64::NAN; n];

    if n == 0 {
        return tr;
    }

    tr[0] = high[0] - low[0];

    for i in 1..n {
        let (h, l, pc) = (high[i], low[i], close[i - 1]);
        if h.is_nan() || l.is_nan() || pc.is_nan() {
            tr[i] = f64::NAN;
        } else {
            tr[i] = (h - l).max((h - pc).abs()).max((l - pc).abs());
        }
    }

    tr
}

/// Apply Wilder smoothing to a series. Alpha = 1/period.
/// Seed: mean of the first run of `period` consecutive non-NaN values.
pub fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if n < period || period == 0 {
        return result;
    }

    // First index that starts `period` consecutive non-NaN values
    let mut run = 0usize;
    let mut seed_end = None;
    for (i, v) in values.iter().enumerate() {
        if v.is_nan() {
            run = 0;
        } else {
            run += 1;
            if run == period {
                seed_end = Some(i + 1);
                break;
            }
        }
    }
    let seed_end = match seed_end {
        Some(e) => e,
        None => return result,
    };

    let seed: f64 = values[seed_end - period..seed_end].iter().sum::<f64>() / period as f64;
    result[seed_end - 1] = seed;

    let alpha = 1.0 / period as f64;
    let mut prev = seed;

    for i in seed_end..n {
        if values[i].is_nan() {
            return result;
        }
        let smoothed = alpha * values[i] + (1.0 - alpha) * prev;
        result[i] = smoothed;
        prev = smoothed;
    }

    result
}

/// Wilder ATR. TR[0] is excluded from the seed so the first value lands at `period`.
pub fn atr(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Vec<f64> {
    let mut tr = true_range(high, low, close);
    if !tr.is_empty() {
        tr[0] = f64::NAN;
    }
    wilder_smooth(&tr, period)
}

/// ATR as a percentage of close.
pub fn natr(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Vec<f64> {
    atr(high, low, close, period)
        .iter()
        .zip(close)
        .map(|(a, c)| if *c == 0.0 { f64::NAN } else { a / c * 100.0 })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    type Hlc = (Vec<f64>, Vec<f64>, Vec<f64>);

    fn hlc(data: &[(f64, f64, f64, f64)]) -> Hlc {
        (
            data.iter().map(|d| d.1).collect(),
            data.iter().map(|d| d.2).collect(),
            data.iter().map(|d| d.3).collect(),
        )
    }

    const SAMPLE: [(f64, f64, f64, f64); 5] = [
        (100.0, 105.0, 95.0, 102.0),  // TR = 10
        (102.0, 108.0, 100.0, 106.0), // TR = 8
        (106.0, 107.0, 98.0, 99.0),   // TR = 9
        (99.0, 103.0, 97.0, 101.0),   // TR = 6
        (101.0, 106.0, 100.0, 105.0), // TR = 6
    ];

    #[test]
    fn true_range_basic() {
        let (h, l, c) = hlc(&SAMPLE[..3]);
        let tr = true_range(&h, &l, &c);
        assert_approx(tr[0], 10.0, DEFAULT_EPSILON);
        assert_approx(tr[1], 8.0, DEFAULT_EPSILON);
        assert_approx(tr[2], 9.0, DEFAULT_EPSILON);
    }

    #[test]
    fn true_range_gap_up() {
        // prev close 100, current bar 110-115-108: TR = max(7, 15, 8)
        let (h, l, c) = hlc(&[(98.0, 102.0, 97.0, 100.0), (110.0, 115.0, 108.0, 112.0)]);
        let tr = true_range(&h, &l, &c);
        assert_approx(tr[1], 15.0, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_period_3() {
        let (h, l, c) = hlc(&SAMPLE);
        let result = atr(&h, &l, &c, 3);

        assert!(result[..3].iter().all(|v| v.is_nan()));
        // Seed uses TR[1..=3] = [8, 9, 6]
        assert_approx(result[3], 23.0 / 3.0, DEFAULT_EPSILON);
        assert_approx(result[4], 64.0 / 9.0, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_nan_delays_seed() {
        let (mut h, l, c) = hlc(&SAMPLE);
        h[1] = f64::NAN;
        let result = atr(&h, &l, &c, 2);
        // TR[2..=3] is the first clean pair
        assert!(result[..3].iter().all(|v| v.is_nan()));
        assert_approx(result[3], 7.5, DEFAULT_EPSILON);
    }

    #[test]
    fn natr_is_percentage_of_close() {
        let (h, l, c) = hlc(&SAMPLE);
        let a = atr(&h, &l, &c, 3);
        let n = natr(&h, &l, &c, 3);
        assert_approx(n[4], a[4] / 105.0 * 100.0, DEFAULT_EPSILON);
    }
}
