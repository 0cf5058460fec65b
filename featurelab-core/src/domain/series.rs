//! Column-level helpers shared by pipeline stages.
//!
//! All helpers follow the same missing-value convention: a NaN input poisons
//! any window that contains it, and positions without enough history are NaN.

/// Lag a series by `periods` rows; the first `periods` values become NaN.
pub fn shift(values: &[f64], periods: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if periods < n {
        out[periods..].copy_from_slice(&values[..n - periods]);
    }
    out
}

/// Rolling maximum over `window` rows. Requires a full, NaN-free window.
pub fn rolling_max(values: &[f64], window: usize) -> Vec<f64> {
    rolling(values, window, f64::NEG_INFINITY, f64::max)
}

/// Rolling minimum over `window` rows. Requires a full, NaN-free window.
pub fn rolling_min(values: &[f64], window: usize) -> Vec<f64> {
    rolling(values, window, f64::INFINITY, f64::min)
}

fn rolling(values: &[f64], window: usize, init: f64, fold: fn(f64, f64) -> f64) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if window == 0 || n < window {
        return out;
    }
    for i in (window - 1)..n {
        let slice = &values[i + 1 - window..=i];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        out[i] = slice.iter().copied().fold(init, fold);
    }
    out
}

/// Left-pad with NaN up to `len`. Longer inputs keep their last `len` values.
pub fn pad_front(mut values: Vec<f64>, len: usize) -> Vec<f64> {
    if values.len() >= len {
        return values.split_off(values.len() - len);
    }
    let mut out = vec![f64::NAN; len - values.len()];
    out.append(&mut values);
    out
}

/// Mean of the non-NaN values in `row`; NaN when all are missing.
pub fn nan_mean(row: &[f64]) -> f64 {
    let (sum, count) = row
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Split a series into the positions and values of its non-NaN entries.
pub fn compact(values: &[f64]) -> (Vec<usize>, Vec<f64>) {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .map(|(i, v)| (i, *v))
        .unzip()
}

/// Inverse of [`compact`]: place `values` at `positions` in a NaN series of `len`.
pub fn scatter(positions: &[usize], values: &[f64], len: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; len];
    for (&pos, &v) in positions.iter().zip(values) {
        if pos < len {
            out[pos] = v;
        }
    }
    out
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}
