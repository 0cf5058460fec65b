//! Empirical mode decomposition by cubic-spline sifting.
//!
//! Components come out highest frequency first; the final component is the
//! residue, so the components always sum back to the input.

use super::EmdParams;

/// Relative squared-difference threshold that ends sifting of one mode.
const SIFT_TOLERANCE: f64 = 0.2;

pub(super) fn denoise(data: &[f64], params: &EmdParams) -> Vec<f64> {
    let components = decompose(data, params);
    let mut out = vec![0.0; data.len()];
    for component in components.iter().skip(params.n_imfs_to_remove) {
        for (o, v) in out.iter_mut().zip(component) {
            *o += v;
        }
    }
    out
}

/// Intrinsic mode functions followed by the residue.
fn decompose(data: &[f64], params: &EmdParams) -> Vec<Vec<f64>> {
    let mut components = Vec::new();
    let mut residue = data.to_vec();

    while components.len() < params.max_imfs {
        let (maxima, minima) = extrema(&residue);
        if maxima.len() < 2 || minima.len() < 2 {
            break;
        }

        let mut mode = residue.clone();
        for _ in 0..params.max_sifts {
            let Some(mean) = envelope_mean(&mode) else {
                break;
            };
            let change: f64 = mean.iter().map(|m| m * m).sum();
            let energy: f64 = mode.iter().map(|h| h * h).sum();
            for (h, m) in mode.iter_mut().zip(&mean) {
                *h -= m;
            }
            if energy == 0.0 || change / energy < SIFT_TOLERANCE * SIFT_TOLERANCE {
                break;
            }
        }

        for (r, m) in residue.iter_mut().zip(&mode) {
            *r -= m;
        }
        components.push(mode);
    }

    components.push(residue);
    components
}

/// Indices of strict interior local maxima and minima.
fn extrema(x: &[f64]) -> (Vec<usize>, Vec<usize>) {
    let mut maxima = Vec::new();
    let mut minima = Vec::new();
    for i in 1..x.len().saturating_sub(1) {
        if x[i] > x[i - 1] && x[i] >= x[i + 1] {
            maxima.push(i);
        } else if x[i] < x[i - 1] && x[i] <= x[i + 1] {
            minima.push(i);
        }
    }
    (maxima, minima)
}

/// Mean of the upper and lower spline envelopes, or `None` when the signal has
/// too few extrema to build them.
fn envelope_mean(x: &[f64]) -> Option<Vec<f64>> {
    let (maxima, minima) = extrema(x);
    if maxima.len() < 2 || minima.len() < 2 {
        return None;
    }
    let upper = envelope(x, &maxima);
    let lower = envelope(x, &minima);
    Some(upper.iter().zip(&lower).map(|(u, l)| (u + l) / 2.0).collect())
}

/// Spline through the given extrema, pinned to the series end points.
fn envelope(x: &[f64], idx: &[usize]) -> Vec<f64> {
    let last = x.len() - 1;
    let mut knots_x = Vec::with_capacity(idx.len() + 2);
    let mut knots_y = Vec::with_capacity(idx.len() + 2);
    if idx.first() != Some(&0) {
        knots_x.push(0.0);
        knots_y.push(x[0]);
    }
    for &i in idx {
        knots_x.push(i as f64);
        knots_y.push(x[i]);
    }
    if idx.last() != Some(&last) {
        knots_x.push(last as f64);
        knots_y.push(x[last]);
    }
    natural_spline(&knots_x, &knots_y, x.len())
}

/// Natural cubic spline through `(xs, ys)` evaluated at `0..len`.
fn natural_spline(xs: &[f64], ys: &[f64], len: usize) -> Vec<f64> {
    let n = xs.len();
    if n < 3 {
        // straight line between the two knots
        let slope = (ys[n - 1] - ys[0]) / (xs[n - 1] - xs[0]);
        return (0..len).map(|t| ys[0] + slope * (t as f64 - xs[0])).collect();
    }

    let h: Vec<f64> = xs.windows(2).map(|w| w[1] - w[0]).collect();

    // Tridiagonal system for the second derivatives at interior knots
    let m = n - 2;
    let mut diag = vec![0.0; m];
    let mut upper = vec![0.0; m];
    let mut rhs = vec![0.0; m];
    for i in 0..m {
        diag[i] = 2.0 * (h[i] + h[i + 1]);
        upper[i] = h[i + 1];
        rhs[i] = 6.0 * ((ys[i + 2] - ys[i + 1]) / h[i + 1] - (ys[i + 1] - ys[i]) / h[i]);
    }
    for i in 1..m {
        let w = h[i] / diag[i - 1];
        diag[i] -= w * upper[i - 1];
        rhs[i] -= w * rhs[i - 1];
    }
    let mut second = vec![0.0; n];
    for i in (0..m).rev() {
        let next = if i + 1 < m { second[i + 2] } else { 0.0 };
        second[i + 1] = (rhs[i] - upper[i] * next) / diag[i];
    }

    let mut seg = 0;
    (0..len)
        .map(|t| {
            let t = t as f64;
            while seg + 2 < n && t > xs[seg + 1] {
                seg += 1;
            }
            let (x0, x1) = (xs[seg], xs[seg + 1]);
            let hs = x1 - x0;
            let a = (x1 - t) / hs;
            let b = (t - x0) / hs;
            a * ys[seg]
                + b * ys[seg + 1]
                + ((a * a * a - a) * second[seg] + (b * b * b - b) * second[seg + 1]) * hs * hs / 6.0
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_tone(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let t = i as f64;
                (t * 1.3).sin() * 0.8 + (t * 0.08).sin() * 4.0 + 20.0
            })
            .collect()
    }

    #[test]
    fn zero_removal_reconstructs_input() {
        let data = two_tone(200);
        let params = EmdParams {
            n_imfs_to_remove: 0,
            ..EmdParams::default()
        };
        let out = denoise(&data, &params);
        for (a, b) in data.iter().zip(&out) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn first_mode_carries_fast_oscillation() {
        let data = two_tone(200);
        let smooth = denoise(&data, &EmdParams::default());
        let slow: Vec<f64> = (0..200).map(|i| (i as f64 * 0.08).sin() * 4.0 + 20.0).collect();
        let before: f64 = data.iter().zip(&slow).map(|(a, b)| (a - b).powi(2)).sum();
        let after: f64 = smooth.iter().zip(&slow).map(|(a, b)| (a - b).powi(2)).sum();
        assert!(after < before * 0.5, "after={after} before={before}");
    }

    #[test]
    fn monotonic_input_is_all_residue() {
        let data: Vec<f64> = (0..20).map(|i| i as f64 * 2.0).collect();
        let components = decompose(&data, &EmdParams::default());
        assert_eq!(components.len(), 1);
        assert_eq!(denoise(&data, &EmdParams::default()), vec![0.0; 20]);
    }

    #[test]
    fn spline_interpolates_knots() {
        let xs = [0.0, 3.0, 5.0, 9.0];
        let ys = [1.0, 4.0, -2.0, 0.5];
        let s = natural_spline(&xs, &ys, 10);
        assert!((s[0] - 1.0).abs() < 1e-12);
        assert!((s[3] - 4.0).abs() < 1e-12);
        assert!((s[5] + 2.0).abs() < 1e-12);
        assert!((s[9] - 0.5).abs() < 1e-12);
    }
}
