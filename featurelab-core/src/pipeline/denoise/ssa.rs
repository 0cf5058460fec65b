//! Singular spectrum analysis.
//!
//! The series is embedded in an `L x K` trajectory matrix. Its leading
//! singular triples come from the eigen-decomposition of the `L x L` lag
//! covariance `X Xᵀ`, and the rank-reduced matrix is mapped back to a series by
//! anti-diagonal averaging.

use ndarray::{Array1, Array2, Axis};

use super::{DenoiseError, SsaParams};

const MAX_SWEEPS: usize = 100;

pub(super) fn denoise(data: &[f64], params: &SsaParams) -> Result<Vec<f64>, DenoiseError> {
    let n = data.len();
    let l = params.window_length;
    if l < 2 || l >= n {
        return Err(DenoiseError::InvalidParameter {
            method: "ssa",
            name: "window_length",
            reason: format!("must be in 2..{n} for a series of {n} values, got {l}"),
        });
    }
    let k = n - l + 1;

    let trajectory = Array2::from_shape_fn((l, k), |(i, j)| data[i + j]);
    let lag_cov = trajectory.dot(&trajectory.t());
    let (eigenvalues, eigenvectors) = symmetric_eigen(lag_cov);

    let mut order: Vec<usize> = (0..l).collect();
    order.sort_by(|&a, &b| eigenvalues[b].total_cmp(&eigenvalues[a]));
    let keep = params.n_components.min(l);

    // Projection onto the leading eigenvectors: U_k U_kᵀ X
    let leading = eigenvectors.select(Axis(1), &order[..keep]);
    let reduced = leading.dot(&leading.t().dot(&trajectory));

    Ok(diagonal_average(&reduced))
}

/// Average each anti-diagonal of `m` into one series value.
fn diagonal_average(m: &Array2<f64>) -> Vec<f64> {
    let (rows, cols) = m.dim();
    let mut sums = Array1::<f64>::zeros(rows + cols - 1);
    let mut counts = Array1::<f64>::zeros(rows + cols - 1);
    for ((i, j), v) in m.indexed_iter() {
        sums[i + j] += v;
        counts[i + j] += 1.0;
    }
    (sums / counts).to_vec()
}

/// Cyclic Jacobi eigen-decomposition of a symmetric matrix.
///
/// Returns the eigenvalues and a matrix whose columns are the eigenvectors.
fn symmetric_eigen(mut a: Array2<f64>) -> (Vec<f64>, Array2<f64>) {
    let n = a.nrows();
    let mut v = Array2::<f64>::eye(n);

    for _ in 0..MAX_SWEEPS {
        let off: f64 = (0..n)
            .flat_map(|p| (0..n).filter(move |&q| q != p).map(move |q| (p, q)))
            .map(|(p, q)| a[[p, q]] * a[[p, q]])
            .sum();
        let scale: f64 = a.iter().map(|x| x * x).sum();
        if off <= 1e-28 * scale.max(f64::MIN_POSITIVE) {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[[p, q]];
                if apq == 0.0 {
                    continue;
                }
                let theta = (a[[q, q]] - a[[p, p]]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let t = if theta == 0.0 { 1.0 } else { t };
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for r in 0..n {
                    let arp = a[[r, p]];
                    let arq = a[[r, q]];
                    a[[r, p]] = c * arp - s * arq;
                    a[[r, q]] = s * arp + c * arq;
                }
                for r in 0..n {
                    let apr = a[[p, r]];
                    let aqr = a[[q, r]];
                    a[[p, r]] = c * apr - s * aqr;
                    a[[q, r]] = s * apr + c * aqr;
                }
                for r in 0..n {
                    let vrp = v[[r, p]];
                    let vrq = v[[r, q]];
                    v[[r, p]] = c * vrp - s * vrq;
                    v[[r, q]] = s * vrp + c * vrq;
                }
            }
        }
    }

    let eigenvalues = (0..n).map(|i| a[[i, i]]).collect();
    (eigenvalues, v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn jacobi_diagonalizes() {
        let m = array![[4.0, 1.0, 0.5], [1.0, 3.0, 0.2], [0.5, 0.2, 1.0]];
        let (values, vectors) = symmetric_eigen(m.clone());
        for (i, lambda) in values.iter().enumerate() {
            let col = vectors.column(i);
            let mv = m.dot(&col);
            for r in 0..3 {
                assert!((mv[r] - lambda * col[r]).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn full_rank_reconstructs_input() {
        let data: Vec<f64> = (0..30).map(|i| (i as f64 * 0.4).sin() + i as f64 * 0.1).collect();
        let out = denoise(
            &data,
            &SsaParams {
                window_length: 6,
                n_components: 6,
            },
        )
        .unwrap();
        for (a, b) in data.iter().zip(&out) {
            assert!((a - b).abs() < 1e-8);
        }
    }

    #[test]
    fn leading_component_tracks_trend() {
        let data: Vec<f64> = (0..60)
            .map(|i| 10.0 + i as f64 * 0.5 + if i % 2 == 0 { 0.3 } else { -0.3 })
            .collect();
        let out = denoise(
            &data,
            &SsaParams {
                window_length: 10,
                n_components: 2,
            },
        )
        .unwrap();
        assert_eq!(out.len(), 60);
        for i in 5..55 {
            let trend = 10.0 + i as f64 * 0.5;
            assert!((out[i] - trend).abs() < 0.3, "bar {i}: {} vs {trend}", out[i]);
        }
    }

    #[test]
    fn window_must_fit() {
        let err = denoise(&[1.0, 2.0, 3.0], &SsaParams::default()).unwrap_err();
        assert!(matches!(err, DenoiseError::InvalidParameter { name: "window_length", .. }));
    }
}
