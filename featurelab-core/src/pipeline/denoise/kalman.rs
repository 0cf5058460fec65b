//! Scalar local-level Kalman filter.
//!
//! The first observation is corrected against the initial state directly; the
//! transition is applied from the second observation on.

use super::KalmanParams;

pub(super) fn filter(data: &[f64], p: &KalmanParams) -> Vec<f64> {
    let mut out = Vec::with_capacity(data.len());
    let mut mean = p.initial_state_mean;
    let mut cov = p.initial_state_covariance;

    for (t, &z) in data.iter().enumerate() {
        let (pred_mean, pred_cov) = if t == 0 {
            (mean, cov)
        } else {
            (
                p.transition * mean,
                p.transition * cov * p.transition + p.transition_covariance,
            )
        };

        let innovation_cov = p.observation * pred_cov * p.observation + p.observation_covariance;
        let gain = if innovation_cov == 0.0 {
            0.0
        } else {
            pred_cov * p.observation / innovation_cov
        };
        mean = pred_mean + gain * (z - p.observation * pred_mean);
        cov = pred_cov - gain * p.observation * pred_cov;
        out.push(mean);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::series::assert_approx;

    #[test]
    fn first_step_blends_prior_and_observation() {
        // P0 = 1, R = 1 -> gain 0.5
        let out = filter(&[10.0], &KalmanParams::default());
        assert_approx(out[0], 5.0, 1e-12);
    }

    #[test]
    fn converges_on_constant_signal() {
        let params = KalmanParams {
            transition_covariance: 0.1,
            ..KalmanParams::default()
        };
        let out = filter(&vec![3.0; 200], &params);
        assert_approx(out[199], 3.0, 1e-6);
    }

    #[test]
    fn smooths_noise() {
        let noisy: Vec<f64> = (0..100).map(|i| 50.0 + if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let params = KalmanParams {
            initial_state_mean: 50.0,
            ..KalmanParams::default()
        };
        let out = filter(&noisy, &params);
        assert!(out[50..].iter().all(|v| (v - 50.0).abs() < 0.5));
    }
}
