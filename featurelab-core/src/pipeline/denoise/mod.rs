//! Signal denoising of frame columns.
//!
//! Each strategy maps a NaN-free series to a reconstruction of the same
//! length. Missing values are dropped before the strategy runs and restored
//! at their original positions afterwards.
//!
//! Strategies are compiled in through the `wavelet`, `kalman`, `ssa` and `emd`
//! cargo features. Requesting one that is compiled out fails with
//! [`DenoiseError::BackendUnavailable`], which is distinct from naming a
//! method that does not exist at all.

#[cfg(feature = "emd")]
mod emd;
#[cfg(feature = "kalman")]
mod kalman;
#[cfg(feature = "ssa")]
mod ssa;
#[cfg(feature = "wavelet")]
mod wavelet;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::series::{compact, scatter};
use crate::domain::FeatureFrame;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DenoiseError {
    #[error("unsupported denoising method: {0}")]
    UnsupportedMethod(String),

    #[error("denoising method '{0}' is not available in this build")]
    BackendUnavailable(&'static str),

    #[error("unknown wavelet: {0}")]
    UnknownWavelet(String),

    #[error("invalid {method} parameter '{name}': {reason}")]
    InvalidParameter {
        method: &'static str,
        name: &'static str,
        reason: String,
    },

    #[error("custom denoising requested without a function")]
    MissingCustomFunction,
}

/// Denoising strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenoiseMethod {
    Wavelet,
    Kalman,
    Ssa,
    Emd,
    Custom,
}

impl DenoiseMethod {
    pub fn name(self) -> &'static str {
        match self {
            DenoiseMethod::Wavelet => "wavelet",
            DenoiseMethod::Kalman => "kalman",
            DenoiseMethod::Ssa => "ssa",
            DenoiseMethod::Emd => "emd",
            DenoiseMethod::Custom => "custom",
        }
    }
}

impl FromStr for DenoiseMethod {
    type Err = DenoiseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wavelet" => Ok(DenoiseMethod::Wavelet),
            "kalman" => Ok(DenoiseMethod::Kalman),
            "ssa" => Ok(DenoiseMethod::Ssa),
            "emd" => Ok(DenoiseMethod::Emd),
            "custom" => Ok(DenoiseMethod::Custom),
            other => Err(DenoiseError::UnsupportedMethod(other.to_string())),
        }
    }
}

/// Caller-supplied series transform. Must return a series of the input length.
#[derive(Clone)]
pub struct CustomDenoiser(Arc<dyn Fn(&[f64]) -> Vec<f64> + Send + Sync>);

impl CustomDenoiser {
    pub fn new(f: impl Fn(&[f64]) -> Vec<f64> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }
}

impl fmt::Debug for CustomDenoiser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomDenoiser(..)")
    }
}

impl PartialEq for CustomDenoiser {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Local-level state-space model settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KalmanParams {
    pub transition: f64,
    pub observation: f64,
    pub transition_covariance: f64,
    pub observation_covariance: f64,
    pub initial_state_mean: f64,
    pub initial_state_covariance: f64,
}

impl Default for KalmanParams {
    fn default() -> Self {
        Self {
            transition: 1.0,
            observation: 1.0,
            transition_covariance: 1e-4,
            observation_covariance: 1.0,
            initial_state_mean: 0.0,
            initial_state_covariance: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SsaParams {
    pub window_length: usize,
    pub n_components: usize,
}

impl Default for SsaParams {
    fn default() -> Self {
        Self {
            window_length: 20,
            n_components: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmdParams {
    pub n_imfs_to_remove: usize,
    /// Upper bound on extracted intrinsic mode functions.
    pub max_imfs: usize,
    /// Upper bound on sifting iterations per mode.
    pub max_sifts: usize,
}

impl Default for EmdParams {
    fn default() -> Self {
        Self {
            n_imfs_to_remove: 1,
            max_imfs: 10,
            max_sifts: 50,
        }
    }
}

/// Denoising configuration of one fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DenoiseSpec {
    pub method: String,
    pub wavelet: String,
    pub level: usize,
    pub kalman: KalmanParams,
    pub ssa: SsaParams,
    pub emd: EmdParams,
    /// Columns to denoise; empty means every column.
    pub columns: Vec<String>,
    /// Replace columns in place instead of adding `denoised_<name>`.
    pub overwrite: bool,
    /// When set, used instead of the named method.
    #[serde(skip)]
    pub custom: Option<CustomDenoiser>,
}

impl Default for DenoiseSpec {
    fn default() -> Self {
        Self {
            method: "wavelet".to_string(),
            wavelet: "rbio2.8".to_string(),
            level: 2,
            kalman: KalmanParams::default(),
            ssa: SsaParams::default(),
            emd: EmdParams::default(),
            columns: Vec::new(),
            overwrite: false,
            custom: None,
        }
    }
}

impl DenoiseSpec {
    pub fn with_method(method: &str) -> Self {
        Self {
            method: method.to_string(),
            ..Self::default()
        }
    }

    pub fn with_custom(f: impl Fn(&[f64]) -> Vec<f64> + Send + Sync + 'static) -> Self {
        Self {
            method: "custom".to_string(),
            custom: Some(CustomDenoiser::new(f)),
            ..Self::default()
        }
    }
}

/// Denoise the selected columns of `frame`.
pub fn denoise(mut frame: FeatureFrame, spec: &DenoiseSpec) -> Result<FeatureFrame, DenoiseError> {
    let method: DenoiseMethod = spec.method.parse()?;
    let targets = if spec.columns.is_empty() {
        frame.column_names()
    } else {
        spec.columns.clone()
    };

    for column in &targets {
        let Some(values) = frame.column(column) else {
            warn!(column = %column, "denoise target column not found, skipping");
            continue;
        };
        let (positions, observed) = compact(values);
        let reconstructed = if observed.is_empty() {
            Vec::new()
        } else {
            reconstruct(method, spec, &observed)?
        };
        let restored = scatter(&positions, &reconstructed, frame.len());

        let name = if spec.overwrite {
            column.clone()
        } else {
            format!("denoised_{column}")
        };
        frame.insert(name, restored);
    }

    debug!(method = method.name(), columns = targets.len(), "denoised");
    Ok(frame)
}

fn reconstruct(method: DenoiseMethod, spec: &DenoiseSpec, data: &[f64]) -> Result<Vec<f64>, DenoiseError> {
    if let Some(custom) = &spec.custom {
        return Ok((custom.0)(data));
    }
    match method {
        DenoiseMethod::Custom => Err(DenoiseError::MissingCustomFunction),
        DenoiseMethod::Wavelet => {
            #[cfg(feature = "wavelet")]
            {
                wavelet::denoise(data, &spec.wavelet, spec.level)
            }
            #[cfg(not(feature = "wavelet"))]
            {
                Err(DenoiseError::BackendUnavailable("wavelet"))
            }
        }
        DenoiseMethod::Kalman => {
            #[cfg(feature = "kalman")]
            {
                Ok(kalman::filter(data, &spec.kalman))
            }
            #[cfg(not(feature = "kalman"))]
            {
                Err(DenoiseError::BackendUnavailable("kalman"))
            }
        }
        DenoiseMethod::Ssa => {
            #[cfg(feature = "ssa")]
            {
                ssa::denoise(data, &spec.ssa)
            }
            #[cfg(not(feature = "ssa"))]
            {
                Err(DenoiseError::BackendUnavailable("ssa"))
            }
        }
        DenoiseMethod::Emd => {
            #[cfg(feature = "emd")]
            {
                Ok(emd::denoise(data, &spec.emd))
            }
            #[cfg(not(feature = "emd"))]
            {
                Err(DenoiseError::BackendUnavailable("emd"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::frame::test_support::make_bars;

    fn frame() -> FeatureFrame {
        let closes: Vec<f64> = (0..64).map(|i| 100.0 + (i as f64 * 0.2).sin() * 5.0 + (i % 3) as f64 * 0.4).collect();
        FeatureFrame::from_bars(&make_bars(&closes))
    }

    #[test]
    #[cfg(feature = "wavelet")]
    fn adds_prefixed_columns_by_default() {
        let spec = DenoiseSpec {
            columns: vec!["close".into()],
            ..DenoiseSpec::default()
        };
        let out = denoise(frame(), &spec).unwrap();
        assert!(out.has_column("denoised_close"));
        assert_eq!(out.column("denoised_close").unwrap().len(), 64);
        assert!(!out.has_column("denoised_open"));
    }

    #[test]
    #[cfg(feature = "kalman")]
    fn overwrite_replaces_in_place() {
        let before = frame();
        let spec = DenoiseSpec {
            overwrite: true,
            columns: vec!["close".into()],
            ..DenoiseSpec::with_method("kalman")
        };
        let out = denoise(before.clone(), &spec).unwrap();
        assert_eq!(out.width(), before.width());
        assert_ne!(out.column("close"), before.column("close"));
    }

    #[test]
    #[cfg(feature = "kalman")]
    fn empty_column_list_targets_every_column() {
        let out = denoise(frame(), &DenoiseSpec::with_method("kalman")).unwrap();
        for base in crate::domain::BASE_COLUMNS {
            assert!(out.has_column(&format!("denoised_{base}")));
        }
    }

    #[test]
    #[cfg(feature = "kalman")]
    fn nan_positions_are_preserved() {
        let mut f = frame();
        let mut close = f.column("close").unwrap().to_vec();
        close[0] = f64::NAN;
        close[10] = f64::NAN;
        f.insert("close", close);
        let spec = DenoiseSpec {
            columns: vec!["close".into()],
            ..DenoiseSpec::with_method("kalman")
        };
        let out = denoise(f, &spec).unwrap();
        let d = out.column("denoised_close").unwrap();
        assert!(d[0].is_nan() && d[10].is_nan());
        assert!(d[1].is_finite() && d[11].is_finite());
    }

    #[test]
    fn unknown_method_is_fatal() {
        let err = denoise(frame(), &DenoiseSpec::with_method("fourier")).unwrap_err();
        assert_eq!(err, DenoiseError::UnsupportedMethod("fourier".into()));
    }

    #[test]
    fn custom_function_is_applied() {
        let spec = DenoiseSpec {
            columns: vec!["volume".into()],
            ..DenoiseSpec::with_custom(|v| v.iter().map(|x| x * 2.0).collect())
        };
        let out = denoise(frame(), &spec).unwrap();
        assert_eq!(out.column("denoised_volume").unwrap()[0], 2000.0);
    }

    #[test]
    fn custom_without_function_fails() {
        let err = denoise(frame(), &DenoiseSpec::with_method("custom")).unwrap_err();
        assert_eq!(err, DenoiseError::MissingCustomFunction);
    }

    #[test]
    fn missing_target_is_skipped() {
        let spec = DenoiseSpec {
            columns: vec!["nope".into()],
            ..DenoiseSpec::default()
        };
        let out = denoise(frame(), &spec).unwrap();
        assert_eq!(out.width(), 5);
    }

    #[test]
    fn compiled_out_method_differs_from_unknown_method() {
        let unknown = DenoiseError::UnsupportedMethod("ssa".into());
        let unavailable = DenoiseError::BackendUnavailable("ssa");
        assert_ne!(unknown, unavailable);
        assert_eq!(unavailable.to_string(), "denoising method 'ssa' is not available in this build");
    }

    fn close_only(method: &str) -> DenoiseSpec {
        DenoiseSpec {
            columns: vec!["close".into()],
            ..DenoiseSpec::with_method(method)
        }
    }

    #[test]
    #[cfg(not(feature = "wavelet"))]
    fn wavelet_unavailable_without_feature() {
        let err = denoise(frame(), &close_only("wavelet")).unwrap_err();
        assert_eq!(err, DenoiseError::BackendUnavailable("wavelet"));
    }

    #[test]
    #[cfg(not(feature = "kalman"))]
    fn kalman_unavailable_without_feature() {
        let err = denoise(frame(), &close_only("kalman")).unwrap_err();
        assert_eq!(err, DenoiseError::BackendUnavailable("kalman"));
    }

    #[test]
    #[cfg(not(feature = "ssa"))]
    fn ssa_unavailable_without_feature() {
        let err = denoise(frame(), &close_only("ssa")).unwrap_err();
        assert_eq!(err, DenoiseError::BackendUnavailable("ssa"));
    }

    #[test]
    #[cfg(not(feature = "emd"))]
    fn emd_unavailable_without_feature() {
        let err = denoise(frame(), &close_only("emd")).unwrap_err();
        assert_eq!(err, DenoiseError::BackendUnavailable("emd"));
    }

    #[test]
    fn custom_closure_runs_without_any_backend_feature() {
        let out = denoise(frame(), &DenoiseSpec {
            columns: vec!["close".into()],
            ..DenoiseSpec::with_custom(|v| v.to_vec())
        })
        .unwrap();
        assert_eq!(out.column("denoised_close"), out.column("close"));
    }

    #[test]
    fn spec_from_toml_with_defaults() {
        let spec: DenoiseSpec = toml::from_str("method = 'ssa'\n[ssa]\nwindow_length = 10").unwrap();
        assert_eq!(spec.method, "ssa");
        assert_eq!(spec.ssa.window_length, 10);
        assert_eq!(spec.ssa.n_components, 5);
        assert_eq!(spec.wavelet, "rbio2.8");
    }
}
