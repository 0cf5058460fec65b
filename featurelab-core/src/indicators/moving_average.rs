//! Moving averages: SMA, EMA, WMA, DEMA, TEMA, TRIMA, KAMA, T3.
//!
//! EMA is seeded with the SMA of its first `period` values. The composite
//! averages (DEMA, TEMA, T3) are built from chained EMAs, so their warmup is
//! the sum of the chained lookbacks. All functions skip leading NaN.

use super::skip_leading_nan;
use std::fmt;
use std::str::FromStr;

/// Moving-average family, as named in requests (`"sma"`, `"EMA"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaKind {
    Sma,
    Ema,
    Wma,
    Dema,
    Tema,
    Trima,
    Kama,
    T3,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported moving average '{0}'")]
pub struct UnknownMaKind(pub String);

impl MaKind {
    pub const ALL: [MaKind; 8] = [
        MaKind::Sma,
        MaKind::Ema,
        MaKind::Wma,
        MaKind::Dema,
        MaKind::Tema,
        MaKind::Trima,
        MaKind::Kama,
        MaKind::T3,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MaKind::Sma => "sma",
            MaKind::Ema => "ema",
            MaKind::Wma => "wma",
            MaKind::Dema => "dema",
            MaKind::Tema => "tema",
            MaKind::Trima => "trima",
            MaKind::Kama => "kama",
            MaKind::T3 => "t3",
        }
    }

    /// Apply this average with its default extra parameters.
    pub fn apply(self, values: &[f64], period: usize) -> Vec<f64> {
        match self {
            MaKind::Sma => sma(values, period),
            MaKind::Ema => ema(values, period),
            MaKind::Wma => wma(values, period),
            MaKind::Dema => dema(values, period),
            MaKind::Tema => tema(values, period),
            MaKind::Trima => trima(values, period),
            MaKind::Kama => kama(values, period),
            MaKind::T3 => t3(values, period, 0.7),
        }
    }
}

impl fmt::Display for MaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MaKind {
    type Err = UnknownMaKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        MaKind::ALL
            .iter()
            .copied()
            .find(|k| k.name() == lower)
            .ok_or_else(|| UnknownMaKind(s.to_string()))
    }
}

/// Simple moving average. A NaN anywhere in the window yields NaN.
pub fn sma(values: &[f64], period: usize) -> Vec<f64> {
    skip_leading_nan(values, |v| sma_raw(v, period))
}

fn sma_raw(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }

    let mut sum = 0.0;
    let mut nan_count = 0usize;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            nan_count += 1;
        } else {
            sum += v;
        }
        if i >= period {
            let leaving = values[i - period];
            if leaving.is_nan() {
                nan_count -= 1;
            } else {
                sum -= leaving;
            }
        }
        if i + 1 >= period && nan_count == 0 {
            result[i] = sum / period as f64;
        }
    }
    result
}

/// Exponential moving average, alpha = 2 / (period + 1).
///
/// NaN after the seed propagates to the end of the series.
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    skip_leading_nan(values, |v| ema_with_alpha(v, period, 2.0 / (period as f64 + 1.0)))
}

pub(crate) fn ema_with_alpha(values: &[f64], period: usize, alpha: f64) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if n < period || period == 0 {
        return result;
    }

    // Seed: SMA of first `period` values
    let mut sum = 0.0;
    for &v in values.iter().take(period) {
        if v.is_nan() {
            return result;
        }
        sum += v;
    }
    let seed = sum / period as f64;
    result[period - 1] = seed;

    let mut prev = seed;
    for i in period..n {
        if values[i].is_nan() {
            return result;
        }
        let ema = alpha * values[i] + (1.0 - alpha) * prev;
        result[i] = ema;
        prev = ema;
    }

    result
}

/// Linearly weighted moving average (weights 1..=period, newest heaviest).
pub fn wma(values: &[f64], period: usize) -> Vec<f64> {
    skip_leading_nan(values, |v| {
        let n = v.len();
        let mut result = vec![f64::NAN; n];
        if period == 0 || n < period {
            return result;
        }
        let denom = (period * (period + 1)) as f64 / 2.0;
        for i in (period - 1)..n {
            let window = &v[i + 1 - period..=i];
            if window.iter().any(|x| x.is_nan()) {
                continue;
            }
            let weighted: f64 = window
                .iter()
                .enumerate()
                .map(|(j, x)| (j + 1) as f64 * x)
                .sum();
            result[i] = weighted / denom;
        }
        result
    })
}

/// Double EMA: 2·EMA − EMA(EMA).
pub fn dema(values: &[f64], period: usize) -> Vec<f64> {
    let e1 = ema(values, period);
    let e2 = ema(&e1, period);
    e1.iter().zip(&e2).map(|(a, b)| 2.0 * a - b).collect()
}

/// Triple EMA: 3·EMA − 3·EMA² + EMA³.
pub fn tema(values: &[f64], period: usize) -> Vec<f64> {
    let e1 = ema(values, period);
    let e2 = ema(&e1, period);
    let e3 = ema(&e2, period);
    (0..values.len())
        .map(|i| 3.0 * e1[i] - 3.0 * e2[i] + e3[i])
        .collect()
}

/// Triangular moving average: an SMA of an SMA whose periods split `period`.
pub fn trima(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 {
        return vec![f64::NAN; values.len()];
    }
    let (first, second) = if period % 2 == 1 {
        ((period + 1) / 2, (period + 1) / 2)
    } else {
        (period / 2, period / 2 + 1)
    };
    sma(&sma(values, first), second)
}

/// Kaufman adaptive moving average with fast = 2 and slow = 30 smoothing.
pub fn kama(values: &[f64], period: usize) -> Vec<f64> {
    skip_leading_nan(values, |v| {
        let n = v.len();
        let mut result = vec![f64::NAN; n];
        if period == 0 || n <= period || v.iter().any(|x| x.is_nan()) {
            return result;
        }
        let fast = 2.0 / 3.0;
        let slow = 2.0 / 31.0;
        let mut prev = v[period - 1];
        for i in period..n {
            let change = (v[i] - v[i - period]).abs();
            let volatility: f64 = (i + 1 - period..=i).map(|j| (v[j] - v[j - 1]).abs()).sum();
            let er = if volatility == 0.0 { 0.0 } else { change / volatility };
            let sc = (er * (fast - slow) + slow).powi(2);
            prev += sc * (v[i] - prev);
            result[i] = prev;
        }
        result
    })
}

/// Tillson T3: a six-fold EMA cascade blended with volume factor `vfactor`.
pub fn t3(values: &[f64], period: usize, vfactor: f64) -> Vec<f64> {
    let e1 = ema(values, period);
    let e2 = ema(&e1, period);
    let e3 = ema(&e2, period);
    let e4 = ema(&e3, period);
    let e5 = ema(&e4, period);
    let e6 = ema(&e5, period);

    let a = vfactor;
    let c1 = -a * a * a;
    let c2 = 3.0 * a * a + 3.0 * a * a * a;
    let c3 = -6.0 * a * a - 3.0 * a - 3.0 * a * a * a;
    let c4 = 1.0 + 3.0 * a + a * a * a + 3.0 * a * a;

    (0..values.len())
        .map(|i| c1 * e6[i] + c2 * e5[i] + c3 * e4[i] + c4 * e3[i])
        .collect()
}
