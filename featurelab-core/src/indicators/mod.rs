//! Indicator kernels over plain `f64` slices.
//!
//! Every kernel returns a vector of the input length with NaN during warmup.
//! A NaN inside a window poisons that window's output. Single-input smoothers
//! skip *leading* NaN so they can be chained on the warmup-padded output of
//! another kernel (e.g. an EMA of an RSI).
//!
//! The backends in `crate::backends` expose these kernels under their own
//! method names and argument conventions.

pub mod adx;
pub mod aroon;
pub mod atr;
pub mod bollinger;
pub mod donchian;
pub mod keltner;
pub mod momentum;
pub mod moving_average;
pub mod oscillators;
pub mod parabolic_sar;
pub mod patterns;
pub mod price;
pub mod rsi;
pub mod supertrend;

pub use adx::adx;
pub use aroon::aroon;
pub use atr::{atr, natr, true_range, wilder_smooth};
pub use bollinger::bollinger;
pub use donchian::donchian;
pub use keltner::keltner;
pub use momentum::{momentum, roc};
pub use moving_average::{dema, ema, kama, sma, t3, tema, trima, wma, MaKind, UnknownMaKind};
pub use oscillators::{cci, macd, obv, stoch, willr};
pub use parabolic_sar::parabolic_sar;
pub use price::{avg_price, med_price, typ_price};
pub use rsi::rsi;
pub use supertrend::{supertrend, SupertrendSeries};

/// Run `kernel` on `values` with leading NaN stripped, then restore the padding.
pub(crate) fn skip_leading_nan(values: &[f64], kernel: impl FnOnce(&[f64]) -> Vec<f64>) -> Vec<f64> {
    let start = values
        .iter()
        .position(|v| !v.is_nan())
        .unwrap_or(values.len());
    let mut out = vec![f64::NAN; start];
    out.extend(kernel(&values[start..]));
    out
}

#[cfg(test)]
pub use crate::domain::series::assert_approx;

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
