//! Supertrend: ATR-based directional indicator.
//!
//! Inherently sequential/stateful: direction flips between support and resistance
//! based on close vs band comparisons.
//!
//! Lookback: period (same as ATR lookback since it depends on ATR).

use super::atr::atr;

/// Supertrend output series.
#[derive(Debug, Clone, PartialEq)]
pub struct SupertrendSeries {
    /// Active band: lower band (support) when trending up, upper band otherwise.
    pub trend: Vec<f64>,
    /// +1 trending up, -1 trending down.
    pub direction: Vec<f64>,
    /// Active band while long, NaN otherwise.
    pub long: Vec<f64>,
    /// Active band while short, NaN otherwise.
    pub short: Vec<f64>,
}

pub fn supertrend(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    period: usize,
    multiplier: f64,
) -> SupertrendSeries {
    let n = high.len().min(low.len()).min(close.len());
    let mut out = SupertrendSeries {
        trend: vec![f64::NAN; n],
        direction: vec![f64::NAN; n],
        long: vec![f64::NAN; n],
        short: vec![f64::NAN; n],
    };

    let atr = atr(high, low, close, period);
    let start = match atr.iter().position(|v| !v.is_nan()) {
        Some(idx) => idx,
        None => return out,
    };

    let hl2 = (high[start] + low[start]) / 2.0;
    let mut upper_band = hl2 + multiplier * atr[start];
    let mut lower_band = hl2 - multiplier * atr[start];
    let mut trending_up = true;
    out.set(start, trending_up, lower_band);

    for i in (start + 1)..n {
        if atr[i].is_nan() || close[i].is_nan() || high[i].is_nan() || low[i].is_nan() {
            continue;
        }

        let hl2 = (high[i] + low[i]) / 2.0;
        let basic_upper = hl2 + multiplier * atr[i];
        let basic_lower = hl2 - multiplier * atr[i];

        // Upper band can only tighten while price stays below it; lower band likewise
        let prev_close = close[i - 1];
        if !prev_close.is_nan() && prev_close <= upper_band {
            upper_band = basic_upper.min(upper_band);
        } else {
            upper_band = basic_upper;
        }
        if !prev_close.is_nan() && prev_close >= lower_band {
            lower_band = basic_lower.max(lower_band);
        } else {
            lower_band = basic_lower;
        }

        if trending_up && close[i] < lower_band {
            trending_up = false;
        } else if !trending_up && close[i] > upper_band {
            trending_up = true;
        }

        let band = if trending_up { lower_band } else { upper_band };
        out.set(i, trending_up, band);
    }

    out
}

impl SupertrendSeries {
    fn set(&mut self, i: usize, up: bool, band: f64) {
        self.trend[i] = band;
        self.direction[i] = if up { 1.0 } else { -1.0 };
        if up {
            self.long[i] = band;
        } else {
            self.short[i] = band;
        }
    }
}
