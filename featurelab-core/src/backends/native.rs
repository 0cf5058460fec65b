//! Native backend: composite indicators built on the kernels.
//!
//! Every method that smooths takes the smoothing method by name. Accepted
//! names are EMA, SMA, WMA, DEMA, T3, KAMA and TRIMA (any case); anything else
//! fails the call.

use std::f64::consts::PI;

use super::{inputs, zip_with, IndicatorBackend, IndicatorError, IndicatorFn, IndicatorOutput, IndicatorSpec, Kwargs};
use crate::indicators::{self, MaKind};

use IndicatorOutput::{Series, SeriesTuple};

type Out = Result<IndicatorOutput, IndicatorError>;

pub struct NativeBackend;

static TABLE: &[(&str, IndicatorFn)] = &[
    ("rvi", rvi),
    ("supertrend", supertrend),
    ("twap", twap),
    ("pov", pov),
    ("rsl", rsl),
    ("ehlers_rpi", ehlers_rpi),
    ("ultra_wpr", ultra_wpr),
    ("ultra_rsi", ultra_rsi),
];

impl IndicatorBackend for NativeBackend {
    fn kind(&self) -> super::BackendKind {
        super::BackendKind::Native
    }

    fn table(&self) -> &'static [(&'static str, IndicatorFn)] {
        TABLE
    }

    fn default_suite(&self) -> Vec<IndicatorSpec> {
        vec![
            IndicatorSpec::new("rvi", &["o", "h", "l", "c"]),
            IndicatorSpec::new("supertrend", &["h", "l", "c"]),
            IndicatorSpec::new("twap", &["o", "h", "l", "c"]),
            IndicatorSpec::new("pov", &["c", "v"]),
            IndicatorSpec::new("rsl", &["c"]),
            IndicatorSpec::new("ehlers_rpi", &["h", "l", "v"]),
            IndicatorSpec::new("ultra_wpr", &["h", "l", "c"]),
            IndicatorSpec::new("ultra_rsi", &["c"]),
        ]
    }
}

/// Smoothing methods accepted by the native indicators.
fn smoothing(name: &str) -> Result<MaKind, IndicatorError> {
    match name.to_ascii_uppercase().as_str() {
        "EMA" => Ok(MaKind::Ema),
        "SMA" => Ok(MaKind::Sma),
        "WMA" => Ok(MaKind::Wma),
        "DEMA" => Ok(MaKind::Dema),
        "T3" => Ok(MaKind::T3),
        "KAMA" => Ok(MaKind::Kama),
        "TRIMA" => Ok(MaKind::Trima),
        _ => Err(IndicatorError::UnsupportedSmoothing(name.to_string())),
    }
}

/// Relative vigor index and its smoothed signal line.
fn rvi(args: &[&[f64]], kw: &Kwargs) -> Out {
    let [o, h, l, c] = inputs::<4>(args)?;
    let lookback = kw.period("lookback", 10)?;
    let method = smoothing(kw.text("smoothing_method", "SMA")?)?;
    let smoothing_period = kw.period("smoothing_period", 4)?;

    let numerator = indicators::sma(&zip_with(c, o, |c, o| c - o), lookback);
    let denominator = indicators::sma(&zip_with(h, l, |h, l| h - l), lookback);
    let line = zip_with(&numerator, &denominator, |n, d| n / d);
    let signal = method.apply(&line, smoothing_period);
    Ok(SeriesTuple(vec![line, signal]))
}

/// Percentage distance of the SuperTrend line from the close.
///
/// Bar 0 is always 0; bars inside the ATR warmup are NaN.
fn supertrend(args: &[&[f64]], kw: &Kwargs) -> Out {
    let [h, l, c] = inputs::<3>(args)?;
    let multiplier = kw.number("multiplier", 3.0)?;
    let lookback = kw.period("lookback", 14)?;

    let atr = indicators::atr(h, l, c, lookback);
    let n = c.len().min(atr.len());
    let basic_upper: Vec<f64> = (0..n).map(|i| (h[i] + l[i]) / 2.0 + multiplier * atr[i]).collect();
    let basic_lower: Vec<f64> = (0..n).map(|i| (h[i] + l[i]) / 2.0 - multiplier * atr[i]).collect();

    let mut upper = basic_upper.clone();
    let mut lower = basic_lower.clone();
    let mut pct = vec![0.0; n];

    for i in 1..n {
        upper[i] = if c[i - 1] > upper[i - 1] || upper[i - 1].is_nan() {
            basic_upper[i]
        } else {
            basic_upper[i].min(upper[i - 1])
        };
        lower[i] = if c[i - 1] < lower[i - 1] || lower[i - 1].is_nan() {
            basic_lower[i]
        } else {
            basic_lower[i].max(lower[i - 1])
        };

        let line = if c[i] <= upper[i] { upper[i] } else { lower[i] };
        pct[i] = (line - c[i]) / c[i] * 100.0;
    }
    Ok(Series(pct))
}

/// Expanding mean of the average price, optionally as percent from close.
fn twap(args: &[&[f64]], kw: &Kwargs) -> Out {
    let [o, h, l, c] = inputs::<4>(args)?;
    let ratio = kw.flag("ratio", true)?;

    let mut sum = 0.0;
    let expanding: Vec<f64> = indicators::avg_price(o, h, l, c)
        .iter()
        .enumerate()
        .map(|(i, p)| {
            sum += p;
            sum / (i + 1) as f64
        })
        .collect();

    if ratio {
        Ok(Series(zip_with(&expanding, c, |t, c| (t - c) / c * 100.0)))
    } else {
        Ok(Series(expanding))
    }
}

/// Percentage-of-volume target relative to price.
fn pov(args: &[&[f64]], kw: &Kwargs) -> Out {
    let [c, v] = inputs::<2>(args)?;
    let rate = kw.number("pov_rate", 0.2)?;
    Ok(Series(zip_with(v, c, |v, c| v * rate / c * 100.0)))
}

/// Relative strength line: close over its moving average.
fn rsl(args: &[&[f64]], kw: &Kwargs) -> Out {
    let [c] = inputs::<1>(args)?;
    let method = smoothing(kw.text("ma_method", "SMA")?)?;
    let ma = method.apply(c, kw.period("period", 15)?);
    Ok(Series(zip_with(c, &ma, |c, m| c / m)))
}

/// Per-period state of the cycle-detection resonators.
#[derive(Debug, Clone, Copy, Default)]
struct Resonator {
    old_i: f64,
    older_i: f64,
    old_q: f64,
    older_q: f64,
    old_real: f64,
    older_real: f64,
    old_imag: f64,
    older_imag: f64,
    ampl: f64,
    db: f64,
}

/// Ehlers restoring pull. Returns `(v1, v2)`.
///
/// Finds the dominant cycle with a bank of band-pass resonators over a
/// high-passed, smoothed median price, then scales volume by the squared
/// angular frequency of that cycle. `v2` is a `minperiod` average of `v1`.
fn ehlers_rpi(args: &[&[f64]], kw: &Kwargs) -> Out {
    let [h, l, v] = inputs::<3>(args)?;
    let min_period = kw.period("minperiod", 8)?;
    let max_period = kw.period("maxperiod", 50)?;
    let hp_period = kw.number("hpPeriod", 40.0)?;
    let median_period = kw.period("medianPeriod", 10)?;
    let decibel_period = kw.number("decibelPeriod", 20.0)?;

    if max_period < min_period {
        return Err(IndicatorError::InvalidParameter {
            name: "maxperiod".into(),
            reason: format!("must be at least minperiod ({min_period})"),
        });
    }

    let n = h.len().min(l.len()).min(v.len());
    let mut v1 = vec![0.0; n];
    let mut v2 = vec![0.0; n];

    let a1 = (1.0 - (2.0 * PI / hp_period).sin()) / (2.0 * PI / hp_period).cos();
    let a2 = 0.5 * (1.0 + a1);

    let mut hp = vec![0.0; n];
    let mut smooth_hp = vec![0.0; n];
    let mut dc = vec![0.0; n];
    let mut bank = vec![Resonator::default(); max_period + 1];

    for s in 1..n {
        let p0 = (h[s] + l[s]) / 2.0;
        let p1 = (h[s - 1] + l[s - 1]) / 2.0;
        hp[s] = a2 * (p0 - p1) + a1 * hp[s - 1];

        if s >= 5 {
            smooth_hp[s] = (hp[s]
                + 2.0 * hp[s - 1]
                + 3.0 * hp[s - 2]
                + 3.0 * hp[s - 3]
                + 2.0 * hp[s - 4]
                + hp[s - 5])
                / 12.0;
        }

        let delta = (-0.015 * s as f64 + 0.5).max(0.15);
        let slope = smooth_hp[s] - smooth_hp[s - 1];
        let mut max_ampl: f64 = 0.0;

        for period in min_period..=max_period {
            let p = period as f64;
            let beta = (2.0 * PI / p).cos();
            let gamma = 1.0 / (4.0 * PI * delta / p).cos();
            let alpha = gamma - (gamma * gamma - 1.0).sqrt();

            let r = &mut bank[period];
            let q = p / (2.0 * PI) * slope;
            let i = smooth_hp[s];
            let real = 0.5 * (1.0 - alpha) * (i - r.older_i) + beta * (1.0 + alpha) * r.old_real
                - alpha * r.older_real;
            let imag = 0.5 * (1.0 - alpha) * (q - r.older_q) + beta * (1.0 + alpha) * r.old_imag
                - alpha * r.older_imag;
            r.ampl = real * real + imag * imag;
            max_ampl = max_ampl.max(r.ampl);

            r.older_i = r.old_i;
            r.old_i = i;
            r.older_q = r.old_q;
            r.old_q = q;
            r.older_real = r.old_real;
            r.old_real = real;
            r.older_imag = r.old_imag;
            r.old_imag = imag;
        }

        let mut num = 0.0;
        let mut denom = 0.0;
        for period in min_period..=max_period {
            let r = &mut bank[period];
            if max_ampl != 0.0 {
                let t = 1.0 - 0.99 * r.ampl / max_ampl;
                if t != 0.0 {
                    r.db = -(median_period as f64) * (0.01 / t).ln() / 10f64.ln();
                }
            }
            if r.db > decibel_period {
                r.db = decibel_period;
            }
            if r.db <= 3.0 {
                num += period as f64 * (decibel_period - r.db);
                denom += decibel_period - r.db;
            }
        }
        if denom != 0.0 {
            dc[s] = num / denom;
        }

        let mut dom_cycle = median(&dc[s.saturating_sub(median_period)..=s]);
        if dom_cycle < min_period as f64 {
            dom_cycle = decibel_period;
        }

        v1[s] = v[s] * (2.0 * PI / dom_cycle).powi(2);
        v2[s] = if s >= min_period {
            v1[s + 1 - min_period..=s].iter().sum::<f64>() / min_period as f64
        } else {
            v1[..=s].iter().sum::<f64>() / (s + 1) as f64
        };
    }

    Ok(SeriesTuple(vec![v1, v2]))
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();
    match n {
        0 => f64::NAN,
        _ if n % 2 == 1 => sorted[n / 2],
        _ => (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0,
    }
}

/// Non-negative whole count; fractions are truncated and huge values saturate.
fn count(kw: &Kwargs, name: &str, default: f64) -> Result<usize, IndicatorError> {
    let v = kw.number(name, default)?;
    if v < 0.0 {
        return Err(IndicatorError::invalid(name, format!("expected a non-negative count, got {v}")));
    }
    Ok(v as usize)
}

/// Count, per bar, how many of a fan of smoothed copies rose vs. did not,
/// then smooth both counts. Returns `(bulls, bears)`.
///
/// A copy whose window reaches the series length has no two consecutive
/// values, so the fan stops there.
fn ultra(base: &[f64], kw: &Kwargs) -> Out {
    let method = smoothing(kw.text("W_Method", "EMA")?)?;
    let start = kw.period("StartLength", 3)?;
    let step = count(kw, "Step", 5.0)?;
    let steps_total = count(kw, "StepsTotal", 10.0)?;
    let smooth_method = smoothing(kw.text("SmoothMethod", "EMA")?)?;
    let smooth_length = kw.period("SmoothLength", 3)?;

    let n = base.len();
    let mut ups = vec![0.0; n];
    let mut dns = vec![0.0; n];
    // with a zero step every copy is the same, so one pass is weighted
    let (passes, weight) = if step == 0 {
        (0, steps_total as f64 + 1.0)
    } else {
        (steps_total, 1.0)
    };
    for k in 0..=passes {
        let window = match k.checked_mul(step).and_then(|offset| offset.checked_add(start)) {
            Some(w) if w < n => w,
            _ => break,
        };
        let smoothed = method.apply(base, window);
        for i in 1..n {
            // comparisons against NaN are false on both sides
            if smoothed[i] > smoothed[i - 1] {
                ups[i] += weight;
            }
            if smoothed[i] <= smoothed[i - 1] {
                dns[i] += weight;
            }
        }
    }

    let bulls = smooth_method.apply(&ups, smooth_length);
    let bears = smooth_method.apply(&dns, smooth_length);
    Ok(SeriesTuple(vec![bulls, bears]))
}

fn ultra_wpr(args: &[&[f64]], kw: &Kwargs) -> Out {
    let [h, l, c] = inputs::<3>(args)?;
    let wpr = indicators::willr(h, l, c, kw.period("WPR_Period", 13)?);
    ultra(&wpr, kw)
}

fn ultra_rsi(args: &[&[f64]], kw: &Kwargs) -> Out {
    let [price] = inputs::<1>(args)?;
    let rsi = indicators::rsi(price, kw.period("RSI_Period", 13)?);
    ultra(&rsi, kw)
}
