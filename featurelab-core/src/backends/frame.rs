//! Frame backend: lower-case names and `length`-style keyword arguments.
//!
//! Single-line indicators return a series; multi-line indicators return a
//! named table whose column names encode their parameters (`BBL_20_2.0`,
//! `MACDh_12_26_9`, ...).

use super::{inputs, zip_with, IndicatorBackend, IndicatorError, IndicatorFn, IndicatorOutput, IndicatorSpec, Kwargs};
use crate::indicators;

use IndicatorOutput::{Series, Table};

type Out = Result<IndicatorOutput, IndicatorError>;

pub struct FrameBackend;

static TABLE: &[(&str, IndicatorFn)] = &[
    ("sma", sma),
    ("ema", ema),
    ("rsi", rsi),
    ("atr", atr),
    ("bbands", bbands),
    ("macd", macd),
    ("donchian", donchian),
    ("kc", kc),
    ("aroon", aroon),
    ("supertrend", supertrend),
    ("stoch", stoch),
];

impl IndicatorBackend for FrameBackend {
    fn kind(&self) -> super::BackendKind {
        super::BackendKind::Frame
    }

    fn table(&self) -> &'static [(&'static str, IndicatorFn)] {
        TABLE
    }

    fn default_suite(&self) -> Vec<IndicatorSpec> {
        vec![
            IndicatorSpec::new("bbands", &["close"]).kwarg("length", 20),
            IndicatorSpec::new("macd", &["close"]),
            IndicatorSpec::new("donchian", &["high", "low"]),
            IndicatorSpec::new("kc", &["high", "low", "close"]),
            IndicatorSpec::new("aroon", &["high", "low"]),
            IndicatorSpec::new("supertrend", &["high", "low", "close"]),
            IndicatorSpec::new("stoch", &["high", "low", "close"]),
        ]
    }
}

/// Float parameter as it appears in a column name (`2.0`, `1.5`).
fn decimal(v: f64) -> String {
    format!("{v:?}")
}

fn sma(args: &[&[f64]], kw: &Kwargs) -> Out {
    let [close] = inputs::<1>(args)?;
    Ok(Series(indicators::sma(close, kw.period("length", 10)?)))
}

fn ema(args: &[&[f64]], kw: &Kwargs) -> Out {
    let [close] = inputs::<1>(args)?;
    Ok(Series(indicators::ema(close, kw.period("length", 10)?)))
}

fn rsi(args: &[&[f64]], kw: &Kwargs) -> Out {
    let [close] = inputs::<1>(args)?;
    Ok(Series(indicators::rsi(close, kw.period("length", 14)?)))
}

fn atr(args: &[&[f64]], kw: &Kwargs) -> Out {
    let [h, l, c] = inputs::<3>(args)?;
    Ok(Series(indicators::atr(h, l, c, kw.period("length", 14)?)))
}

fn bbands(args: &[&[f64]], kw: &Kwargs) -> Out {
    let [close] = inputs::<1>(args)?;
    let length = kw.period("length", 5)?;
    let std = kw.number("std", 2.0)?;
    let (upper, middle, lower) = indicators::bollinger(close, length, std, std);

    let bandwidth = (0..middle.len())
        .map(|i| (upper[i] - lower[i]) / middle[i] * 100.0)
        .collect();
    let percent = (0..close.len().min(middle.len()))
        .map(|i| (close[i] - lower[i]) / (upper[i] - lower[i]))
        .collect();

    let tag = format!("{length}_{}", decimal(std));
    Ok(Table(vec![
        (format!("BBL_{tag}"), lower),
        (format!("BBM_{tag}"), middle),
        (format!("BBU_{tag}"), upper),
        (format!("BBB_{tag}"), bandwidth),
        (format!("BBP_{tag}"), percent),
    ]))
}

fn macd(args: &[&[f64]], kw: &Kwargs) -> Out {
    let [close] = inputs::<1>(args)?;
    let fast = kw.period("fast", 12)?;
    let slow = kw.period("slow", 26)?;
    let signal = kw.period("signal", 9)?;
    let (line, sig, hist) = indicators::macd(close, fast, slow, signal);

    let tag = format!("{fast}_{slow}_{signal}");
    Ok(Table(vec![
        (format!("MACD_{tag}"), line),
        (format!("MACDh_{tag}"), hist),
        (format!("MACDs_{tag}"), sig),
    ]))
}

fn donchian(args: &[&[f64]], kw: &Kwargs) -> Out {
    let [h, l] = inputs::<2>(args)?;
    let lower_length = kw.period("lower_length", 20)?;
    let upper_length = kw.period("upper_length", 20)?;
    let (lower, middle, upper) = indicators::donchian(h, l, lower_length, upper_length);

    let tag = format!("{lower_length}_{upper_length}");
    Ok(Table(vec![
        (format!("DCL_{tag}"), lower),
        (format!("DCM_{tag}"), middle),
        (format!("DCU_{tag}"), upper),
    ]))
}

fn kc(args: &[&[f64]], kw: &Kwargs) -> Out {
    let [h, l, c] = inputs::<3>(args)?;
    let length = kw.period("length", 20)?;
    let scalar = kw.number("scalar", 2.0)?;
    let (lower, basis, upper) = indicators::keltner(h, l, c, length, scalar);

    let tag = format!("{length}_{scalar}");
    Ok(Table(vec![
        (format!("KCLe_{tag}"), lower),
        (format!("KCBe_{tag}"), basis),
        (format!("KCUe_{tag}"), upper),
    ]))
}

fn aroon(args: &[&[f64]], kw: &Kwargs) -> Out {
    let [h, l] = inputs::<2>(args)?;
    let length = kw.period("length", 14)?;
    let (down, up) = indicators::aroon(h, l, length);
    let osc = zip_with(&up, &down, |u, d| u - d);
    Ok(Table(vec![
        (format!("AROOND_{length}"), down),
        (format!("AROONU_{length}"), up),
        (format!("AROONOSC_{length}"), osc),
    ]))
}

fn supertrend(args: &[&[f64]], kw: &Kwargs) -> Out {
    let [h, l, c] = inputs::<3>(args)?;
    let length = kw.period("length", 7)?;
    let multiplier = kw.number("multiplier", 3.0)?;
    let st = indicators::supertrend(h, l, c, length, multiplier);

    let tag = format!("{length}_{}", decimal(multiplier));
    Ok(Table(vec![
        (format!("SUPERT_{tag}"), st.trend),
        (format!("SUPERTd_{tag}"), st.direction),
        (format!("SUPERTl_{tag}"), st.long),
        (format!("SUPERTs_{tag}"), st.short),
    ]))
}

fn stoch(args: &[&[f64]], kw: &Kwargs) -> Out {
    let [h, l, c] = inputs::<3>(args)?;
    let k = kw.period("k", 14)?;
    let d = kw.period("d", 3)?;
    let smooth_k = kw.period("smooth_k", 3)?;
    let (slow_k, slow_d) = indicators::stoch(h, l, c, k, smooth_k, d);

    let tag = format!("{k}_{d}_{smooth_k}");
    Ok(Table(vec![
        (format!("STOCHk_{tag}"), slow_k),
        (format!("STOCHd_{tag}"), slow_d),
    ]))
}
