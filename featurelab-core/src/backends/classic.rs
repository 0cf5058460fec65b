//! Classic backend: upper-case function names with `timeperiod`-style keyword
//! arguments, returning plain arrays or tuples of arrays.
//!
//! Candle-pattern functions (`CDL*`) score each bar with `±100` or `0`.

use super::{inputs, IndicatorBackend, IndicatorError, IndicatorFn, IndicatorOutput, IndicatorSpec, Kwargs};
use crate::indicators::{self, patterns, MaKind};

use IndicatorOutput::{Series, SeriesTuple};

type Out = Result<IndicatorOutput, IndicatorError>;

pub struct ClassicBackend;

/// The candle-pattern subset, dispatched by the pattern stage.
pub const PATTERN_METHODS: [&str; 6] = [
    "CDLDOJI",
    "CDLENGULFING",
    "CDLHAMMER",
    "CDLHARAMI",
    "CDLMARUBOZU",
    "CDLSHOOTINGSTAR",
];

static TABLE: &[(&str, IndicatorFn)] = &[
    ("SMA", |a, k| moving_average(MaKind::Sma, a, k)),
    ("EMA", |a, k| moving_average(MaKind::Ema, a, k)),
    ("WMA", |a, k| moving_average(MaKind::Wma, a, k)),
    ("DEMA", |a, k| moving_average(MaKind::Dema, a, k)),
    ("TEMA", |a, k| moving_average(MaKind::Tema, a, k)),
    ("TRIMA", |a, k| moving_average(MaKind::Trima, a, k)),
    ("KAMA", |a, k| moving_average(MaKind::Kama, a, k)),
    ("T3", t3),
    ("RSI", rsi),
    ("ATR", atr),
    ("NATR", natr),
    ("ADX", adx),
    ("AROON", aroon),
    ("BBANDS", bbands),
    ("MACD", macd),
    ("STOCH", stoch),
    ("WILLR", willr),
    ("CCI", cci),
    ("OBV", obv),
    ("ROC", roc),
    ("MOM", mom),
    ("SAR", sar),
    ("AVGPRICE", avgprice),
    ("MEDPRICE", medprice),
    ("TYPPRICE", typprice),
    ("CDLDOJI", |a, k| pattern(patterns::doji, a, k)),
    ("CDLENGULFING", |a, k| pattern(patterns::engulfing, a, k)),
    ("CDLHAMMER", |a, k| pattern(patterns::hammer, a, k)),
    ("CDLHARAMI", |a, k| pattern(patterns::harami, a, k)),
    ("CDLMARUBOZU", |a, k| pattern(patterns::marubozu, a, k)),
    ("CDLSHOOTINGSTAR", |a, k| pattern(patterns::shooting_star, a, k)),
];

impl IndicatorBackend for ClassicBackend {
    fn kind(&self) -> super::BackendKind {
        super::BackendKind::Classic
    }

    fn table(&self) -> &'static [(&'static str, IndicatorFn)] {
        TABLE
    }

    fn default_suite(&self) -> Vec<IndicatorSpec> {
        vec![
            IndicatorSpec::new("SMA", &["close"]).kwarg("timeperiod", 14),
            IndicatorSpec::new("EMA", &["close"]).kwarg("timeperiod", 14),
            IndicatorSpec::new("RSI", &["close"]).kwarg("timeperiod", 14),
            IndicatorSpec::new("ATR", &["high", "low", "close"]),
            IndicatorSpec::new("ADX", &["high", "low", "close"]),
            IndicatorSpec::new("AROON", &["high", "low"]),
            IndicatorSpec::new("BBANDS", &["close"]).kwarg("timeperiod", 20),
            IndicatorSpec::new("MACD", &["close"]),
            IndicatorSpec::new("STOCH", &["high", "low", "close"]),
            IndicatorSpec::new("WILLR", &["high", "low", "close"]),
            IndicatorSpec::new("CCI", &["high", "low", "close"]),
            IndicatorSpec::new("OBV", &["close", "volume"]),
            IndicatorSpec::new("ROC", &["close"]),
            IndicatorSpec::new("SAR", &["high", "low"]),
        ]
    }
}

fn moving_average(kind: MaKind, args: &[&[f64]], kw: &Kwargs) -> Out {
    let [real] = inputs::<1>(args)?;
    Ok(Series(kind.apply(real, kw.period("timeperiod", 30)?)))
}

fn t3(args: &[&[f64]], kw: &Kwargs) -> Out {
    let [real] = inputs::<1>(args)?;
    let vfactor = kw.number("vfactor", 0.7)?;
    Ok(Series(indicators::t3(real, kw.period("timeperiod", 5)?, vfactor)))
}

fn rsi(args: &[&[f64]], kw: &Kwargs) -> Out {
    let [real] = inputs::<1>(args)?;
    Ok(Series(indicators::rsi(real, kw.period("timeperiod", 14)?)))
}

fn atr(args: &[&[f64]], kw: &Kwargs) -> Out {
    let [h, l, c] = inputs::<3>(args)?;
    Ok(Series(indicators::atr(h, l, c, kw.period("timeperiod", 14)?)))
}

fn natr(args: &[&[f64]], kw: &Kwargs) -> Out {
    let [h, l, c] = inputs::<3>(args)?;
    Ok(Series(indicators::natr(h, l, c, kw.period("timeperiod", 14)?)))
}

fn adx(args: &[&[f64]], kw: &Kwargs) -> Out {
    let [h, l, c] = inputs::<3>(args)?;
    Ok(Series(indicators::adx(h, l, c, kw.period("timeperiod", 14)?)))
}

fn aroon(args: &[&[f64]], kw: &Kwargs) -> Out {
    let [h, l] = inputs::<2>(args)?;
    let (down, up) = indicators::aroon(h, l, kw.period("timeperiod", 14)?);
    Ok(SeriesTuple(vec![down, up]))
}

fn bbands(args: &[&[f64]], kw: &Kwargs) -> Out {
    let [real] = inputs::<1>(args)?;
    if kw.number("matype", 0.0)? != 0.0 {
        return Err(IndicatorError::InvalidParameter {
            name: "matype".into(),
            reason: "only the simple moving average basis (0) is available".into(),
        });
    }
    let (upper, middle, lower) = indicators::bollinger(
        real,
        kw.period("timeperiod", 5)?,
        kw.number("nbdevup", 2.0)?,
        kw.number("nbdevdn", 2.0)?,
    );
    Ok(SeriesTuple(vec![upper, middle, lower]))
}

fn macd(args: &[&[f64]], kw: &Kwargs) -> Out {
    let [real] = inputs::<1>(args)?;
    let (line, signal, hist) = indicators::macd(
        real,
        kw.period("fastperiod", 12)?,
        kw.period("slowperiod", 26)?,
        kw.period("signalperiod", 9)?,
    );
    Ok(SeriesTuple(vec![line, signal, hist]))
}

fn stoch(args: &[&[f64]], kw: &Kwargs) -> Out {
    let [h, l, c] = inputs::<3>(args)?;
    let (k, d) = indicators::stoch(
        h,
        l,
        c,
        kw.period("fastk_period", 5)?,
        kw.period("slowk_period", 3)?,
        kw.period("slowd_period", 3)?,
    );
    Ok(SeriesTuple(vec![k, d]))
}

fn willr(args: &[&[f64]], kw: &Kwargs) -> Out {
    let [h, l, c] = inputs::<3>(args)?;
    Ok(Series(indicators::willr(h, l, c, kw.period("timeperiod", 14)?)))
}

fn cci(args: &[&[f64]], kw: &Kwargs) -> Out {
    let [h, l, c] = inputs::<3>(args)?;
    Ok(Series(indicators::cci(h, l, c, kw.period("timeperiod", 14)?)))
}

fn obv(args: &[&[f64]], _kw: &Kwargs) -> Out {
    let [c, v] = inputs::<2>(args)?;
    Ok(Series(indicators::obv(c, v)))
}

fn roc(args: &[&[f64]], kw: &Kwargs) -> Out {
    let [real] = inputs::<1>(args)?;
    Ok(Series(indicators::roc(real, kw.period("timeperiod", 10)?)))
}

fn mom(args: &[&[f64]], kw: &Kwargs) -> Out {
    let [real] = inputs::<1>(args)?;
    Ok(Series(indicators::momentum(real, kw.period("timeperiod", 10)?)))
}

fn sar(args: &[&[f64]], kw: &Kwargs) -> Out {
    let [h, l] = inputs::<2>(args)?;
    Ok(Series(indicators::parabolic_sar(
        h,
        l,
        kw.number("acceleration", 0.02)?,
        kw.number("maximum", 0.2)?,
    )))
}

fn avgprice(args: &[&[f64]], _kw: &Kwargs) -> Out {
    let [o, h, l, c] = inputs::<4>(args)?;
    Ok(Series(indicators::avg_price(o, h, l, c)))
}

fn medprice(args: &[&[f64]], _kw: &Kwargs) -> Out {
    let [h, l] = inputs::<2>(args)?;
    Ok(Series(indicators::med_price(h, l)))
}

fn typprice(args: &[&[f64]], _kw: &Kwargs) -> Out {
    let [h, l, c] = inputs::<3>(args)?;
    Ok(Series(indicators::typ_price(h, l, c)))
}

fn pattern(
    rule: fn(&[f64], &[f64], &[f64], &[f64]) -> Vec<f64>,
    args: &[&[f64]],
    _kw: &Kwargs,
) -> Out {
    let [o, h, l, c] = inputs::<4>(args)?;
    Ok(Series(rule(o, h, l, c)))
}
