//! Derived-column stages: gaps, grid filling, price summaries, calendar
//! columns, candle patterns, moving-average ratios, lookbacks and column drops.

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::PipelineError;
use crate::backends::classic::PATTERN_METHODS;
use crate::backends::{BackendKind, ClassicBackend, IndicatorBackend, IndicatorOutput, Kwargs, MethodLookup};
use crate::domain::series::{nan_mean, shift};
use crate::domain::{FeatureFrame, Timeframe};
use crate::indicators::MaKind;

fn default_ma_periods() -> Vec<usize> {
    vec![14]
}

fn default_lookback_periods() -> Vec<usize> {
    vec![1, 2]
}

/// Moving average of a field as a percentage of the field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaSpec {
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Takes precedence over `field`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    #[serde(default = "default_ma_periods")]
    pub periods: Vec<usize>,
}

impl MaSpec {
    fn targets(&self) -> Vec<&str> {
        match (&self.fields, &self.field) {
            (Some(fields), _) => fields.iter().map(String::as_str).collect(),
            (None, Some(field)) => vec![field.as_str()],
            (None, None) => Vec::new(),
        }
    }
}

/// Lagged copy (or ratio to the lagged copy) of a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookbackSpec {
    pub field: String,
    #[serde(default = "default_lookback_periods")]
    pub periods: Vec<usize>,
    #[serde(default)]
    pub ratio: bool,
}

/// `gap = open - previous close`, zero on the first bar.
pub fn add_gap(mut frame: FeatureFrame) -> FeatureFrame {
    let (Some(open), Some(close)) = (frame.column("open"), frame.column("close")) else {
        return frame;
    };
    let gap: Vec<f64> = open
        .iter()
        .zip(shift(close, 1))
        .map(|(o, c)| {
            let g = o - c;
            if g.is_nan() {
                0.0
            } else {
                g
            }
        })
        .collect();
    frame.insert("gap", gap);
    frame
}

/// Reindex onto the uniform grid of `timeframe` between the first and last bar.
///
/// Inserted rows get zero volume and every other column forward-filled.
pub fn fill_empty_ranges(frame: FeatureFrame, timeframe: Timeframe) -> FeatureFrame {
    let (Some(first), Some(last)) = (frame.first_time(), frame.last_time()) else {
        return frame;
    };
    let grid = timeframe.grid(first, last);
    let inserted = grid.len().saturating_sub(frame.len());
    let mut out = frame.reindex(&grid);
    out.fill_where(|name| name == "volume", 0.0);
    out.forward_fill();
    debug!(timeframe = %timeframe, inserted, "filled empty ranges");
    out
}

/// `avgPrice`, `ohlcPrice`, `range` and `momentum`.
pub fn add_price_summaries(mut frame: FeatureFrame) -> FeatureFrame {
    let (Some(open), Some(high), Some(low), Some(close)) = (
        frame.column("open"),
        frame.column("high"),
        frame.column("low"),
        frame.column("close"),
    ) else {
        return frame;
    };
    let n = frame.len();
    let avg: Vec<f64> = (0..n).map(|i| nan_mean(&[low[i], high[i]])).collect();
    let ohlc: Vec<f64> = (0..n)
        .map(|i| nan_mean(&[open[i], high[i], low[i], close[i]]))
        .collect();
    let range: Vec<f64> = (0..n).map(|i| high[i] - low[i]).collect();
    let momentum: Vec<f64> = (0..n).map(|i| open[i] - close[i]).collect();

    frame.insert("avgPrice", avg);
    frame.insert("ohlcPrice", ohlc);
    frame.insert("range", range);
    frame.insert("momentum", momentum);
    frame
}

/// Calendar columns from the index: `minute` (sub-hour timeframes only),
/// `hour` (sub-day only), `day`, `month`, `weekday` (Monday = 0) and
/// optionally `year`.
pub fn add_meta_dates(mut frame: FeatureFrame, timeframe: Timeframe, year: bool) -> FeatureFrame {
    let index = frame.index().to_vec();

    if timeframe.is_sub_hour() {
        frame.insert("minute", calendar(&index, |t| t.minute()));
    }
    if timeframe.is_sub_day() {
        frame.insert("hour", calendar(&index, |t| t.hour()));
    }
    frame.insert("day", calendar(&index, |t| t.day()));
    frame.insert("month", calendar(&index, |t| t.month()));
    frame.insert("weekday", calendar(&index, |t| t.weekday().num_days_from_monday()));
    if year {
        frame.insert("year", index.iter().map(|t| f64::from(t.year())).collect());
    }
    frame
}

fn calendar(index: &[NaiveDateTime], field: impl Fn(&NaiveDateTime) -> u32) -> Vec<f64> {
    index.iter().map(|t| f64::from(field(t))).collect()
}

/// Score every candle pattern of the classic backend, stored as
/// `score / 100` truncated toward zero under the function name.
pub fn add_candle_patterns(mut frame: FeatureFrame) -> Result<FeatureFrame, PipelineError> {
    let (Some(open), Some(high), Some(low), Some(close)) = (
        frame.column("open"),
        frame.column("high"),
        frame.column("low"),
        frame.column("close"),
    ) else {
        return Ok(frame);
    };
    let args = [open, high, low, close];
    let kwargs = Kwargs::new();

    let mut flags = Vec::with_capacity(PATTERN_METHODS.len());
    for method in PATTERN_METHODS {
        let MethodLookup::Found(function) = ClassicBackend.resolve(method) else {
            continue;
        };
        let output = function(&args, &kwargs).map_err(|source| PipelineError::Indicator {
            backend: BackendKind::Classic,
            method: method.to_string(),
            source,
        })?;
        if let IndicatorOutput::Series(scores) = output {
            let scaled: Vec<f64> = scores.iter().map(|s| (s / 100.0).trunc()).collect();
            flags.push((method, scaled));
        }
    }

    for (method, values) in flags {
        frame.insert(method, values);
    }
    Ok(frame)
}

/// `<method>-<period>-<field>-pct = ma / field * 100` for every combination.
pub fn add_ma_percentages(mut frame: FeatureFrame, specs: &[MaSpec]) -> FeatureFrame {
    for spec in specs {
        let kind: MaKind = match spec.method.parse() {
            Ok(kind) => kind,
            Err(err) => {
                warn!(method = %spec.method, "{err}, skipping");
                continue;
            }
        };
        for field in spec.targets() {
            let Some(values) = frame.column(field) else {
                warn!(field = %field, "moving-average field does not exist, skipping");
                continue;
            };
            let values = values.to_vec();
            for &period in &spec.periods {
                let ma = kind.apply(&values, period);
                let pct = ma.iter().zip(&values).map(|(m, v)| m / v * 100.0).collect();
                frame.insert(format!("{}-{period}-{field}-pct", kind.name()), pct);
            }
        }
    }
    frame
}

/// `lb_<period>_<field>`: the field `period` bars ago, or the ratio of the
/// current value to it.
pub fn add_lookbacks(mut frame: FeatureFrame, specs: &[LookbackSpec]) -> FeatureFrame {
    for spec in specs {
        let Some(values) = frame.column(&spec.field) else {
            warn!(field = %spec.field, "lookback field does not exist, skipping");
            continue;
        };
        let values = values.to_vec();
        for &period in &spec.periods {
            let lagged = shift(&values, period);
            let column = if spec.ratio {
                values.iter().zip(&lagged).map(|(v, l)| v / l).collect()
            } else {
                lagged
            };
            frame.insert(format!("lb_{period}_{}", spec.field), column);
        }
    }
    frame
}

/// Remove the named columns; unknown names are logged.
pub fn drop_columns(mut frame: FeatureFrame, names: &[String]) -> FeatureFrame {
    for name in names {
        if frame.remove(name).is_none() {
            warn!(column = %name, "column to drop does not exist");
        }
    }
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::frame::test_support::{make_bars, t0};
    use crate::domain::series::assert_approx;
    use chrono::Duration;

    fn frame(closes: &[f64]) -> FeatureFrame {
        FeatureFrame::from_bars(&make_bars(closes))
    }

    #[test]
    fn gap_is_open_minus_previous_close() {
        let mut f = frame(&[10.0, 11.0, 12.0]);
        f.insert("open", vec![10.0, 10.5, 13.0]);
        let out = add_gap(f);
        assert_eq!(out.column("gap").unwrap(), &[0.0, 0.5, 2.0]);
    }

    #[test]
    fn fill_empty_ranges_inserts_missing_bars() {
        let mut bars = make_bars(&[1.0, 2.0, 3.0, 4.0]);
        bars.remove(2);
        let out = fill_empty_ranges(FeatureFrame::from_bars(&bars), Timeframe::H1);
        assert_eq!(out.len(), 4);
        assert_eq!(out.index()[2], t0() + Duration::hours(2));
        assert_eq!(out.column("volume").unwrap()[2], 0.0);
        assert_eq!(out.column("close").unwrap()[2], 2.0);
    }

    #[test]
    fn price_summaries() {
        let out = add_price_summaries(frame(&[10.0, 12.0]));
        // bar 1: open 10, close 12, high 13, low 9
        assert_approx(out.column("avgPrice").unwrap()[1], 11.0, 1e-12);
        assert_approx(out.column("ohlcPrice").unwrap()[1], 11.0, 1e-12);
        assert_approx(out.column("range").unwrap()[1], 4.0, 1e-12);
        assert_approx(out.column("momentum").unwrap()[1], -2.0, 1e-12);
    }

    #[test]
    fn meta_dates_follow_timeframe() {
        let hourly = add_meta_dates(frame(&[1.0, 2.0]), Timeframe::H1, false);
        assert!(!hourly.has_column("minute"));
        assert_eq!(hourly.column("hour").unwrap(), &[0.0, 1.0]);
        // 2024-01-02 is a Tuesday
        assert_eq!(hourly.column("weekday").unwrap(), &[1.0, 1.0]);
        assert!(!hourly.has_column("year"));

        let daily = add_meta_dates(frame(&[1.0]), Timeframe::D1, true);
        assert!(!daily.has_column("hour"));
        assert_eq!(daily.column("day").unwrap(), &[2.0]);
        assert_eq!(daily.column("month").unwrap(), &[1.0]);
        assert_eq!(daily.column("year").unwrap(), &[2024.0]);

        let minutes = add_meta_dates(frame(&[1.0]), Timeframe::M15, false);
        assert!(minutes.has_column("minute") && minutes.has_column("hour"));
    }

    #[test]
    fn candle_patterns_are_scaled() {
        let mut f = frame(&[10.0, 10.0, 10.0]);
        f.insert("open", vec![10.0, 10.0, 10.0]);
        let out = add_candle_patterns(f).unwrap();
        for method in PATTERN_METHODS {
            let col = out.column(method).unwrap();
            assert!(col.iter().all(|v| [-1.0, 0.0, 1.0].contains(v)), "{method}");
        }
        // open == close with a range: doji
        assert_eq!(out.column("CDLDOJI").unwrap()[2], 1.0);
    }

    #[test]
    fn ma_percentages_named_and_skipped() {
        let specs = vec![
            MaSpec {
                method: "SMA".into(),
                field: Some("close".into()),
                fields: None,
                periods: vec![2],
            },
            MaSpec {
                method: "mama".into(),
                field: Some("close".into()),
                fields: None,
                periods: vec![2],
            },
            MaSpec {
                method: "ema".into(),
                field: None,
                fields: Some(vec!["nope".into(), "open".into()]),
                periods: vec![3],
            },
        ];
        let out = add_ma_percentages(frame(&[10.0, 20.0, 30.0]), &specs);
        let pct = out.column("sma-2-close-pct").unwrap();
        assert!(pct[0].is_nan());
        assert_approx(pct[1], 15.0 / 20.0 * 100.0, 1e-12);
        assert!(out.has_column("ema-3-open-pct"));
        assert!(!out.columns().any(|(n, _)| n.starts_with("mama")));
    }

    #[test]
    fn lookback_ratio() {
        let specs = vec![LookbackSpec {
            field: "close".into(),
            periods: vec![2],
            ratio: true,
        }];
        let out = add_lookbacks(frame(&[1.0, 2.0, 4.0, 8.0, 16.0]), &specs);
        let lb = out.column("lb_2_close").unwrap();
        assert!(lb[0].is_nan() && lb[1].is_nan());
        assert_eq!(&lb[2..], &[4.0, 4.0, 4.0]);
    }

    #[test]
    fn lookback_defaults_to_plain_shift() {
        let spec: LookbackSpec = toml::from_str("field = 'close'").unwrap();
        assert_eq!(spec.periods, vec![1, 2]);
        let out = add_lookbacks(frame(&[1.0, 2.0, 3.0]), &[spec]);
        assert_eq!(out.column("lb_1_close").unwrap()[2], 2.0);
        assert_eq!(out.column("lb_2_close").unwrap()[2], 1.0);
    }

    #[test]
    fn drop_ignores_unknown_columns() {
        let out = drop_columns(frame(&[1.0]), &["volume".into(), "missing".into()]);
        assert_eq!(out.width(), 4);
        assert!(!out.has_column("volume"));
    }
}
