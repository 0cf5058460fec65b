//! Indicator dispatch: run a list of specs against one backend and attach the
//! results as uniquely named columns.
//!
//! Unknown methods and unknown argument keys are logged and skipped so a batch
//! partially succeeds; only a failing backend call aborts the fetch.

use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use tracing::{debug, warn};

use super::{CancelToken, ColumnRegistry, PipelineError};
use crate::backends::{IndicatorBackend, IndicatorOutput, IndicatorSpec, MethodLookup};
use crate::domain::FeatureFrame;

/// A base OHLCV field referenced by a positional indicator argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceField {
    Open,
    High,
    Low,
    Close,
    Volume,
}

impl PriceField {
    pub fn column(self) -> &'static str {
        match self {
            PriceField::Open => "open",
            PriceField::High => "high",
            PriceField::Low => "low",
            PriceField::Close => "close",
            PriceField::Volume => "volume",
        }
    }
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for PriceField {
    type Err = ();

    /// Accepts the one-letter keys (`o h l c v`) and the full column names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "o" | "open" => Ok(PriceField::Open),
            "h" | "high" => Ok(PriceField::High),
            "l" | "low" => Ok(PriceField::Low),
            "c" | "close" => Ok(PriceField::Close),
            "v" | "volume" => Ok(PriceField::Volume),
            _ => Err(()),
        }
    }
}

/// Apply `specs` in order, adding one or more columns per successful spec.
pub fn apply_indicators(
    backend: &dyn IndicatorBackend,
    specs: &[IndicatorSpec],
    mut frame: FeatureFrame,
    registry: &mut ColumnRegistry,
    cancel: &CancelToken,
) -> Result<FeatureFrame, PipelineError> {
    let started = Instant::now();
    let kind = backend.kind();
    let mut added = 0usize;
    registry.reserve(frame.column_names());

    for spec in specs {
        cancel.check(&format!("indicator {}", spec.method))?;

        let mut inputs: Vec<Vec<f64>> = Vec::with_capacity(spec.args.len());
        for key in &spec.args {
            match key.parse::<PriceField>() {
                Ok(field) => match frame.column(field.column()) {
                    Some(values) => inputs.push(values.to_vec()),
                    None => warn!(method = %spec.method, field = %field, "field missing from frame, ignoring argument"),
                },
                Err(()) => {
                    warn!(method = %spec.method, argument = %key, "ignoring unknown positional argument")
                }
            }
        }

        let function = match backend.resolve(&spec.method) {
            MethodLookup::Found(f) => f,
            MethodLookup::Unsupported => {
                warn!(backend = %kind, method = %spec.method, "method is not supported, skipping");
                continue;
            }
        };

        let args: Vec<&[f64]> = inputs.iter().map(Vec::as_slice).collect();
        let output = function(&args, &spec.kwargs).map_err(|source| PipelineError::Indicator {
            backend: kind,
            method: spec.method.clone(),
            source,
        })?;

        attach(&mut frame, spec, output, registry);
        added += 1;
    }

    debug!(
        backend = %kind,
        indicators = added,
        seconds = started.elapsed().as_secs_f64(),
        "indicators added"
    );
    Ok(frame)
}

/// Name and insert a backend result.
fn attach(frame: &mut FeatureFrame, spec: &IndicatorSpec, output: IndicatorOutput, registry: &mut ColumnRegistry) {
    let prefix = spec.prefix.as_deref().unwrap_or("");
    let stem = spec.name.as_deref().unwrap_or(&spec.method).to_lowercase();

    match output {
        IndicatorOutput::SeriesTuple(parts) => {
            for (i, values) in parts.into_iter().enumerate() {
                let name = registry.resolve(&format!("{prefix}{stem}_{i}"));
                frame.insert(name, values);
            }
        }
        IndicatorOutput::Table(columns) => {
            for (column, values) in columns {
                // underscores would read as a dedup suffix
                let name = registry.resolve(&format!("{prefix}{}", column.replace('_', "|")));
                frame.insert(name, values);
            }
        }
        IndicatorOutput::Series(values) => {
            let name = registry.resolve(&format!("{prefix}{stem}"));
            frame.insert(name, values);
        }
        IndicatorOutput::Empty => {
            let name = registry.resolve(&format!("{prefix}{stem}"));
            let len = frame.len();
            frame.insert(name, vec![f64::NAN; len]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{BackendKind, ClassicBackend, FrameBackend, NativeBackend};
    use crate::domain::frame::test_support::make_bars;

    fn frame(n: usize) -> FeatureFrame {
        let closes: Vec<f64> = (0..n).map(|i| 100.0 + (i as f64 * 0.4).sin() * 3.0).collect();
        FeatureFrame::from_bars(&make_bars(&closes))
    }

    fn run(backend: &dyn IndicatorBackend, specs: &[IndicatorSpec], f: FeatureFrame) -> FeatureFrame {
        let mut registry = ColumnRegistry::new();
        apply_indicators(backend, specs, f, &mut registry, &CancelToken::new()).unwrap()
    }

    #[test]
    fn tuple_output_repeated_name_gets_suffix() {
        let specs = vec![
            IndicatorSpec::new("AROON", &["h", "l"]).named("ar"),
            IndicatorSpec::new("AROON", &["h", "l"]).named("ar").kwarg("timeperiod", 5),
        ];
        let out = run(&ClassicBackend, &specs, frame(40));
        for name in ["ar_0", "ar_1", "ar_0_2", "ar_1_2"] {
            assert!(out.has_column(name), "missing {name}: {:?}", out.column_names());
        }
    }

    #[test]
    fn series_named_by_lowercased_method_with_prefix() {
        let specs = vec![IndicatorSpec::new("RSI", &["c"]).prefixed("x_")];
        let out = run(&ClassicBackend, &specs, frame(30));
        assert!(out.has_column("x_rsi"));
        assert_eq!(out.column("x_rsi").unwrap().len(), 30);
    }

    #[test]
    fn table_columns_swap_underscores() {
        let specs = vec![IndicatorSpec::new("bbands", &["close"]).kwarg("length", 10)];
        let out = run(&FrameBackend, &specs, frame(30));
        assert!(out.has_column("BBL|10|2.0"));
        assert!(out.has_column("BBU|10|2.0"));
    }

    #[test]
    fn unknown_method_and_argument_are_skipped() {
        let specs = vec![
            IndicatorSpec::new("NOPE", &["c"]),
            IndicatorSpec::new("pov", &["c", "x", "v"]),
        ];
        let out = run(&NativeBackend, &specs, frame(10));
        assert!(!out.has_column("nope"));
        assert!(out.has_column("pov"));
        assert_eq!(out.width(), 6);
    }

    #[test]
    fn backend_failure_is_fatal() {
        let specs = vec![IndicatorSpec::new("ATR", &["c"])];
        let mut registry = ColumnRegistry::new();
        let err = apply_indicators(&ClassicBackend, &specs, frame(10), &mut registry, &CancelToken::new())
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Indicator { backend: BackendKind::Classic, ref method, .. } if method == "ATR"
        ));
    }

    #[test]
    fn cancelled_token_aborts() {
        let token = CancelToken::new();
        token.cancel();
        let mut registry = ColumnRegistry::new();
        let specs = vec![IndicatorSpec::new("SMA", &["c"])];
        let err = apply_indicators(&ClassicBackend, &specs, frame(10), &mut registry, &token).unwrap_err();
        assert!(matches!(err, PipelineError::Cancelled { .. }));
    }

    #[test]
    fn indicator_named_like_existing_column_is_suffixed() {
        let base = frame(30);
        let close = base.column("close").unwrap().to_vec();
        let specs = vec![
            IndicatorSpec::new("SMA", &["c"]).named("close").kwarg("timeperiod", 5),
            IndicatorSpec::new("ROC", &["c"]).named("range"),
        ];
        let out = run(&ClassicBackend, &specs, base);
        assert_eq!(out.column("close").unwrap(), close.as_slice());
        assert!(out.has_column("close_2"));
        assert!(out.has_column("range"));
        assert_eq!(out.width(), 7);
    }

    #[test]
    fn existing_columns_reserved_across_backends() {
        let mut registry = ColumnRegistry::new();
        let cancel = CancelToken::new();
        let specs = vec![IndicatorSpec::new("RSI", &["c"])];
        let f = apply_indicators(&ClassicBackend, &specs, frame(30), &mut registry, &cancel).unwrap();
        let specs = vec![IndicatorSpec::new("sma", &["close"]).named("rsi")];
        let f = apply_indicators(&FrameBackend, &specs, f, &mut registry, &cancel).unwrap();
        assert!(f.has_column("rsi") && f.has_column("rsi_2"));
        assert_eq!(f.width(), 7);
    }

    #[test]
    fn price_field_keys() {
        assert_eq!("o".parse::<PriceField>(), Ok(PriceField::Open));
        assert_eq!("volume".parse::<PriceField>(), Ok(PriceField::Volume));
        assert!("x".parse::<PriceField>().is_err());
    }
}
