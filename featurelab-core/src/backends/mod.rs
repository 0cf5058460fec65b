//! Indicator backends: named method tables over the slice kernels.
//!
//! A backend is a finite table mapping method names to plain function
//! pointers. Lookup is a static table search; an unknown name resolves to
//! [`MethodLookup::Unsupported`] and the dispatcher decides what to do with it.
//!
//! Three backends ship with the crate, each with its own naming and argument
//! conventions:
//! - [`classic`]: upper-case function names (`SMA`, `BBANDS`, `CDLDOJI`), arrays
//!   and tuples of arrays out.
//! - [`native`]: composite indicators (`rvi`, `ehlers_rpi`, `ultra_wpr`, ...).
//! - [`frame`]: lower-case names returning named tables (`BBL_20_2.0`, ...).

pub mod classic;
pub mod frame;
pub mod native;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use classic::ClassicBackend;
pub use frame::FrameBackend;
pub use native::NativeBackend;

// ─── Error type ──────────────────────────────────────────────────────

/// Failures raised from inside a backend call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IndicatorError {
    #[error("expected {expected} input series, got {got}")]
    Arity { expected: usize, got: usize },
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },
    #[error("unsupported smoothing method '{0}'")]
    UnsupportedSmoothing(String),
}

impl IndicatorError {
    fn invalid(name: &str, reason: impl Into<String>) -> Self {
        IndicatorError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

// ─── Keyword arguments ───────────────────────────────────────────────

/// One keyword argument value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KwargValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl From<f64> for KwargValue {
    fn from(v: f64) -> Self {
        KwargValue::Number(v)
    }
}

impl From<i32> for KwargValue {
    fn from(v: i32) -> Self {
        KwargValue::Number(f64::from(v))
    }
}

impl From<bool> for KwargValue {
    fn from(v: bool) -> Self {
        KwargValue::Bool(v)
    }
}

impl From<&str> for KwargValue {
    fn from(v: &str) -> Self {
        KwargValue::Text(v.to_string())
    }
}

/// Keyword arguments of one indicator call, with typed accessors that fall
/// back to a default when the key is absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kwargs(BTreeMap<String, KwargValue>);

impl Kwargs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<KwargValue>) -> Self {
        self.0.insert(name.to_string(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&KwargValue> {
        self.0.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Numeric parameter.
    pub fn number(&self, name: &str, default: f64) -> Result<f64, IndicatorError> {
        match self.0.get(name) {
            None => Ok(default),
            Some(KwargValue::Number(v)) if v.is_finite() => Ok(*v),
            Some(other) => Err(IndicatorError::invalid(
                name,
                format!("expected a number, got {other:?}"),
            )),
        }
    }

    /// Window length: a positive integer.
    pub fn period(&self, name: &str, default: usize) -> Result<usize, IndicatorError> {
        match self.0.get(name) {
            None => Ok(default),
            Some(KwargValue::Number(v)) if *v >= 1.0 && v.fract() == 0.0 => Ok(*v as usize),
            Some(other) => Err(IndicatorError::invalid(
                name,
                format!("expected a positive integer, got {other:?}"),
            )),
        }
    }

    pub fn flag(&self, name: &str, default: bool) -> Result<bool, IndicatorError> {
        match self.0.get(name) {
            None => Ok(default),
            Some(KwargValue::Bool(b)) => Ok(*b),
            Some(other) => Err(IndicatorError::invalid(
                name,
                format!("expected a boolean, got {other:?}"),
            )),
        }
    }

    pub fn text<'a>(&'a self, name: &str, default: &'a str) -> Result<&'a str, IndicatorError> {
        match self.0.get(name) {
            None => Ok(default),
            Some(KwargValue::Text(s)) => Ok(s),
            Some(other) => Err(IndicatorError::invalid(
                name,
                format!("expected a string, got {other:?}"),
            )),
        }
    }
}

// ─── Specs and outputs ───────────────────────────────────────────────

/// One requested indicator call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSpec {
    pub method: String,
    /// Semantic input keys (`open`/`o`, `high`/`h`, ...), in positional order.
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Kwargs::is_empty")]
    pub kwargs: Kwargs,
    /// Overrides the method name in output column names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

impl IndicatorSpec {
    pub fn new(method: &str, args: &[&str]) -> Self {
        Self {
            method: method.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            kwargs: Kwargs::new(),
            name: None,
            prefix: None,
        }
    }

    pub fn kwarg(mut self, name: &str, value: impl Into<KwargValue>) -> Self {
        self.kwargs = self.kwargs.with(name, value);
        self
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn prefixed(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
        self
    }
}

/// Shapes a backend call can return.
#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorOutput {
    Series(Vec<f64>),
    SeriesTuple(Vec<Vec<f64>>),
    /// Named columns, in output order.
    Table(Vec<(String, Vec<f64>)>),
    Empty,
}

/// Signature shared by every backend method: positional input series plus
/// keyword arguments.
pub type IndicatorFn = fn(&[&[f64]], &Kwargs) -> Result<IndicatorOutput, IndicatorError>;

/// Result of looking a method name up in a backend.
#[derive(Debug, Clone, Copy)]
pub enum MethodLookup {
    Found(IndicatorFn),
    Unsupported,
}

// ─── Backend trait ───────────────────────────────────────────────────

/// Which backend a spec list targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    #[serde(alias = "talib")]
    Classic,
    Native,
    #[serde(alias = "pandas_ta", alias = "pandasta")]
    Frame,
}

impl BackendKind {
    /// Dispatch order used by the pipeline.
    pub const ALL: [BackendKind; 3] = [BackendKind::Classic, BackendKind::Native, BackendKind::Frame];

    pub fn name(self) -> &'static str {
        match self {
            BackendKind::Classic => "classic",
            BackendKind::Native => "native",
            BackendKind::Frame => "frame",
        }
    }

    pub fn backend(self) -> &'static dyn IndicatorBackend {
        match self {
            BackendKind::Classic => &ClassicBackend,
            BackendKind::Native => &NativeBackend,
            BackendKind::Frame => &FrameBackend,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown indicator backend '{0}'")]
pub struct UnknownBackend(pub String);

impl FromStr for BackendKind {
    type Err = UnknownBackend;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "classic" | "talib" => Ok(BackendKind::Classic),
            "native" => Ok(BackendKind::Native),
            "frame" | "pandas_ta" | "pandasta" => Ok(BackendKind::Frame),
            _ => Err(UnknownBackend(s.to_string())),
        }
    }
}

/// A named capability set of indicator functions.
pub trait IndicatorBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// The method table. Names are matched exactly.
    fn table(&self) -> &'static [(&'static str, IndicatorFn)];

    /// Specs dispatched by the bulk "all indicators" stage.
    fn default_suite(&self) -> Vec<IndicatorSpec>;

    fn resolve(&self, method: &str) -> MethodLookup {
        self.table()
            .iter()
            .find(|(name, _)| *name == method)
            .map_or(MethodLookup::Unsupported, |(_, f)| MethodLookup::Found(*f))
    }

    fn methods(&self) -> Vec<&'static str> {
        self.table().iter().map(|(name, _)| *name).collect()
    }
}

// ─── Helpers shared by the backends ──────────────────────────────────

/// Destructure positional inputs into a fixed-size array.
fn inputs<'a, const N: usize>(args: &[&'a [f64]]) -> Result<[&'a [f64]; N], IndicatorError> {
    <[&'a [f64]; N]>::try_from(args).map_err(|_| IndicatorError::Arity {
        expected: N,
        got: args.len(),
    })
}

fn zip_with(a: &[f64], b: &[f64], f: impl Fn(f64, f64) -> f64) -> Vec<f64> {
    a.iter().zip(b).map(|(x, y)| f(*x, *y)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kwargs_typed_access() {
        let kw = Kwargs::new()
            .with("timeperiod", 20)
            .with("ratio", false)
            .with("method", "EMA");
        assert_eq!(kw.period("timeperiod", 14).unwrap(), 20);
        assert_eq!(kw.period("missing", 14).unwrap(), 14);
        assert!(!kw.flag("ratio", true).unwrap());
        assert_eq!(kw.text("method", "SMA").unwrap(), "EMA");
        assert!(kw.number("method", 1.0).is_err());
    }

    #[test]
    fn period_rejects_fractions_and_zero() {
        assert!(Kwargs::new().with("p", 2.5).period("p", 1).is_err());
        assert!(Kwargs::new().with("p", 0).period("p", 1).is_err());
    }

    #[test]
    fn kwargs_deserialize_from_toml() {
        let kw: Kwargs = toml::from_str("timeperiod = 14\nstd = 2.5\nratio = true\nm = 'EMA'").unwrap();
        assert_eq!(kw.period("timeperiod", 1).unwrap(), 14);
        assert_eq!(kw.number("std", 0.0).unwrap(), 2.5);
        assert!(kw.flag("ratio", false).unwrap());
        assert_eq!(kw.text("m", "").unwrap(), "EMA");
    }

    #[test]
    fn backend_kind_aliases() {
        assert_eq!("talib".parse::<BackendKind>().unwrap(), BackendKind::Classic);
        assert_eq!("pandas_ta".parse::<BackendKind>().unwrap(), BackendKind::Frame);
        assert!("tulip".parse::<BackendKind>().is_err());
    }

    #[test]
    fn every_backend_resolves_its_own_methods() {
        for kind in BackendKind::ALL {
            let backend = kind.backend();
            assert_eq!(backend.kind(), kind);
            for name in backend.methods() {
                assert!(matches!(backend.resolve(name), MethodLookup::Found(_)), "{kind}: {name}");
            }
            assert!(matches!(backend.resolve("no_such_method"), MethodLookup::Unsupported));
        }
    }

    #[test]
    fn inputs_checks_arity() {
        let a = [1.0, 2.0];
        let args: Vec<&[f64]> = vec![&a, &a];
        assert!(inputs::<2>(&args).is_ok());
        assert_eq!(
            inputs::<3>(&args).unwrap_err(),
            IndicatorError::Arity { expected: 3, got: 2 }
        );
    }
}
