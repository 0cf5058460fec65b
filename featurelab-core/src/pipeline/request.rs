//! Serializable fetch request.

use std::collections::HashSet;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::denoise::DenoiseSpec;
use super::features::{LookbackSpec, MaSpec};
use super::pivots::PivotConfig;
use super::support_resistance::SupportResistanceSpec;
use super::PipelineError;
use crate::backends::{BackendKind, IndicatorSpec};
use crate::data::BarRange;
use crate::domain::Timeframe;

/// Fingerprint of a request (BLAKE3 hex digest of its JSON form).
pub type RequestId = String;

/// One instrument, or several to be aligned on a common grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Instruments {
    One(String),
    Many(Vec<String>),
}

impl Instruments {
    pub fn as_list(&self) -> Vec<&str> {
        match self {
            Instruments::One(symbol) => vec![symbol.as_str()],
            Instruments::Many(symbols) => symbols.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for Instruments {
    fn from(symbol: &str) -> Self {
        Instruments::One(symbol.to_string())
    }
}

impl From<Vec<&str>> for Instruments {
    fn from(symbols: Vec<&str>) -> Self {
        Instruments::Many(symbols.into_iter().map(String::from).collect())
    }
}

/// Indicator specs grouped by the backend that runs them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorGroups {
    #[serde(alias = "talib")]
    pub classic: Vec<IndicatorSpec>,
    pub native: Vec<IndicatorSpec>,
    #[serde(alias = "pandas_ta")]
    pub frame: Vec<IndicatorSpec>,
}

impl IndicatorGroups {
    pub fn for_backend(&self, kind: BackendKind) -> &[IndicatorSpec] {
        match kind {
            BackendKind::Classic => &self.classic,
            BackendKind::Native => &self.native,
            BackendKind::Frame => &self.frame,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.classic.is_empty() && self.native.is_empty() && self.frame.is_empty()
    }
}

fn yes() -> bool {
    true
}

fn default_pivot_window() -> usize {
    14
}

/// Everything one fetch needs: what to load and which stages to run.
///
/// Timestamps are written as `"2024-01-02T00:00:00"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub instruments: Instruments,
    pub timeframe: String,

    /// Most recent `count` bars. Takes precedence over `from`/`to`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<NaiveDateTime>,
    /// Defaults to now.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<NaiveDateTime>,
    #[serde(default = "yes")]
    pub provide_open_bar: bool,

    #[serde(default)]
    pub indicators: IndicatorGroups,
    /// Backends whose default suite is added in bulk.
    #[serde(default)]
    pub all_indicators: Vec<BackendKind>,
    #[serde(default)]
    pub candle_patterns: bool,
    #[serde(default)]
    pub mas: Vec<MaSpec>,
    #[serde(default)]
    pub lookbacks: Vec<LookbackSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub denoise: Option<DenoiseSpec>,

    #[serde(default)]
    pub meta_dates: bool,
    #[serde(default)]
    pub year: bool,
    #[serde(default = "yes")]
    pub price_summaries: bool,
    #[serde(default)]
    pub gap: bool,
    #[serde(default)]
    pub support_resistance: SupportResistanceSpec,
    /// Levels per pivot system; zero skips pivots.
    #[serde(default)]
    pub pivot_levels: usize,
    #[serde(default = "default_pivot_window")]
    pub pivot_window: usize,

    #[serde(default)]
    pub fill_empty_ranges: bool,
    #[serde(default = "yes")]
    pub drop_na: bool,
    #[serde(default)]
    pub drop_columns: Vec<String>,
    #[serde(default)]
    pub quiet: bool,
}

impl FetchRequest {
    /// A request with every stage at its default.
    pub fn new(instruments: impl Into<Instruments>, timeframe: &str) -> Self {
        Self {
            instruments: instruments.into(),
            timeframe: timeframe.to_string(),
            count: None,
            from: None,
            to: None,
            provide_open_bar: true,
            indicators: IndicatorGroups::default(),
            all_indicators: Vec::new(),
            candle_patterns: false,
            mas: Vec::new(),
            lookbacks: Vec::new(),
            denoise: None,
            meta_dates: false,
            year: false,
            price_summaries: true,
            gap: false,
            support_resistance: SupportResistanceSpec::default(),
            pivot_levels: 0,
            pivot_window: default_pivot_window(),
            fill_empty_ranges: false,
            drop_na: true,
            drop_columns: Vec::new(),
            quiet: false,
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn from_toml_str(text: &str) -> Result<Self, PipelineError> {
        let request: Self = toml::from_str(text).map_err(|e| PipelineError::Config(e.to_string()))?;
        request.validate()?;
        Ok(request)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, PipelineError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Instrument names must be distinct: aligned columns are keyed by them.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let mut seen = HashSet::new();
        for instrument in self.instruments.as_list() {
            if !seen.insert(instrument) {
                return Err(PipelineError::Config(format!(
                    "instrument '{instrument}' is listed more than once"
                )));
            }
        }
        Ok(())
    }

    pub fn timeframe(&self) -> Result<Timeframe, PipelineError> {
        Ok(self.timeframe.parse()?)
    }

    /// Which bars to load: a count wins over a date range.
    pub fn range(&self) -> Result<BarRange, PipelineError> {
        match (self.count, self.from) {
            (Some(count), _) => Ok(BarRange::Count {
                count,
                include_open_bar: self.provide_open_bar,
            }),
            (None, Some(from)) => Ok(BarRange::Span {
                from,
                to: self.to.unwrap_or_else(|| chrono::Utc::now().naive_utc()),
            }),
            (None, None) => Err(PipelineError::MissingRange),
        }
    }

    pub fn pivot_config(&self) -> PivotConfig {
        PivotConfig {
            window: self.pivot_window,
            levels: self.pivot_levels,
            distances_only: true,
        }
    }

    /// Per-instrument request used by multi-instrument alignment.
    ///
    /// Grid filling and NaN dropping are forced on; calendar columns are left
    /// to the merged frame.
    pub fn for_instrument(&self, instrument: &str) -> FetchRequest {
        FetchRequest {
            instruments: Instruments::One(instrument.to_string()),
            fill_empty_ranges: true,
            drop_na: true,
            meta_dates: false,
            year: false,
            ..self.clone()
        }
    }

    /// Deterministic content hash of the request.
    ///
    /// A custom denoise function is not part of the serialized form and so
    /// does not affect the fingerprint.
    pub fn fingerprint(&self) -> RequestId {
        let json = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}
