//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over bar sources (a live terminal, CSV
//! directories, synthetic generators) so the pipeline never talks to a venue
//! directly and tests can run against in-memory data.

use crate::domain::{Bar, Timeframe};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("parquet I/O error: {0}")]
    ParquetError(String),

    #[error("data error: {0}")]
    Other(String),
}

/// Which bars to fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarRange {
    /// The most recent `count` bars. With `include_open_bar` the window ends at the
    /// currently forming bar, otherwise at the last closed one.
    Count { count: usize, include_open_bar: bool },
    /// Every bar with `from <= time <= to`.
    Span {
        from: NaiveDateTime,
        to: NaiveDateTime,
    },
}

impl BarRange {
    /// Select the requested bars from a full, ascending history whose last bar is
    /// the currently forming one.
    pub fn select(&self, history: &[Bar]) -> Vec<Bar> {
        match *self {
            BarRange::Count {
                count,
                include_open_bar,
            } => {
                let end = if include_open_bar {
                    history.len()
                } else {
                    history.len().saturating_sub(1)
                };
                let start = end.saturating_sub(count);
                history[start..end].to_vec()
            }
            BarRange::Span { from, to } => history
                .iter()
                .filter(|b| b.time >= from && b.time <= to)
                .cloned()
                .collect(),
        }
    }
}

/// Contract metadata for an instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub symbol: String,
    pub point: f64,
    pub digits: u32,
    pub spread: f64,
    pub trade_mode: i32,
    pub trade_allowed: bool,
    pub volume_min: f64,
    pub volume_max: f64,
    pub volume_step: f64,
}

/// Trait for bar sources.
///
/// An empty `Ok` result is the "no data" signal; the pipeline turns it into a
/// fatal error. Implementations must be shareable across the threads used for
/// multi-instrument fetches.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch bars for an instrument, ascending by time.
    fn bars(
        &self,
        instrument: &str,
        timeframe: Timeframe,
        range: &BarRange,
    ) -> Result<Vec<Bar>, DataError>;

    /// Contract metadata, if the source knows the instrument.
    fn symbol_meta(&self, _instrument: &str) -> Result<Option<SymbolInfo>, DataError> {
        Ok(None)
    }
}

/// Provider over bars held in memory, keyed by instrument.
///
/// Bars are served as stored whatever timeframe is requested.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    bars: HashMap<String, Vec<Bar>>,
    symbols: HashMap<String, SymbolInfo>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bars(mut self, instrument: impl Into<String>, mut bars: Vec<Bar>) -> Self {
        bars.sort_by_key(|b| b.time);
        self.bars.insert(instrument.into(), bars);
        self
    }

    pub fn with_symbol(mut self, info: SymbolInfo) -> Self {
        self.symbols.insert(info.symbol.clone(), info);
        self
    }
}

impl DataProvider for InMemoryProvider {
    fn name(&self) -> &str {
        "memory"
    }

    fn bars(
        &self,
        instrument: &str,
        _timeframe: Timeframe,
        range: &BarRange,
    ) -> Result<Vec<Bar>, DataError> {
        Ok(self
            .bars
            .get(instrument)
            .map(|history| range.select(history))
            .unwrap_or_default())
    }

    fn symbol_meta(&self, instrument: &str) -> Result<Option<SymbolInfo>, DataError> {
        Ok(self.symbols.get(instrument).cloned())
    }
}
