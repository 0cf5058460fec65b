//! Bar: one OHLCV interval as delivered by a data source.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// OHLCV bar for a single instrument over one timeframe interval.
///
/// `time` is the interval's open time. Volume is the tick volume reported by the
/// source and is kept as `f64` so it can live in a [`FeatureFrame`](super::FeatureFrame)
/// column next to prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub time: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// True if any price is NaN. Sources drop such rows.
    pub fn is_void(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .any(|p| p.is_nan())
    }

    /// High and low bracket the open and close, and volume is not negative.
    pub fn is_consistent(&self) -> bool {
        !self.is_void()
            && self.high >= self.open.max(self.close)
            && self.low <= self.open.min(self.close)
            && self.volume >= 0.0
    }
}
