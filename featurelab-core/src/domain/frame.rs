//! FeatureFrame: the working table that flows through the enrichment pipeline.
//!
//! A frame is a strictly increasing timestamp index plus an ordered list of named
//! `f64` columns, all of the index's length. Missing values are NaN. Column order
//! is insertion order, and inserting an existing name replaces that column in place.

use super::series::pad_front;
use super::Bar;
use chrono::NaiveDateTime;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Base OHLCV column names, in frame order.
pub const BASE_COLUMNS: [&str; 5] = ["open", "high", "low", "close", "volume"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureFrame {
    index: Vec<NaiveDateTime>,
    columns: Vec<(String, Vec<f64>)>,
}

impl FeatureFrame {
    /// An empty-columned frame over `index`.
    pub fn new(index: Vec<NaiveDateTime>) -> Self {
        Self {
            index,
            columns: Vec::new(),
        }
    }

    /// Build the base frame (open, high, low, close, volume) from bars.
    ///
    /// Bars are expected in ascending time order; duplicates keep the last bar.
    pub fn from_bars(bars: &[Bar]) -> Self {
        let mut sorted: Vec<&Bar> = bars.iter().collect();
        sorted.sort_by_key(|b| b.time);
        sorted.dedup_by(|next, prev| {
            if next.time == prev.time {
                *prev = *next;
                true
            } else {
                false
            }
        });

        let mut frame = Self::new(sorted.iter().map(|b| b.time).collect());
        frame.insert("open", sorted.iter().map(|b| b.open).collect());
        frame.insert("high", sorted.iter().map(|b| b.high).collect());
        frame.insert("low", sorted.iter().map(|b| b.low).collect());
        frame.insert("close", sorted.iter().map(|b| b.close).collect());
        frame.insert("volume", sorted.iter().map(|b| b.volume).collect());
        frame
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn index(&self) -> &[NaiveDateTime] {
        &self.index
    }

    pub fn first_time(&self) -> Option<NaiveDateTime> {
        self.index.first().copied()
    }

    pub fn last_time(&self) -> Option<NaiveDateTime> {
        self.index.last().copied()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.position(name).map(|i| self.columns[i].1.as_slice())
    }

    /// Iterate `(name, values)` pairs in column order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.columns
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|(n, _)| n == name)
    }

    /// Insert or replace a column.
    ///
    /// A series shorter than the frame is left-padded with NaN; a longer one keeps
    /// its trailing values.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        let name = name.into();
        let values = if values.len() == self.len() {
            values
        } else {
            pad_front(values, self.len())
        };
        match self.position(&name) {
            Some(i) => self.columns[i].1 = values,
            None => self.columns.push((name, values)),
        }
    }

    /// Remove a column, returning its values if it existed.
    pub fn remove(&mut self, name: &str) -> Option<Vec<f64>> {
        self.position(name).map(|i| self.columns.remove(i).1)
    }

    /// Prefix every column name with `prefix`.
    pub fn prefix_columns(&mut self, prefix: &str) {
        for (name, _) in &mut self.columns {
            name.insert_str(0, prefix);
        }
    }

    /// Append all columns of `other`, which must share this frame's index.
    ///
    /// Returns false (and leaves `self` untouched) when the indices differ.
    pub fn append_columns(&mut self, other: FeatureFrame) -> bool {
        if other.index != self.index {
            return false;
        }
        for (name, values) in other.columns {
            self.insert(name, values);
        }
        true
    }

    /// Keep only the rows where `keep[i]` is true.
    pub fn retain_rows(&mut self, keep: &[bool]) {
        let mask = |i: usize| keep.get(i).copied().unwrap_or(false);
        self.index = self
            .index
            .iter()
            .enumerate()
            .filter(|(i, _)| mask(*i))
            .map(|(_, t)| *t)
            .collect();
        for (_, values) in &mut self.columns {
            *values = values
                .iter()
                .enumerate()
                .filter(|(i, _)| mask(*i))
                .map(|(_, v)| *v)
                .collect();
        }
    }

    /// Left-join this frame onto `grid`: rows at timestamps absent from the frame
    /// are NaN, and rows whose timestamps are not on the grid are dropped.
    pub fn reindex(&self, grid: &[NaiveDateTime]) -> FeatureFrame {
        let lookup: HashMap<NaiveDateTime, usize> = self
            .index
            .iter()
            .enumerate()
            .map(|(i, t)| (*t, i))
            .collect();
        let rows: Vec<Option<usize>> = grid.iter().map(|t| lookup.get(t).copied()).collect();

        let mut out = FeatureFrame::new(grid.to_vec());
        for (name, values) in &self.columns {
            let col = rows
                .iter()
                .map(|row| row.map_or(f64::NAN, |i| values[i]))
                .collect();
            out.columns.push((name.clone(), col));
        }
        out
    }

    /// Propagate the last non-NaN value forward in every column.
    pub fn forward_fill(&mut self) {
        for (_, values) in &mut self.columns {
            let mut last = f64::NAN;
            for v in values.iter_mut() {
                if v.is_nan() {
                    *v = last;
                } else {
                    last = *v;
                }
            }
        }
    }

    /// Propagate the next non-NaN value backward in every column.
    pub fn backward_fill(&mut self) {
        for (_, values) in &mut self.columns {
            let mut next = f64::NAN;
            for v in values.iter_mut().rev() {
                if v.is_nan() {
                    *v = next;
                } else {
                    next = *v;
                }
            }
        }
    }

    /// Replace NaN with `fill` in every column matching `predicate`.
    pub fn fill_where(&mut self, predicate: impl Fn(&str) -> bool, fill: f64) {
        for (name, values) in &mut self.columns {
            if predicate(name) {
                values.iter_mut().filter(|v| v.is_nan()).for_each(|v| *v = fill);
            }
        }
    }

    /// Turn ±inf into NaN.
    pub fn replace_infinite(&mut self) {
        for (_, values) in &mut self.columns {
            values
                .iter_mut()
                .filter(|v| v.is_infinite())
                .for_each(|v| *v = f64::NAN);
        }
    }

    /// Drop every row holding a NaN or infinite value in any column.
    pub fn drop_incomplete_rows(&mut self) {
        let keep: Vec<bool> = (0..self.len())
            .map(|i| self.columns.iter().all(|(_, values)| values[i].is_finite()))
            .collect();
        self.retain_rows(&keep);
    }

    /// Row-oriented view: one JSON object per row with `time` plus every column.
    ///
    /// Non-finite values become `null`.
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        (0..self.len())
            .map(|i| {
                let mut record = Map::new();
                record.insert(
                    "time".to_string(),
                    Value::String(self.index[i].format("%Y-%m-%dT%H:%M:%S").to_string()),
                );
                for (name, values) in &self.columns {
                    let value = serde_json::Number::from_f64(values[i])
                        .map(Value::Number)
                        .unwrap_or(Value::Null);
                    record.insert(name.clone(), value);
                }
                record
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::domain::Bar;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    pub fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    /// Hourly bars from closes: open = previous close, high/low = ±1 around body.
    pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                let open = if i == 0 { close } else { closes[i - 1] };
                Bar {
                    time: t0() + Duration::hours(i as i64),
                    open,
                    high: open.max(close) + 1.0,
                    low: open.min(close) - 1.0,
                    close,
                    volume: 1000.0,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{make_bars, t0};
    use super::*;
    use chrono::Duration;

    #[test]
    fn from_bars_builds_base_columns() {
        let frame = FeatureFrame::from_bars(&make_bars(&[10.0, 11.0, 12.0]));
        assert_eq!(frame.len(), 3);
        assert_eq!(frame.column_names(), BASE_COLUMNS.map(String::from).to_vec());
        assert_eq!(frame.column("close").unwrap(), &[10.0, 11.0, 12.0]);
    }

    #[test]
    fn from_bars_sorts_and_dedups() {
        let mut bars = make_bars(&[10.0, 11.0, 12.0]);
        bars.swap(0, 2);
        let mut dup = bars[1].clone();
        dup.close = 99.0;
        bars.push(dup);
        let frame = FeatureFrame::from_bars(&bars);
        assert_eq!(frame.len(), 3);
        assert!(frame.index().windows(2).all(|w| w[0] < w[1]));
        assert_eq!(frame.column("close").unwrap()[1], 99.0);
    }

    #[test]
    fn insert_replaces_existing() {
        let mut frame = FeatureFrame::from_bars(&make_bars(&[1.0, 2.0]));
        frame.insert("close", vec![5.0, 6.0]);
        assert_eq!(frame.width(), 5);
        assert_eq!(frame.column("close").unwrap(), &[5.0, 6.0]);
    }

    #[test]
    fn insert_pads_short_series() {
        let mut frame = FeatureFrame::from_bars(&make_bars(&[1.0, 2.0, 3.0]));
        frame.insert("x", vec![7.0]);
        let x = frame.column("x").unwrap();
        assert!(x[0].is_nan() && x[1].is_nan());
        assert_eq!(x[2], 7.0);
    }

    #[test]
    fn reindex_inserts_missing_rows_as_nan() {
        let frame = FeatureFrame::from_bars(&make_bars(&[1.0, 2.0]));
        let grid: Vec<_> = (0..4).map(|h| t0() + Duration::hours(h)).collect();
        let out = frame.reindex(&grid);
        assert_eq!(out.len(), 4);
        let close = out.column("close").unwrap();
        assert_eq!(&close[..2], &[1.0, 2.0]);
        assert!(close[2].is_nan() && close[3].is_nan());
    }

    #[test]
    fn fills_forward_and_backward() {
        let mut frame = FeatureFrame::new((0..4).map(|h| t0() + Duration::hours(h)).collect());
        frame.insert("a", vec![f64::NAN, 1.0, f64::NAN, 3.0]);

        let mut ff = frame.clone();
        ff.forward_fill();
        let a = ff.column("a").unwrap();
        assert!(a[0].is_nan());
        assert_eq!(&a[1..], &[1.0, 1.0, 3.0]);

        frame.backward_fill();
        assert_eq!(frame.column("a").unwrap(), &[1.0, 1.0, 3.0, 3.0]);
    }

    #[test]
    fn drop_incomplete_rows_removes_nan_and_inf() {
        let mut frame = FeatureFrame::new((0..3).map(|h| t0() + Duration::hours(h)).collect());
        frame.insert("a", vec![1.0, f64::INFINITY, 3.0]);
        frame.insert("b", vec![f64::NAN, 2.0, 3.0]);
        frame.drop_incomplete_rows();
        assert_eq!(frame.len(), 1);
        assert_eq!(frame.index()[0], t0() + Duration::hours(2));
    }

    #[test]
    fn prefix_and_fill_where() {
        let mut frame = FeatureFrame::new(vec![t0()]);
        frame.insert("volume", vec![f64::NAN]);
        frame.insert("close", vec![f64::NAN]);
        frame.prefix_columns("EURUSD-");
        frame.fill_where(|n| n.ends_with("-volume"), 0.0);
        assert_eq!(frame.column("EURUSD-volume").unwrap(), &[0.0]);
        assert!(frame.column("EURUSD-close").unwrap()[0].is_nan());
    }

    #[test]
    fn records_render_nan_as_null() {
        let mut frame = FeatureFrame::new(vec![t0()]);
        frame.insert("a", vec![f64::NAN]);
        frame.insert("b", vec![2.5]);
        let records = frame.to_records();
        assert_eq!(records[0]["time"], "2024-01-02T00:00:00");
        assert!(records[0]["a"].is_null());
        assert_eq!(records[0]["b"], 2.5);
    }
}
