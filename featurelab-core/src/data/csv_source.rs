//! CSV directory provider.
//!
//! Layout: `{dir}/{INSTRUMENT}_{timeframe}.csv`, falling back to `{dir}/{INSTRUMENT}.csv`,
//! with header `time,open,high,low,close,volume` (`tick_volume` is accepted for
//! `volume`). `time` is either unix seconds or a `YYYY-MM-DD[ HH:MM[:SS]]` string.
//! Symbol metadata lives in an optional `{dir}/symbols.json` array of [`SymbolInfo`].

use super::provider::{BarRange, DataError, DataProvider, SymbolInfo};
use crate::domain::{Bar, Timeframe};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Deserialize)]
struct CsvRow {
    time: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(alias = "tick_volume")]
    volume: f64,
}

pub struct CsvProvider {
    dir: PathBuf,
}

impl CsvProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_for(&self, instrument: &str, timeframe: Timeframe) -> Option<PathBuf> {
        [
            self.dir.join(format!("{instrument}_{}.csv", timeframe.label())),
            self.dir.join(format!("{instrument}.csv")),
        ]
        .into_iter()
        .find(|p| p.is_file())
    }

    /// Load the full history of a file, ascending by time.
    fn load(&self, path: &Path) -> Result<Vec<Bar>, DataError> {
        let mut reader = csv::Reader::from_path(path)
            .map_err(|e| DataError::Io(format!("{}: {e}", path.display())))?;

        let mut bars = Vec::new();
        let mut skipped = 0usize;
        for (line, row) in reader.deserialize::<CsvRow>().enumerate() {
            let row =
                row.map_err(|e| DataError::Parse(format!("{} row {}: {e}", path.display(), line + 1)))?;
            let time = parse_time(&row.time).ok_or_else(|| {
                DataError::Parse(format!(
                    "{} row {}: unrecognized time '{}'",
                    path.display(),
                    line + 1,
                    row.time
                ))
            })?;
            let bar = Bar {
                time,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
            };
            if bar.is_void() {
                skipped += 1;
                continue;
            }
            if !bar.is_consistent() {
                return Err(DataError::ValidationError(format!(
                    "{} row {}: high/low do not bracket open/close or volume is negative",
                    path.display(),
                    line + 1
                )));
            }
            bars.push(bar);
        }
        if skipped > 0 {
            warn!(file = %path.display(), skipped, "dropped rows with missing prices");
        }
        bars.sort_by_key(|b| b.time);
        Ok(bars)
    }
}

/// Parse unix seconds or one of the accepted datetime layouts.
pub(crate) fn parse_time(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<i64>() {
        return DateTime::from_timestamp(secs, 0).map(|dt| dt.naive_utc());
    }
    const LAYOUTS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y.%m.%d %H:%M",
    ];
    LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(raw, layout).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

impl DataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn bars(
        &self,
        instrument: &str,
        timeframe: Timeframe,
        range: &BarRange,
    ) -> Result<Vec<Bar>, DataError> {
        match self.file_for(instrument, timeframe) {
            Some(path) => Ok(range.select(&self.load(&path)?)),
            None => Ok(Vec::new()),
        }
    }

    fn symbol_meta(&self, instrument: &str) -> Result<Option<SymbolInfo>, DataError> {
        let path = self.dir.join("symbols.json");
        if !path.is_file() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path)
            .map_err(|e| DataError::Io(format!("{}: {e}", path.display())))?;
        let symbols: Vec<SymbolInfo> = serde_json::from_str(&raw)
            .map_err(|e| DataError::Parse(format!("{}: {e}", path.display())))?;
        Ok(symbols.into_iter().find(|s| s.symbol == instrument))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_data_dir() -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
        let dir = env::temp_dir().join(format!("featurelab_csv_{}_{id}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    const SAMPLE: &str = "time,open,high,low,close,tick_volume\n\
        2024-01-02 00:00:00,1.10,1.12,1.09,1.11,100\n\
        2024-01-02 01:00:00,1.11,1.13,1.10,1.12,120\n\
        1704164400,1.12,1.14,1.11,1.13,90\n";

    #[test]
    fn loads_mixed_time_formats() {
        let dir = temp_data_dir();
        fs::write(dir.join("EURUSD.csv"), SAMPLE).unwrap();
        let provider = CsvProvider::new(&dir);

        let range = BarRange::Count {
            count: 10,
            include_open_bar: true,
        };
        let bars = provider.bars("EURUSD", Timeframe::H1, &range).unwrap();
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[2].close, 1.13);
        assert_eq!(bars[2].time.to_string(), "2024-01-02 03:00:00");
        assert_eq!(bars[0].volume, 100.0);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn timeframe_specific_file_wins() {
        let dir = temp_data_dir();
        fs::write(dir.join("EURUSD.csv"), SAMPLE).unwrap();
        fs::write(
            dir.join("EURUSD_1d.csv"),
            "time,open,high,low,close,volume\n2024-01-02,1,2,0.5,1.5,10\n",
        )
        .unwrap();
        let provider = CsvProvider::new(&dir);
        let range = BarRange::Count {
            count: 10,
            include_open_bar: true,
        };
        let bars = provider.bars("EURUSD", Timeframe::D1, &range).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, 1.5);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn rows_without_prices_are_dropped() {
        let dir = temp_data_dir();
        fs::write(
            dir.join("EURUSD.csv"),
            "time,open,high,low,close,volume\n\
             2024-01-02 00:00,1,2,0.5,1.5,10\n\
             2024-01-02 01:00,NaN,NaN,NaN,NaN,0\n\
             2024-01-02 02:00,1.5,2,1,1.8,12\n",
        )
        .unwrap();
        let range = BarRange::Count {
            count: 10,
            include_open_bar: true,
        };
        let bars = CsvProvider::new(&dir).bars("EURUSD", Timeframe::H1, &range).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].close, 1.8);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_is_empty_not_error() {
        let dir = temp_data_dir();
        let provider = CsvProvider::new(&dir);
        let range = BarRange::Count {
            count: 10,
            include_open_bar: true,
        };
        assert!(provider.bars("NOPE", Timeframe::H1, &range).unwrap().is_empty());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn malformed_time_is_parse_error() {
        let dir = temp_data_dir();
        fs::write(
            dir.join("BAD.csv"),
            "time,open,high,low,close,volume\nyesterday,1,2,0.5,1.5,10\n",
        )
        .unwrap();
        let provider = CsvProvider::new(&dir);
        let range = BarRange::Count {
            count: 10,
            include_open_bar: true,
        };
        let err = provider.bars("BAD", Timeframe::H1, &range).unwrap_err();
        assert!(matches!(err, DataError::Parse(_)));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn inconsistent_row_is_validation_error() {
        let dir = temp_data_dir();
        fs::write(
            dir.join("EURUSD.csv"),
            "time,open,high,low,close,volume\n\
             2024-01-02 00:00,1,2,0.5,1.5,10\n\
             2024-01-02 01:00,1.5,1.2,1,1.8,12\n",
        )
        .unwrap();
        let range = BarRange::Count {
            count: 10,
            include_open_bar: true,
        };
        let err = CsvProvider::new(&dir).bars("EURUSD", Timeframe::H1, &range).unwrap_err();
        match err {
            DataError::ValidationError(msg) => assert!(msg.contains("row 2"), "{msg}"),
            other => panic!("expected validation error, got {other:?}"),
        }
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn symbol_meta_from_sidecar() {
        let dir = temp_data_dir();
        fs::write(
            dir.join("symbols.json"),
            r#"[{"symbol":"EURUSD","point":0.00001,"digits":5,"spread":12.0,
                "trade_mode":4,"trade_allowed":true,"volume_min":0.01,
                "volume_max":100.0,"volume_step":0.01}]"#,
        )
        .unwrap();
        let provider = CsvProvider::new(&dir);
        let info = provider.symbol_meta("EURUSD").unwrap().unwrap();
        assert_eq!(info.digits, 5);
        assert!(provider.symbol_meta("GBPUSD").unwrap().is_none());
        let _ = fs::remove_dir_all(&dir);
    }
}
