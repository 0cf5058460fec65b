//! Feature-table export: JSON records, CSV and Parquet.
//!
//! The Parquet path goes through a Polars DataFrame with `time` stored as a
//! millisecond datetime column; CSV is written row by row with the csv crate.

use super::provider::DataError;
use crate::domain::FeatureFrame;
use polars::prelude::*;
use std::fs;
use std::path::Path;

/// Output formats understood by [`write_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    Parquet,
}

impl std::str::FromStr for ExportFormat {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "parquet" => Ok(ExportFormat::Parquet),
            other => Err(DataError::Other(format!("unknown export format '{other}'"))),
        }
    }
}

/// Write `frame` to `path` in `format`.
pub fn write_frame(frame: &FeatureFrame, path: &Path, format: ExportFormat) -> Result<(), DataError> {
    match format {
        ExportFormat::Json => {
            let json = to_json(frame)?;
            fs::write(path, json).map_err(|e| DataError::Io(format!("{}: {e}", path.display())))
        }
        ExportFormat::Csv => {
            let csv = to_csv(frame)?;
            fs::write(path, csv).map_err(|e| DataError::Io(format!("{}: {e}", path.display())))
        }
        ExportFormat::Parquet => write_parquet(frame, path),
    }
}

/// Pretty JSON array of records.
pub fn to_json(frame: &FeatureFrame) -> Result<String, DataError> {
    serde_json::to_string_pretty(&frame.to_records())
        .map_err(|e| DataError::Other(format!("serialize records: {e}")))
}

/// CSV with a `time` column followed by every frame column. NaN is written empty.
pub fn to_csv(frame: &FeatureFrame) -> Result<String, DataError> {
    let csv_err = |e: csv::Error| DataError::Io(format!("csv: {e}"));
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec!["time".to_string()];
    header.extend(frame.column_names());
    wtr.write_record(&header).map_err(csv_err)?;

    let columns: Vec<&[f64]> = frame.columns().map(|(_, values)| values).collect();
    for (i, time) in frame.index().iter().enumerate() {
        let mut record = Vec::with_capacity(columns.len() + 1);
        record.push(time.format("%Y-%m-%d %H:%M:%S").to_string());
        for values in &columns {
            let v = values[i];
            record.push(if v.is_finite() { v.to_string() } else { String::new() });
        }
        wtr.write_record(&record).map_err(csv_err)?;
    }

    let data = wtr
        .into_inner()
        .map_err(|e| DataError::Io(format!("flush csv writer: {e}")))?;
    String::from_utf8(data).map_err(|e| DataError::Other(format!("csv output is not UTF-8: {e}")))
}

/// Convert a feature frame to a Polars DataFrame.
pub fn to_dataframe(frame: &FeatureFrame) -> Result<DataFrame, DataError> {
    let millis: Vec<i64> = frame
        .index()
        .iter()
        .map(|t| t.and_utc().timestamp_millis())
        .collect();

    let mut columns = Vec::with_capacity(frame.width() + 1);
    columns.push(
        Column::new("time".into(), millis)
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
            .map_err(|e| DataError::ParquetError(format!("time cast: {e}")))?,
    );
    for (name, values) in frame.columns() {
        columns.push(Column::new(name.into(), values));
    }

    DataFrame::new(columns).map_err(|e| DataError::ParquetError(format!("dataframe creation: {e}")))
}

/// Write a feature frame to a Parquet file.
pub fn write_parquet(frame: &FeatureFrame, path: &Path) -> Result<(), DataError> {
    let mut df = to_dataframe(frame)?;
    let file =
        fs::File::create(path).map_err(|e| DataError::ParquetError(format!("create file: {e}")))?;
    ParquetWriter::new(file)
        .finish(&mut df)
        .map_err(|e| DataError::ParquetError(format!("write parquet: {e}")))?;
    Ok(())
}
