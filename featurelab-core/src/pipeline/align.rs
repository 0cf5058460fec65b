//! Multi-instrument alignment.
//!
//! Each instrument runs through the single-instrument pipeline on its own
//! (in parallel), then the frames are prefixed with `"<instrument>-"` and
//! left-joined onto one uniform grid spanning all of them.

use rayon::prelude::*;
use tracing::info;

use super::features::add_meta_dates;
use super::orchestrator::fetch_single;
use super::request::FetchRequest;
use super::{CancelToken, PipelineError};
use crate::data::DataProvider;
use crate::domain::{FeatureFrame, Timeframe};

/// Fetch every instrument of `request` and merge the results.
///
/// Sub-fetches may finish in any order; the merge always follows the order of
/// the instrument list.
pub fn fetch_aligned(
    provider: &dyn DataProvider,
    request: &FetchRequest,
    cancel: &CancelToken,
) -> Result<FeatureFrame, PipelineError> {
    request.validate()?;
    let timeframe = request.timeframe()?;
    let instruments = request.instruments.as_list();

    let frames = instruments
        .par_iter()
        .map(|&instrument| {
            cancel.check(&format!("instrument {instrument}"))?;
            let sub = request.for_instrument(instrument);
            fetch_single(provider, &sub, instrument, cancel).map(|frame| (instrument.to_string(), frame))
        })
        .collect::<Result<Vec<_>, PipelineError>>()?;

    cancel.check("align")?;
    let merged = align_frames(frames, timeframe, request.meta_dates, request.year).ok_or_else(|| {
        PipelineError::NoData {
            instrument: instruments.join(","),
        }
    })?;

    if !request.quiet {
        info!(
            instruments = %instruments.join(","),
            timeframe = %timeframe,
            rows = merged.len(),
            columns = merged.width(),
            begins = %merged.first_time().map(|t| t.to_string()).unwrap_or_default(),
            ends = %merged.last_time().map(|t| t.to_string()).unwrap_or_default(),
            "multi-instrument fetch complete"
        );
    }
    Ok(merged)
}

/// Merge per-instrument frames onto the grid from the earliest start to the
/// latest end.
///
/// `-volume` gaps become zero and every other gap is back-filled; calendar
/// columns are taken from the grid itself. Rows that still hold a missing or
/// infinite value are dropped. Returns `None` when every frame is empty.
/// Instrument names are expected to be distinct.
pub fn align_frames(
    frames: Vec<(String, FeatureFrame)>,
    timeframe: Timeframe,
    meta_dates: bool,
    year: bool,
) -> Option<FeatureFrame> {
    let start = frames.iter().filter_map(|(_, f)| f.first_time()).min()?;
    let end = frames.iter().filter_map(|(_, f)| f.last_time()).max()?;
    let grid = timeframe.grid(start, end);

    let mut merged = FeatureFrame::new(grid.clone());
    for (instrument, mut frame) in frames {
        frame.prefix_columns(&format!("{instrument}-"));
        let appended = merged.append_columns(frame.reindex(&grid));
        debug_assert!(appended, "reindexed frame is on the merge grid");
    }

    merged.fill_where(|name| name.ends_with("-volume"), 0.0);
    merged.backward_fill();

    if meta_dates {
        merged = add_meta_dates(merged, timeframe, year);
    }

    merged.replace_infinite();
    merged.drop_incomplete_rows();
    Some(merged)
}
