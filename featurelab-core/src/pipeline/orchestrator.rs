//! Fixed stage sequence of a single-instrument fetch, and the entry point that
//! routes multi-instrument requests to the aligner.

use tracing::{debug, info};

use super::align::fetch_aligned;
use super::denoise::denoise;
use super::dispatch::apply_indicators;
use super::features::{
    add_candle_patterns, add_gap, add_lookbacks, add_ma_percentages, add_meta_dates,
    add_price_summaries, drop_columns, fill_empty_ranges,
};
use super::pivots::add_pivot_levels;
use super::request::{FetchRequest, Instruments};
use super::support_resistance::add_support_resistance;
use super::{CancelToken, ColumnRegistry, PipelineError};
use crate::backends::BackendKind;
use crate::data::DataProvider;
use crate::domain::FeatureFrame;

/// Run `request` against `provider`.
///
/// A single instrument goes through the stage sequence directly; a list of
/// instruments is fetched per instrument and aligned on a common grid.
pub fn fetch(
    provider: &dyn DataProvider,
    request: &FetchRequest,
    cancel: &CancelToken,
) -> Result<FeatureFrame, PipelineError> {
    match &request.instruments {
        Instruments::One(instrument) => fetch_single(provider, request, instrument, cancel),
        Instruments::Many(_) => fetch_aligned(provider, request, cancel),
    }
}

/// The single-instrument pipeline.
pub fn fetch_single(
    provider: &dyn DataProvider,
    request: &FetchRequest,
    instrument: &str,
    cancel: &CancelToken,
) -> Result<FeatureFrame, PipelineError> {
    let timeframe = request.timeframe()?;
    let range = request.range()?;

    cancel.check("fetch")?;
    let bars = provider.bars(instrument, timeframe, &range)?;
    if bars.is_empty() {
        return Err(PipelineError::NoData {
            instrument: instrument.to_string(),
        });
    }
    let mut frame = FeatureFrame::from_bars(&bars);
    trace_stage("fetch", &frame);

    if request.gap {
        cancel.check("gap")?;
        frame = add_gap(frame);
    }

    if request.fill_empty_ranges {
        cancel.check("fill_empty_ranges")?;
        frame = fill_empty_ranges(frame, timeframe);
        trace_stage("fill_empty_ranges", &frame);
    }

    if request.pivot_levels > 0 {
        cancel.check("pivots")?;
        frame = add_pivot_levels(frame, &request.pivot_config());
        trace_stage("pivots", &frame);
    }

    if let Some(spec) = &request.denoise {
        cancel.check("denoise")?;
        frame = denoise(frame, spec)?;
        trace_stage("denoise", &frame);
    }

    if request.price_summaries {
        cancel.check("price_summaries")?;
        frame = add_price_summaries(frame);
    }

    if !request.support_resistance.windows.is_empty() {
        cancel.check("support_resistance")?;
        frame = add_support_resistance(frame, &request.support_resistance);
        trace_stage("support_resistance", &frame);
    }

    if request.meta_dates {
        cancel.check("meta_dates")?;
        frame = add_meta_dates(frame, timeframe, request.year);
    }

    let mut registry = ColumnRegistry::new();
    for kind in BackendKind::ALL {
        let specs = request.indicators.for_backend(kind);
        if !specs.is_empty() {
            frame = apply_indicators(kind.backend(), specs, frame, &mut registry, cancel)?;
        }
    }
    for kind in BackendKind::ALL {
        if request.all_indicators.contains(&kind) {
            let backend = kind.backend();
            frame = apply_indicators(backend, &backend.default_suite(), frame, &mut registry, cancel)?;
        }
    }
    trace_stage("indicators", &frame);

    if request.candle_patterns {
        cancel.check("candle_patterns")?;
        frame = add_candle_patterns(frame)?;
    }

    if !request.mas.is_empty() {
        cancel.check("moving_averages")?;
        frame = add_ma_percentages(frame, &request.mas);
    }

    if !request.lookbacks.is_empty() {
        cancel.check("lookbacks")?;
        frame = add_lookbacks(frame, &request.lookbacks);
    }

    if request.drop_na {
        cancel.check("drop_na")?;
        frame.replace_infinite();
        frame.drop_incomplete_rows();
        trace_stage("drop_na", &frame);
    }

    if !request.drop_columns.is_empty() {
        frame = drop_columns(frame, &request.drop_columns);
    }

    let last_bar = if request.provide_open_bar { "open" } else { "closed" };
    let begins = frame.first_time().map(|t| t.to_string()).unwrap_or_default();
    let ends = frame.last_time().map(|t| t.to_string()).unwrap_or_default();
    if request.quiet {
        debug!(instrument, timeframe = %timeframe, rows = frame.len(), %begins, %ends, last_bar, "fetch complete");
    } else {
        info!(
            instrument,
            timeframe = %timeframe,
            rows = frame.len(),
            columns = frame.width(),
            %begins,
            %ends,
            last_bar,
            request = %request.fingerprint(),
            "fetch complete"
        );
    }
    Ok(frame)
}

fn trace_stage(stage: &str, frame: &FeatureFrame) {
    debug!(stage, rows = frame.len(), columns = frame.width(), "stage done");
}
