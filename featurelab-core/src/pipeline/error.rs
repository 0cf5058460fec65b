//! Fatal pipeline errors. Recoverable conditions are logged and skipped instead.

use thiserror::Error;

use super::denoise::DenoiseError;
use crate::backends::{BackendKind, IndicatorError};
use crate::data::DataError;
use crate::domain::UnknownTimeframe;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    UnsupportedTimeframe(#[from] UnknownTimeframe),

    #[error("instrument {instrument} has no data")]
    NoData { instrument: String },

    #[error("request needs either a bar count or a start date")]
    MissingRange,

    #[error("denoise failed: {0}")]
    Denoise(#[from] DenoiseError),

    #[error("{backend} indicator '{method}' failed: {source}")]
    Indicator {
        backend: BackendKind,
        method: String,
        #[source]
        source: IndicatorError,
    },

    #[error("data source failed: {0}")]
    Data(#[from] DataError),

    #[error("fetch cancelled before stage '{stage}'")]
    Cancelled { stage: String },

    #[error("invalid request: {0}")]
    Config(String),
}
