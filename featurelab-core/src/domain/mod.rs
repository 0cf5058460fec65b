//! Domain types for the enrichment pipeline.

pub mod bar;
pub mod frame;
pub mod series;
pub mod timeframe;

pub use bar::Bar;
pub use frame::{FeatureFrame, BASE_COLUMNS};
pub use timeframe::{Timeframe, UnknownTimeframe};
