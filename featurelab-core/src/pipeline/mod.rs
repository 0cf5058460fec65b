//! The enrichment pipeline.
//!
//! A fetch turns a bar series and a [`FetchRequest`] into a wide feature
//! table. Every stage takes the working [`FeatureFrame`](crate::domain::FeatureFrame)
//! by value and returns it, so ownership of the frame moves through the stage
//! sequence in [`orchestrator`]. Naming collisions between indicator outputs
//! are resolved by one [`ColumnRegistry`] per fetch.

pub mod align;
pub mod cancel;
pub mod denoise;
pub mod dispatch;
pub mod error;
pub mod features;
pub mod orchestrator;
pub mod pivots;
pub mod registry;
pub mod request;
pub mod support_resistance;

pub use align::{align_frames, fetch_aligned};
pub use cancel::CancelToken;
pub use denoise::{denoise, CustomDenoiser, DenoiseError, DenoiseMethod, DenoiseSpec};
pub use dispatch::{apply_indicators, PriceField};
pub use error::PipelineError;
pub use features::{LookbackSpec, MaSpec};
pub use orchestrator::{fetch, fetch_single};
pub use pivots::{add_pivot_levels, PivotConfig};
pub use registry::ColumnRegistry;
pub use request::{FetchRequest, IndicatorGroups, Instruments, RequestId};
pub use support_resistance::{add_support_resistance, SupportResistanceSpec};
