//! FeatureLab Core: bar frames, indicator backends, denoising, pivots and the
//! enrichment pipeline.
//!
//! This crate turns a raw OHLCV series into a wide feature table:
//! - Domain types (bars, timeframes, the feature frame)
//! - Data-source port with CSV, in-memory and synthetic adapters
//! - Slice-based indicator kernels
//! - Interchangeable indicator backends behind one trait
//! - The fixed-order enrichment pipeline and multi-instrument alignment
//!
//! The denoising backends are cargo features (`wavelet`, `kalman`, `ssa`,
//! `emd`), all enabled by default. Building without one turns a request for it
//! into `DenoiseError::BackendUnavailable`. To run the tests for that path:
//!
//! ```text
//! cargo test -p featurelab-core --no-default-features --features wavelet,kalman,emd
//! ```

pub mod backends;
pub mod data;
pub mod domain;
pub mod indicators;
pub mod pipeline;

pub use pipeline::{fetch, CancelToken, FetchRequest, PipelineError};
