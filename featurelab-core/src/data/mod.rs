//! Data sources and export.

pub mod csv_source;
pub mod export;
pub mod provider;
pub mod synthetic;

pub use csv_source::CsvProvider;
pub use export::{write_frame, ExportFormat};
pub use provider::{BarRange, DataError, DataProvider, InMemoryProvider, SymbolInfo};
pub use synthetic::SyntheticProvider;
