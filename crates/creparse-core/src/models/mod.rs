//! Data models: the extraction record aggregate and pipeline configuration.

pub mod config;
pub mod record;

pub use config::CreConfig;
pub use record::{ExtractionMetadata, ExtractionRecord, FieldValue, Scalar};
