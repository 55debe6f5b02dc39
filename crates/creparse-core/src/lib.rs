//! Core library for commercial real estate document extraction.
//!
//! This crate provides:
//! - Document adapters (PDF, Word, spreadsheet) producing normalized text
//! - A declarative field schema with six record groups and 39 fillable slots
//! - Pattern-catalog extraction with per-field citation snippets
//! - Strategy coordination with model-first extraction and regex fallback
//! - Completeness and citation-coverage scoring

pub mod document;
pub mod error;
pub mod extract;
pub mod models;
pub mod schema;

pub use document::{DocumentAdapter, RawDocument, SourceFormat, parse_bytes, parse_file};
pub use error::{CreError, DocumentError, ExtractionError, ModelError, Result};
pub use extract::{
    CompletenessScorer, CoordinatedExtraction, ExtractionCoordinator, ModelStrategy,
    RegexExtractionStrategy, StrategyLabel,
};
pub use models::config::{CreConfig, ExtractionConfig, ModelConfig};
pub use models::record::{ExtractionRecord, FieldValue, Scalar};
