//! Field extraction engines and scoring.
//!
//! Two engines produce the same record shape: [`RegexExtractionStrategy`]
//! matches a static pattern catalog against normalized text, and any
//! [`ModelStrategy`] implementation (see the companion service crate) does
//! structured generation. [`ExtractionCoordinator`] picks between them per
//! the runtime configuration and [`CompletenessScorer`] annotates whatever
//! comes out.

pub mod catalog;
pub mod citation;
pub mod coordinator;
pub mod regex_strategy;
pub mod scorer;

pub use catalog::PatternCatalog;
pub use citation::{CITATION_WINDOW, citation_window};
pub use coordinator::{
    CoordinatedExtraction, ExtractionCoordinator, ModelStrategy, StrategyLabel,
};
pub use regex_strategy::RegexExtractionStrategy;
pub use scorer::CompletenessScorer;
