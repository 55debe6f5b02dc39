//! Error types for the creparse-core library.

use thiserror::Error;

/// Main error type for the creparse library.
#[derive(Error, Debug)]
pub enum CreError {
    /// Document decoding error.
    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    /// Field extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Model strategy error.
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised while turning an uploaded file into a [`RawDocument`].
///
/// [`RawDocument`]: crate::document::RawDocument
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The file extension does not map to a supported format.
    /// Fatal for the document; no extraction is attempted.
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// The adapter could not read the document.
    #[error("failed to decode {format} document: {reason}")]
    Decode { format: String, reason: String },

    /// The document decoded but produced no pages or sheets.
    #[error("document has no readable content")]
    NoContent,
}

/// Errors specific to the model-based extraction strategy.
///
/// Service and parse failures are distinct kinds and both propagate to the
/// coordinator, which owns the fallback policy.
#[derive(Error, Debug, Clone)]
pub enum ModelError {
    /// No credentials configured; the strategy is unavailable.
    #[error("model strategy not configured")]
    NotConfigured,

    /// Transport or service-side failure.
    #[error("model service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The service responded but the payload did not match the schema.
    #[error("malformed model response: {0}")]
    MalformedResponse(String),
}

/// Errors raised by the extraction coordinator.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The model strategy failed and fallback is disabled.
    #[error("model strategy failed and fallback is disabled: {source}")]
    FallbackDisabled {
        #[source]
        source: ModelError,
    },
}

/// Result type for the creparse library.
pub type Result<T> = std::result::Result<T, CreError>;
