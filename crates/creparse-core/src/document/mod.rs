//! Document adapters: one per supported format, behind a single trait.
//!
//! Adapters are opaque producers of `(full_text, tables)` — everything
//! downstream (catalog matching, citations, scoring) works on the
//! normalized [`RawDocument`] alone.

mod pdf;
mod sheet;
mod word;

pub use pdf::PdfAdapter;
pub use sheet::SheetAdapter;
pub use word::WordAdapter;

use std::path::Path;

use crate::error::DocumentError;

/// Result type for document operations.
pub type Result<T> = std::result::Result<T, DocumentError>;

/// Supported source formats, keyed by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    Pdf,
    Word,
    Spreadsheet,
}

impl SourceFormat {
    /// Map a file extension to a format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(SourceFormat::Pdf),
            "docx" => Some(SourceFormat::Word),
            "xlsx" => Some(SourceFormat::Spreadsheet),
            _ => None,
        }
    }

    /// Determine the format from a file path, or fail as unsupported.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        Self::from_extension(ext)
            .ok_or_else(|| DocumentError::UnsupportedFormat(path.display().to_string()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            SourceFormat::Pdf => "pdf",
            SourceFormat::Word => "word",
            SourceFormat::Spreadsheet => "spreadsheet",
        }
    }
}

/// A table extracted from a document, with its page or sheet label.
#[derive(Debug, Clone, PartialEq)]
pub struct TableBlock {
    pub label: String,
    pub rows: Vec<Vec<String>>,
}

/// The normalized output of a document adapter.
///
/// Produced once per upload and immutable thereafter.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub format: SourceFormat,
    /// The full text stream the pattern catalog runs against.
    pub full_text: String,
    /// Structured tables, when the format exposes them.
    pub tables: Vec<TableBlock>,
    /// Page count for PDF/Word, sheet count for spreadsheets.
    pub page_count: usize,
}

/// Converts a file's bytes into a [`RawDocument`].
pub trait DocumentAdapter {
    fn parse(&self, data: &[u8]) -> Result<RawDocument>;
}

/// The adapter for a given format.
pub fn adapter_for(format: SourceFormat) -> Box<dyn DocumentAdapter> {
    match format {
        SourceFormat::Pdf => Box::new(PdfAdapter),
        SourceFormat::Word => Box::new(WordAdapter),
        SourceFormat::Spreadsheet => Box::new(SheetAdapter),
    }
}

/// Decode in-memory bytes of a known format.
pub fn parse_bytes(data: &[u8], format: SourceFormat) -> Result<RawDocument> {
    adapter_for(format).parse(data)
}

/// Read a file, pick the adapter from its extension, and decode it.
pub fn parse_file(path: &Path) -> Result<RawDocument> {
    let format = SourceFormat::from_path(path)?;
    let data = std::fs::read(path).map_err(|e| DocumentError::Decode {
        format: format.name().to_string(),
        reason: e.to_string(),
    })?;
    parse_bytes(&data, format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(SourceFormat::from_extension("PDF"), Some(SourceFormat::Pdf));
        assert_eq!(SourceFormat::from_extension("docx"), Some(SourceFormat::Word));
        assert_eq!(
            SourceFormat::from_extension("xlsx"),
            Some(SourceFormat::Spreadsheet)
        );
        assert_eq!(SourceFormat::from_extension("txt"), None);
    }

    #[test]
    fn test_unsupported_path_is_fatal() {
        let err = SourceFormat::from_path(Path::new("deal_memo.txt")).unwrap_err();
        assert!(matches!(err, DocumentError::UnsupportedFormat(_)));
    }
}
