//! PDF adapter using lopdf for structure and pdf-extract for text.

use tracing::debug;

use super::{DocumentAdapter, RawDocument, Result, SourceFormat};
use crate::error::DocumentError;

/// Adapter for PDF documents.
pub struct PdfAdapter;

impl PdfAdapter {
    fn decode_err(reason: impl ToString) -> DocumentError {
        DocumentError::Decode {
            format: "pdf".to_string(),
            reason: reason.to_string(),
        }
    }
}

impl DocumentAdapter for PdfAdapter {
    fn parse(&self, data: &[u8]) -> Result<RawDocument> {
        let doc = lopdf::Document::load_mem(data).map_err(Self::decode_err)?;
        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(DocumentError::NoContent);
        }

        let text = pdf_extract::extract_text_from_mem(data).map_err(Self::decode_err)?;

        // pdf-extract separates pages with form feeds; rewrite those into
        // explicit markers so citations stay readable.
        let mut full_text = String::new();
        for (idx, page_text) in text.split('\x0C').enumerate() {
            let page_text = page_text.trim();
            if page_text.is_empty() {
                continue;
            }
            full_text.push_str(&format!("\n--- PAGE {} ---\n", idx + 1));
            full_text.push_str(page_text);
            full_text.push('\n');
        }

        debug!(pages = page_count, chars = full_text.len(), "decoded PDF");

        Ok(RawDocument {
            format: SourceFormat::Pdf,
            full_text,
            tables: Vec::new(),
            page_count,
        })
    }
}
