//! Spreadsheet (.xlsx) adapter using calamine.

use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use tracing::debug;

use super::{DocumentAdapter, RawDocument, Result, SourceFormat, TableBlock};
use crate::error::DocumentError;

/// Adapter for spreadsheet workbooks.
pub struct SheetAdapter;

fn decode_err(reason: impl ToString) -> DocumentError {
    DocumentError::Decode {
        format: "spreadsheet".to_string(),
        reason: reason.to_string(),
    }
}

impl DocumentAdapter for SheetAdapter {
    fn parse(&self, data: &[u8]) -> Result<RawDocument> {
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(data)).map_err(decode_err)?;
        let sheet_names = workbook.sheet_names().to_owned();
        if sheet_names.is_empty() {
            return Err(DocumentError::NoContent);
        }

        let mut full_text = String::new();
        let mut tables = Vec::new();

        for name in &sheet_names {
            let range = workbook.worksheet_range(name).map_err(decode_err)?;

            full_text.push_str(&format!("\n--- SHEET: {name} ---\n"));

            let mut rows = Vec::new();
            for row in range.rows() {
                let cells: Vec<String> = row
                    .iter()
                    .map(|cell| match cell {
                        Data::Empty => String::new(),
                        other => other.to_string().trim().to_string(),
                    })
                    .collect();

                // Join label/value rows with ": " so the line-anchored
                // catalog patterns match tabular data too.
                let line = cells
                    .iter()
                    .filter(|c| !c.is_empty())
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(": ");
                if !line.is_empty() {
                    full_text.push_str(&line);
                    full_text.push('\n');
                }
                rows.push(cells);
            }

            tables.push(TableBlock {
                label: name.clone(),
                rows,
            });
        }

        debug!(
            sheets = sheet_names.len(),
            chars = full_text.len(),
            "decoded spreadsheet"
        );

        Ok(RawDocument {
            format: SourceFormat::Spreadsheet,
            full_text,
            tables,
            page_count: sheet_names.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_bytes_fail_with_decode_error() {
        let err = SheetAdapter.parse(b"not a workbook").unwrap_err();
        assert!(matches!(err, DocumentError::Decode { .. }));
    }
}
