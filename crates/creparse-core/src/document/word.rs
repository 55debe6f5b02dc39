//! Word (.docx) adapter using docx-rs.

use docx_rs::{
    DocumentChild, Paragraph, ParagraphChild, RunChild, Table, TableCellContent, TableChild,
    TableRowChild, read_docx,
};
use tracing::debug;

use super::{DocumentAdapter, RawDocument, Result, SourceFormat, TableBlock};
use crate::error::DocumentError;

/// Adapter for Word documents.
pub struct WordAdapter;

fn paragraph_text(para: &Paragraph) -> String {
    para.children
        .iter()
        .filter_map(|child| match child {
            ParagraphChild::Run(run) => Some(
                run.children
                    .iter()
                    .filter_map(|rc| match rc {
                        RunChild::Text(t) => Some(t.text.as_str()),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
                    .join(""),
            ),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("")
}

fn table_rows(table: &Table) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    for child in &table.rows {
        let TableChild::TableRow(row) = child;
        let mut cells = Vec::new();
        for cell_child in &row.cells {
            let TableRowChild::TableCell(cell) = cell_child;
            let text = cell
                .children
                .iter()
                .filter_map(|content| match content {
                    TableCellContent::Paragraph(p) => Some(paragraph_text(p)),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join(" ");
            cells.push(text.trim().to_string());
        }
        rows.push(cells);
    }
    rows
}

impl DocumentAdapter for WordAdapter {
    fn parse(&self, data: &[u8]) -> Result<RawDocument> {
        let docx = read_docx(data).map_err(|e| DocumentError::Decode {
            format: "word".to_string(),
            reason: e.to_string(),
        })?;

        let mut full_text = String::new();
        let mut tables = Vec::new();

        for child in &docx.document.children {
            match child {
                DocumentChild::Paragraph(para) => {
                    let text = paragraph_text(para);
                    if !text.trim().is_empty() {
                        full_text.push_str(text.trim());
                        full_text.push('\n');
                    }
                }
                DocumentChild::Table(table) => {
                    let rows = table_rows(table);
                    // Mirror tabular label/value pairs into the text stream
                    // so the labeled-field catalog can see them.
                    for row in &rows {
                        let line = row
                            .iter()
                            .filter(|c| !c.is_empty())
                            .cloned()
                            .collect::<Vec<_>>()
                            .join(": ");
                        if !line.is_empty() {
                            full_text.push_str(&line);
                            full_text.push('\n');
                        }
                    }
                    tables.push(TableBlock {
                        label: format!("table {}", tables.len() + 1),
                        rows,
                    });
                }
                _ => {}
            }
        }

        if full_text.trim().is_empty() && tables.is_empty() {
            return Err(DocumentError::NoContent);
        }

        debug!(chars = full_text.len(), tables = tables.len(), "decoded Word document");

        Ok(RawDocument {
            format: SourceFormat::Word,
            full_text,
            tables,
            page_count: 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_bytes_fail_with_decode_error() {
        let err = WordAdapter.parse(b"not a docx").unwrap_err();
        assert!(matches!(err, DocumentError::Decode { .. }));
    }
}
