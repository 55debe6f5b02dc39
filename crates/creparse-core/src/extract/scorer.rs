//! Completeness and citation scoring over a finished record.

use crate::models::record::{ExtractionMetadata, ExtractionRecord};
use crate::schema::{self, FieldNode};

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Fills in [`ExtractionMetadata`] from the record's slot states.
///
/// A scalar slot counts as filled when its value is non-null, and as cited
/// when it also carries `source_text`. Each filled list entry counts as
/// one filled unit and each cited entry as one cited unit, so entry-rich
/// lists raise the score; the confidence percentage is clamped to 100.
#[derive(Debug, Default)]
pub struct CompletenessScorer;

impl CompletenessScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, mut record: ExtractionRecord) -> ExtractionRecord {
        let total = schema::total_fillable();
        let mut filled = 0usize;
        let mut cited = 0usize;
        let mut missing = Vec::new();

        for (def, node) in record.fields() {
            match node {
                FieldNode::Leaf(value) => {
                    if value.is_filled() {
                        filled += 1;
                        if value.is_cited() {
                            cited += 1;
                        }
                    } else {
                        missing.push(def.path());
                    }
                }
                FieldNode::List(entries) => {
                    let filled_entries = entries.iter().filter(|e| e.filled).count();
                    if filled_entries == 0 {
                        missing.push(def.path());
                    } else {
                        filled += filled_entries;
                        cited += entries.iter().filter(|e| e.cited).count();
                    }
                }
            }
        }

        let confidence = round2((filled as f64 / total as f64 * 100.0).min(100.0));
        let coverage = if filled == 0 {
            0.0
        } else {
            round2(cited as f64 / filled as f64 * 100.0)
        };

        record.extraction_metadata = ExtractionMetadata {
            confidence_score: confidence,
            missing_fields: missing,
            fields_with_citations: cited as u32,
            fields_without_citations: (filled - cited) as u32,
            citation_coverage_percent: coverage,
        };
        record
    }
}
