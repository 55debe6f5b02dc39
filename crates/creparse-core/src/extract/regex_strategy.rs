//! Deterministic pattern-based extraction over normalized document text.
//!
//! This strategy is infallible: it always returns a record, leaving slots
//! null when nothing matches. Numeric coercion failures downgrade to text
//! rather than dropping the match, so a citation is never lost to a
//! formatting quirk.

use tracing::debug;

use crate::extract::catalog::{CatalogEntry, PatternCatalog};
use crate::extract::citation::citation_window;
use crate::models::record::{ExtractionRecord, FieldValue, Scalar};
use crate::schema::{FieldKind, ValueType};

/// Regex-driven extraction strategy backed by the standard catalog.
#[derive(Debug)]
pub struct RegexExtractionStrategy {
    catalog: &'static PatternCatalog,
}

impl Default for RegexExtractionStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl RegexExtractionStrategy {
    pub fn new() -> Self {
        Self {
            catalog: PatternCatalog::standard(),
        }
    }

    /// Run every catalog rule against `text` and assemble a record.
    pub fn extract(&self, text: &str) -> ExtractionRecord {
        let mut record = ExtractionRecord::empty();
        if text.trim().is_empty() {
            return record;
        }
        let mut hits = 0usize;
        for entry in self.catalog.entries() {
            match entry.def.kind {
                FieldKind::Scalar => {
                    if self.fill_leaf(&mut record, entry, text) {
                        hits += 1;
                    }
                }
                FieldKind::List { max, .. } => {
                    if self.fill_list(&mut record, entry, text, max) {
                        hits += 1;
                    }
                }
            }
        }
        debug!(fields_matched = hits, "pattern extraction complete");
        record
    }

    fn fill_leaf(&self, record: &mut ExtractionRecord, entry: &CatalogEntry, text: &str) -> bool {
        for rule in &entry.rules {
            let Some(caps) = rule.regex.captures(text) else {
                continue;
            };
            let Some(value) = caps.get(rule.group) else {
                continue;
            };
            let raw = value.as_str().trim();
            if raw.is_empty() {
                continue;
            }
            let whole = match caps.get(0) {
                Some(m) => m,
                None => value,
            };
            let citation = citation_window(text, whole.start(), whole.end());
            record.set_leaf(
                entry.def,
                FieldValue::cited(coerce(raw, entry.def.value_type), citation),
            );
            return true;
        }
        false
    }

    fn fill_list(
        &self,
        record: &mut ExtractionRecord,
        entry: &CatalogEntry,
        text: &str,
        max: usize,
    ) -> bool {
        for rule in &entry.rules {
            let mut pushed = 0usize;
            for caps in rule.regex.captures_iter(text) {
                if pushed == max {
                    break;
                }
                let Some(value) = caps.get(rule.group) else {
                    continue;
                };
                let raw = value.as_str().trim();
                if raw.is_empty() {
                    continue;
                }
                let whole = match caps.get(0) {
                    Some(m) => m,
                    None => value,
                };
                let citation = citation_window(text, whole.start(), whole.end());
                record.push_list_item(
                    entry.def,
                    coerce(raw, entry.def.value_type),
                    citation.to_string(),
                );
                pushed += 1;
            }
            if pushed > 0 {
                return true;
            }
        }
        false
    }
}

/// Coerce a raw capture to the field's declared type. Currency symbols,
/// thousands separators, and percent signs are stripped before parsing;
/// anything unparseable is kept verbatim as text.
fn coerce(raw: &str, value_type: ValueType) -> Scalar {
    match value_type {
        ValueType::Text => Scalar::Text(raw.to_string()),
        ValueType::Integer => {
            let cleaned = clean_numeric(raw);
            match cleaned.parse::<i64>() {
                Ok(n) => Scalar::Int(n),
                Err(_) => Scalar::Text(raw.to_string()),
            }
        }
        ValueType::Number => {
            let cleaned = clean_numeric(raw);
            if cleaned.contains('.') {
                match cleaned.parse::<f64>() {
                    Ok(n) => Scalar::Float(n),
                    Err(_) => Scalar::Text(raw.to_string()),
                }
            } else {
                match cleaned.parse::<i64>() {
                    Ok(n) => Scalar::Int(n),
                    Err(_) => Scalar::Text(raw.to_string()),
                }
            }
        }
    }
}

fn clean_numeric(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '$' | ',' | '%') && !c.is_whitespace())
        .collect()
}
