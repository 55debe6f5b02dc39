//! Extraction record models shared by both extraction strategies.
//!
//! The record shape (field names, grouping, multiplicities) is the single
//! source of truth for the regex catalog, the model wire schema, and the
//! completeness scorer. See [`crate::schema`] for the declarative field list.

use serde::{Deserialize, Serialize};

/// A leaf value extracted from a document: string, number, or absent.
///
/// Serializes as a bare JSON number or string. Integer-typed fields keep
/// their integer representation so `year_built` round-trips as `2015`,
/// not `2015.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    /// Numeric view of the scalar, if it holds a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            Scalar::Text(_) => None,
        }
    }

    /// Textual view, rendering numbers with their natural formatting.
    pub fn to_text(&self) -> String {
        match self {
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Text(s) => s.clone(),
        }
    }
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// A single extracted field with optional unit and provenance.
///
/// Invariant: `source_text` is `Some` only when `value` is `Some`. A field
/// absent from the document has both set to `None`. `unit` is informational
/// and never required for completeness.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldValue {
    pub value: Option<Scalar>,
    pub unit: Option<String>,
    pub source_text: Option<String>,
}

impl FieldValue {
    /// A field with a value and its citation snippet.
    pub fn cited(value: Scalar, source_text: impl Into<String>) -> Self {
        Self {
            value: Some(value),
            unit: None,
            source_text: Some(source_text.into()),
        }
    }

    /// Whether the field holds a value.
    pub fn is_filled(&self) -> bool {
        self.value.is_some()
    }

    /// Whether the field holds a value backed by a citation snippet.
    pub fn is_cited(&self) -> bool {
        self.is_filled() && self.source_text.is_some()
    }
}

/// Common behavior of bounded-list entries.
///
/// An entry is *filled* when its label key holds a value, and *cited* when
/// it additionally carries a `source_text` snippet.
pub trait ListEntry {
    fn is_filled(&self) -> bool;
    fn source_text(&self) -> Option<&str>;

    fn is_cited(&self) -> bool {
        self.is_filled() && self.source_text().is_some()
    }
}

macro_rules! labeled_entry {
    ($(#[$doc:meta])* $name:ident, $label:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        #[serde(default)]
        pub struct $name {
            pub $label: Option<String>,
            pub source_text: Option<String>,
        }

        impl $name {
            pub fn cited($label: impl Into<String>, source_text: impl Into<String>) -> Self {
                Self {
                    $label: Some($label.into()),
                    source_text: Some(source_text.into()),
                }
            }
        }

        impl ListEntry for $name {
            fn is_filled(&self) -> bool {
                self.$label.is_some()
            }

            fn source_text(&self) -> Option<&str> {
                self.source_text.as_deref()
            }
        }
    };
}

labeled_entry!(
    /// A major or anchor tenant.
    TenantEntry, name
);
labeled_entry!(
    /// A comparable property referenced by the document.
    ComparableEntry, property
);
labeled_entry!(
    /// A market trend statement.
    TrendEntry, trend
);
labeled_entry!(
    /// An identified risk factor.
    RiskEntry, risk
);
labeled_entry!(
    /// A risk mitigation strategy.
    MitigationEntry, strategy
);

/// An expected rent figure, optionally labeled with the rent type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RentEntry {
    #[serde(rename = "type")]
    pub rent_type: Option<String>,
    pub value: Option<Scalar>,
    pub unit: Option<String>,
    pub source_text: Option<String>,
}

impl ListEntry for RentEntry {
    fn is_filled(&self) -> bool {
        self.value.is_some() || self.rent_type.is_some()
    }

    fn source_text(&self) -> Option<&str> {
        self.source_text.as_deref()
    }
}

/// Core property information.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyDetails {
    pub property_address: FieldValue,
    pub property_type: FieldValue,
    pub square_footage: FieldValue,
    pub acres: FieldValue,
    pub land_square_feet: FieldValue,
    pub gross_building_area: FieldValue,
    pub net_rentable_area: FieldValue,
    pub year_built: FieldValue,
    pub units: FieldValue,
    pub occupancy_rate: FieldValue,
}

/// Key financial metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancialMetrics {
    pub noi_annual: FieldValue,
    pub stabilized_noi: FieldValue,
    pub cap_rate: FieldValue,
    pub purchase_price: FieldValue,
    pub appraised_value: FieldValue,
    pub annual_gross_income: FieldValue,
    pub operating_expenses: FieldValue,
    pub debt_service: FieldValue,
    pub dscr: FieldValue,
    pub irr: FieldValue,
    pub project_cost: FieldValue,
    pub expected_exit_valuation: FieldValue,
    pub expected_rents: Vec<RentEntry>,
}

/// Financing terms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoanDetails {
    pub loan_amount: FieldValue,
    pub interest_rate: FieldValue,
    pub loan_term_years: FieldValue,
    pub loan_type: FieldValue,
    pub lender: FieldValue,
    pub maturity_date: FieldValue,
    pub ltv: FieldValue,
}

/// Tenant and lease information.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TenantInformation {
    pub major_tenants: Vec<TenantEntry>,
    pub lease_terms: FieldValue,
    pub tenant_quality: FieldValue,
}

/// Market-related narrative fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketAnalysis {
    pub market: FieldValue,
    pub submarket: FieldValue,
    pub comparable_properties: Vec<ComparableEntry>,
    pub market_trends: Vec<TrendEntry>,
}

/// Risk factors and mitigations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskAssessment {
    pub identified_risks: Vec<RiskEntry>,
    pub mitigation_strategies: Vec<MitigationEntry>,
}

/// Completeness and citation statistics, recomputed on every extraction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionMetadata {
    /// Percentage of schema-defined fillable fields with a non-null value.
    pub confidence_score: f64,

    /// Dotted paths of null leaves and empty lists, in schema order.
    pub missing_fields: Vec<String>,

    /// Count of filled fields that carry a citation.
    pub fields_with_citations: u32,

    /// Count of filled fields without a citation.
    pub fields_without_citations: u32,

    /// Percentage of filled fields with citations (0 when nothing filled).
    pub citation_coverage_percent: f64,
}

/// The root extraction aggregate: six fixed groups plus derived metadata.
///
/// Built once per (document, strategy) pair; immutable after the scorer
/// annotates it. Re-extraction replaces the record wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionRecord {
    pub property_details: PropertyDetails,
    pub financial_metrics: FinancialMetrics,
    pub loan_details: LoanDetails,
    pub tenant_information: TenantInformation,
    pub market_analysis: MarketAnalysis,
    pub risk_assessment: RiskAssessment,
    pub extraction_metadata: ExtractionMetadata,
}

impl ExtractionRecord {
    /// The canonical all-null record of the exact schema shape.
    pub fn empty() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_serialization() {
        assert_eq!(serde_json::to_string(&Scalar::Int(2015)).unwrap(), "2015");
        assert_eq!(serde_json::to_string(&Scalar::Float(6.5)).unwrap(), "6.5");
        assert_eq!(
            serde_json::to_string(&Scalar::Text("A+ Credit".into())).unwrap(),
            "\"A+ Credit\""
        );
    }

    #[test]
    fn test_scalar_deserialization_prefers_int() {
        let v: Scalar = serde_json::from_str("2500000").unwrap();
        assert_eq!(v, Scalar::Int(2_500_000));
        let v: Scalar = serde_json::from_str("6.5").unwrap();
        assert_eq!(v, Scalar::Float(6.5));
    }

    #[test]
    fn test_empty_record_serializes_nulls() {
        let json = serde_json::to_value(ExtractionRecord::empty()).unwrap();
        assert!(json["property_details"]["property_address"]["value"].is_null());
        assert!(json["financial_metrics"]["expected_rents"]
            .as_array()
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_rent_entry_uses_type_key() {
        let entry = RentEntry {
            rent_type: Some("office".into()),
            value: Some(Scalar::Float(42.0)),
            unit: Some("USD/SF/yr".into()),
            source_text: Some("Office rent: $42/SF".into()),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "office");
        assert!(entry.is_cited());
    }

    #[test]
    fn test_list_entry_citation_requires_value() {
        let entry = TenantEntry {
            name: None,
            source_text: Some("Tenant: ???".into()),
        };
        assert!(!entry.is_filled());
        assert!(!entry.is_cited());
    }
}
