//! Declarative schema for the CRE extraction record.
//!
//! [`FIELDS`] is the single source of truth for field names, value types,
//! and multiplicities. The regex catalog, the model wire schema, and the
//! completeness scorer are all derived from it, so the total-fillable count
//! can never drift from the record shape.

use serde_json::{Map, Value, json};

use crate::models::record::{ExtractionRecord, FieldValue, ListEntry, Scalar};

/// Schema contract name sent to the structured-generation service.
///
/// `source_text` is the canonical citation key; bump this name if the
/// record shape ever changes.
pub const SCHEMA_NAME: &str = "cre_extraction_v2";

/// Expected JSON type of a leaf value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Text,
    Number,
    Integer,
}

impl ValueType {
    fn json_type(self) -> &'static str {
        match self {
            ValueType::Text => "string",
            ValueType::Number => "number",
            ValueType::Integer => "integer",
        }
    }
}

/// Shape of a bounded-list entry: the domain label key, and whether the
/// entry carries a measured value/unit pair (expected rents only).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryShape {
    pub label: &'static str,
    pub measured: bool,
}

/// Multiplicity of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A single `FieldValue` leaf.
    Scalar,
    /// A bounded, document-ordered list of entries.
    List { max: usize, entry: EntryShape },
}

/// One fillable slot of the extraction record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub group: &'static str,
    pub name: &'static str,
    pub value_type: ValueType,
    pub kind: FieldKind,
}

impl FieldDef {
    /// Dotted path used in `missing_fields`.
    pub fn path(&self) -> String {
        format!("{}.{}", self.group, self.name)
    }
}

const fn leaf(group: &'static str, name: &'static str, value_type: ValueType) -> FieldDef {
    FieldDef {
        group,
        name,
        value_type,
        kind: FieldKind::Scalar,
    }
}

const fn list(
    group: &'static str,
    name: &'static str,
    max: usize,
    label: &'static str,
    measured: bool,
) -> FieldDef {
    FieldDef {
        group,
        name,
        value_type: if measured {
            ValueType::Number
        } else {
            ValueType::Text
        },
        kind: FieldKind::List {
            max,
            entry: EntryShape { label, measured },
        },
    }
}

/// The six top-level record groups, in declaration order.
pub const GROUPS: [&str; 6] = [
    "property_details",
    "financial_metrics",
    "loan_details",
    "tenant_information",
    "market_analysis",
    "risk_assessment",
];

/// Every fillable slot of the record, in schema declaration order.
/// Each list field counts as one slot.
pub const FIELDS: [FieldDef; 39] = [
    leaf("property_details", "property_address", ValueType::Text),
    leaf("property_details", "property_type", ValueType::Text),
    leaf("property_details", "square_footage", ValueType::Number),
    leaf("property_details", "acres", ValueType::Number),
    leaf("property_details", "land_square_feet", ValueType::Number),
    leaf("property_details", "gross_building_area", ValueType::Number),
    leaf("property_details", "net_rentable_area", ValueType::Number),
    leaf("property_details", "year_built", ValueType::Integer),
    leaf("property_details", "units", ValueType::Integer),
    leaf("property_details", "occupancy_rate", ValueType::Number),
    leaf("financial_metrics", "noi_annual", ValueType::Number),
    leaf("financial_metrics", "stabilized_noi", ValueType::Number),
    leaf("financial_metrics", "cap_rate", ValueType::Number),
    leaf("financial_metrics", "purchase_price", ValueType::Number),
    leaf("financial_metrics", "appraised_value", ValueType::Number),
    leaf("financial_metrics", "annual_gross_income", ValueType::Number),
    leaf("financial_metrics", "operating_expenses", ValueType::Number),
    leaf("financial_metrics", "debt_service", ValueType::Number),
    leaf("financial_metrics", "dscr", ValueType::Number),
    leaf("financial_metrics", "irr", ValueType::Number),
    leaf("financial_metrics", "project_cost", ValueType::Number),
    leaf("financial_metrics", "expected_exit_valuation", ValueType::Number),
    list("financial_metrics", "expected_rents", 10, "type", true),
    leaf("loan_details", "loan_amount", ValueType::Number),
    leaf("loan_details", "interest_rate", ValueType::Number),
    leaf("loan_details", "loan_term_years", ValueType::Integer),
    leaf("loan_details", "loan_type", ValueType::Text),
    leaf("loan_details", "lender", ValueType::Text),
    leaf("loan_details", "maturity_date", ValueType::Text),
    leaf("loan_details", "ltv", ValueType::Number),
    list("tenant_information", "major_tenants", 5, "name", false),
    leaf("tenant_information", "lease_terms", ValueType::Text),
    leaf("tenant_information", "tenant_quality", ValueType::Text),
    leaf("market_analysis", "market", ValueType::Text),
    leaf("market_analysis", "submarket", ValueType::Text),
    list("market_analysis", "comparable_properties", 5, "property", false),
    list("market_analysis", "market_trends", 5, "trend", false),
    list("risk_assessment", "identified_risks", 5, "risk", false),
    list("risk_assessment", "mitigation_strategies", 5, "strategy", false),
];

/// Total fillable slots declared by the schema.
pub fn total_fillable() -> usize {
    FIELDS.len()
}

/// Look up a field definition by dotted path.
pub fn field(path: &str) -> Option<&'static FieldDef> {
    FIELDS.iter().find(|d| d.path() == path)
}

/// Filled/cited status of one list entry, as seen by the scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryView {
    pub filled: bool,
    pub cited: bool,
}

/// Typed view of one record slot.
#[derive(Debug)]
pub enum FieldNode<'a> {
    Leaf(&'a FieldValue),
    List(Vec<EntryView>),
}

fn views<E: ListEntry>(entries: &[E]) -> Vec<EntryView> {
    entries
        .iter()
        .map(|e| EntryView {
            filled: e.is_filled(),
            cited: e.is_cited(),
        })
        .collect()
}

impl ExtractionRecord {
    /// Walk every schema slot in declaration order.
    pub fn fields(&self) -> Vec<(&'static FieldDef, FieldNode<'_>)> {
        FIELDS.iter().map(|def| (def, self.node(def))).collect()
    }

    fn node(&self, def: &FieldDef) -> FieldNode<'_> {
        use FieldNode::{Leaf, List};
        let p = &self.property_details;
        let f = &self.financial_metrics;
        let l = &self.loan_details;
        let t = &self.tenant_information;
        let m = &self.market_analysis;
        let r = &self.risk_assessment;
        match (def.group, def.name) {
            ("property_details", "property_address") => Leaf(&p.property_address),
            ("property_details", "property_type") => Leaf(&p.property_type),
            ("property_details", "square_footage") => Leaf(&p.square_footage),
            ("property_details", "acres") => Leaf(&p.acres),
            ("property_details", "land_square_feet") => Leaf(&p.land_square_feet),
            ("property_details", "gross_building_area") => Leaf(&p.gross_building_area),
            ("property_details", "net_rentable_area") => Leaf(&p.net_rentable_area),
            ("property_details", "year_built") => Leaf(&p.year_built),
            ("property_details", "units") => Leaf(&p.units),
            ("property_details", "occupancy_rate") => Leaf(&p.occupancy_rate),
            ("financial_metrics", "noi_annual") => Leaf(&f.noi_annual),
            ("financial_metrics", "stabilized_noi") => Leaf(&f.stabilized_noi),
            ("financial_metrics", "cap_rate") => Leaf(&f.cap_rate),
            ("financial_metrics", "purchase_price") => Leaf(&f.purchase_price),
            ("financial_metrics", "appraised_value") => Leaf(&f.appraised_value),
            ("financial_metrics", "annual_gross_income") => Leaf(&f.annual_gross_income),
            ("financial_metrics", "operating_expenses") => Leaf(&f.operating_expenses),
            ("financial_metrics", "debt_service") => Leaf(&f.debt_service),
            ("financial_metrics", "dscr") => Leaf(&f.dscr),
            ("financial_metrics", "irr") => Leaf(&f.irr),
            ("financial_metrics", "project_cost") => Leaf(&f.project_cost),
            ("financial_metrics", "expected_exit_valuation") => Leaf(&f.expected_exit_valuation),
            ("financial_metrics", "expected_rents") => List(views(&f.expected_rents)),
            ("loan_details", "loan_amount") => Leaf(&l.loan_amount),
            ("loan_details", "interest_rate") => Leaf(&l.interest_rate),
            ("loan_details", "loan_term_years") => Leaf(&l.loan_term_years),
            ("loan_details", "loan_type") => Leaf(&l.loan_type),
            ("loan_details", "lender") => Leaf(&l.lender),
            ("loan_details", "maturity_date") => Leaf(&l.maturity_date),
            ("loan_details", "ltv") => Leaf(&l.ltv),
            ("tenant_information", "major_tenants") => List(views(&t.major_tenants)),
            ("tenant_information", "lease_terms") => Leaf(&t.lease_terms),
            ("tenant_information", "tenant_quality") => Leaf(&t.tenant_quality),
            ("market_analysis", "market") => Leaf(&m.market),
            ("market_analysis", "submarket") => Leaf(&m.submarket),
            ("market_analysis", "comparable_properties") => List(views(&m.comparable_properties)),
            ("market_analysis", "market_trends") => List(views(&m.market_trends)),
            ("risk_assessment", "identified_risks") => List(views(&r.identified_risks)),
            ("risk_assessment", "mitigation_strategies") => List(views(&r.mitigation_strategies)),
            _ => unreachable!("field not declared in schema: {}", def.path()),
        }
    }

    /// Assign a leaf slot. Used by the regex strategy during assembly.
    pub fn set_leaf(&mut self, def: &FieldDef, value: FieldValue) {
        let p = &mut self.property_details;
        let f = &mut self.financial_metrics;
        let l = &mut self.loan_details;
        let t = &mut self.tenant_information;
        let m = &mut self.market_analysis;
        let slot = match (def.group, def.name) {
            ("property_details", "property_address") => &mut p.property_address,
            ("property_details", "property_type") => &mut p.property_type,
            ("property_details", "square_footage") => &mut p.square_footage,
            ("property_details", "acres") => &mut p.acres,
            ("property_details", "land_square_feet") => &mut p.land_square_feet,
            ("property_details", "gross_building_area") => &mut p.gross_building_area,
            ("property_details", "net_rentable_area") => &mut p.net_rentable_area,
            ("property_details", "year_built") => &mut p.year_built,
            ("property_details", "units") => &mut p.units,
            ("property_details", "occupancy_rate") => &mut p.occupancy_rate,
            ("financial_metrics", "noi_annual") => &mut f.noi_annual,
            ("financial_metrics", "stabilized_noi") => &mut f.stabilized_noi,
            ("financial_metrics", "cap_rate") => &mut f.cap_rate,
            ("financial_metrics", "purchase_price") => &mut f.purchase_price,
            ("financial_metrics", "appraised_value") => &mut f.appraised_value,
            ("financial_metrics", "annual_gross_income") => &mut f.annual_gross_income,
            ("financial_metrics", "operating_expenses") => &mut f.operating_expenses,
            ("financial_metrics", "debt_service") => &mut f.debt_service,
            ("financial_metrics", "dscr") => &mut f.dscr,
            ("financial_metrics", "irr") => &mut f.irr,
            ("financial_metrics", "project_cost") => &mut f.project_cost,
            ("financial_metrics", "expected_exit_valuation") => &mut f.expected_exit_valuation,
            ("loan_details", "loan_amount") => &mut l.loan_amount,
            ("loan_details", "interest_rate") => &mut l.interest_rate,
            ("loan_details", "loan_term_years") => &mut l.loan_term_years,
            ("loan_details", "loan_type") => &mut l.loan_type,
            ("loan_details", "lender") => &mut l.lender,
            ("loan_details", "maturity_date") => &mut l.maturity_date,
            ("loan_details", "ltv") => &mut l.ltv,
            ("tenant_information", "lease_terms") => &mut t.lease_terms,
            ("tenant_information", "tenant_quality") => &mut t.tenant_quality,
            ("market_analysis", "market") => &mut m.market,
            ("market_analysis", "submarket") => &mut m.submarket,
            _ => unreachable!("not a leaf field: {}", def.path()),
        };
        *slot = value;
    }

    /// Append one extracted entry to a list slot, in document order.
    pub fn push_list_item(&mut self, def: &FieldDef, value: Scalar, source_text: String) {
        use crate::models::record::{
            ComparableEntry, MitigationEntry, RentEntry, RiskEntry, TenantEntry, TrendEntry,
        };
        match (def.group, def.name) {
            ("financial_metrics", "expected_rents") => {
                self.financial_metrics.expected_rents.push(RentEntry {
                    rent_type: None,
                    value: Some(value),
                    unit: None,
                    source_text: Some(source_text),
                });
            }
            ("tenant_information", "major_tenants") => self
                .tenant_information
                .major_tenants
                .push(TenantEntry::cited(value.to_text(), source_text)),
            ("market_analysis", "comparable_properties") => self
                .market_analysis
                .comparable_properties
                .push(ComparableEntry::cited(value.to_text(), source_text)),
            ("market_analysis", "market_trends") => self
                .market_analysis
                .market_trends
                .push(TrendEntry::cited(value.to_text(), source_text)),
            ("risk_assessment", "identified_risks") => self
                .risk_assessment
                .identified_risks
                .push(RiskEntry::cited(value.to_text(), source_text)),
            ("risk_assessment", "mitigation_strategies") => self
                .risk_assessment
                .mitigation_strategies
                .push(MitigationEntry::cited(value.to_text(), source_text)),
            _ => unreachable!("not a list field: {}", def.path()),
        }
    }
}

fn nullable(value_type: ValueType) -> Value {
    json!([value_type.json_type(), "null"])
}

fn leaf_schema(def: &FieldDef) -> Value {
    json!({
        "type": "object",
        "properties": {
            "value": { "type": nullable(def.value_type) },
            "unit": { "type": ["string", "null"] },
            "source_text": { "type": ["string", "null"] },
        },
        "required": ["value", "unit", "source_text"],
        "additionalProperties": false,
    })
}

fn list_schema(def: &FieldDef, max: usize, entry: EntryShape) -> Value {
    let mut props = Map::new();
    let mut required: Vec<Value> = Vec::new();
    props.insert(entry.label.to_string(), json!({ "type": ["string", "null"] }));
    required.push(json!(entry.label));
    if entry.measured {
        props.insert("value".to_string(), json!({ "type": nullable(def.value_type) }));
        props.insert("unit".to_string(), json!({ "type": ["string", "null"] }));
        required.push(json!("value"));
        required.push(json!("unit"));
    }
    props.insert("source_text".to_string(), json!({ "type": ["string", "null"] }));
    required.push(json!("source_text"));
    json!({
        "type": "array",
        "items": {
            "type": "object",
            "properties": props,
            "required": required,
            "additionalProperties": false,
        },
        "maxItems": max,
    })
}

fn metadata_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "confidence_score": { "type": "number" },
            "missing_fields": { "type": "array", "items": { "type": "string" } },
            "fields_with_citations": { "type": "integer" },
            "fields_without_citations": { "type": "integer" },
            "citation_coverage_percent": { "type": "number" },
        },
        "required": [
            "confidence_score",
            "missing_fields",
            "fields_with_citations",
            "fields_without_citations",
            "citation_coverage_percent",
        ],
        "additionalProperties": false,
    })
}

/// Build the strict JSON schema sent to the structured-generation service.
///
/// Every leaf is typed, every object is closed, nullability is explicit.
/// Generated from [`FIELDS`], so the wire contract cannot drift from the
/// record shape the regex strategy produces.
pub fn json_schema() -> Value {
    let mut group_props = Map::new();
    let mut root_required: Vec<Value> = Vec::new();

    for group in GROUPS {
        let mut props = Map::new();
        let mut required: Vec<Value> = Vec::new();
        for def in FIELDS.iter().filter(|d| d.group == group) {
            let field_schema = match def.kind {
                FieldKind::Scalar => leaf_schema(def),
                FieldKind::List { max, entry } => list_schema(def, max, entry),
            };
            props.insert(def.name.to_string(), field_schema);
            required.push(json!(def.name));
        }
        group_props.insert(
            group.to_string(),
            json!({
                "type": "object",
                "properties": props,
                "required": required,
                "additionalProperties": false,
            }),
        );
        root_required.push(json!(group));
    }

    group_props.insert("extraction_metadata".to_string(), metadata_schema());
    root_required.push(json!("extraction_metadata"));

    json!({
        "name": SCHEMA_NAME,
        "description": "Structured extraction of commercial real estate underwriting data with source citations",
        "strict": true,
        "schema": {
            "type": "object",
            "properties": group_props,
            "required": root_required,
            "additionalProperties": false,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_total_fillable_matches_visitor() {
        let record = ExtractionRecord::empty();
        assert_eq!(record.fields().len(), total_fillable());
        assert_eq!(total_fillable(), 39);
    }

    #[test]
    fn test_field_lookup_by_path() {
        let def = field("financial_metrics.cap_rate").unwrap();
        assert_eq!(def.value_type, ValueType::Number);
        assert!(field("financial_metrics.nope").is_none());
    }

    #[test]
    fn test_paths_are_unique_and_ordered_by_group() {
        let mut seen = std::collections::HashSet::new();
        for def in &FIELDS {
            assert!(seen.insert(def.path()), "duplicate path {}", def.path());
            assert!(GROUPS.contains(&def.group));
        }
    }

    #[test]
    fn test_json_schema_is_closed_and_complete() {
        let schema = json_schema();
        assert_eq!(schema["name"], SCHEMA_NAME);
        assert_eq!(schema["strict"], true);

        let root = &schema["schema"];
        assert_eq!(root["additionalProperties"], false);
        for group in GROUPS {
            let g = &root["properties"][group];
            assert_eq!(g["additionalProperties"], false, "{group} must be closed");
        }
        assert!(root["properties"]["extraction_metadata"].is_object());
        assert_eq!(root["required"].as_array().unwrap().len(), 7);

        // The wire contract and the serde record must agree on shape.
        let rents = &root["properties"]["financial_metrics"]["properties"]["expected_rents"];
        assert_eq!(rents["maxItems"], 10);
        assert!(rents["items"]["properties"]["type"].is_object());
    }

    #[test]
    fn test_set_leaf_round_trips_through_visitor() {
        let mut record = ExtractionRecord::empty();
        let def = field("property_details.year_built").unwrap();
        record.set_leaf(def, FieldValue::cited(Scalar::Int(2015), "Year Built: 2015"));

        match record.node(def) {
            FieldNode::Leaf(fv) => {
                assert_eq!(fv.value, Some(Scalar::Int(2015)));
                assert_eq!(fv.source_text.as_deref(), Some("Year Built: 2015"));
            }
            FieldNode::List(_) => panic!("year_built is a leaf"),
        }
    }

    #[test]
    fn test_push_list_item_preserves_order() {
        let mut record = ExtractionRecord::empty();
        let def = field("tenant_information.major_tenants").unwrap();
        record.push_list_item(def, Scalar::Text("Acme Corp".into()), "Tenant: Acme Corp".into());
        record.push_list_item(def, Scalar::Text("Bolt LLC".into()), "Tenant: Bolt LLC".into());

        let names: Vec<_> = record
            .tenant_information
            .major_tenants
            .iter()
            .map(|t| t.name.clone().unwrap())
            .collect();
        assert_eq!(names, vec!["Acme Corp", "Bolt LLC"]);
    }
}
