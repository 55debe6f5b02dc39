//! The pattern catalog: every leaf field's ordered match rules, as data.
//!
//! Rules are declared in a static table so field coverage can grow without
//! touching the matching logic. Patterns compile case-insensitive and
//! multiline, label-anchored at line start; a rule that fails to compile is
//! skipped with a warning and its field simply resolves to null.

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};
use tracing::warn;

use crate::schema::{self, FieldDef};

/// One match rule: a pattern and the capture group holding the value.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub pattern: &'static str,
    pub group: usize,
}

const fn rule(pattern: &'static str) -> Rule {
    Rule { pattern, group: 1 }
}

/// Raw catalog: dotted field path -> ordered rules. For single-value
/// fields the first rule producing any non-empty match wins; list fields
/// keep every match of the winning rule, in document order.
const RULES: &[(&str, &[Rule])] = &[
    (
        "property_details.property_address",
        &[
            rule(r"^[ \t]*property address[ \t]*:[ \t]*([^\n]+)"),
            rule(r"^[ \t]*(?:address|location|property)[ \t]*:[ \t]*([^\n]+)"),
        ],
    ),
    (
        "property_details.property_type",
        &[rule(r"^[ \t]*(?:property type|asset class)[ \t]*:[ \t]*([^\n]+)")],
    ),
    (
        "property_details.square_footage",
        &[rule(r"^[ \t]*(?:square (?:feet|footage)|total area|sf)[ \t]*:[ \t]*([\d,]+)")],
    ),
    (
        "property_details.acres",
        &[rule(r"^[ \t]*(?:acres|site area|land area)[ \t]*:[ \t]*([\d,.]+)")],
    ),
    (
        "property_details.land_square_feet",
        &[rule(r"^[ \t]*(?:land square feet|land sf)[ \t]*:[ \t]*([\d,]+)")],
    ),
    (
        "property_details.gross_building_area",
        &[rule(r"^[ \t]*(?:gross building area|gba)[ \t]*:[ \t]*([\d,]+)")],
    ),
    (
        "property_details.net_rentable_area",
        &[rule(r"^[ \t]*(?:net rentable area|rentable area|nra)[ \t]*:[ \t]*([\d,]+)")],
    ),
    (
        "property_details.year_built",
        &[rule(r"^[ \t]*(?:year built|year constructed)[ \t]*:[ \t]*(\d{4})")],
    ),
    (
        "property_details.units",
        &[rule(r"^[ \t]*(?:number of units|total units|units)[ \t]*:[ \t]*(\d+)")],
    ),
    (
        "property_details.occupancy_rate",
        &[rule(r"^[ \t]*(?:occupancy rate|occupancy)[ \t]*:[ \t]*([\d.]+)[ \t]*%?")],
    ),
    (
        "financial_metrics.noi_annual",
        &[rule(
            r"^[ \t]*(?:net operating income(?:[ \t]*\(noi\))?|noi)[ \t]*:[ \t]*\$?[ \t]*([\d,]+(?:\.\d+)?)",
        )],
    ),
    (
        "financial_metrics.stabilized_noi",
        &[rule(
            r"^[ \t]*stabilized (?:net operating income|noi)[ \t]*:[ \t]*\$?[ \t]*([\d,]+(?:\.\d+)?)",
        )],
    ),
    (
        "financial_metrics.cap_rate",
        &[rule(
            r"^[ \t]*(?:cap rate|capitalization rate|going[- ]in cap rate)[ \t]*:[ \t]*([\d.]+)[ \t]*%?",
        )],
    ),
    (
        "financial_metrics.purchase_price",
        &[rule(
            r"^[ \t]*(?:purchase price|acquisition price)[ \t]*:[ \t]*\$?[ \t]*([\d,]+(?:\.\d+)?)",
        )],
    ),
    (
        "financial_metrics.appraised_value",
        &[rule(
            r"^[ \t]*(?:appraised value|valuation)[ \t]*:[ \t]*\$?[ \t]*([\d,]+(?:\.\d+)?)",
        )],
    ),
    (
        "financial_metrics.annual_gross_income",
        &[rule(
            r"^[ \t]*(?:annual gross income|gross income|annual revenue)[ \t]*:[ \t]*\$?[ \t]*([\d,]+(?:\.\d+)?)",
        )],
    ),
    (
        "financial_metrics.operating_expenses",
        &[rule(
            r"^[ \t]*(?:operating expenses|opex)[ \t]*:[ \t]*\$?[ \t]*([\d,]+(?:\.\d+)?)",
        )],
    ),
    (
        "financial_metrics.debt_service",
        &[rule(
            r"^[ \t]*(?:annual debt service|debt service)[ \t]*:[ \t]*\$?[ \t]*([\d,]+(?:\.\d+)?)",
        )],
    ),
    (
        "financial_metrics.dscr",
        &[rule(r"^[ \t]*(?:dscr|debt service coverage ratio)[ \t]*:[ \t]*([\d.]+)")],
    ),
    (
        "financial_metrics.irr",
        &[rule(
            r"^[ \t]*(?:expected irr|irr|internal rate of return)[ \t]*:[ \t]*([\d.]+)[ \t]*%?",
        )],
    ),
    (
        "financial_metrics.project_cost",
        &[rule(
            r"^[ \t]*(?:total project cost|project cost)[ \t]*:[ \t]*\$?[ \t]*([\d,]+(?:\.\d+)?)",
        )],
    ),
    (
        "financial_metrics.expected_exit_valuation",
        &[rule(
            r"^[ \t]*(?:expected exit valuation|exit valuation|exit value)[ \t]*:[ \t]*\$?[ \t]*([\d,]+(?:\.\d+)?)",
        )],
    ),
    (
        "financial_metrics.expected_rents",
        &[rule(
            r"^[ \t]*(?:expected|market|asking)[ \t]+rents?[^:\n]*:[ \t]*\$?[ \t]*([\d,]+(?:\.\d+)?)",
        )],
    ),
    (
        "loan_details.loan_amount",
        &[rule(
            r"^[ \t]*(?:loan amount|credit facility)[ \t]*:[ \t]*\$?[ \t]*([\d,]+(?:\.\d+)?)",
        )],
    ),
    (
        "loan_details.interest_rate",
        &[
            rule(r"^[ \t]*interest rate[ \t]*:[ \t]*([\d.]+)[ \t]*%?"),
            rule(r"^[ \t]*rate[ \t]*:[ \t]*([\d.]+)[ \t]*%?"),
        ],
    ),
    (
        "loan_details.loan_term_years",
        &[rule(
            r"^[ \t]*(?:loan term|amortization period)[ \t]*:[ \t]*(\d+)[ \t:]*(?:years?)?",
        )],
    ),
    (
        "loan_details.loan_type",
        &[rule(r"^[ \t]*(?:loan type|facility type)[ \t]*:[ \t]*([^\n]+)")],
    ),
    (
        "loan_details.lender",
        &[rule(r"^[ \t]*(?:lender|financial institution|bank)[ \t]*:[ \t]*([^\n]+)")],
    ),
    (
        "loan_details.maturity_date",
        &[rule(r"^[ \t]*(?:maturity date|loan maturity)[ \t]*:[ \t]*([^\n]+)")],
    ),
    (
        "loan_details.ltv",
        &[rule(r"^[ \t]*(?:ltv|loan[- ]to[- ]value)[ \t]*:[ \t]*([\d.]+)[ \t]*%?")],
    ),
    (
        "tenant_information.major_tenants",
        &[rule(r"^[ \t]*(?:major tenants?|anchor tenants?|tenant)[ \t]*:[ \t]*([^\n]+)")],
    ),
    (
        "tenant_information.lease_terms",
        &[rule(r"^[ \t]*(?:lease terms?|remaining term)[ \t]*:[ \t]*([^\n]+)")],
    ),
    (
        "tenant_information.tenant_quality",
        &[rule(r"^[ \t]*(?:tenant quality|credit quality)[ \t]*:[ \t]*([^\n]+)")],
    ),
    (
        "market_analysis.market",
        &[rule(r"^[ \t]*(?:market|msa)[ \t]*:[ \t]*([^\n]+)")],
    ),
    (
        "market_analysis.submarket",
        &[rule(r"^[ \t]*(?:submarket|sub-market)[ \t]*:[ \t]*([^\n]+)")],
    ),
    (
        "market_analysis.comparable_properties",
        &[rule(r"^[ \t]*(?:comparable properties|comparables?|comps?)[ \t]*:[ \t]*([^\n]+)")],
    ),
    (
        "market_analysis.market_trends",
        &[rule(r"^[ \t]*(?:market trends?|trends?)[ \t]*:[ \t]*([^\n]+)")],
    ),
    (
        "risk_assessment.identified_risks",
        &[rule(r"^[ \t]*(?:risk factors?|risks?|concerns?)[ \t]*\d*[ \t]*:[ \t]*([^\n]+)")],
    ),
    (
        "risk_assessment.mitigation_strategies",
        &[rule(
            r"^[ \t]*(?:mitigation strateg(?:y|ies)|mitigations?)[ \t]*\d*[ \t]*:[ \t]*([^\n]+)",
        )],
    ),
];

/// A compiled match rule.
#[derive(Debug)]
pub struct CompiledRule {
    pub regex: Regex,
    pub group: usize,
}

/// Rules for one schema field.
#[derive(Debug)]
pub struct CatalogEntry {
    pub def: &'static FieldDef,
    pub rules: Vec<CompiledRule>,
}

/// The compiled pattern taxonomy.
#[derive(Debug)]
pub struct PatternCatalog {
    entries: Vec<CatalogEntry>,
}

impl PatternCatalog {
    fn build(raw: &[(&str, &[Rule])]) -> Self {
        let mut entries = Vec::with_capacity(raw.len());
        for &(path, rules) in raw {
            let Some(def) = schema::field(path) else {
                warn!(field = path, "catalog rule references unknown schema field, skipping");
                continue;
            };
            let compiled: Vec<CompiledRule> = rules
                .iter()
                .filter_map(|r| {
                    match RegexBuilder::new(r.pattern)
                        .case_insensitive(true)
                        .multi_line(true)
                        .build()
                    {
                        Ok(regex) => Some(CompiledRule {
                            regex,
                            group: r.group,
                        }),
                        Err(e) => {
                            warn!(field = path, error = %e, "skipping malformed pattern");
                            None
                        }
                    }
                })
                .collect();
            entries.push(CatalogEntry {
                def,
                rules: compiled,
            });
        }
        Self { entries }
    }

    /// The standard CRE catalog, compiled once.
    pub fn standard() -> &'static PatternCatalog {
        lazy_static! {
            static ref CATALOG: PatternCatalog = PatternCatalog::build(RULES);
        }
        &CATALOG
    }

    /// Entries in schema declaration order of the raw table.
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldKind;

    #[test]
    fn test_every_rule_targets_a_schema_field_and_compiles() {
        let catalog = PatternCatalog::standard();
        assert_eq!(catalog.entries().len(), RULES.len());
        for entry in catalog.entries() {
            assert!(!entry.rules.is_empty(), "{} has no usable rules", entry.def.path());
        }
    }

    #[test]
    fn test_list_fields_have_list_kind() {
        let catalog = PatternCatalog::standard();
        for entry in catalog.entries() {
            if entry.def.name == "major_tenants" || entry.def.name == "identified_risks" {
                assert!(matches!(entry.def.kind, FieldKind::List { .. }));
            }
        }
    }

    #[test]
    fn test_noi_pattern_handles_parenthesized_label() {
        let catalog = PatternCatalog::standard();
        let entry = catalog
            .entries()
            .iter()
            .find(|e| e.def.name == "noi_annual")
            .unwrap();
        let caps = entry.rules[0]
            .regex
            .captures("Net Operating Income (NOI): $2,500,000")
            .unwrap();
        assert_eq!(&caps[1], "2,500,000");
    }

    #[test]
    fn test_interest_rate_does_not_steal_cap_rate() {
        let catalog = PatternCatalog::standard();
        let entry = catalog
            .entries()
            .iter()
            .find(|e| e.def.name == "interest_rate")
            .unwrap();
        let text = "Cap Rate: 6.5%\nInterest Rate: 4.5%";
        let caps = entry.rules[0].regex.captures(text).unwrap();
        assert_eq!(&caps[1], "4.5");
        // The bare "Rate:" fallback is line-anchored, so it cannot match
        // inside "Cap Rate:" or "Interest Rate:".
        assert!(entry.rules[1].regex.captures(text).is_none());
    }

    #[test]
    fn test_risk_pattern_accepts_numbered_labels() {
        let catalog = PatternCatalog::standard();
        let entry = catalog
            .entries()
            .iter()
            .find(|e| e.def.name == "identified_risks")
            .unwrap();
        let caps = entry.rules[0]
            .regex
            .captures("Risk Factor 1: Economic downturn")
            .unwrap();
        assert_eq!(&caps[1], "Economic downturn");
    }
}
