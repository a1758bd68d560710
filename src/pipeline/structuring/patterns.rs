//! Table-driven field extraction.
//!
//! Each document type owns an ordered list of `FieldRule`s. A rule holds
//! one or more patterns tried in order; the first pattern that matches
//! supplies the field's raw value (capture group 1). Raw values are then
//! parsed into the typed field structs, and a value that matched but would
//! not parse is kept as `Extracted::Error`.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use super::classify::{parse_amount, parse_document_date};
use super::generic::extract_generic;
use crate::models::document::{
    MedicalBillFields, PoliceReportFields, PolicyFields, RepairEstimateFields, StructuredFields,
};
use crate::models::enums::{CoverageKind, DocumentType};
use crate::models::extracted::Extracted;

/// One capturing group matching a written date.
pub const DATE: &str = r"(\d{4}-\d{1,2}-\d{1,2}|\d{1,2}/\d{1,2}/\d{4}|\d{1,2}-\d{1,2}-\d{4}|[A-Za-z]{3,9}\.?\s+\d{1,2},?\s+\d{4}|\d{1,2}\s+[A-Za-z]{3,9}\s+\d{4})";

/// One capturing group matching an amount, optionally prefixed by a currency sign.
pub const AMOUNT: &str = r"((?:[$€£]\s*)?\d[\d,]*(?:\.\d{1,2})?)";

/// Personal name: capitalised words separated by single spaces.
const NAME: &str = r"([A-Za-z][A-Za-z.,'\-]*(?:[ ][A-Za-z][A-Za-z.,'\-]*)*)";

/// Business/place name: like NAME but digits and '&' are allowed.
const PHRASE: &str = r"([A-Za-z0-9&#][A-Za-z0-9&#.,'\-]*(?:[ ][A-Za-z0-9&#][A-Za-z0-9&#.,'\-]*)*)";

/// Identifier such as a policy or report number.
const IDENT: &str = r"([A-Z0-9][A-Z0-9\-/]{2,})";

/// The same alternation without its capturing group.
fn non_capturing(group: &str) -> String {
    group.replacen('(', "(?:", 1)
}

pub struct FieldRule {
    pub field: &'static str,
    pub patterns: Vec<Regex>,
}

impl FieldRule {
    fn new(field: &'static str, patterns: &[String]) -> Self {
        Self {
            field,
            patterns: patterns
                .iter()
                .map(|p| Regex::new(p).expect("Invalid field regex pattern"))
                .collect(),
        }
    }

    /// First non-empty capture across the patterns, in order.
    pub fn capture(&self, text: &str) -> Option<String> {
        self.patterns.iter().find_map(|re| {
            re.captures(text)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().trim().trim_end_matches([',', ';']).to_string())
                .filter(|v| !v.is_empty())
        })
    }
}

static POLICY_RULES: LazyLock<Vec<FieldRule>> = LazyLock::new(|| {
    vec![
        FieldRule::new(
            "policy_number",
            &[
                format!(r"(?i)policy\s*(?:number|no\.?|#)\s*[:\-]?\s*{IDENT}"),
                r"\b(POL[\-\s]?\d{4,})\b".to_string(),
            ],
        ),
        FieldRule::new(
            "policy_holder",
            &[
                format!(r"(?i)named\s+insured\s*[:\-]\s*{NAME}"),
                format!(r"(?i)policy\s*holder\s*[:\-]\s*{NAME}"),
                format!(r"(?i)\binsured(?:\s+name)?\s*[:\-]\s*{NAME}"),
            ],
        ),
        FieldRule::new(
            "insurer",
            &[format!(
                r"(?i)(?:insurer|insurance\s+company|underwritten\s+by|carrier)\s*[:\-]\s*{PHRASE}"
            )],
        ),
        FieldRule::new(
            "effective_date",
            &[
                format!(r"(?i)effective(?:\s+date)?\s*[:\-]?\s*{DATE}"),
                format!(r"(?i)policy\s+period\s*[:\-]?\s*{DATE}"),
            ],
        ),
        FieldRule::new(
            "expiration_date",
            &[
                format!(r"(?i)(?:expiration|expiry|expires)(?:\s+date)?\s*[:\-]?\s*{DATE}"),
                format!(
                    r"(?i)policy\s+period\s*[:\-]?\s*{}\s*(?:to|through|-)\s*{DATE}",
                    non_capturing(DATE)
                ),
            ],
        ),
        FieldRule::new(
            "deductible",
            &[format!(r"(?i)deductible\s*[:\-]?\s*{AMOUNT}")],
        ),
        FieldRule::new(
            "premium",
            &[format!(r"(?i)premium\s*[:\-]?\s*{AMOUNT}")],
        ),
    ]
});

/// Coverage limit patterns, keyed by the kind of limit they read.
static COVERAGE_RULES: LazyLock<Vec<(CoverageKind, Regex)>> = LazyLock::new(|| {
    let limit = |label: &str| {
        Regex::new(&format!(
            r"(?i){label}(?:\s+coverage)?(?:\s+limit)?\s*[:\-]?\s*{AMOUNT}"
        ))
        .expect("Invalid coverage regex pattern")
    };
    vec![
        (CoverageKind::PerOccurrence, limit(r"per[\s\-]+occurrence")),
        (CoverageKind::Comprehensive, limit(r"comprehensive")),
        (CoverageKind::Collision, limit(r"collision")),
        (CoverageKind::Dwelling, limit(r"dwelling")),
        (CoverageKind::PersonalProperty, limit(r"personal\s+property")),
        (CoverageKind::Liability, limit(r"(?:bodily\s+injury\s+)?liability")),
        (
            CoverageKind::Total,
            limit(r"(?:total\s+coverage|policy\s+limit|limit\s+of\s+insurance|coverage\s+amount)"),
        ),
    ]
});

static REPAIR_RULES: LazyLock<Vec<FieldRule>> = LazyLock::new(|| {
    vec![
        FieldRule::new(
            "estimate_number",
            &[
                format!(r"(?i)estimate\s*(?:number|no\.?|#)\s*[:\-]?\s*{IDENT}"),
                format!(r"(?i)(?:ro|work\s+order)\s*(?:number|no\.?|#)\s*[:\-]?\s*{IDENT}"),
            ],
        ),
        FieldRule::new(
            "shop_name",
            &[format!(
                r"(?i)(?:body\s+shop|repair\s+facility|shop|facility)(?:\s+name)?\s*[:\-]\s*{PHRASE}"
            )],
        ),
        FieldRule::new(
            "vehicle",
            &[
                format!(r"(?i)vehicle(?:\s+description)?\s*[:\-]\s*{PHRASE}"),
                r"\b((?:19|20)\d{2}\s+[A-Z][A-Za-z]+\s+[A-Z0-9][A-Za-z0-9\-]+)\b".to_string(),
            ],
        ),
        FieldRule::new(
            "vin",
            &[r"(?i)\bVIN\s*[:#]?\s*([A-HJ-NPR-Z0-9]{17})\b".to_string()],
        ),
        FieldRule::new(
            "estimate_date",
            &[
                format!(r"(?i)(?:estimate\s+date|date\s+of\s+estimate)\s*[:\-]?\s*{DATE}"),
                format!(r"(?i)\bdate\s*[:\-]\s*{DATE}"),
            ],
        ),
        FieldRule::new(
            "labor_total",
            &[format!(r"(?i)(?:total\s+)?labor(?:\s+total)?\s*[:\-]?\s*{AMOUNT}")],
        ),
        FieldRule::new(
            "parts_total",
            &[format!(r"(?i)(?:total\s+)?parts(?:\s+total)?\s*[:\-]?\s*{AMOUNT}")],
        ),
        FieldRule::new(
            "total_amount",
            &[
                format!(
                    r"(?i)(?:grand\s+total|total\s+estimate|estimate\s+total|total\s+amount|total\s+due)\s*[:\-]?\s*{AMOUNT}"
                ),
                format!(r"(?im)^\s*total\s*[:\-]?\s*{AMOUNT}"),
            ],
        ),
    ]
});

static MEDICAL_RULES: LazyLock<Vec<FieldRule>> = LazyLock::new(|| {
    vec![
        FieldRule::new(
            "patient_name",
            &[format!(r"(?i)patient(?:\s+name)?\s*[:\-]\s*{NAME}")],
        ),
        FieldRule::new(
            "provider_name",
            &[format!(
                r"(?i)(?:provider|physician|attending|rendering\s+provider)(?:\s+name)?\s*[:\-]\s*{PHRASE}"
            )],
        ),
        FieldRule::new(
            "account_number",
            &[format!(r"(?i)(?:account|acct\.?)\s*(?:number|no\.?|#)\s*[:\-]?\s*{IDENT}")],
        ),
        FieldRule::new(
            "service_date",
            &[format!(
                r"(?i)(?:date\s+of\s+service|service\s+date|\bDOS\b)\s*[:\-]?\s*{DATE}"
            )],
        ),
        FieldRule::new(
            "total_charges",
            &[format!(
                r"(?i)(?:total\s+charges|amount\s+due|balance\s+due|total\s+billed)\s*[:\-]?\s*{AMOUNT}"
            )],
        ),
    ]
});

/// CPT code followed by its description, one per line.
static PROCEDURE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:CPT[ \t]*[:#]?[ \t]*)?(\d{5})\b[ \t]+([A-Za-z][A-Za-z ,/\-]*[A-Za-z])")
        .expect("Invalid procedure regex pattern")
});

static POLICE_RULES: LazyLock<Vec<FieldRule>> = LazyLock::new(|| {
    vec![
        FieldRule::new(
            "report_number",
            &[format!(
                r"(?i)(?:report|case|incident)\s*(?:number|no\.?|#)\s*[:\-]?\s*{IDENT}"
            )],
        ),
        FieldRule::new(
            "incident_date",
            &[
                format!(
                    r"(?i)(?:date\s+of\s+(?:incident|accident|occurrence|loss)|incident\s+date|accident\s+date)\s*[:\-]?\s*{DATE}"
                ),
                format!(r"(?i)\bdate\s*[:\-]\s*{DATE}"),
            ],
        ),
        FieldRule::new(
            "officer_name",
            &[format!(
                r"(?i)(?:reporting\s+)?officer(?:\s+name)?\s*[:\-]\s*(?:(?:ofc|officer|sgt|det|cpl|lt)\.?\s+)?{NAME}"
            )],
        ),
        FieldRule::new(
            "location",
            &[r"(?i)(?:incident\s+location|location(?:\s+of\s+(?:incident|accident))?|address\s+of\s+incident)\s*[:\-]\s*([^\n]+)".to_string()],
        ),
        FieldRule::new(
            "incident_type",
            &[r"(?i)(?:incident\s+type|type\s+of\s+incident|nature\s+of\s+incident|offense)\s*[:\-]\s*([^\n]+)".to_string()],
        ),
    ]
});

/// Ordered rules for a document type. Unknown documents have none.
pub fn rules_for(doc_type: DocumentType) -> &'static [FieldRule] {
    match doc_type {
        DocumentType::Policy => POLICY_RULES.as_slice(),
        DocumentType::RepairEstimate => REPAIR_RULES.as_slice(),
        DocumentType::MedicalBill => MEDICAL_RULES.as_slice(),
        DocumentType::PoliceReport => POLICE_RULES.as_slice(),
        DocumentType::Unknown => &[],
    }
}

/// Run every rule of the type and collect raw values by field name.
pub fn capture_fields(doc_type: DocumentType, text: &str) -> BTreeMap<&'static str, String> {
    rules_for(doc_type)
        .iter()
        .filter_map(|rule| rule.capture(text).map(|v| (rule.field, v)))
        .collect()
}

/// Read every coverage limit present, one value per kind (first match).
pub fn extract_coverage_limits(text: &str) -> BTreeMap<CoverageKind, f64> {
    COVERAGE_RULES
        .iter()
        .filter_map(|(kind, re)| {
            re.captures(text)
                .and_then(|c| c.get(1))
                .and_then(|m| parse_amount(m.as_str()))
                .map(|v| (*kind, v))
        })
        .collect()
}

/// Structured fields for a classified document. Unknown types fall back
/// to generic extraction.
pub fn extract_fields(doc_type: DocumentType, text: &str) -> StructuredFields {
    let mut raw = capture_fields(doc_type, text);
    let mut take = |field: &str| -> Extracted<String> { raw.remove(field).into() };

    match doc_type {
        DocumentType::Policy => StructuredFields::Policy(PolicyFields {
            policy_number: take("policy_number"),
            policy_holder: take("policy_holder"),
            insurer: take("insurer"),
            effective_date: as_date(take("effective_date")),
            expiration_date: as_date(take("expiration_date")),
            coverage_limits: extract_coverage_limits(text),
            deductible: as_amount(take("deductible")),
            premium: as_amount(take("premium")),
        }),
        DocumentType::RepairEstimate => StructuredFields::RepairEstimate(RepairEstimateFields {
            estimate_number: take("estimate_number"),
            shop_name: take("shop_name"),
            vehicle: take("vehicle"),
            vin: take("vin").map(|v| v.to_uppercase()),
            estimate_date: as_date(take("estimate_date")),
            labor_total: as_amount(take("labor_total")),
            parts_total: as_amount(take("parts_total")),
            total_amount: as_amount(take("total_amount")),
        }),
        DocumentType::MedicalBill => StructuredFields::MedicalBill(MedicalBillFields {
            patient_name: take("patient_name"),
            provider_name: take("provider_name"),
            account_number: take("account_number"),
            service_date: as_date(take("service_date")),
            procedures: PROCEDURE_LINE
                .captures_iter(text)
                .map(|c| format!("{} {}", &c[1], c[2].trim()))
                .collect(),
            total_charges: as_amount(take("total_charges")),
        }),
        DocumentType::PoliceReport => StructuredFields::PoliceReport(PoliceReportFields {
            report_number: take("report_number"),
            incident_date: as_date(take("incident_date")),
            officer_name: take("officer_name"),
            location: take("location"),
            incident_type: take("incident_type"),
        }),
        DocumentType::Unknown => StructuredFields::Generic(extract_generic(text)),
    }
}

fn as_date(raw: Extracted<String>) -> Extracted<NaiveDate> {
    match raw {
        Extracted::Found(s) => match parse_document_date(&s) {
            Some(d) => Extracted::Found(d),
            None => Extracted::Error(format!("unparsable date '{s}'")),
        },
        Extracted::NotFound => Extracted::NotFound,
        Extracted::Error(e) => Extracted::Error(e),
    }
}

fn as_amount(raw: Extracted<String>) -> Extracted<f64> {
    match raw {
        Extracted::Found(s) => match parse_amount(&s) {
            Some(v) => Extracted::Found(v),
            None => Extracted::Error(format!("unparsable amount '{s}'")),
        },
        Extracted::NotFound => Extracted::NotFound,
        Extracted::Error(e) => Extracted::Error(e),
    }
}
