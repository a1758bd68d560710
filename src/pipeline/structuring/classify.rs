use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::document::Classification;
use crate::models::enums::DocumentType;

/// Keyword vocabulary per classifiable document type.
const VOCABULARIES: [(DocumentType, &[&str]); 4] = [
    (
        DocumentType::Policy,
        &[
            "policy",
            "policyholder",
            "named insured",
            "insured",
            "coverage",
            "premium",
            "deductible",
            "effective date",
            "expiration date",
            "declarations",
            "endorsement",
            "limit of liability",
            "underwriter",
        ],
    ),
    (
        DocumentType::RepairEstimate,
        &[
            "estimate",
            "repair",
            "labor",
            "parts",
            "body shop",
            "vin",
            "refinish",
            "paint",
            "bumper",
            "subtotal",
            "mechanic",
        ],
    ),
    (
        DocumentType::MedicalBill,
        &[
            "patient",
            "provider",
            "diagnosis",
            "procedure",
            "cpt",
            "icd",
            "charges",
            "date of service",
            "physician",
            "hospital",
            "billing",
        ],
    ),
    (
        DocumentType::PoliceReport,
        &[
            "police",
            "officer",
            "badge",
            "incident report",
            "case number",
            "report number",
            "precinct",
            "citation",
            "witness",
            "accident report",
            "department",
        ],
    ),
];

/// Count whole-word (or whole-phrase) occurrences of `term` in lowercase text.
fn count_term(lower: &str, term: &str) -> usize {
    lower
        .match_indices(term)
        .filter(|(start, _)| {
            let before = lower[..*start].chars().next_back();
            let after = lower[start + term.len()..].chars().next();
            !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
        })
        .count()
}

/// Score text against the four keyword vocabularies.
///
/// The type with the most hits wins when it reaches `min_matches`; ties go
/// to the type listed first. Confidence is the winner's share of all hits.
pub fn classify_document(text: &str, min_matches: usize) -> Classification {
    let lower = text.to_lowercase();

    let keyword_matches: BTreeMap<DocumentType, usize> = VOCABULARIES
        .iter()
        .map(|(doc_type, terms)| {
            let hits = terms.iter().map(|t| count_term(&lower, t)).sum();
            (*doc_type, hits)
        })
        .collect();

    let total: usize = keyword_matches.values().sum();
    let mut winner: Option<(DocumentType, usize)> = None;
    for (doc_type, _) in VOCABULARIES.iter() {
        let hits = keyword_matches.get(doc_type).copied().unwrap_or(0);
        if winner.map_or(true, |(_, best)| hits > best) {
            winner = Some((*doc_type, hits));
        }
    }

    match winner {
        Some((document_type, hits)) if hits >= min_matches.max(1) => Classification {
            document_type,
            confidence: hits as f64 / total as f64,
            keyword_matches,
        },
        _ => Classification {
            document_type: DocumentType::Unknown,
            confidence: 0.0,
            keyword_matches,
        },
    }
}

/// Parse a date as written on claim paperwork.
/// Supports ISO 8601, US MM/DD/YYYY (tried before DD/MM/YYYY), dashed
/// variants and English textual dates ("January 15, 2024", "15 Jan 2024").
pub fn parse_document_date(date_str: &str) -> Option<NaiveDate> {
    let trimmed = date_str.trim().trim_end_matches(['.', ',']);
    if trimmed.is_empty() {
        return None;
    }

    const FORMATS: [&str; 9] = [
        "%Y-%m-%d",
        "%m/%d/%Y",
        "%d/%m/%Y",
        "%m-%d-%Y",
        "%d-%m-%Y",
        "%B %d, %Y",
        "%B %d %Y",
        "%d %B %Y",
        "%Y/%m/%d",
    ];
    // chrono's %B also accepts abbreviated month names
    let normalized = trimmed.replace('.', "");
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&normalized, fmt).ok())
}

/// Parse a currency amount: "$12,500.00", "12500", "€ 1.250,50".
pub fn parse_amount(raw: &str) -> Option<f64> {
    let digits: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ','))
        .collect();
    if digits.is_empty() {
        return None;
    }

    // A trailing ",dd" with no '.' is a decimal comma
    let normalized = match (digits.rfind(','), digits.rfind('.')) {
        (Some(c), None) if digits.len() - c == 3 && digits.matches(',').count() == 1 => {
            digits.replace(',', ".")
        }
        (Some(c), Some(d)) if c > d => digits.replace('.', "").replace(',', "."),
        _ => digits.replace(',', ""),
    };

    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLICY_TEXT: &str = "AUTO INSURANCE POLICY DECLARATIONS\n\
        Named Insured: Jane Smith\n\
        Policy Number: POL-123456\n\
        Effective Date: 01/01/2024   Expiration Date: 01/01/2025\n\
        Collision Coverage Limit: $10,000   Deductible: $500   Premium: $1,200";

    #[test]
    fn classifies_policy_document() {
        let c = classify_document(POLICY_TEXT, 2);
        assert_eq!(c.document_type, DocumentType::Policy);
        assert!(c.confidence > 0.5);
        assert!(c.keyword_matches[&DocumentType::Policy] >= 5);
    }

    #[test]
    fn classifies_repair_estimate() {
        let text = "Joe's Body Shop\nRepair Estimate #E-2291\nVIN: 1HGCM82633A004352\n\
                    Parts: $1,450.00\nLabor: $900.00\nRefinish and paint rear bumper";
        let c = classify_document(text, 2);
        assert_eq!(c.document_type, DocumentType::RepairEstimate);
    }

    #[test]
    fn classifies_medical_bill() {
        let text = "Mercy Hospital Billing\nPatient: John Park\nProvider: Dr. Alice Wong\n\
                    Date of Service: 03/02/2024\nCPT 99213 Office visit\nTotal Charges: $240.00";
        assert_eq!(classify_document(text, 2).document_type, DocumentType::MedicalBill);
    }

    #[test]
    fn classifies_police_report() {
        let text = "Springfield Police Department\nAccident Report\nReport Number: 24-00817\n\
                    Officer: Sgt. Dana Cole, Badge 4471\nWitness statements attached.";
        assert_eq!(classify_document(text, 2).document_type, DocumentType::PoliceReport);
    }

    #[test]
    fn too_few_hits_is_unknown() {
        let c = classify_document("Thank you for your letter of last week.", 2);
        assert_eq!(c.document_type, DocumentType::Unknown);
        assert_eq!(c.confidence, 0.0);

        let c = classify_document("Your premium is due.", 2);
        assert_eq!(c.document_type, DocumentType::Unknown);
    }

    #[test]
    fn confidence_is_winner_share_of_all_hits() {
        // policy: policy, premium, coverage = 3; repair: repair = 1
        let c = classify_document("policy premium coverage repair", 2);
        assert_eq!(c.document_type, DocumentType::Policy);
        assert!((c.confidence - 0.75).abs() < 1e-9);
    }

    #[test]
    fn terms_match_whole_words_only() {
        // "policy" inside "policyholders" and "parts" inside "departs" don't count
        assert_eq!(count_term("the policyholders", "policy"), 0);
        assert_eq!(count_term("train departs", "parts"), 0);
        assert_eq!(count_term("policy, policy.", "policy"), 2);
    }

    #[test]
    fn parse_dates_in_common_formats() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 15);
        assert_eq!(parse_document_date("2024-01-15"), d);
        assert_eq!(parse_document_date("01/15/2024"), d);
        assert_eq!(parse_document_date("15/01/2024"), d);
        assert_eq!(parse_document_date("January 15, 2024"), d);
        assert_eq!(parse_document_date("Jan. 15, 2024"), d);
        assert_eq!(parse_document_date("15 January 2024"), d);
    }

    #[test]
    fn ambiguous_dates_read_as_us() {
        assert_eq!(
            parse_document_date("03/04/2024"),
            NaiveDate::from_ymd_opt(2024, 3, 4)
        );
    }

    #[test]
    fn invalid_dates_rejected() {
        assert_eq!(parse_document_date(""), None);
        assert_eq!(parse_document_date("13/13/2024"), None);
        assert_eq!(parse_document_date("sometime"), None);
    }

    #[test]
    fn parse_amounts() {
        assert_eq!(parse_amount("$12,500.00"), Some(12500.0));
        assert_eq!(parse_amount("10000"), Some(10000.0));
        assert_eq!(parse_amount("€ 1.250,50"), Some(1250.5));
        assert_eq!(parse_amount("450,75"), Some(450.75));
        assert_eq!(parse_amount("1,250,000"), Some(1_250_000.0));
        assert_eq!(parse_amount("$"), None);
    }
}
