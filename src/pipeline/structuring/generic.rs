//! Fallback extraction for documents no vocabulary claimed.

use std::sync::LazyLock;

use regex::Regex;

use super::classify::{parse_amount, parse_document_date};
use super::patterns::DATE;
use crate::models::document::GenericFields;

static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DATE).expect("Invalid date regex pattern"));

/// Amounts need a currency marker; bare numbers are too ambiguous.
static AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:[$€£]\s*(\d[\d,]*(?:\.\d{1,2})?))|(?:(\d[\d,]*(?:\.\d{1,2})?)\s*(?:USD|EUR|GBP)\b)")
        .expect("Invalid amount regex pattern")
});

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Z][a-z]+(?:[ ][A-Z]\.)?[ ]+[A-Z][a-z]+(?:-[A-Z][a-z]+)?)\b")
        .expect("Invalid name regex pattern")
});

static ADDRESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(\d{1,6}\s+(?:[A-Z][a-z]+\s+){1,4}(?:Street|St|Avenue|Ave|Road|Rd|Boulevard|Blvd|Lane|Ln|Drive|Dr|Court|Ct|Way|Place|Pl)\b\.?)",
    )
    .expect("Invalid address regex pattern")
});

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"((?:\+1[\s.\-]?)?\(?\d{3}\)?[\s.\-]?\d{3}[\s.\-]\d{4})\b")
        .expect("Invalid phone regex pattern")
});

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,})")
        .expect("Invalid email regex pattern")
});

static REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Z]{2,5}-?\d{4,}(?:-\d+)?)\b").expect("Invalid reference regex pattern")
});

/// Capitalised word pairs that are form labels, not people.
const NAME_STOPWORDS: &[&str] = &[
    "The", "This", "That", "Date", "Total", "Amount", "Policy", "Claim", "Invoice", "Page",
    "Dear", "Account", "Phone", "Email", "Street", "Avenue", "Thank", "Please", "Number",
];

fn push_unique<T: PartialEq>(out: &mut Vec<T>, value: T) {
    if !out.contains(&value) {
        out.push(value);
    }
}

/// Every date found in the text, in order of first appearance.
pub fn find_dates(text: &str) -> Vec<chrono::NaiveDate> {
    let mut dates = Vec::new();
    for m in DATE_RE.find_iter(text) {
        if let Some(d) = parse_document_date(m.as_str()) {
            push_unique(&mut dates, d);
        }
    }
    dates
}

pub fn extract_generic(text: &str) -> GenericFields {
    let mut fields = GenericFields {
        dates: find_dates(text),
        ..Default::default()
    };

    for c in AMOUNT_RE.captures_iter(text) {
        if let Some(v) = c.get(1).or_else(|| c.get(2)).and_then(|m| parse_amount(m.as_str())) {
            push_unique(&mut fields.amounts, v);
        }
    }

    for c in NAME_RE.captures_iter(text) {
        let name = c[1].to_string();
        let first = name.split_whitespace().next().unwrap_or_default();
        let last = name.split_whitespace().last().unwrap_or_default();
        if NAME_STOPWORDS.contains(&first) || NAME_STOPWORDS.contains(&last) {
            continue;
        }
        push_unique(&mut fields.names, name);
    }

    for (re, out) in [
        (&*ADDRESS_RE, &mut fields.addresses),
        (&*PHONE_RE, &mut fields.phone_numbers),
        (&*EMAIL_RE, &mut fields.emails),
        (&*REFERENCE_RE, &mut fields.reference_numbers),
    ] {
        for c in re.captures_iter(text) {
            push_unique(out, c[1].trim().to_string());
        }
    }

    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const LETTER: &str = "Dear Customer,\n\
        Maria Lopez called on 2024-02-10 about claim CLM-20240017.\n\
        She paid $1,250.00 and a further 300.00 USD on March 1, 2024.\n\
        Address: 42 Elm Street, Springfield\n\
        Contact: (555) 123-4567 or maria.lopez@example.com\n\
        Reference ABC12345 was also quoted. Thank You.";

    #[test]
    fn collects_dates_in_order() {
        let f = extract_generic(LETTER);
        assert_eq!(
            f.dates,
            vec![
                NaiveDate::from_ymd_opt(2024, 2, 10).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
            ]
        );
    }

    #[test]
    fn collects_marked_amounts_only() {
        let f = extract_generic(LETTER);
        assert_eq!(f.amounts, vec![1250.0, 300.0]);
    }

    #[test]
    fn collects_names_skipping_labels() {
        let f = extract_generic(LETTER);
        assert!(f.names.contains(&"Maria Lopez".to_string()));
        assert!(!f.names.iter().any(|n| n.starts_with("Dear") || n.starts_with("Thank")));
    }

    #[test]
    fn collects_contact_details() {
        let f = extract_generic(LETTER);
        assert_eq!(f.addresses, vec!["42 Elm Street"]);
        assert_eq!(f.phone_numbers, vec!["(555) 123-4567"]);
        assert_eq!(f.emails, vec!["maria.lopez@example.com"]);
    }

    #[test]
    fn collects_reference_numbers() {
        let f = extract_generic(LETTER);
        assert!(f.reference_numbers.contains(&"CLM-20240017".to_string()));
        assert!(f.reference_numbers.contains(&"ABC12345".to_string()));
    }

    #[test]
    fn duplicates_collapsed() {
        let f = extract_generic("Paid $10.00, then $10.00 again on 2024-01-01 and 2024-01-01.");
        assert_eq!(f.amounts, vec![10.0]);
        assert_eq!(f.dates.len(), 1);
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert_eq!(extract_generic(""), GenericFields::default());
    }
}
