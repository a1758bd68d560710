//! OCR-vs-form validation.
//!
//! Each comparison yields its own verdict and at most one scored indicator.
//! "Not found" is always distinct from a mismatch: a document that simply
//! lacks a field costs little and never invalidates the claim.

use chrono::NaiveDate;

use super::similarity::{normalize_name, normalize_policy_number, similarity};
use crate::models::document::{ExtractedDocument, StructuredFields};
use crate::models::enums::{CoverageKind, DocumentType};
use crate::models::validation::{
    AuthenticityCheck, CoverageCheck, DocumentValidationResult, FieldMatch, PolicyWindowCheck,
};
use crate::models::{ClaimSubmission, Extracted};
use crate::pipeline::Findings;
use crate::pipeline_config::ValidationPenalties;

/// Compare an extracted document against the submitted claim form. Total.
pub fn validate_document_data(
    document: &ExtractedDocument,
    submission: &ClaimSubmission,
    cfg: &ValidationPenalties,
) -> DocumentValidationResult {
    let mut findings = Findings::new();
    let mut warnings = Vec::new();

    check_readability(document, cfg, &mut findings, &mut warnings);

    let policy_number = compare_policy_number(
        policy_number_of(&document.fields),
        &submission.policy_number,
        cfg,
        &mut findings,
        &mut warnings,
    );
    let claimant_name = compare_name(
        holder_name_of(&document.fields),
        &submission.claimant_name,
        cfg,
        &mut findings,
        &mut warnings,
    );
    let coverage = check_coverage(document, submission.amount(), cfg, &mut findings, &mut warnings);
    let policy_window = check_policy_window(document, submission.incident_date, cfg, &mut findings);
    let authenticity = check_authenticity(document, cfg, &mut findings, &mut warnings);
    check_document_type(document, cfg, &mut findings, &mut warnings);

    if document.error.is_none() && document.ocr_confidence < cfg.low_ocr_confidence {
        warnings.push(format!(
            "Low text confidence ({:.0}%): extracted fields may be unreliable",
            document.ocr_confidence
        ));
    }

    let mut result = DocumentValidationResult {
        policy_number,
        claimant_name,
        coverage,
        policy_window,
        authenticity,
        score: findings.score(),
        indicators: findings.indicators,
        warnings,
        is_valid: true,
    };
    result.is_valid = !result.has_invalidating_verdict();

    tracing::info!(
        claim_id = %submission.claim_id,
        document_id = %document.document_id,
        score = result.score,
        indicators = result.indicators.len(),
        warnings = result.warnings.len(),
        is_valid = result.is_valid,
        "Document validation complete"
    );
    result
}

fn policy_number_of(fields: &StructuredFields) -> &Extracted<String> {
    static NOT_FOUND: Extracted<String> = Extracted::NotFound;
    match fields {
        StructuredFields::Policy(p) => &p.policy_number,
        _ => &NOT_FOUND,
    }
}

/// Whose name the document is issued to, for the types that carry one.
fn holder_name_of(fields: &StructuredFields) -> &Extracted<String> {
    static NOT_FOUND: Extracted<String> = Extracted::NotFound;
    match fields {
        StructuredFields::Policy(p) => &p.policy_holder,
        StructuredFields::MedicalBill(m) => &m.patient_name,
        _ => &NOT_FOUND,
    }
}

fn check_readability(
    document: &ExtractedDocument,
    cfg: &ValidationPenalties,
    findings: &mut Findings,
    warnings: &mut Vec<String>,
) {
    if document.is_unreadable() {
        findings.flag(
            "Document could not be read - possible corrupt file",
            cfg.unreadable_document,
        );
    } else if document.extraction_limited {
        warnings.push(match &document.error {
            Some(reason) => format!("Document text could not be extracted: {reason}"),
            None => "Document text only partially extracted".to_string(),
        });
    }
}

fn compare_policy_number(
    extracted: &Extracted<String>,
    submitted: &str,
    cfg: &ValidationPenalties,
    findings: &mut Findings,
    warnings: &mut Vec<String>,
) -> FieldMatch {
    let found = match extracted {
        Extracted::Found(v) => v,
        Extracted::NotFound | Extracted::Error(_) => {
            if let Extracted::Error(reason) = extracted {
                warnings.push(format!("Policy number unreadable in document: {reason}"));
            }
            findings.flag("Policy number not found in document", cfg.policy_not_found);
            return FieldMatch::NotFound;
        }
    };

    let (doc, form) = (normalize_policy_number(found), normalize_policy_number(submitted));
    if doc == form {
        return FieldMatch::ExactMatch;
    }

    let sim = similarity(&doc, &form);
    tracing::debug!(similarity = sim, "Policy number differs after normalisation");
    if sim >= cfg.policy_probable_similarity {
        warnings.push(format!(
            "Policy number probable OCR variance: document shows {found}, claim states {submitted}"
        ));
        FieldMatch::ProbableMatch { similarity: sim }
    } else {
        findings.flag(
            format!(
                "Policy number mismatch: document shows {found}, claim states {submitted} (similarity {sim:.2})"
            ),
            cfg.policy_mismatch,
        );
        FieldMatch::Mismatch { similarity: sim }
    }
}

fn compare_name(
    extracted: &Extracted<String>,
    submitted: &str,
    cfg: &ValidationPenalties,
    findings: &mut Findings,
    warnings: &mut Vec<String>,
) -> FieldMatch {
    let found = match extracted {
        Extracted::Found(v) => v,
        Extracted::NotFound | Extracted::Error(_) => {
            findings.flag("Claimant name not found in document", cfg.name_not_found);
            return FieldMatch::NotFound;
        }
    };

    let sim = similarity(&normalize_name(found), &normalize_name(submitted));
    if sim >= cfg.name_match_similarity {
        FieldMatch::ExactMatch
    } else if sim >= cfg.name_probable_similarity {
        warnings.push(format!(
            "Claimant name differs slightly: document shows {found}, claim states {submitted}"
        ));
        FieldMatch::ProbableMatch { similarity: sim }
    } else {
        findings.flag(
            format!("Claimant name mismatch: document shows {found}, claim states {submitted}"),
            cfg.name_mismatch,
        );
        FieldMatch::Mismatch { similarity: sim }
    }
}

/// Most specific limit on the policy: peril-specific before liability and
/// generic totals.
pub fn select_coverage_limit(document: &ExtractedDocument) -> Option<(CoverageKind, f64)> {
    let limits = &document.policy_fields()?.coverage_limits;
    CoverageKind::SPECIFICITY_ORDER
        .iter()
        .find_map(|kind| limits.get(kind).map(|limit| (*kind, *limit)))
}

fn check_coverage(
    document: &ExtractedDocument,
    claim_amount: f64,
    cfg: &ValidationPenalties,
    findings: &mut Findings,
    warnings: &mut Vec<String>,
) -> CoverageCheck {
    let Some((kind, limit)) = select_coverage_limit(document) else {
        return CoverageCheck::NotFound;
    };

    if claim_amount > limit {
        findings.flag(
            format!("Claim amount ${claim_amount:.2} exceeds {kind} coverage limit ${limit:.2}"),
            cfg.coverage_exceeded,
        );
        CoverageCheck::Exceeds { kind, limit }
    } else if claim_amount >= limit * cfg.coverage_warning_ratio {
        warnings.push(format!(
            "Claim amount ${claim_amount:.2} is close to {kind} coverage limit ${limit:.2}"
        ));
        CoverageCheck::NearLimit { kind, limit }
    } else {
        CoverageCheck::WithinLimit { kind, limit }
    }
}

fn check_policy_window(
    document: &ExtractedDocument,
    incident: NaiveDate,
    cfg: &ValidationPenalties,
    findings: &mut Findings,
) -> PolicyWindowCheck {
    let Some(policy) = document.policy_fields() else {
        return PolicyWindowCheck::NotFound;
    };
    let effective = policy.effective_date.found().copied();
    let expiration = policy.expiration_date.found().copied();

    if let Some(effective) = effective.filter(|d| incident < *d) {
        findings.flag(
            format!("Incident date {incident} is before policy effective date {effective}"),
            cfg.before_effective,
        );
        return PolicyWindowCheck::BeforeEffective { effective };
    }
    if let Some(expiration) = expiration.filter(|d| incident > *d) {
        findings.flag(
            format!("Incident date {incident} is after policy expiration date {expiration}"),
            cfg.after_expiration,
        );
        return PolicyWindowCheck::AfterExpiration { expiration };
    }

    if effective.is_some() || expiration.is_some() {
        PolicyWindowCheck::WithinWindow
    } else {
        PolicyWindowCheck::NotFound
    }
}

fn check_authenticity(
    document: &ExtractedDocument,
    cfg: &ValidationPenalties,
    findings: &mut Findings,
    warnings: &mut Vec<String>,
) -> AuthenticityCheck {
    let assessment = &document.authenticity;
    if !assessment.is_authentic {
        findings.flag(
            format!(
                "Document authenticity check failed ({:.0}% confidence): {}",
                assessment.confidence,
                assessment.flags.join("; ")
            ),
            cfg.authenticity_failed,
        );
        return AuthenticityCheck::Forgery {
            confidence: assessment.confidence,
        };
    }
    if !assessment.flags.is_empty() {
        warnings.push(format!(
            "Document has suspicious elements: {}",
            assessment.flags.join("; ")
        ));
        return AuthenticityCheck::Suspicious {
            flags: assessment.flags.clone(),
        };
    }
    AuthenticityCheck::Authentic
}

fn check_document_type(
    document: &ExtractedDocument,
    cfg: &ValidationPenalties,
    findings: &mut Findings,
    warnings: &mut Vec<String>,
) {
    let classification = &document.classification;
    if matches!(
        classification.document_type,
        DocumentType::Policy | DocumentType::Unknown
    ) || classification.confidence < cfg.document_type_min_confidence
    {
        return;
    }
    findings.flag(
        format!(
            "Expected a policy document, found {}",
            classification.document_type
        ),
        cfg.document_type_mismatch,
    );
    warnings.push(format!(
        "Document classified as {} ({:.0}% confidence)",
        classification.document_type,
        classification.confidence * 100.0
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::{
        AuthenticityAssessment, Classification, ExtractionMethod, MedicalBillFields, PolicyFields,
    };
    use crate::models::enums::ClaimType;
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn submission() -> ClaimSubmission {
        ClaimSubmission {
            claim_id: "CLM-42".into(),
            policy_number: "POL123456".into(),
            claimant_name: "Jane Smith".into(),
            claimant_email: "jane@example.com".into(),
            claim_type: ClaimType::Auto,
            incident_date: date(2024, 5, 10),
            submitted_on: date(2024, 5, 12),
            claim_amount: 5_000.0,
            description: "Rear-ended at a stop light, bumper and trunk damaged.".into(),
        }
    }

    fn policy() -> PolicyFields {
        PolicyFields {
            policy_number: Extracted::Found("POL-123456".into()),
            policy_holder: Extracted::Found("Jane Smith".into()),
            effective_date: Extracted::Found(date(2024, 1, 1)),
            expiration_date: Extracted::Found(date(2025, 1, 1)),
            coverage_limits: BTreeMap::from([
                (CoverageKind::Collision, 10_000.0),
                (CoverageKind::Total, 100_000.0),
            ]),
            ..Default::default()
        }
    }

    fn document(fields: StructuredFields) -> ExtractedDocument {
        let document_type = match &fields {
            StructuredFields::Policy(_) => DocumentType::Policy,
            StructuredFields::MedicalBill(_) => DocumentType::MedicalBill,
            _ => DocumentType::Unknown,
        };
        ExtractedDocument {
            document_id: Uuid::nil(),
            content_hash: "abc".into(),
            mime_type: "application/pdf".into(),
            method: ExtractionMethod::PdfDirect,
            pages: vec![],
            raw_text: String::new(),
            tables: vec![],
            classification: Classification {
                document_type,
                confidence: 0.9,
                keyword_matches: BTreeMap::new(),
            },
            fields,
            language: "eng".into(),
            authenticity: AuthenticityAssessment::default(),
            ocr_confidence: 95.0,
            field_completeness: 1.0,
            overall_confidence: 95.0,
            extraction_limited: false,
            error: None,
        }
    }

    fn validate(doc: &ExtractedDocument, sub: &ClaimSubmission) -> DocumentValidationResult {
        validate_document_data(doc, sub, &ValidationPenalties::default())
    }

    #[test]
    fn clean_policy_matches_everything() {
        let result = validate(&document(StructuredFields::Policy(policy())), &submission());
        // Hyphenated vs plain policy numbers normalise to the same value
        assert_eq!(result.policy_number, FieldMatch::ExactMatch);
        assert_eq!(result.claimant_name, FieldMatch::ExactMatch);
        assert_eq!(
            result.coverage,
            CoverageCheck::WithinLimit {
                kind: CoverageKind::Collision,
                limit: 10_000.0
            }
        );
        assert_eq!(result.policy_window, PolicyWindowCheck::WithinWindow);
        assert_eq!(result.authenticity, AuthenticityCheck::Authentic);
        assert_eq!(result.score, 0.0);
        assert!(result.indicators.is_empty());
        assert!(result.is_valid);
    }

    #[test]
    fn different_policy_number_is_mismatch() {
        let mut fields = policy();
        fields.policy_number = Extracted::Found("POL-999999".into());
        let mut sub = submission();
        sub.policy_number = "POL-123456".into();

        let result = validate(&document(StructuredFields::Policy(fields)), &sub);
        assert!(matches!(result.policy_number, FieldMatch::Mismatch { similarity } if similarity < 0.9));
        assert_eq!(result.score, 40.0);
        assert!(!result.is_valid);
    }

    #[test]
    fn near_policy_number_is_probable_match() {
        let mut fields = policy();
        fields.policy_number = Extracted::Found("POL-1234567890".into());
        let mut sub = submission();
        sub.policy_number = "POL-1234567B90".into();

        let result = validate(&document(StructuredFields::Policy(fields)), &sub);
        assert!(matches!(result.policy_number, FieldMatch::ProbableMatch { .. }));
        assert_eq!(result.score, 0.0);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.is_valid);
    }

    #[test]
    fn missing_policy_number_is_not_a_mismatch() {
        let mut fields = policy();
        fields.policy_number = Extracted::NotFound;
        let result = validate(&document(StructuredFields::Policy(fields)), &submission());
        assert_eq!(result.policy_number, FieldMatch::NotFound);
        assert_eq!(result.score, 10.0);
        assert!(result.is_valid);
    }

    #[test]
    fn name_with_suffix_matches() {
        let mut fields = policy();
        fields.policy_holder = Extracted::Found("JANE SMITH JR.".into());
        let result = validate(&document(StructuredFields::Policy(fields)), &submission());
        assert_eq!(result.claimant_name, FieldMatch::ExactMatch);
    }

    #[test]
    fn nickname_is_probable_name_match() {
        let mut sub = submission();
        sub.claimant_name = "Janet Smith".into();
        let result = validate(&document(StructuredFields::Policy(policy())), &sub);
        assert!(matches!(result.claimant_name, FieldMatch::ProbableMatch { .. }));
        assert!(result.is_valid);
    }

    #[test]
    fn different_name_is_mismatch() {
        let mut sub = submission();
        sub.claimant_name = "Robert Johnson".into();
        let result = validate(&document(StructuredFields::Policy(policy())), &sub);
        assert!(matches!(result.claimant_name, FieldMatch::Mismatch { .. }));
        assert_eq!(result.score, 30.0);
        assert!(!result.is_valid);
    }

    #[test]
    fn claim_above_collision_limit_exceeds() {
        let mut sub = submission();
        sub.claim_amount = 12_000.0;
        let result = validate(&document(StructuredFields::Policy(policy())), &sub);
        assert_eq!(
            result.coverage,
            CoverageCheck::Exceeds {
                kind: CoverageKind::Collision,
                limit: 10_000.0
            }
        );
        assert!(result.indicators[0].contains("exceeds collision coverage"));
        assert_eq!(result.score, 35.0);
        assert!(!result.is_valid);
    }

    #[test]
    fn claim_near_limit_only_warns() {
        let mut sub = submission();
        sub.claim_amount = 9_500.0;
        let result = validate(&document(StructuredFields::Policy(policy())), &sub);
        assert!(matches!(result.coverage, CoverageCheck::NearLimit { .. }));
        assert_eq!(result.score, 0.0);
        assert!(result.is_valid);
    }

    #[test]
    fn total_limit_used_when_no_peril_limit() {
        let mut fields = policy();
        fields.coverage_limits.remove(&CoverageKind::Collision);
        let result = validate(&document(StructuredFields::Policy(fields)), &submission());
        assert!(matches!(
            result.coverage,
            CoverageCheck::WithinLimit { kind: CoverageKind::Total, .. }
        ));
    }

    #[test]
    fn incident_outside_window_invalidates() {
        let mut sub = submission();
        sub.incident_date = date(2023, 12, 1);
        let before = validate(&document(StructuredFields::Policy(policy())), &sub);
        assert!(matches!(before.policy_window, PolicyWindowCheck::BeforeEffective { .. }));
        assert_eq!(before.score, 35.0);
        assert!(!before.is_valid);

        sub.incident_date = date(2025, 2, 1);
        let after = validate(&document(StructuredFields::Policy(policy())), &sub);
        assert!(matches!(after.policy_window, PolicyWindowCheck::AfterExpiration { .. }));
        assert_eq!(after.score, 40.0);
        assert!(!after.is_valid);
    }

    #[test]
    fn forgery_invalidates_and_suspicion_warns() {
        let mut doc = document(StructuredFields::Policy(policy()));
        doc.authenticity = AuthenticityAssessment {
            is_authentic: false,
            confidence: 35.0,
            flags: vec!["Placeholder text present".into()],
        };
        let result = validate(&doc, &submission());
        assert_eq!(result.authenticity, AuthenticityCheck::Forgery { confidence: 35.0 });
        assert!(!result.is_valid);

        doc.authenticity = AuthenticityAssessment {
            is_authentic: true,
            confidence: 80.0,
            flags: vec!["Mixed currency notation".into()],
        };
        let result = validate(&doc, &submission());
        assert!(matches!(result.authenticity, AuthenticityCheck::Suspicious { .. }));
        assert_eq!(result.score, 0.0);
        assert!(result.is_valid);
    }

    #[test]
    fn non_policy_document_costs_a_little() {
        let bill = MedicalBillFields {
            patient_name: Extracted::Found("Jane Smith".into()),
            ..Default::default()
        };
        let result = validate(&document(StructuredFields::MedicalBill(bill)), &submission());
        assert_eq!(result.claimant_name, FieldMatch::ExactMatch);
        assert_eq!(result.policy_number, FieldMatch::NotFound);
        assert_eq!(result.coverage, CoverageCheck::NotFound);
        assert_eq!(result.policy_window, PolicyWindowCheck::NotFound);
        // Not found (10) + type mismatch (10)
        assert_eq!(result.score, 20.0);
        assert!(result.is_valid);
    }

    #[test]
    fn low_ocr_confidence_warns_without_penalty() {
        let mut doc = document(StructuredFields::Policy(policy()));
        doc.ocr_confidence = 30.0;
        let result = validate(&doc, &submission());
        assert_eq!(result.score, 0.0);
        assert!(result.warnings.iter().any(|w| w.contains("Low text confidence")));
    }

    #[test]
    fn unreadable_document_is_penalised_but_valid() {
        let doc = ExtractedDocument::failed(
            Uuid::nil(),
            "abc".into(),
            "application/octet-stream".into(),
            "Unsupported format".into(),
            false,
        );
        let result = validate(&doc, &submission());
        assert!(result.indicators[0].contains("could not be read"));
        // Unreadable (25) + policy number (10) + name (5)
        assert_eq!(result.score, 40.0);
        assert!(result.is_valid);
    }

    #[test]
    fn limited_extraction_warns_only() {
        let doc = ExtractedDocument::failed(
            Uuid::nil(),
            "abc".into(),
            "image/png".into(),
            "No OCR engine available".into(),
            true,
        );
        let result = validate(&doc, &submission());
        assert!(!result.indicators.iter().any(|i| i.contains("could not be read")));
        assert!(result.warnings[0].contains("No OCR engine available"));
    }

    #[test]
    fn invalid_iff_some_definite_negative_verdict() {
        let mut sub = submission();
        sub.claim_amount = 50_000.0;
        sub.claimant_name = "Someone Else".into();
        let result = validate(&document(StructuredFields::Policy(policy())), &sub);
        assert!(result.has_invalidating_verdict());
        assert!(!result.is_valid);
        assert_eq!(result.indicators.len(), 2);
        assert_eq!(result.score, 65.0);

        let ok = validate(&document(StructuredFields::Policy(policy())), &submission());
        assert!(!ok.has_invalidating_verdict());
        assert!(ok.is_valid);
    }

    #[test]
    fn validation_is_deterministic() {
        let doc = document(StructuredFields::Policy(policy()));
        assert_eq!(validate(&doc, &submission()), validate(&doc, &submission()));
    }
}
