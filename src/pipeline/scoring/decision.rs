//! Score → disposition, with a reviewer-facing explanation.

use chrono::{DateTime, Utc};

use crate::models::enums::DecisionStatus;
use crate::models::fraud::{Decision, FraudAnalysis};
use crate::pipeline_config::DecisionThresholds;

/// Fixed explanation text per status.
pub struct ExplanationTemplates;

impl ExplanationTemplates {
    pub fn flagged(score: u8, amount: f64, indicators: &[String]) -> String {
        format!(
            "Claim flagged for manual review. Fraud score {score}/100 on a claim of ${amount:.2}.\n\
             Indicators:\n{}",
            bullet_list(indicators, "No specific indicators recorded.")
        )
    }

    pub fn pending(score: u8, amount: f64, indicators: &[String]) -> String {
        format!(
            "Claim pending additional verification. Fraud score {score}/100 on a claim of ${amount:.2}.\n\
             Indicators:\n{}",
            bullet_list(indicators, "No specific indicators recorded.")
        )
    }

    pub fn approved(score: u8, amount: f64, indicators: &[String]) -> String {
        let head = format!(
            "Claim approved. Fraud score {score}/100 on a claim of ${amount:.2} is within the low-risk range."
        );
        if indicators.is_empty() {
            head
        } else {
            format!("{head}\nMinor observations:\n{}", bullet_list(indicators, ""))
        }
    }
}

fn bullet_list(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        return format!("- {empty}");
    }
    items
        .iter()
        .map(|i| format!("- {i}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Disposition stamped with the current time.
pub fn make_decision(
    analysis: &FraudAnalysis,
    claim_amount: f64,
    thresholds: &DecisionThresholds,
) -> Decision {
    make_decision_at(analysis, claim_amount, Utc::now(), thresholds)
}

/// Deterministic form of [`make_decision`].
pub fn make_decision_at(
    analysis: &FraudAnalysis,
    claim_amount: f64,
    processed_at: DateTime<Utc>,
    thresholds: &DecisionThresholds,
) -> Decision {
    let score = analysis.fraud_score;
    let amount = claim_amount.max(0.0);
    let indicators = &analysis.indicators;

    let (status, confidence, explanation) = if score >= thresholds.high_risk {
        (
            DecisionStatus::Flagged,
            thresholds.flagged_confidence,
            ExplanationTemplates::flagged(score, amount, indicators),
        )
    } else if score >= thresholds.medium_risk {
        (
            DecisionStatus::Pending,
            thresholds.pending_confidence,
            ExplanationTemplates::pending(score, amount, indicators),
        )
    } else {
        (
            DecisionStatus::Approved,
            thresholds.approved_confidence,
            ExplanationTemplates::approved(score, amount, indicators),
        )
    };

    tracing::info!(status = %status, score, confidence, "Decision made");

    Decision {
        status,
        explanation,
        confidence,
        processed_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::{Recommendation, RiskLevel};
    use crate::models::fraud::ScoreBreakdown;
    use crate::pipeline_config::FusionWeights;
    use chrono::TimeZone;

    fn analysis(score: u8, indicators: &[&str]) -> FraudAnalysis {
        FraudAnalysis {
            fraud_score: score,
            indicators: indicators.iter().map(|s| s.to_string()).collect(),
            breakdown: ScoreBreakdown {
                text_score: score as f64,
                document_score: None,
                image_score: None,
                weights: FusionWeights::default().text_only,
            },
            risk_level: RiskLevel::Low,
            recommendation: Recommendation::AutoApprove,
        }
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap()
    }

    fn decide(score: u8) -> Decision {
        make_decision_at(&analysis(score, &[]), 1_000.0, at(), &DecisionThresholds::default())
    }

    #[test]
    fn boundaries_are_exact() {
        assert_eq!(decide(69).status, DecisionStatus::Pending);
        assert_eq!(decide(70).status, DecisionStatus::Flagged);
        assert_eq!(decide(39).status, DecisionStatus::Approved);
        assert_eq!(decide(40).status, DecisionStatus::Pending);
        assert_eq!(decide(0).status, DecisionStatus::Approved);
        assert_eq!(decide(100).status, DecisionStatus::Flagged);
    }

    #[test]
    fn confidence_per_status() {
        assert_eq!(decide(85).confidence, 95);
        assert_eq!(decide(55).confidence, 75);
        assert_eq!(decide(10).confidence, 90);
    }

    #[test]
    fn flagged_lists_every_indicator() {
        let a = analysis(82, &["Policy number mismatch", "Round claim amount: $20000"]);
        let d = make_decision_at(&a, 20_000.0, at(), &DecisionThresholds::default());
        assert!(d.explanation.contains("82/100"));
        assert!(d.explanation.contains("$20000.00"));
        assert!(d.explanation.contains("- Policy number mismatch\n- Round claim amount: $20000"));
    }

    #[test]
    fn approved_frames_indicators_as_minor() {
        let a = analysis(20, &["Claim submitted on the same day as the incident"]);
        let d = make_decision_at(&a, 15_000.0, at(), &DecisionThresholds::default());
        assert_eq!(d.status, DecisionStatus::Approved);
        assert!(d.explanation.contains("Minor observations:"));
        assert!(!d.explanation.contains("Indicators:"));
    }

    #[test]
    fn clean_approval_has_no_observation_block() {
        let d = decide(5);
        assert!(!d.explanation.contains("Minor observations"));
    }

    #[test]
    fn pending_without_indicators_says_so() {
        let d = decide(45);
        assert!(d.explanation.contains("- No specific indicators recorded."));
    }

    #[test]
    fn timestamp_is_what_was_passed() {
        assert_eq!(decide(10).processed_at, at());
        assert_eq!(decide(10), decide(10));
    }
}
