//! Weighted fusion of the behavioral, document and image sub-scores.

use crate::models::enums::RiskLevel;
use crate::models::fraud::{FraudAnalysis, ScoreBreakdown};
use crate::models::image::AggregateImageResult;
use crate::models::validation::DocumentValidationResult;
use crate::models::ClaimSubmission;
use crate::pipeline::clamp_score;
use crate::pipeline_config::{DecisionThresholds, FusionWeights, PipelineConfig, WeightSet};

use super::behavior::evaluate_behavior;

/// Weight set for the signals actually present.
pub fn select_weights(weights: &FusionWeights, has_document: bool, has_images: bool) -> WeightSet {
    match (has_document, has_images) {
        (true, true) => weights.all_signals,
        (true, false) => weights.text_and_document,
        (false, true) => weights.text_and_image,
        (false, false) => weights.text_only,
    }
}

pub fn risk_level_for(score: u8, thresholds: &DecisionThresholds) -> RiskLevel {
    if score >= thresholds.high_risk {
        RiskLevel::High
    } else if score >= thresholds.medium_risk {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Fuse every available signal into one integer fraud score. Pure.
///
/// Each component is clamped to 0-100 before weighting. Indicators come out
/// behavioral first, then document validation, then images.
pub fn analyze_claim(
    claim: &ClaimSubmission,
    validation: Option<&DocumentValidationResult>,
    images: Option<&AggregateImageResult>,
    config: &PipelineConfig,
) -> FraudAnalysis {
    let behavior = evaluate_behavior(claim, &config.behavior);
    let text_score = behavior.score();
    let document_score = validation.map(|v| clamp_score(v.score));
    let image_score = images.map(|i| clamp_score(i.score));

    let weights = select_weights(&config.fusion, document_score.is_some(), image_score.is_some());
    let fused = text_score * weights.text
        + document_score.unwrap_or(0.0) * weights.document
        + image_score.unwrap_or(0.0) * weights.image;
    let fraud_score = clamp_score(fused).round() as u8;

    let mut indicators = behavior.indicators;
    if let Some(v) = validation {
        indicators.extend(v.indicators.iter().cloned());
    }
    if let Some(i) = images {
        indicators.extend(i.fraud_indicators.iter().cloned());
    }

    let risk_level = risk_level_for(fraud_score, &config.decision);

    tracing::info!(
        claim_id = %claim.claim_id,
        fraud_score,
        text_score,
        document_score = ?document_score,
        image_score = ?image_score,
        risk = %risk_level,
        indicators = indicators.len(),
        "Claim analysis complete"
    );

    FraudAnalysis {
        fraud_score,
        indicators,
        breakdown: ScoreBreakdown {
            text_score,
            document_score,
            image_score,
            weights,
        },
        risk_level,
        recommendation: risk_level.recommendation(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::{ClaimType, Recommendation};
    use crate::models::validation::{
        AuthenticityCheck, CoverageCheck, FieldMatch, PolicyWindowCheck,
    };
    use chrono::NaiveDate;

    fn claim() -> ClaimSubmission {
        ClaimSubmission {
            claim_id: "CLM-9".into(),
            policy_number: "POL-123456".into(),
            claimant_name: "Jane Smith".into(),
            claimant_email: "jane@example.com".into(),
            claim_type: ClaimType::Auto,
            // Tuesday
            incident_date: NaiveDate::from_ymd_opt(2024, 5, 7).unwrap(),
            submitted_on: NaiveDate::from_ymd_opt(2024, 5, 7).unwrap(),
            claim_amount: 15_000.0,
            description: "Rear-ended at a red light on Main Street, bumper and trunk lid crushed."
                .into(),
        }
    }

    fn validation(score: f64, indicator: &str) -> DocumentValidationResult {
        DocumentValidationResult {
            policy_number: FieldMatch::ExactMatch,
            claimant_name: FieldMatch::ExactMatch,
            coverage: CoverageCheck::NotFound,
            policy_window: PolicyWindowCheck::NotFound,
            authenticity: AuthenticityCheck::Authentic,
            score,
            indicators: vec![indicator.into()],
            warnings: vec![],
            is_valid: true,
        }
    }

    fn images(score: f64, indicator: &str) -> AggregateImageResult {
        AggregateImageResult {
            images: vec![],
            duplicate_pairs: vec![],
            fraud_indicators: vec![indicator.into()],
            score,
            confidence: 80.0,
        }
    }

    #[test]
    fn text_only_same_day_claim() {
        let cfg = PipelineConfig::default();
        let analysis = analyze_claim(&claim(), None, None, &cfg);
        assert_eq!(analysis.indicators, vec!["Claim submitted on the same day as the incident"]);
        assert_eq!(analysis.fraud_score, 20);
        assert_eq!(analysis.breakdown.weights, cfg.fusion.text_only);
        assert_eq!(analysis.breakdown.document_score, None);
        assert_eq!(analysis.risk_level, RiskLevel::Low);
        assert_eq!(analysis.recommendation, Recommendation::AutoApprove);
    }

    #[test]
    fn all_signals_weighted() {
        let cfg = PipelineConfig::default();
        let v = validation(40.0, "doc");
        let i = images(50.0, "img");
        let analysis = analyze_claim(&claim(), Some(&v), Some(&i), &cfg);
        // 20*.35 + 40*.35 + 50*.30 = 36
        assert_eq!(analysis.fraud_score, 36);
        assert_eq!(analysis.breakdown.weights, cfg.fusion.all_signals);
    }

    #[test]
    fn text_and_document_split_evenly() {
        let v = validation(60.0, "doc");
        let analysis = analyze_claim(&claim(), Some(&v), None, &PipelineConfig::default());
        assert_eq!(analysis.fraud_score, 40);
        assert_eq!(analysis.risk_level, RiskLevel::Medium);
        assert_eq!(analysis.recommendation, Recommendation::AdditionalVerification);
    }

    #[test]
    fn text_and_image_weighted() {
        let i = images(100.0, "img");
        let analysis = analyze_claim(&claim(), None, Some(&i), &PipelineConfig::default());
        // 20*.6 + 100*.4 = 52
        assert_eq!(analysis.fraud_score, 52);
    }

    #[test]
    fn indicators_ordered_behavior_document_image() {
        let v = validation(10.0, "doc");
        let i = images(10.0, "img");
        let analysis = analyze_claim(&claim(), Some(&v), Some(&i), &PipelineConfig::default());
        assert_eq!(
            analysis.indicators,
            vec!["Claim submitted on the same day as the incident", "doc", "img"]
        );
    }

    #[test]
    fn out_of_range_components_are_clamped() {
        let v = validation(250.0, "doc");
        let i = images(-30.0, "img");
        let analysis = analyze_claim(&claim(), Some(&v), Some(&i), &PipelineConfig::default());
        assert_eq!(analysis.breakdown.document_score, Some(100.0));
        assert_eq!(analysis.breakdown.image_score, Some(0.0));
        // 20*.35 + 100*.35 = 42
        assert_eq!(analysis.fraud_score, 42);
        assert!(analysis.fraud_score <= 100);
    }

    #[test]
    fn adding_a_violation_never_lowers_the_score() {
        let cfg = PipelineConfig::default();
        let v = validation(30.0, "doc");
        let base = analyze_claim(&claim(), Some(&v), None, &cfg);

        let mut worse = claim();
        worse.description = "Car hit.".into();
        let worse = analyze_claim(&worse, Some(&v), None, &cfg);
        assert!(worse.fraud_score >= base.fraud_score);
        assert!(worse.indicators.len() > base.indicators.len());
    }

    #[test]
    fn risk_boundaries() {
        let t = DecisionThresholds::default();
        assert_eq!(risk_level_for(39, &t), RiskLevel::Low);
        assert_eq!(risk_level_for(40, &t), RiskLevel::Medium);
        assert_eq!(risk_level_for(69, &t), RiskLevel::Medium);
        assert_eq!(risk_level_for(70, &t), RiskLevel::High);
    }

    #[test]
    fn default_weight_sets_close() {
        let w = FusionWeights::default();
        for (doc, img) in [(true, true), (true, false), (false, true), (false, false)] {
            assert!((select_weights(&w, doc, img).sum() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn analysis_is_deterministic() {
        let cfg = PipelineConfig::default();
        let v = validation(33.0, "doc");
        assert_eq!(
            analyze_claim(&claim(), Some(&v), None, &cfg),
            analyze_claim(&claim(), Some(&v), None, &cfg)
        );
    }
}
