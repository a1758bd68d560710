//! Multi-image aggregation: mean score, internal duplicates, missing evidence.

use std::collections::HashSet;

use crate::models::image::{AggregateImageResult, ImageAnalysisResult};
use crate::pipeline::clamp_score;
use crate::pipeline_config::AggregateThresholds;

pub const NO_IMAGES_INDICATOR: &str = "No photographic evidence submitted";

/// Index pairs (i < j) whose perceptual hashes differ by fewer than
/// `max_distance` bits. Images without a hash are skipped.
pub fn internal_duplicates(images: &[ImageAnalysisResult], max_distance: u32) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for (i, a) in images.iter().enumerate() {
        let Some(hash_a) = a.perceptual_hash.found() else {
            continue;
        };
        for (j, b) in images.iter().enumerate().skip(i + 1) {
            if let Some(hash_b) = b.perceptual_hash.found() {
                if hash_a.hamming_distance(hash_b) < max_distance {
                    pairs.push((i, j));
                }
            }
        }
    }
    pairs
}

fn duplicate_indicator(count: usize) -> String {
    if count == 1 {
        "1 duplicate image pair found within this submission".to_string()
    } else {
        format!("{count} duplicate image pairs found within this submission")
    }
}

/// Combine per-image results. Commutative apart from indicator order,
/// which follows submission order.
pub fn aggregate_results(
    images: Vec<ImageAnalysisResult>,
    cfg: &AggregateThresholds,
) -> AggregateImageResult {
    if images.is_empty() {
        return AggregateImageResult {
            images,
            duplicate_pairs: vec![],
            fraud_indicators: vec![NO_IMAGES_INDICATOR.to_string()],
            score: clamp_score(cfg.no_images_penalty),
            confidence: 0.0,
        };
    }

    let count = images.len() as f64;
    let mean_score = images.iter().map(|r| r.score).sum::<f64>() / count;
    let confidence = images.iter().map(|r| r.confidence).sum::<f64>() / count;

    let mut seen = HashSet::new();
    let mut fraud_indicators: Vec<String> = images
        .iter()
        .flat_map(|r| r.fraud_indicators.iter())
        .filter(|i| seen.insert(i.as_str()))
        .cloned()
        .collect();

    let duplicate_pairs = internal_duplicates(&images, cfg.internal_duplicate_distance);
    let mut score = mean_score;
    if !duplicate_pairs.is_empty() {
        fraud_indicators.push(duplicate_indicator(duplicate_pairs.len()));
        score += cfg.internal_duplicate_penalty;
    }

    tracing::debug!(
        images = images.len(),
        duplicates = duplicate_pairs.len(),
        score,
        "Aggregated image results"
    );

    AggregateImageResult {
        images,
        duplicate_pairs,
        fraud_indicators,
        score: clamp_score(score),
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::image::ImageCheck;
    use crate::models::Extracted;
    use crate::pipeline::intake::PerceptualHash;

    fn image(score: f64, confidence: f64, hash: Option<Vec<u8>>, indicators: &[&str]) -> ImageAnalysisResult {
        ImageAnalysisResult {
            metadata: Extracted::NotFound,
            quality: Extracted::NotFound,
            tamper: Extracted::NotFound,
            perceptual_hash: hash.map(PerceptualHash::from_bytes).into(),
            content_hash: Extracted::NotFound,
            content_labels: vec![],
            fraud_indicators: indicators.iter().map(|s| s.to_string()).collect(),
            score,
            confidence,
            failed_checks: vec![ImageCheck::Metadata],
            error: None,
        }
    }

    fn hash_with_bits(bits: u8) -> Vec<u8> {
        let mut h = vec![0u8; 32];
        h[0] = bits;
        h
    }

    #[test]
    fn empty_submission_is_penalised() {
        let result = aggregate_results(vec![], &AggregateThresholds::default());
        assert_eq!(result.score, 30.0);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.fraud_indicators, vec![NO_IMAGES_INDICATOR]);
    }

    #[test]
    fn score_and_confidence_are_means() {
        let result = aggregate_results(
            vec![
                image(10.0, 100.0, Some(hash_with_bits(0x00)), &[]),
                image(30.0, 60.0, Some(hash_with_bits(0xFF)), &[]),
            ],
            &AggregateThresholds::default(),
        );
        assert_eq!(result.score, 20.0);
        assert_eq!(result.confidence, 80.0);
        assert!(result.duplicate_pairs.is_empty());
    }

    #[test]
    fn near_identical_pair_counted_once() {
        // Distance 2: below the internal threshold of 3
        let result = aggregate_results(
            vec![
                image(10.0, 100.0, Some(hash_with_bits(0b0000_0000)), &[]),
                image(10.0, 100.0, Some(hash_with_bits(0b0000_0011)), &[]),
            ],
            &AggregateThresholds::default(),
        );
        assert_eq!(result.duplicate_pairs, vec![(0, 1)]);
        assert_eq!(result.score, 30.0);
        assert_eq!(
            result.fraud_indicators,
            vec!["1 duplicate image pair found within this submission"]
        );
    }

    #[test]
    fn distance_three_is_not_internal_duplicate() {
        let result = aggregate_results(
            vec![
                image(0.0, 100.0, Some(hash_with_bits(0b000)), &[]),
                image(0.0, 100.0, Some(hash_with_bits(0b111)), &[]),
            ],
            &AggregateThresholds::default(),
        );
        assert!(result.duplicate_pairs.is_empty());
    }

    #[test]
    fn three_copies_make_three_pairs_one_penalty() {
        let h = hash_with_bits(0x01);
        let result = aggregate_results(
            vec![
                image(0.0, 100.0, Some(h.clone()), &[]),
                image(0.0, 100.0, Some(h.clone()), &[]),
                image(0.0, 100.0, Some(h), &[]),
            ],
            &AggregateThresholds::default(),
        );
        assert_eq!(result.duplicate_pairs, vec![(0, 1), (0, 2), (1, 2)]);
        assert_eq!(result.score, 20.0);
        assert!(result.fraud_indicators[0].starts_with("3 duplicate image pairs"));
    }

    #[test]
    fn missing_hashes_are_skipped() {
        let result = aggregate_results(
            vec![image(0.0, 0.0, None, &[]), image(0.0, 0.0, None, &[])],
            &AggregateThresholds::default(),
        );
        assert!(result.duplicate_pairs.is_empty());
    }

    #[test]
    fn indicators_deduplicated_in_order() {
        let result = aggregate_results(
            vec![
                image(5.0, 100.0, Some(hash_with_bits(0x00)), &["No image metadata found", "blurry"]),
                image(5.0, 100.0, Some(hash_with_bits(0xFF)), &["No image metadata found", "low contrast"]),
            ],
            &AggregateThresholds::default(),
        );
        assert_eq!(
            result.fraud_indicators,
            vec!["No image metadata found", "blurry", "low contrast"]
        );
    }

    #[test]
    fn aggregate_score_clamped() {
        let h = hash_with_bits(0);
        let result = aggregate_results(
            vec![image(95.0, 100.0, Some(h.clone()), &[]), image(95.0, 100.0, Some(h), &[])],
            &AggregateThresholds::default(),
        );
        assert_eq!(result.score, 100.0);
    }

    #[test]
    fn mean_is_order_independent() {
        let cfg = AggregateThresholds::default();
        let a = image(12.0, 80.0, Some(hash_with_bits(0x0F)), &[]);
        let b = image(48.0, 40.0, Some(hash_with_bits(0xF0)), &[]);
        let ab = aggregate_results(vec![a.clone(), b.clone()], &cfg);
        let ba = aggregate_results(vec![b, a], &cfg);
        assert_eq!(ab.score, ba.score);
        assert_eq!(ab.confidence, ba.confidence);
    }
}
