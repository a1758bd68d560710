//! Tunable thresholds and penalties for the fraud-scoring pipeline.
//!
//! Every magic number the analyzers use lives here as a named default.
//! None of them were statistically calibrated: they are the empirically chosen
//! values the scoring rules were written against, exposed so deployments can
//! override them from a JSON file without a rebuild.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Fusion weight set '{name}' sums to {sum}, expected 1.0")]
    WeightsNotNormalized { name: &'static str, sum: f64 },
}

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Complete pipeline configuration, one section per stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub image: ImageThresholds,
    pub aggregate: AggregateThresholds,
    pub extraction: ExtractionThresholds,
    pub authenticity: AuthenticityPenalties,
    pub validation: ValidationPenalties,
    pub behavior: BehaviorRules,
    pub fusion: FusionWeights,
    pub decision: DecisionThresholds,
    pub timeouts: Timeouts,
}

/// Per-image forensic checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageThresholds {
    /// Refuse to decode payloads above this size.
    pub max_image_bytes: usize,
    /// Longest edge of the downscaled copy the pixel heuristics run on.
    pub analysis_max_dimension: u32,
    pub editing_software_penalty: f64,
    pub metadata_stripped_penalty: f64,
    pub no_metadata_penalty: f64,
    /// Pixel count below which the image is treated as a likely screenshot.
    pub low_resolution_pixels: u64,
    pub low_resolution_penalty: f64,
    pub medium_resolution_pixels: u64,
    pub medium_resolution_penalty: f64,
    /// Laplacian variance below this = blurry.
    pub blur_variance_floor: f64,
    pub blur_penalty: f64,
    /// Average per-channel (max - min) below this = low contrast.
    pub contrast_floor: f64,
    pub low_contrast_penalty: f64,
    pub recompression_quality: u8,
    /// Re-encoded size / original size above this = heavily compressed source.
    pub recompression_size_ratio: f64,
    pub recompression_penalty: f64,
    /// Variance of the nine 3x3-grid brightness means.
    pub lighting_variance_threshold: f64,
    pub lighting_penalty: f64,
    pub ela_quality: u8,
    /// Mean absolute channel-mean drift after low-quality re-encode.
    pub ela_drift_threshold: f64,
    pub ela_penalty: f64,
    /// Mean 8x8 block-boundary step / mean interior step above this = JPEG grid artifacts.
    pub blockiness_threshold: f64,
    pub compression_anomaly_penalty: f64,
    pub stock_min_pixels: u64,
    pub stock_ratio_tolerance: f64,
    pub stock_photo_penalty: f64,
    /// Hamming distance strictly below this = cross-claim duplicate.
    pub cross_claim_distance: u32,
    pub cross_claim_penalty: f64,
    pub content_mismatch_penalty: f64,
    pub predates_severe_days: i64,
    pub predates_severe_penalty: f64,
    pub predates_moderate_days: i64,
    pub predates_moderate_penalty: f64,
    pub postdates_days: i64,
    pub postdates_penalty: f64,
    pub corrupt_file_penalty: f64,
}

impl Default for ImageThresholds {
    fn default() -> Self {
        Self {
            max_image_bytes: 50 * 1024 * 1024,
            analysis_max_dimension: 1024,
            editing_software_penalty: 25.0,
            metadata_stripped_penalty: 15.0,
            no_metadata_penalty: 5.0,
            low_resolution_pixels: 640 * 480,
            low_resolution_penalty: 20.0,
            medium_resolution_pixels: 1280 * 720,
            medium_resolution_penalty: 5.0,
            blur_variance_floor: 100.0,
            blur_penalty: 10.0,
            contrast_floor: 50.0,
            low_contrast_penalty: 5.0,
            recompression_quality: 95,
            recompression_size_ratio: 1.5,
            recompression_penalty: 10.0,
            lighting_variance_threshold: 1500.0,
            lighting_penalty: 15.0,
            ela_quality: 75,
            ela_drift_threshold: 3.0,
            ela_penalty: 20.0,
            blockiness_threshold: 1.35,
            compression_anomaly_penalty: 10.0,
            stock_min_pixels: 12_000_000,
            stock_ratio_tolerance: 0.01,
            stock_photo_penalty: 10.0,
            cross_claim_distance: 5,
            cross_claim_penalty: 40.0,
            content_mismatch_penalty: 15.0,
            predates_severe_days: 30,
            predates_severe_penalty: 30.0,
            predates_moderate_days: 1,
            predates_moderate_penalty: 15.0,
            postdates_days: 60,
            postdates_penalty: 5.0,
            corrupt_file_penalty: 50.0,
        }
    }
}

/// Multi-image aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateThresholds {
    /// Hamming distance strictly below this = duplicate pair within one claim.
    pub internal_duplicate_distance: u32,
    pub internal_duplicate_penalty: f64,
    pub no_images_penalty: f64,
}

impl Default for AggregateThresholds {
    fn default() -> Self {
        Self {
            internal_duplicate_distance: 3,
            internal_duplicate_penalty: 20.0,
            no_images_penalty: 30.0,
        }
    }
}

/// Document OCR and structuring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionThresholds {
    /// Direct PDF text shorter than this (trimmed chars) = scanned PDF.
    pub min_pdf_text_chars: usize,
    pub default_max_pages: usize,
    /// Keyword hits the winning document type needs.
    pub classification_min_matches: usize,
    /// Images narrower than this are upscaled 2x before OCR.
    pub upscale_below_width: u32,
    pub render_dpi: u32,
}

impl Default for ExtractionThresholds {
    fn default() -> Self {
        Self {
            min_pdf_text_chars: 50,
            default_max_pages: 10,
            classification_min_matches: 2,
            upscale_below_width: 1000,
            render_dpi: 300,
        }
    }
}

/// Document authenticity heuristic. Starts at 100 and subtracts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthenticityPenalties {
    pub inconsistent_formatting: f64,
    pub max_indentation_levels: usize,
    pub future_dates: f64,
    pub wide_date_span: f64,
    pub wide_date_span_years: i32,
    pub mixed_eras: f64,
    pub missing_required_fields: f64,
    pub placeholder_text: f64,
    pub excessive_repetition: f64,
    pub mixed_currency: f64,
    pub poor_scan_symbols: f64,
    pub poor_scan_fragments: f64,
    /// Authentic iff confidence is strictly above this.
    pub authentic_above: f64,
}

impl Default for AuthenticityPenalties {
    fn default() -> Self {
        Self {
            inconsistent_formatting: 15.0,
            max_indentation_levels: 5,
            future_dates: 20.0,
            wide_date_span: 10.0,
            wide_date_span_years: 10,
            mixed_eras: 10.0,
            missing_required_fields: 20.0,
            placeholder_text: 25.0,
            excessive_repetition: 10.0,
            mixed_currency: 10.0,
            poor_scan_symbols: 10.0,
            poor_scan_fragments: 10.0,
            authentic_above: 50.0,
        }
    }
}

/// OCR-vs-form validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationPenalties {
    pub policy_probable_similarity: f64,
    pub policy_mismatch: f64,
    pub policy_not_found: f64,
    pub name_match_similarity: f64,
    pub name_probable_similarity: f64,
    pub name_mismatch: f64,
    pub name_not_found: f64,
    pub coverage_exceeded: f64,
    /// Claim at or above this fraction of the limit raises a warning.
    pub coverage_warning_ratio: f64,
    pub before_effective: f64,
    pub after_expiration: f64,
    pub authenticity_failed: f64,
    pub document_type_mismatch: f64,
    pub document_type_min_confidence: f64,
    /// OCR confidence (0-100) below this raises a reviewer warning.
    pub low_ocr_confidence: f64,
    /// Document bytes could not be read at all.
    pub unreadable_document: f64,
}

impl Default for ValidationPenalties {
    fn default() -> Self {
        Self {
            policy_probable_similarity: 0.90,
            policy_mismatch: 40.0,
            policy_not_found: 10.0,
            name_match_similarity: 0.95,
            name_probable_similarity: 0.70,
            name_mismatch: 30.0,
            name_not_found: 5.0,
            coverage_exceeded: 35.0,
            coverage_warning_ratio: 0.90,
            before_effective: 35.0,
            after_expiration: 40.0,
            authenticity_failed: 30.0,
            document_type_mismatch: 10.0,
            document_type_min_confidence: 0.50,
            low_ocr_confidence: 50.0,
            unreadable_document: 25.0,
        }
    }
}

/// Behavioral rules evaluated directly over the submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorRules {
    pub high_amount_threshold: f64,
    pub high_amount_penalty: f64,
    pub same_day_penalty: f64,
    pub min_description_chars: usize,
    pub short_description_penalty: f64,
    pub weekend_penalty: f64,
    /// Amounts that are an exact multiple of this count as round.
    pub round_amount_modulus: f64,
    pub round_amount_penalty: f64,
    pub keyword_min_matches: usize,
    pub keyword_penalty: f64,
    pub keywords: Vec<String>,
}

impl Default for BehaviorRules {
    fn default() -> Self {
        Self {
            high_amount_threshold: 50_000.0,
            high_amount_penalty: 25.0,
            same_day_penalty: 20.0,
            min_description_chars: 50,
            short_description_penalty: 15.0,
            weekend_penalty: 10.0,
            round_amount_modulus: 10_000.0,
            round_amount_penalty: 10.0,
            keyword_min_matches: 2,
            keyword_penalty: 20.0,
            keywords: [
                "total loss",
                "stolen",
                "theft",
                "cash",
                "urgent",
                "no witnesses",
                "lost receipt",
                "destroyed",
                "immediately",
                "untraceable",
            ]
            .iter()
            .map(|k| k.to_string())
            .collect(),
        }
    }
}

/// One set of fusion weights. Each set must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightSet {
    pub text: f64,
    pub document: f64,
    pub image: f64,
}

impl WeightSet {
    pub fn sum(&self) -> f64 {
        self.text + self.document + self.image
    }
}

/// Fusion weights keyed by which optional signals are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionWeights {
    pub all_signals: WeightSet,
    pub text_and_document: WeightSet,
    pub text_and_image: WeightSet,
    pub text_only: WeightSet,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            all_signals: WeightSet { text: 0.35, document: 0.35, image: 0.30 },
            text_and_document: WeightSet { text: 0.5, document: 0.5, image: 0.0 },
            text_and_image: WeightSet { text: 0.6, document: 0.0, image: 0.4 },
            text_only: WeightSet { text: 1.0, document: 0.0, image: 0.0 },
        }
    }
}

impl FusionWeights {
    /// Check every weight set sums to 1.0.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, set) in [
            ("all_signals", &self.all_signals),
            ("text_and_document", &self.text_and_document),
            ("text_and_image", &self.text_and_image),
            ("text_only", &self.text_only),
        ] {
            let sum = set.sum();
            if (sum - 1.0).abs() > 1e-9 {
                return Err(ConfigError::WeightsNotNormalized { name, sum });
            }
        }
        Ok(())
    }
}

/// Score → tier/status mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionThresholds {
    pub high_risk: u8,
    pub medium_risk: u8,
    pub flagged_confidence: u8,
    pub pending_confidence: u8,
    pub approved_confidence: u8,
}

impl Default for DecisionThresholds {
    fn default() -> Self {
        Self {
            high_risk: 70,
            medium_risk: 40,
            flagged_confidence: 95,
            pending_confidence: 75,
            approved_confidence: 90,
        }
    }
}

/// Wall-clock bounds. A timeout degrades the affected check only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub image_check_ms: u64,
    pub ocr_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            image_check_ms: 15_000,
            ocr_ms: 60_000,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Loading
// ═══════════════════════════════════════════════════════════

impl PipelineConfig {
    /// Parse a JSON document. Missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = serde_json::from_str(json)?;
        config.fusion.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load from `CLAIMLENS_CONFIG` or the per-user config file.
    /// Missing or invalid files fall back to defaults.
    pub fn load() -> Self {
        let path = config::pipeline_config_path();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No pipeline config file, using defaults");
            return Self::default();
        }

        match Self::from_file(&path) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "Loaded pipeline config");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Invalid pipeline config, using defaults"
                );
                Self::default()
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
