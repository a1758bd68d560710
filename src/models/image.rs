use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::enums::ContentLabel;
use super::extracted::Extracted;
use crate::pipeline::intake::hash::PerceptualHash;

/// The independent sub-checks run over one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageCheck {
    Metadata,
    Quality,
    Tamper,
    Hashing,
    Content,
}

impl ImageCheck {
    pub const ALL: [ImageCheck; 5] = [
        ImageCheck::Metadata,
        ImageCheck::Quality,
        ImageCheck::Tamper,
        ImageCheck::Hashing,
        ImageCheck::Content,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Metadata => "metadata",
            Self::Quality => "quality",
            Self::Tamper => "tamper",
            Self::Hashing => "hashing",
            Self::Content => "content",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsCoordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Capture metadata read from the image container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadata {
    /// An EXIF block was present and parsable.
    pub exif_present: bool,
    pub captured_at: Extracted<NaiveDateTime>,
    pub gps: Extracted<GpsCoordinates>,
    pub camera_make: Extracted<String>,
    pub camera_model: Extracted<String>,
    pub software: Extracted<String>,
    pub width: u32,
    pub height: u32,
}

impl ImageMetadata {
    /// Timestamp, camera and GPS are all absent.
    pub fn is_stripped(&self) -> bool {
        !self.captured_at.is_found()
            && !self.gps.is_found()
            && !self.camera_make.is_found()
            && !self.camera_model.is_found()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionClass {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub pixel_count: u64,
    /// Laplacian variance. Higher = sharper.
    pub sharpness: f64,
    /// Mean of per-channel (max - min).
    pub contrast: f64,
    pub resolution_class: ResolutionClass,
    /// Re-encoded size / original size, lossy formats only.
    pub recompression_ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TamperFlags {
    pub lighting_variance: f64,
    pub lighting_inconsistent: bool,
    pub ela_drift: f64,
    pub ela_suspicious: bool,
    pub compression_anomaly: bool,
    pub stock_aspect_ratio: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelConfidence {
    pub label: ContentLabel,
    /// 0.0 - 1.0
    pub confidence: f64,
}

/// Per-image forensic result. Produced once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAnalysisResult {
    pub metadata: Extracted<ImageMetadata>,
    pub quality: Extracted<QualityMetrics>,
    pub tamper: Extracted<TamperFlags>,
    pub perceptual_hash: Extracted<PerceptualHash>,
    pub content_hash: Extracted<String>,
    pub content_labels: Vec<LabelConfidence>,
    pub fraud_indicators: Vec<String>,
    /// 0 - 100
    pub score: f64,
    /// 0 - 100, grows with the number of sub-checks that produced data.
    pub confidence: f64,
    /// Sub-checks that failed or timed out. They contribute no score.
    pub failed_checks: Vec<ImageCheck>,
    /// Set only when the whole analysis failed (e.g. undecodable bytes).
    pub error: Option<String>,
}

impl ImageAnalysisResult {
    /// Minimal result for an image that could not be analysed at all.
    pub fn failed(reason: String, indicator: String, penalty: f64) -> Self {
        Self {
            metadata: Extracted::Error(reason.clone()),
            quality: Extracted::Error(reason.clone()),
            tamper: Extracted::Error(reason.clone()),
            perceptual_hash: Extracted::Error(reason.clone()),
            content_hash: Extracted::NotFound,
            content_labels: vec![],
            fraud_indicators: vec![indicator],
            score: penalty.clamp(0.0, 100.0),
            confidence: 0.0,
            failed_checks: ImageCheck::ALL.to_vec(),
            error: Some(reason),
        }
    }
}

/// Combined result over every photo in one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateImageResult {
    pub images: Vec<ImageAnalysisResult>,
    /// Index pairs (i < j) whose perceptual hashes are near-identical.
    pub duplicate_pairs: Vec<(usize, usize)>,
    pub fraud_indicators: Vec<String>,
    /// 0 - 100
    pub score: f64,
    pub confidence: f64,
}
