//! Coarse scene labels from colour ratios and edge density.
//!
//! This is a stand-in for an object detector: the labels only feed the
//! claim-type consistency check and never score on their own.

use image::RgbImage;

use crate::models::image::LabelConfidence;
use crate::models::{ClaimType, ContentLabel};
use crate::pipeline::Findings;
use crate::pipeline_config::ImageThresholds;

use super::ForensicsError;

/// Labels below this confidence are dropped.
pub const MIN_LABEL_CONFIDENCE: f64 = 0.3;

/// Gradient magnitude (|dx| + |dy| on luma) that counts as an edge pixel.
const EDGE_STEP: f64 = 60.0;

/// Fractions of pixels in each colour family, plus edge density.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ColourStats {
    pub green: f64,
    pub blue: f64,
    pub warm: f64,
    pub dark: f64,
    pub neutral: f64,
    /// Bright blue pixels in the top third of the frame.
    pub sky: f64,
    pub edge_density: f64,
    pub mean_luma: f64,
}

fn luma(p: [u8; 3]) -> f64 {
    0.299 * p[0] as f64 + 0.587 * p[1] as f64 + 0.114 * p[2] as f64
}

pub fn colour_stats(img: &RgbImage) -> Result<ColourStats, ForensicsError> {
    let (w, h) = (img.width(), img.height());
    if w < 2 || h < 2 {
        return Err(ForensicsError::ImageTooSmall { width: w, height: h });
    }

    let mut stats = ColourStats::default();
    let mut top_pixels = 0u64;
    let mut edges = 0u64;

    for y in 0..h {
        for x in 0..w {
            let p = img.get_pixel(x, y).0;
            let (r, g, b) = (p[0] as i32, p[1] as i32, p[2] as i32);
            let l = luma(p);
            let saturation = r.max(g).max(b) - r.min(g).min(b);

            if g > r + 10 && g > b + 10 {
                stats.green += 1.0;
            }
            let blue = b > r + 10 && b > g;
            if blue {
                stats.blue += 1.0;
            }
            if r > g + 30 && r > b + 40 {
                stats.warm += 1.0;
            }
            if l < 60.0 {
                stats.dark += 1.0;
            }
            if saturation < 25 {
                stats.neutral += 1.0;
            }
            if y < h / 3 {
                top_pixels += 1;
                if blue && l > 130.0 {
                    stats.sky += 1.0;
                }
            }
            stats.mean_luma += l;

            if x + 1 < w && y + 1 < h {
                let dx = (luma(img.get_pixel(x + 1, y).0) - l).abs();
                let dy = (luma(img.get_pixel(x, y + 1).0) - l).abs();
                if dx + dy > EDGE_STEP {
                    edges += 1;
                }
            }
        }
    }

    let n = (w as u64 * h as u64) as f64;
    stats.green /= n;
    stats.blue /= n;
    stats.warm /= n;
    stats.dark /= n;
    stats.neutral /= n;
    stats.mean_luma /= n;
    stats.sky /= top_pixels.max(1) as f64;
    stats.edge_density = edges as f64 / ((w - 1) as u64 * (h - 1) as u64) as f64;
    Ok(stats)
}

/// Heuristic labels for a colour profile, in label order.
pub fn labels_from_stats(s: &ColourStats) -> Vec<LabelConfidence> {
    let mut labels = Vec::new();
    let mut push = |label: ContentLabel, confidence: f64| {
        let confidence = confidence.clamp(0.0, 1.0);
        if confidence >= MIN_LABEL_CONFIDENCE {
            labels.push(LabelConfidence { label, confidence });
        }
    };

    if s.sky >= 0.15 || s.green >= 0.2 {
        push(ContentLabel::Outdoor, (s.sky * 2.0).max(s.green * 1.5));
    }
    if s.green >= 0.2 {
        push(ContentLabel::Vegetation, s.green * 2.0);
    }
    if s.neutral >= 0.4 && (0.05..0.25).contains(&s.edge_density) && s.mean_luma > 60.0 {
        push(ContentLabel::Vehicle, s.neutral * 0.6 + s.edge_density * 2.0);
    }
    if s.neutral >= 0.3 && s.green < 0.05 && s.sky < 0.05 && s.edge_density < 0.1 {
        push(ContentLabel::BuildingInterior, 0.4 + s.neutral * 0.4);
    }
    if s.dark >= 0.3 && (s.warm >= 0.05 || s.neutral >= 0.5) {
        push(ContentLabel::FireDamage, s.dark * 0.8 + s.warm * 2.0);
    }
    if s.blue >= 0.15 && s.mean_luma < 140.0 && s.sky < 0.15 {
        push(ContentLabel::WaterDamage, s.blue * 2.0);
    }
    if s.edge_density >= 0.2 {
        push(ContentLabel::StructuralDamage, s.edge_density * 2.5);
    }

    labels
}

pub fn classify_content(img: &RgbImage) -> Result<Vec<LabelConfidence>, ForensicsError> {
    Ok(labels_from_stats(&colour_stats(img)?))
}

/// Flag photos whose detected content shares nothing with what the claim
/// type should show. Silent when nothing was detected or nothing is expected.
pub fn score_content(
    labels: &[LabelConfidence],
    claim_type: Option<ClaimType>,
    cfg: &ImageThresholds,
) -> Findings {
    let mut findings = Findings::new();
    let Some(claim_type) = claim_type else {
        return findings;
    };
    let expected = claim_type.expected_labels();
    if labels.is_empty() || expected.is_empty() {
        return findings;
    }

    if !labels.iter().any(|l| expected.contains(&l.label)) {
        let detected: Vec<&str> = labels.iter().map(|l| l.label.as_str()).collect();
        findings.flag(
            format!(
                "Image content ({}) inconsistent with {} claim",
                detected.join(", "),
                claim_type.as_str()
            ),
            cfg.content_mismatch_penalty,
        );
    }

    findings
}
