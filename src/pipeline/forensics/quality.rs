//! Resolution, sharpness, contrast and recompression checks.

use image::RgbImage;

use crate::models::image::{QualityMetrics, ResolutionClass};
use crate::pipeline::intake::raster::{compute_laplacian_variance, encode_jpeg, rgb_to_gray};
use crate::pipeline::Findings;
use crate::pipeline_config::ImageThresholds;

use super::ForensicsError;

/// Full-resolution facts the downscaled working copy no longer carries.
#[derive(Debug, Clone, Copy)]
pub struct SourceInfo {
    pub width: u32,
    pub height: u32,
    pub byte_len: usize,
    pub lossy: bool,
}

impl SourceInfo {
    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

pub fn resolution_class(pixels: u64, cfg: &ImageThresholds) -> ResolutionClass {
    if pixels < cfg.low_resolution_pixels {
        ResolutionClass::Low
    } else if pixels < cfg.medium_resolution_pixels {
        ResolutionClass::Medium
    } else {
        ResolutionClass::High
    }
}

/// Per-channel (max - min), averaged over R, G and B.
pub fn channel_contrast(img: &RgbImage) -> f64 {
    if img.width() == 0 || img.height() == 0 {
        return 0.0;
    }

    let mut min = [u8::MAX; 3];
    let mut max = [u8::MIN; 3];
    for pixel in img.pixels() {
        for c in 0..3 {
            min[c] = min[c].min(pixel.0[c]);
            max[c] = max[c].max(pixel.0[c]);
        }
    }

    (0..3).map(|c| (max[c] - min[c]) as f64).sum::<f64>() / 3.0
}

/// Size of a high-quality re-encode relative to the original payload.
/// A large ratio means the source had been squeezed hard already.
pub fn recompression_ratio(
    full: &RgbImage,
    original_len: usize,
    quality: u8,
) -> Result<f64, ForensicsError> {
    if original_len == 0 {
        return Err(ForensicsError::ImageProcessing("Empty original payload".into()));
    }
    let reencoded = encode_jpeg(full, quality)?;
    Ok(reencoded.len() as f64 / original_len as f64)
}

/// Quality metrics. `working` is the downscaled copy; `full` is only
/// needed for the recompression comparison on lossy sources.
pub fn assess_quality(
    working: &RgbImage,
    full: Option<&RgbImage>,
    source: SourceInfo,
    cfg: &ImageThresholds,
) -> Result<QualityMetrics, ForensicsError> {
    if working.width() == 0 || working.height() == 0 {
        return Err(ForensicsError::ImageTooSmall {
            width: working.width(),
            height: working.height(),
        });
    }

    let gray = rgb_to_gray(working);
    let sharpness = compute_laplacian_variance(&gray);
    let contrast = channel_contrast(working);

    let recompression_ratio = match (source.lossy, full) {
        (true, Some(full)) => Some(recompression_ratio(
            full,
            source.byte_len,
            cfg.recompression_quality,
        )?),
        _ => None,
    };

    let pixel_count = source.pixel_count();
    Ok(QualityMetrics {
        pixel_count,
        sharpness,
        contrast,
        resolution_class: resolution_class(pixel_count, cfg),
        recompression_ratio,
    })
}

pub fn score_quality(quality: &QualityMetrics, cfg: &ImageThresholds) -> Findings {
    let mut findings = Findings::new();

    match quality.resolution_class {
        ResolutionClass::Low => findings.flag(
            format!(
                "Very low resolution image ({} pixels), possible screenshot of a screenshot",
                quality.pixel_count
            ),
            cfg.low_resolution_penalty,
        ),
        ResolutionClass::Medium => findings.flag(
            format!("Below-average image resolution ({} pixels)", quality.pixel_count),
            cfg.medium_resolution_penalty,
        ),
        ResolutionClass::High => {}
    }

    if quality.sharpness < cfg.blur_variance_floor {
        findings.flag(
            format!("Image appears blurry (sharpness {:.1})", quality.sharpness),
            cfg.blur_penalty,
        );
    }

    if quality.contrast < cfg.contrast_floor {
        findings.flag(
            format!("Low contrast image ({:.1})", quality.contrast),
            cfg.low_contrast_penalty,
        );
    }

    if let Some(ratio) = quality.recompression_ratio {
        if ratio > cfg.recompression_size_ratio {
            findings.flag(
                format!("Image shows signs of repeated compression (re-encode grew {ratio:.2}x)"),
                cfg.recompression_penalty,
            );
        }
    }

    findings
}
