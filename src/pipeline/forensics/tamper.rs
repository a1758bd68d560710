//! Edit/tamper heuristics: lighting consistency, an error-level-analysis
//! proxy, JPEG block artifacts and stock-photo aspect ratios.
//!
//! None of these is a real forensic detector. Each is a weighted signal.

use image::{GrayImage, RgbImage};

use crate::models::image::TamperFlags;
use crate::pipeline::intake::raster::{encode_jpeg, rgb_to_gray};
use crate::pipeline::Findings;
use crate::pipeline_config::ImageThresholds;

use super::quality::SourceInfo;
use super::ForensicsError;

/// Long edge / short edge for common stock-photography framings.
const STOCK_RATIOS: &[(&str, f64)] = &[
    ("1:1", 1.0),
    ("3:2", 1.5),
    ("16:9", 16.0 / 9.0),
    ("2:1", 2.0),
];

const JPEG_BLOCK: u32 = 8;

/// Variance of average brightness across a 3x3 grid of cells.
pub fn lighting_grid_variance(gray: &GrayImage) -> Result<f64, ForensicsError> {
    let (w, h) = (gray.width(), gray.height());
    if w < 3 || h < 3 {
        return Err(ForensicsError::ImageTooSmall { width: w, height: h });
    }

    let mut means = Vec::with_capacity(9);
    for row in 0..3 {
        for col in 0..3 {
            let (x0, x1) = (col * w / 3, (col + 1) * w / 3);
            let (y0, y1) = (row * h / 3, (row + 1) * h / 3);
            let mut sum = 0u64;
            let mut count = 0u64;
            for y in y0..y1 {
                for x in x0..x1 {
                    sum += gray.get_pixel(x, y).0[0] as u64;
                    count += 1;
                }
            }
            means.push(sum as f64 / count.max(1) as f64);
        }
    }

    let mean = means.iter().sum::<f64>() / means.len() as f64;
    Ok(means.iter().map(|m| (m - mean).powi(2)).sum::<f64>() / means.len() as f64)
}

fn channel_means(img: &RgbImage) -> [f64; 3] {
    let mut sums = [0u64; 3];
    for pixel in img.pixels() {
        for c in 0..3 {
            sums[c] += pixel.0[c] as u64;
        }
    }
    let n = (img.width() as u64 * img.height() as u64).max(1) as f64;
    [sums[0] as f64 / n, sums[1] as f64 / n, sums[2] as f64 / n]
}

/// Re-encode at reduced quality and measure how far the channel means move.
pub fn ela_drift(img: &RgbImage, quality: u8) -> Result<f64, ForensicsError> {
    let reencoded = encode_jpeg(img, quality)?;
    let decoded = image::load_from_memory(&reencoded)
        .map_err(|e| ForensicsError::ImageProcessing(e.to_string()))?
        .to_rgb8();

    let before = channel_means(img);
    let after = channel_means(&decoded);
    Ok((0..3).map(|c| (before[c] - after[c]).abs()).sum::<f64>() / 3.0)
}

/// Mean luminance step across 8-pixel block boundaries divided by the mean
/// step inside blocks. Close to 1.0 for natural images.
pub fn blockiness(img: &RgbImage) -> f64 {
    let (w, h) = (img.width(), img.height());
    if w <= JPEG_BLOCK || h == 0 {
        return 1.0;
    }

    let luma = |x: u32, y: u32| {
        let p = img.get_pixel(x, y).0;
        0.299 * p[0] as f64 + 0.587 * p[1] as f64 + 0.114 * p[2] as f64
    };

    let (mut boundary, mut boundary_n) = (0.0f64, 0u64);
    let (mut interior, mut interior_n) = (0.0f64, 0u64);
    for y in 0..h {
        for x in 1..w {
            let step = (luma(x, y) - luma(x - 1, y)).abs();
            if x % JPEG_BLOCK == 0 {
                boundary += step;
                boundary_n += 1;
            } else {
                interior += step;
                interior_n += 1;
            }
        }
    }

    let boundary = boundary / boundary_n.max(1) as f64;
    let interior = interior / interior_n.max(1) as f64;
    match (boundary < 0.5, interior < 0.5) {
        (true, true) => 1.0,
        (false, true) => boundary / 0.5,
        _ => boundary / interior,
    }
}

/// Matching stock ratio label for large images, orientation-insensitive.
pub fn stock_aspect_ratio(width: u32, height: u32, cfg: &ImageThresholds) -> Option<&'static str> {
    let pixels = width as u64 * height as u64;
    if pixels < cfg.stock_min_pixels || width == 0 || height == 0 {
        return None;
    }

    let ratio = width.max(height) as f64 / width.min(height) as f64;
    STOCK_RATIOS
        .iter()
        .find(|(_, r)| (ratio - r).abs() <= cfg.stock_ratio_tolerance * r)
        .map(|(label, _)| *label)
}

/// Run every tamper heuristic. `full` is the full-resolution image for
/// lossy sources, where block artifacts survive.
pub fn detect_tampering(
    working: &RgbImage,
    full: Option<&RgbImage>,
    source: SourceInfo,
    cfg: &ImageThresholds,
) -> Result<TamperFlags, ForensicsError> {
    let gray = rgb_to_gray(working);
    let lighting_variance = lighting_grid_variance(&gray)?;
    let ela_drift = ela_drift(working, cfg.ela_quality)?;

    let compression_anomaly = match (source.lossy, full) {
        (true, Some(full)) => blockiness(full) > cfg.blockiness_threshold,
        _ => false,
    };

    Ok(TamperFlags {
        lighting_variance,
        lighting_inconsistent: lighting_variance > cfg.lighting_variance_threshold,
        ela_drift,
        ela_suspicious: ela_drift > cfg.ela_drift_threshold,
        compression_anomaly,
        stock_aspect_ratio: stock_aspect_ratio(source.width, source.height, cfg).map(String::from),
    })
}

pub fn score_tamper(flags: &TamperFlags, cfg: &ImageThresholds) -> Findings {
    let mut findings = Findings::new();

    if flags.lighting_inconsistent {
        findings.flag(
            "Inconsistent lighting across image regions",
            cfg.lighting_penalty,
        );
    }
    if flags.ela_suspicious {
        findings.flag(
            format!(
                "Error-level analysis drift {:.2} suggests localized manipulation",
                flags.ela_drift
            ),
            cfg.ela_penalty,
        );
    }
    if flags.compression_anomaly {
        findings.flag(
            "Compression block artifacts suggest the image was re-saved",
            cfg.compression_anomaly_penalty,
        );
    }
    if let Some(ratio) = &flags.stock_aspect_ratio {
        findings.flag(
            format!("High resolution with common stock-photo aspect ratio ({ratio})"),
            cfg.stock_photo_penalty,
        );
    }

    findings
}
