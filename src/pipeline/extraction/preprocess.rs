//! Image preparation ahead of OCR.
//!
//! Fixed sequence: orientation, grayscale, contrast stretch, sharpen,
//! upscale small scans, binarize. Quality problems found along the way
//! are surfaced as page warnings rather than errors.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageOutputFormat, Luma};

use crate::models::document::ExtractionWarning;
use crate::pipeline::intake::raster::{
    compute_laplacian_variance, compute_rms_contrast, rgb_to_gray, validate_image_bytes,
};

use super::ExtractionError;

/// Maximum input image size (in bytes) before rejecting.
const MAX_IMAGE_BYTES: usize = 50 * 1024 * 1024; // 50 MB

/// Laplacian variance below this: text strokes are smeared.
const BLUR_THRESHOLD: f64 = 100.0;

/// RMS contrast below this: near-uniform page.
const CONTRAST_THRESHOLD: f64 = 25.0;

/// Fraction of darkest/brightest pixels ignored by the contrast stretch.
const STRETCH_CLIP: f64 = 0.01;

/// OCR-ready page image plus whatever quality warnings were raised.
#[derive(Debug, Clone)]
pub struct PreparedPage {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub warnings: Vec<ExtractionWarning>,
}

/// Read EXIF orientation tag from raw image bytes.
/// Returns 1 (normal) if no EXIF data or tag not present.
pub fn read_exif_orientation(bytes: &[u8]) -> u32 {
    let mut cursor = Cursor::new(bytes);
    let reader = match exif::Reader::new().read_from_container(&mut cursor) {
        Ok(r) => r,
        Err(_) => return 1,
    };

    reader
        .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|f| f.value.get_uint(0))
        .unwrap_or(1)
}

/// Apply EXIF orientation transform to a `DynamicImage`.
pub fn apply_orientation(img: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(),
        6 => img.rotate90(),
        7 => img.rotate270().fliph(),
        8 => img.rotate270(),
        _ => img,
    }
}

/// Linear stretch so the 1st..99th percentile spans the full 0-255 range.
pub fn stretch_contrast(gray: &GrayImage) -> GrayImage {
    let total = (gray.width() as u64 * gray.height() as u64) as f64;
    if total == 0.0 {
        return gray.clone();
    }

    let mut histogram = [0u64; 256];
    for p in gray.pixels() {
        histogram[p.0[0] as usize] += 1;
    }

    let clip = (total * STRETCH_CLIP) as u64;
    let mut low = 0usize;
    let mut acc = 0u64;
    for (value, count) in histogram.iter().enumerate() {
        acc += count;
        if acc > clip {
            low = value;
            break;
        }
    }
    let mut high = 255usize;
    acc = 0;
    for (value, count) in histogram.iter().enumerate().rev() {
        acc += count;
        if acc > clip {
            high = value;
            break;
        }
    }

    if high <= low {
        return gray.clone();
    }

    let span = (high - low) as f64;
    let mut out = gray.clone();
    for p in out.pixels_mut() {
        let v = (p.0[0] as f64 - low as f64) / span * 255.0;
        p.0[0] = v.round().clamp(0.0, 255.0) as u8;
    }
    out
}

/// Otsu's threshold: maximises between-class variance of the histogram.
pub fn otsu_threshold(gray: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for p in gray.pixels() {
        histogram[p.0[0] as usize] += 1;
    }

    let total: u64 = histogram.iter().sum();
    if total == 0 {
        return 128;
    }
    let sum_all: f64 = histogram
        .iter()
        .enumerate()
        .map(|(v, c)| v as f64 * *c as f64)
        .sum();

    let mut best_threshold = 0u8;
    let mut best_variance = -1.0f64;
    let mut weight_bg = 0u64;
    let mut sum_bg = 0.0f64;

    for (t, count) in histogram.iter().enumerate() {
        weight_bg += count;
        if weight_bg == 0 {
            continue;
        }
        let weight_fg = total - weight_bg;
        if weight_fg == 0 {
            break;
        }
        sum_bg += t as f64 * *count as f64;

        let mean_bg = sum_bg / weight_bg as f64;
        let mean_fg = (sum_all - sum_bg) / weight_fg as f64;
        let between = weight_bg as f64 * weight_fg as f64 * (mean_bg - mean_fg).powi(2);
        if between > best_variance {
            best_variance = between;
            best_threshold = t as u8;
        }
    }

    best_threshold
}

pub fn binarize(gray: &GrayImage, threshold: u8) -> GrayImage {
    let mut out = gray.clone();
    for p in out.pixels_mut() {
        p.0[0] = if p.0[0] > threshold { 255 } else { 0 };
    }
    out
}

fn encode_gray_png(gray: GrayImage) -> Result<Vec<u8>, ExtractionError> {
    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(gray)
        .write_to(&mut cursor, ImageOutputFormat::Png)
        .map_err(|e| ExtractionError::ImageProcessing(format!("PNG encoding failed: {e}")))?;
    Ok(cursor.into_inner())
}

/// Full preprocessing pass for one page image.
/// Pages narrower than `upscale_below_width` are doubled in size.
pub fn preprocess_for_ocr(
    bytes: &[u8],
    upscale_below_width: u32,
) -> Result<PreparedPage, ExtractionError> {
    validate_image_bytes(bytes, MAX_IMAGE_BYTES)?;

    let img = image::load_from_memory(bytes)
        .map_err(|e| ExtractionError::ImageProcessing(e.to_string()))?;
    let img = apply_orientation(img, read_exif_orientation(bytes));
    let gray = rgb_to_gray(&img.to_rgb8());

    let mut warnings = Vec::new();
    if compute_laplacian_variance(&gray) < BLUR_THRESHOLD {
        warnings.push(ExtractionWarning::BlurryImage);
    }
    if compute_rms_contrast(&gray) < CONTRAST_THRESHOLD {
        warnings.push(ExtractionWarning::PoorContrast);
    }

    let stretched = stretch_contrast(&gray);
    let sharpened = image::imageops::unsharpen(&stretched, 1.0, 5);

    let scaled = if sharpened.width() < upscale_below_width {
        let (w, h) = (sharpened.width() * 2, sharpened.height() * 2);
        tracing::debug!(to = format!("{w}x{h}"), "Upscaling small page for OCR");
        image::imageops::resize(&sharpened, w, h, FilterType::CatmullRom)
    } else {
        sharpened
    };

    let threshold = otsu_threshold(&scaled);
    let binary = binarize(&scaled, threshold);
    let (width, height) = binary.dimensions();

    Ok(PreparedPage {
        png: encode_gray_png(binary)?,
        width,
        height,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::intake::raster::encode_png;
    use image::{GenericImageView, Rgb, RgbImage};

    fn text_like_page(width: u32, height: u32) -> RgbImage {
        // Dark "strokes" every few pixels on a light background
        RgbImage::from_fn(width, height, |x, y| {
            if x % 7 < 2 && y % 11 < 6 {
                Rgb([30, 30, 30])
            } else {
                Rgb([235, 235, 235])
            }
        })
    }

    #[test]
    fn otsu_separates_two_levels() {
        let gray = GrayImage::from_fn(20, 20, |x, _| Luma([if x < 10 { 40 } else { 200 }]));
        let t = otsu_threshold(&gray);
        assert!((40..200).contains(&t));
        let bin = binarize(&gray, t);
        assert_eq!(bin.get_pixel(0, 0).0[0], 0);
        assert_eq!(bin.get_pixel(19, 0).0[0], 255);
    }

    #[test]
    fn stretch_expands_narrow_range() {
        let gray = GrayImage::from_fn(100, 1, |x, _| Luma([100 + (x as u8 % 50)]));
        let out = stretch_contrast(&gray);
        let max = out.pixels().map(|p| p.0[0]).max().unwrap();
        let min = out.pixels().map(|p| p.0[0]).min().unwrap();
        assert!(max >= 250);
        assert!(min <= 5);
    }

    #[test]
    fn stretch_leaves_flat_image() {
        let gray = GrayImage::from_pixel(10, 10, Luma([77]));
        assert_eq!(stretch_contrast(&gray), gray);
    }

    #[test]
    fn small_page_is_upscaled_and_binarized() {
        let bytes = encode_png(&text_like_page(200, 100)).unwrap();
        let page = preprocess_for_ocr(&bytes, 1000).unwrap();
        assert_eq!((page.width, page.height), (400, 200));

        let decoded = image::load_from_memory(&page.png).unwrap().to_luma8();
        assert!(decoded.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    }

    #[test]
    fn wide_page_not_upscaled() {
        let bytes = encode_png(&text_like_page(200, 100)).unwrap();
        let page = preprocess_for_ocr(&bytes, 100).unwrap();
        assert_eq!((page.width, page.height), (200, 100));
    }

    #[test]
    fn flat_page_warns_blurry_and_low_contrast() {
        let bytes = encode_png(&RgbImage::from_pixel(64, 64, Rgb([200, 200, 200]))).unwrap();
        let page = preprocess_for_ocr(&bytes, 10).unwrap();
        assert!(page.warnings.contains(&ExtractionWarning::BlurryImage));
        assert!(page.warnings.contains(&ExtractionWarning::PoorContrast));
    }

    #[test]
    fn garbage_bytes_rejected() {
        assert!(preprocess_for_ocr(&[0xAB; 500], 1000).is_err());
    }

    #[test]
    fn orientation_six_rotates() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(40, 10));
        let rotated = apply_orientation(img, 6);
        assert_eq!((rotated.width(), rotated.height()), (10, 40));
    }

    #[test]
    fn orientation_defaults_to_normal_without_exif() {
        assert_eq!(read_exif_orientation(b"no exif here"), 1);
    }
}
