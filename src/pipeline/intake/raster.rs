//! Pixel helpers shared by image forensics and OCR preprocessing.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageOutputFormat, Luma, RgbImage};

use super::IntakeError;

/// Smallest byte length that can hold a real PNG/JPEG.
pub const MIN_IMAGE_BYTES: usize = 67;

/// Validate image bytes before decoding.
/// Returns early error for clearly invalid input, saving decode time.
pub fn validate_image_bytes(bytes: &[u8], max_bytes: usize) -> Result<(), IntakeError> {
    if bytes.len() < MIN_IMAGE_BYTES {
        return Err(IntakeError::ImageProcessing(
            "Image data too small to be valid".into(),
        ));
    }
    if bytes.len() > max_bytes {
        return Err(IntakeError::FileTooLarge {
            size_mb: bytes.len() as f64 / (1024.0 * 1024.0),
            max_mb: (max_bytes / (1024 * 1024)) as u64,
        });
    }
    Ok(())
}

/// Convert RGB image to grayscale using ITU-R BT.601 luminance.
pub fn rgb_to_gray(rgb: &RgbImage) -> GrayImage {
    let (w, h) = (rgb.width(), rgb.height());
    let mut gray = GrayImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let p = rgb.get_pixel(x, y);
            let luma = (0.299 * p.0[0] as f32 + 0.587 * p.0[1] as f32 + 0.114 * p.0[2] as f32) as u8;
            gray.put_pixel(x, y, Luma([luma]));
        }
    }
    gray
}

/// Compute Laplacian variance, the standard sharpness metric.
///
/// Higher variance = sharper image. Blurry photos < 100, crisp detail > 500.
/// Uses a 3x3 Laplacian kernel: `[0,1,0; 1,-4,1; 0,1,0]`.
pub fn compute_laplacian_variance(img: &GrayImage) -> f64 {
    let (w, h) = (img.width() as i32, img.height() as i32);
    if w < 3 || h < 3 {
        return 0.0;
    }

    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    let mut count = 0u64;

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let center = img.get_pixel(x as u32, y as u32).0[0] as f64;
            let top = img.get_pixel(x as u32, (y - 1) as u32).0[0] as f64;
            let bottom = img.get_pixel(x as u32, (y + 1) as u32).0[0] as f64;
            let left = img.get_pixel((x - 1) as u32, y as u32).0[0] as f64;
            let right = img.get_pixel((x + 1) as u32, y as u32).0[0] as f64;

            let laplacian = top + bottom + left + right - 4.0 * center;
            sum += laplacian;
            sum_sq += laplacian * laplacian;
            count += 1;
        }
    }

    if count == 0 {
        return 0.0;
    }

    let mean = sum / count as f64;
    let variance = (sum_sq / count as f64) - (mean * mean);
    variance.max(0.0)
}

/// RMS contrast: standard deviation of grayscale intensities (0-127.5).
pub fn compute_rms_contrast(img: &GrayImage) -> f64 {
    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    let mut count = 0u64;

    for pixel in img.pixels() {
        let val = pixel.0[0] as f64;
        sum += val;
        sum_sq += val * val;
        count += 1;
    }

    if count == 0 {
        return 0.0;
    }

    let mean = sum / count as f64;
    let variance = (sum_sq / count as f64) - (mean * mean);
    variance.max(0.0).sqrt()
}

/// Downscaled copy whose longest edge is at most `max_dim`.
/// Small images are returned unscaled.
pub fn working_copy(rgb: &RgbImage, max_dim: u32) -> RgbImage {
    let (w, h) = rgb.dimensions();
    let largest = w.max(h);

    if largest <= max_dim || max_dim == 0 {
        return rgb.clone();
    }

    let scale = max_dim as f64 / largest as f64;
    let new_w = ((w as f64 * scale).round() as u32).max(1);
    let new_h = ((h as f64 * scale).round() as u32).max(1);

    tracing::debug!(
        from = format!("{w}x{h}"),
        to = format!("{new_w}x{new_h}"),
        "Downscaling image for analysis"
    );

    image::imageops::resize(rgb, new_w, new_h, FilterType::Triangle)
}

/// Encode an RGB image as PNG bytes.
pub fn encode_png(img: &RgbImage) -> Result<Vec<u8>, IntakeError> {
    encode(img, ImageOutputFormat::Png)
}

/// Encode an RGB image as JPEG at the given quality (1-100).
pub fn encode_jpeg(img: &RgbImage, quality: u8) -> Result<Vec<u8>, IntakeError> {
    encode(img, ImageOutputFormat::Jpeg(quality.clamp(1, 100)))
}

fn encode(img: &RgbImage, format: ImageOutputFormat) -> Result<Vec<u8>, IntakeError> {
    let dynamic = DynamicImage::ImageRgb8(img.clone());
    let mut cursor = Cursor::new(Vec::new());
    dynamic
        .write_to(&mut cursor, format)
        .map_err(|e| IntakeError::ImageProcessing(format!("Encoding failed: {e}")))?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn checkerboard(size: u32, cell: u32) -> RgbImage {
        RgbImage::from_fn(size, size, |x, y| {
            if ((x / cell) + (y / cell)) % 2 == 0 {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        })
    }

    #[test]
    fn validate_rejects_tiny_and_oversized() {
        assert!(validate_image_bytes(&[0u8; 10], 1024).is_err());
        assert!(validate_image_bytes(&[0u8; 2048], 1024).is_err());
        assert!(validate_image_bytes(&[0u8; 512], 1024).is_ok());
    }

    #[test]
    fn gray_conversion_uses_luma_weights() {
        let rgb = RgbImage::from_pixel(2, 2, Rgb([255, 0, 0]));
        let gray = rgb_to_gray(&rgb);
        assert_eq!(gray.get_pixel(0, 0).0[0], 76);
    }

    #[test]
    fn laplacian_sharp_vs_flat() {
        let sharp = rgb_to_gray(&checkerboard(32, 2));
        let flat = rgb_to_gray(&RgbImage::from_pixel(32, 32, Rgb([128, 128, 128])));
        assert!(compute_laplacian_variance(&sharp) > 500.0);
        assert_eq!(compute_laplacian_variance(&flat), 0.0);
    }

    #[test]
    fn laplacian_tiny_image_is_zero() {
        let tiny = GrayImage::new(2, 2);
        assert_eq!(compute_laplacian_variance(&tiny), 0.0);
    }

    #[test]
    fn rms_contrast_bounds() {
        let board = rgb_to_gray(&checkerboard(16, 4));
        assert!((compute_rms_contrast(&board) - 127.5).abs() < 1.0);
        assert_eq!(compute_rms_contrast(&GrayImage::new(0, 0)), 0.0);
    }

    #[test]
    fn working_copy_caps_longest_edge() {
        let img = RgbImage::new(400, 200);
        let small = working_copy(&img, 100);
        assert_eq!((small.width(), small.height()), (100, 50));
        let same = working_copy(&img, 1000);
        assert_eq!((same.width(), same.height()), (400, 200));
    }

    #[test]
    fn encoders_produce_decodable_bytes() {
        let img = checkerboard(16, 4);
        let png = encode_png(&img).unwrap();
        let jpeg = encode_jpeg(&img, 90).unwrap();
        assert_eq!(&png[..4], &[0x89, 0x50, 0x4E, 0x47]);
        assert_eq!(&jpeg[..3], &[0xFF, 0xD8, 0xFF]);
        assert!(image::load_from_memory(&jpeg).is_ok());
    }
}
