//! Capture metadata: EXIF timestamp, GPS, camera and editing software.

use std::io::Cursor;

use chrono::{NaiveDate, NaiveDateTime};
use exif::{Exif, In, Tag, Value};

use crate::models::image::{GpsCoordinates, ImageMetadata};
use crate::models::Extracted;
use crate::pipeline::Findings;
use crate::pipeline_config::ImageThresholds;

/// Software tags that indicate the file went through a photo editor.
const EDITING_SOFTWARE: &[&str] = &[
    "photoshop",
    "gimp",
    "lightroom",
    "affinity photo",
    "pixelmator",
    "paint.net",
    "pixlr",
    "snapseed",
    "picsart",
    "facetune",
    "canva",
    "photoscape",
    "corel",
    "luminar",
];

/// Read capture metadata from the raw container bytes.
/// `width`/`height` come from the decoded image so they are always set.
pub fn extract_metadata(bytes: &[u8], width: u32, height: u32) -> ImageMetadata {
    let mut cursor = Cursor::new(bytes);
    match exif::Reader::new().read_from_container(&mut cursor) {
        Ok(exif) => metadata_from_exif(&exif, width, height),
        Err(e) => {
            tracing::debug!(error = %e, "No EXIF container");
            ImageMetadata {
                exif_present: false,
                width,
                height,
                ..Default::default()
            }
        }
    }
}

pub fn metadata_from_exif(exif: &Exif, width: u32, height: u32) -> ImageMetadata {
    let captured_at = [Tag::DateTimeOriginal, Tag::DateTimeDigitized, Tag::DateTime]
        .iter()
        .find_map(|tag| ascii_field(exif, *tag).and_then(|s| parse_exif_datetime(&s)));

    ImageMetadata {
        exif_present: true,
        captured_at: captured_at.into(),
        gps: read_gps(exif).into(),
        camera_make: ascii_field(exif, Tag::Make).into(),
        camera_model: ascii_field(exif, Tag::Model).into(),
        software: ascii_field(exif, Tag::Software).into(),
        width,
        height,
    }
}

fn ascii_field(exif: &Exif, tag: Tag) -> Option<String> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    match &field.value {
        Value::Ascii(parts) => parts
            .iter()
            .map(|p| String::from_utf8_lossy(p).trim_matches(char::from(0)).trim().to_string())
            .find(|s| !s.is_empty()),
        _ => None,
    }
}

/// EXIF timestamps look like `2024:03:15 14:22:05`.
pub fn parse_exif_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y:%m:%d %H:%M:%S")
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw.get(..10)?, "%Y:%m:%d")
                .ok()?
                .and_hms_opt(0, 0, 0)
        })
}

fn read_gps(exif: &Exif) -> Option<GpsCoordinates> {
    let latitude = gps_degrees(exif, Tag::GPSLatitude)?;
    let longitude = gps_degrees(exif, Tag::GPSLongitude)?;

    let lat_sign = match ascii_field(exif, Tag::GPSLatitudeRef).as_deref() {
        Some("S") => -1.0,
        _ => 1.0,
    };
    let lon_sign = match ascii_field(exif, Tag::GPSLongitudeRef).as_deref() {
        Some("W") => -1.0,
        _ => 1.0,
    };

    Some(GpsCoordinates {
        latitude: latitude * lat_sign,
        longitude: longitude * lon_sign,
    })
}

/// Degrees/minutes/seconds rationals to decimal degrees.
fn gps_degrees(exif: &Exif, tag: Tag) -> Option<f64> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    match &field.value {
        Value::Rational(parts) if !parts.is_empty() => {
            let part = |i: usize| parts.get(i).map(|r| r.to_f64()).unwrap_or(0.0);
            let degrees = part(0) + part(1) / 60.0 + part(2) / 3600.0;
            degrees.is_finite().then_some(degrees)
        }
        _ => None,
    }
}

/// Name of the editing tool found in the software tag, if any.
pub fn editing_tool(software: &str) -> Option<&'static str> {
    let lower = software.to_lowercase();
    EDITING_SOFTWARE.iter().copied().find(|tool| lower.contains(tool))
}

pub fn score_metadata(meta: &ImageMetadata, cfg: &ImageThresholds) -> Findings {
    let mut findings = Findings::new();

    if let Extracted::Found(software) = &meta.software {
        if editing_tool(software).is_some() {
            findings.flag(
                format!("Image edited with photo-editing software ({software})"),
                cfg.editing_software_penalty,
            );
        }
    }

    if !meta.exif_present {
        findings.flag("No image metadata found", cfg.no_metadata_penalty);
    } else if meta.is_stripped() {
        findings.flag(
            "Image metadata stripped (no capture time, camera or GPS)",
            cfg.metadata_stripped_penalty,
        );
    }

    findings
}
