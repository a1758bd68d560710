use serde::{Deserialize, Serialize};

/// Broad file categories we handle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FileCategory {
    DigitalPdf,
    ScannedPdf,
    Image,
    PlainText,
    Unsupported,
}

impl FileCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DigitalPdf => "digital_pdf",
            Self::ScannedPdf => "scanned_pdf",
            Self::Image => "image",
            Self::PlainText => "plain_text",
            Self::Unsupported => "unsupported",
        }
    }

    pub fn is_pdf(&self) -> bool {
        matches!(self, Self::DigitalPdf | Self::ScannedPdf)
    }
}

/// Result of format detection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormatDetection {
    pub mime_type: String,
    pub category: FileCategory,
    pub is_digital_pdf: Option<bool>,
    pub size_bytes: u64,
}

impl FormatDetection {
    /// JPEG is the only lossy format we decode; re-encode checks apply to it.
    pub fn is_lossy_image(&self) -> bool {
        self.mime_type == "image/jpeg"
    }
}

pub const MAX_PAYLOAD_BYTES: u64 = 100 * 1024 * 1024; // 100MB

/// Detect payload format from magic bytes (NOT file extensions).
pub fn detect_format_bytes(bytes: &[u8]) -> FormatDetection {
    let size_bytes = bytes.len() as u64;

    if size_bytes > MAX_PAYLOAD_BYTES {
        return FormatDetection {
            mime_type: "unknown".into(),
            category: FileCategory::Unsupported,
            is_digital_pdf: None,
            size_bytes,
        };
    }

    let header = &bytes[..bytes.len().min(16)];

    let (mime_type, category, is_digital_pdf) = match &header[..header.len().min(8)] {
        // PDF: starts with %PDF
        [0x25, 0x50, 0x44, 0x46, ..] => {
            let is_digital = pdf_has_text_markers(bytes);
            let category = if is_digital {
                FileCategory::DigitalPdf
            } else {
                FileCategory::ScannedPdf
            };
            ("application/pdf", category, Some(is_digital))
        }
        // JPEG: starts with FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => ("image/jpeg", FileCategory::Image, None),
        // PNG: starts with 89 50 4E 47
        [0x89, 0x50, 0x4E, 0x47, ..] => ("image/png", FileCategory::Image, None),
        // TIFF: little-endian (49 49 2A 00) or big-endian (4D 4D 00 2A)
        [0x49, 0x49, 0x2A, 0x00, ..] | [0x4D, 0x4D, 0x00, 0x2A, ..] => {
            ("image/tiff", FileCategory::Image, None)
        }
        // HEIC/HEIF: "ftyp" at offset 4
        _ if header.len() >= 12 && &header[4..8] == b"ftyp" => {
            ("image/heic", FileCategory::Image, None)
        }
        _ => {
            if is_likely_text(bytes) {
                ("text/plain", FileCategory::PlainText, None)
            } else {
                ("application/octet-stream", FileCategory::Unsupported, None)
            }
        }
    };

    FormatDetection {
        mime_type: mime_type.to_string(),
        category,
        is_digital_pdf,
        size_bytes,
    }
}

/// Check if a PDF has extractable text (digital vs scanned).
/// Heuristic: count text operators in the first 256KB.
fn pdf_has_text_markers(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(256 * 1024)];
    let content = String::from_utf8_lossy(window);

    // BT/ET = begin/end text, Tj/TJ = show text, Tf = set font
    let text_markers = ["BT", "ET", " Tj", " TJ", " Tf"];
    let marker_count: usize = text_markers
        .iter()
        .map(|m| content.matches(m).count())
        .sum();

    // >= 3 text markers suggests a digital PDF with text layer
    marker_count >= 3
}

/// Likely plain text: valid UTF-8 in the first 4KB, mostly printable.
fn is_likely_text(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(4096)];
    if window.is_empty() {
        return false;
    }

    let text = match std::str::from_utf8(window) {
        Ok(t) => t,
        // A multi-byte char may straddle the window edge
        Err(e) if e.valid_up_to() > 0 && window.len() == 4096 => {
            match std::str::from_utf8(&window[..e.valid_up_to()]) {
                Ok(t) => t,
                Err(_) => return false,
            }
        }
        Err(_) => return false,
    };

    // At least 80% printable characters (or whitespace)
    let total = text.chars().count().max(1);
    let printable = text
        .chars()
        .filter(|c| !c.is_control() || c.is_whitespace())
        .count();
    printable as f64 / total as f64 > 0.80
}
