use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ExtractionError;

/// Caller-supplied processing options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionOptions {
    /// Pages beyond this are not read.
    pub max_pages: usize,
    /// Tesseract language code(s), e.g. "eng" or "eng+fra". Overrides detection.
    pub language_hint: Option<String>,
    /// Reference day for date plausibility checks. When unset the current
    /// UTC date is used, so authenticity flags then depend on the run date.
    /// Set it for reproducible output.
    pub as_of: Option<NaiveDate>,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            max_pages: 10,
            language_hint: None,
            as_of: None,
        }
    }
}

/// Raw OCR result from the engine
#[derive(Debug, Clone, PartialEq)]
pub struct OcrPageResult {
    pub text: String,
    /// 0.0 - 1.0
    pub confidence: f32,
    pub word_confidences: Vec<(String, f32)>,
}

/// OCR engine abstraction (allows mocking for tests)
pub trait OcrEngine {
    fn ocr_image(&self, image_bytes: &[u8]) -> Result<OcrPageResult, ExtractionError>;

    fn ocr_image_with_lang(
        &self,
        image_bytes: &[u8],
        lang: &str,
    ) -> Result<OcrPageResult, ExtractionError>;
}

/// PDF text-layer extraction abstraction. One string per page.
pub trait PdfExtractor {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<String>, ExtractionError>;
}

/// Rasterises one PDF page (zero-based) to encoded image bytes.
pub trait PdfPageRenderer {
    fn render_page(
        &self,
        pdf_bytes: &[u8],
        page_index: usize,
        dpi: u32,
    ) -> Result<Vec<u8>, ExtractionError>;
}
