use crate::models::document::{ExtractionMethod, ExtractionWarning, PageExtraction};

use super::types::OcrPageResult;

/// Page-level confidence constants, 0.0 - 1.0.
pub mod thresholds {
    /// Below this: page flagged as low confidence.
    pub const LOW: f32 = 0.50;

    /// Text layer read straight from a digital PDF.
    pub const VERY_HIGH: f32 = 0.95;

    /// Plain UTF-8 input.
    pub const PLAIN_TEXT: f32 = 0.99;

    /// Word confidence below this counts toward the handwriting ratio.
    pub const HANDWRITING_WORD: f32 = 0.40;
}

/// Weight of each signal in the overall extraction confidence.
const OCR_WEIGHT: f64 = 0.4;
const CLASSIFICATION_WEIGHT: f64 = 0.2;
const AUTHENTICITY_WEIGHT: f64 = 0.2;
const COMPLETENESS_WEIGHT: f64 = 0.2;

/// Text engine confidence over all pages, 0.0 - 1.0.
pub fn compute_text_confidence(pages: &[PageExtraction], method: ExtractionMethod) -> f32 {
    if pages.is_empty() {
        return 0.0;
    }

    match method {
        ExtractionMethod::None => 0.0,
        // Digital PDFs: base 0.95, scaled by ratio of pages with text
        ExtractionMethod::PdfDirect => {
            let pages_with_text = pages.iter().filter(|p| !p.text.trim().is_empty()).count();
            thresholds::VERY_HIGH * (pages_with_text as f32 / pages.len() as f32)
        }
        ExtractionMethod::PlainTextRead => thresholds::PLAIN_TEXT,
        // OCR: mean page confidence weighted by recovered characters
        ExtractionMethod::Ocr => {
            let (weighted, chars) = pages.iter().fold((0.0f32, 0usize), |(sum, n), p| {
                let len = p.text.chars().count();
                (sum + p.confidence * len as f32, n + len)
            });
            if chars == 0 {
                0.0
            } else {
                weighted / chars as f32
            }
        }
    }
}

/// Combine the four extraction signals into one 0 - 100 confidence.
///
/// `text_confidence` and `authenticity` are on the 0 - 100 scale,
/// `classification` and `completeness` on 0.0 - 1.0.
pub fn compute_overall_confidence(
    text_confidence: f64,
    classification: f64,
    authenticity: f64,
    completeness: f64,
) -> f64 {
    let combined = OCR_WEIGHT * text_confidence.clamp(0.0, 100.0)
        + CLASSIFICATION_WEIGHT * classification.clamp(0.0, 1.0) * 100.0
        + AUTHENTICITY_WEIGHT * authenticity.clamp(0.0, 100.0)
        + COMPLETENESS_WEIGHT * completeness.clamp(0.0, 1.0) * 100.0;
    combined.clamp(0.0, 100.0)
}

/// Analyze one OCR page result and generate warnings
pub fn analyze_ocr_quality(page_number: usize, result: &OcrPageResult) -> Vec<ExtractionWarning> {
    let mut warnings = Vec::new();

    if result.confidence < thresholds::LOW {
        warnings.push(ExtractionWarning::LowConfidencePage {
            page: page_number,
            confidence: result.confidence,
        });
    }

    // Majority of words below 0.40 reads as handwriting
    if !result.word_confidences.is_empty() {
        let low = result
            .word_confidences
            .iter()
            .filter(|(_, c)| *c < thresholds::HANDWRITING_WORD)
            .count();
        if low as f64 / result.word_confidences.len() as f64 > 0.50 {
            warnings.push(ExtractionWarning::HandwritingDetected);
        }
    }

    warnings
}
