pub mod types;
pub mod confidence;
pub mod sanitize;
pub mod preprocess;
pub mod pdf;
pub mod ocr;
pub mod language_detect;
pub mod table_detect;
pub mod orchestrator;

pub use types::*;
pub use confidence::*;
pub use sanitize::*;
pub use preprocess::*;
pub use pdf::*;
pub use ocr::*;
pub use orchestrator::*;

#[cfg(feature = "ocr")]
use std::path::PathBuf;

use thiserror::Error;

use crate::pipeline::intake::IntakeError;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Tesseract OCR initialization failed: {0}")]
    OcrInit(String),

    #[error("Tesseract OCR configuration error: {0}")]
    OcrConfig(String),

    #[error("OCR processing failed: {0}")]
    OcrProcessing(String),

    #[error("No OCR engine available")]
    OcrUnavailable,

    #[error("No PDF page renderer available")]
    RendererUnavailable,

    #[error("PDF parsing failed: {0}")]
    PdfParsing(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("Text encoding error: {0}")]
    EncodingError(String),

    #[cfg(feature = "ocr")]
    #[error("Tessdata not found at: {0}")]
    TessdataNotFound(PathBuf),

    #[error("Unsupported format for extraction: {0}")]
    UnsupportedFormat(String),

    #[error("Extraction timed out after {0}ms")]
    Timeout(u64),

    #[error("Intake error: {0}")]
    Intake(#[from] IntakeError),
}

impl ExtractionError {
    /// The OCR/rendering path is missing or broke, as opposed to the input
    /// itself being unreadable.
    pub fn is_engine_failure(&self) -> bool {
        match self {
            Self::OcrInit(_)
            | Self::OcrConfig(_)
            | Self::OcrProcessing(_)
            | Self::OcrUnavailable
            | Self::RendererUnavailable
            | Self::Timeout(_) => true,
            #[cfg(feature = "ocr")]
            Self::TessdataNotFound(_) => true,
            _ => false,
        }
    }
}
