//! Document extraction: bytes in, structured `ExtractedDocument` out.
//!
//! Format sniffing picks the text path (PDF text layer, page OCR, image
//! OCR or plain text). The recovered text is then sanitised, segmented,
//! classified and structured. Every failure degrades the result instead of
//! propagating: the caller always receives a document.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use uuid::Uuid;

use super::confidence::{
    analyze_ocr_quality, compute_overall_confidence, compute_text_confidence, thresholds,
};
use super::language_detect::resolve_language;
use super::ocr::UnavailableOcrEngine;
use super::pdf::PdfTextExtractor;
use super::preprocess::preprocess_for_ocr;
use super::sanitize::sanitize_extracted_text;
use super::table_detect::{annotate_table_continuations, extract_tables};
use super::types::{ExtractionOptions, OcrEngine, PdfExtractor, PdfPageRenderer};
use super::ExtractionError;
use crate::models::document::{ExtractedDocument, ExtractionMethod, ExtractionWarning, PageExtraction};
use crate::pipeline::intake::{
    compute_content_hash, detect_format_bytes, FileCategory, IntakeError, MAX_PAYLOAD_BYTES,
};
use crate::pipeline::structuring::{assess_authenticity, classify_document, extract_fields};
use crate::pipeline_config::PipelineConfig;

/// Overall confidence multiplier for documents only partially read.
const LIMITED_CONFIDENCE_DECAY: f64 = 0.5;

/// Text recovered from a payload, before structuring.
struct RawText {
    method: ExtractionMethod,
    pages: Vec<PageExtraction>,
    /// Why the text is incomplete, when it is.
    limited: Option<String>,
}

impl RawText {
    /// An empty (or partial) read whose OCR path was unavailable.
    fn limited(method: ExtractionMethod, mut pages: Vec<PageExtraction>, reason: String) -> Self {
        if pages.is_empty() {
            pages.push(PageExtraction {
                page_number: 1,
                text: String::new(),
                confidence: 0.0,
                warnings: vec![],
            });
        }
        pages[0].warnings.push(ExtractionWarning::ExtractionLimited {
            reason: reason.clone(),
        });
        Self {
            method,
            pages,
            limited: Some(reason),
        }
    }
}

/// Deterministic id: identical bytes always get the same document id.
pub fn document_id_for(content_hash: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, content_hash.as_bytes())
}

/// Uses trait objects for OCR, PDF text and page rendering so each can be
/// swapped or mocked.
pub struct DocumentExtractor {
    ocr_engine: Box<dyn OcrEngine + Send + Sync>,
    pdf_extractor: Box<dyn PdfExtractor + Send + Sync>,
    pdf_renderer: Option<Box<dyn PdfPageRenderer + Send + Sync>>,
    config: Arc<PipelineConfig>,
}

impl DocumentExtractor {
    pub fn new(
        ocr_engine: Box<dyn OcrEngine + Send + Sync>,
        pdf_extractor: Box<dyn PdfExtractor + Send + Sync>,
        config: Arc<PipelineConfig>,
    ) -> Self {
        Self {
            ocr_engine,
            pdf_extractor,
            pdf_renderer: None,
            config,
        }
    }

    /// Add a PDF page renderer for per-page OCR of scanned PDFs.
    pub fn with_pdf_renderer(mut self, renderer: Box<dyn PdfPageRenderer + Send + Sync>) -> Self {
        self.pdf_renderer = Some(renderer);
        self
    }

    /// pdf-extract for text layers, plus Tesseract when built with `ocr`
    /// and tessdata is installed.
    pub fn with_defaults(config: Arc<PipelineConfig>) -> Self {
        #[cfg(feature = "ocr")]
        let ocr_engine: Box<dyn OcrEngine + Send + Sync> =
            match super::ocr::BundledTesseract::from_environment() {
                Ok(engine) => Box::new(engine),
                Err(e) => {
                    tracing::warn!(error = %e, "Tesseract unavailable, OCR disabled");
                    Box::new(UnavailableOcrEngine)
                }
            };
        #[cfg(not(feature = "ocr"))]
        let ocr_engine: Box<dyn OcrEngine + Send + Sync> = Box::new(UnavailableOcrEngine);

        Self::new(ocr_engine, Box::new(PdfTextExtractor), config)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Extract and structure one document. Never fails: unreadable input
    /// yields a document carrying `error`, a missing OCR path yields one
    /// marked `extraction_limited`. Deterministic for a given input when
    /// `options.as_of` is set; otherwise dates are judged against today.
    pub fn extract_from_document(
        &self,
        bytes: &[u8],
        options: &ExtractionOptions,
    ) -> ExtractedDocument {
        let started = Instant::now();
        let content_hash = compute_content_hash(bytes);
        let document_id = document_id_for(&content_hash);
        let format = detect_format_bytes(bytes);

        tracing::info!(
            document_id = %document_id,
            category = format.category.as_str(),
            text_layer = ?format.is_digital_pdf,
            size = bytes.len(),
            "Starting document extraction"
        );

        let raw = match self.read_text(bytes, format.category, &format.mime_type, options) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(document_id = %document_id, error = %e, "Document extraction failed");
                return ExtractedDocument::failed(
                    document_id,
                    content_hash,
                    format.mime_type,
                    e.to_string(),
                    e.is_engine_failure(),
                );
            }
        };

        let document = self.structure(document_id, content_hash, format.mime_type, raw, options);

        tracing::info!(
            document_id = %document_id,
            method = ?document.method,
            document_type = %document.classification.document_type,
            pages = document.pages.len(),
            confidence = document.overall_confidence,
            limited = document.extraction_limited,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Document extraction complete"
        );
        document
    }

    fn read_text(
        &self,
        bytes: &[u8],
        category: FileCategory,
        mime_type: &str,
        options: &ExtractionOptions,
    ) -> Result<RawText, ExtractionError> {
        if bytes.len() as u64 > MAX_PAYLOAD_BYTES {
            return Err(IntakeError::FileTooLarge {
                size_mb: bytes.len() as f64 / (1024.0 * 1024.0),
                max_mb: MAX_PAYLOAD_BYTES / (1024 * 1024),
            }
            .into());
        }

        match category {
            pdf if pdf.is_pdf() => self.read_pdf(bytes, options),
            FileCategory::Image => match self.ocr_page(1, bytes, options) {
                Ok(page) => Ok(RawText {
                    method: ExtractionMethod::Ocr,
                    pages: vec![page],
                    limited: None,
                }),
                Err(e) if e.is_engine_failure() => {
                    tracing::warn!(error = %e, "Image OCR unavailable, extraction limited");
                    Ok(RawText::limited(ExtractionMethod::None, vec![], e.to_string()))
                }
                Err(e) => Err(e),
            },
            FileCategory::PlainText => {
                let text = String::from_utf8(bytes.to_vec())
                    .map_err(|e| ExtractionError::EncodingError(e.to_string()))?;
                Ok(RawText {
                    method: ExtractionMethod::PlainTextRead,
                    pages: vec![PageExtraction {
                        page_number: 1,
                        text,
                        confidence: thresholds::PLAIN_TEXT,
                        warnings: vec![],
                    }],
                    limited: None,
                })
            }
            _ => Err(ExtractionError::UnsupportedFormat(mime_type.to_string())),
        }
    }

    /// Text layer first; too little text means a scanned PDF, which is
    /// rendered and OCR'd page by page when a renderer is available.
    fn read_pdf(&self, bytes: &[u8], options: &ExtractionOptions) -> Result<RawText, ExtractionError> {
        let max_pages = options.max_pages.max(1);
        let (direct, parse_error) = match self.pdf_extractor.extract_pages(bytes) {
            Ok(pages) => (pages, None),
            Err(e) => {
                tracing::warn!(error = %e, "PDF text layer unreadable");
                (Vec::new(), Some(e))
            }
        };
        if direct.len() > max_pages {
            tracing::debug!(total = direct.len(), max_pages, "Truncating PDF pages");
        }

        let direct_pages: Vec<PageExtraction> = direct
            .into_iter()
            .take(max_pages)
            .enumerate()
            .map(|(i, text)| PageExtraction {
                page_number: i + 1,
                confidence: if text.trim().is_empty() { 0.0 } else { thresholds::VERY_HIGH },
                text,
                warnings: vec![],
            })
            .collect();

        let chars: usize = direct_pages.iter().map(|p| p.text.trim().chars().count()).sum();
        if chars >= self.config.extraction.min_pdf_text_chars {
            return Ok(RawText {
                method: ExtractionMethod::PdfDirect,
                pages: direct_pages,
                limited: None,
            });
        }

        tracing::debug!(chars, "PDF text layer too short, treating as scanned");
        let page_count = direct_pages.len().clamp(1, max_pages);
        match self.ocr_pdf_pages(bytes, page_count, options) {
            Ok(pages) => Ok(RawText {
                method: ExtractionMethod::Ocr,
                pages,
                limited: None,
            }),
            Err(e) => match parse_error {
                // Neither path could read it: the file itself is bad
                Some(parse) => Err(parse),
                None => {
                    tracing::warn!(error = %e, "Scanned PDF could not be OCR'd, extraction limited");
                    let method = if chars > 0 {
                        ExtractionMethod::PdfDirect
                    } else {
                        ExtractionMethod::None
                    };
                    Ok(RawText::limited(method, direct_pages, e.to_string()))
                }
            },
        }
    }

    fn ocr_pdf_pages(
        &self,
        bytes: &[u8],
        page_count: usize,
        options: &ExtractionOptions,
    ) -> Result<Vec<PageExtraction>, ExtractionError> {
        let renderer = self
            .pdf_renderer
            .as_ref()
            .ok_or(ExtractionError::RendererUnavailable)?;
        let dpi = self.config.extraction.render_dpi;

        (0..page_count)
            .map(|index| {
                let image = renderer.render_page(bytes, index, dpi)?;
                self.ocr_page(index + 1, &image, options)
            })
            .collect()
    }

    /// Preprocess one page image and OCR it.
    fn ocr_page(
        &self,
        page_number: usize,
        image_bytes: &[u8],
        options: &ExtractionOptions,
    ) -> Result<PageExtraction, ExtractionError> {
        let prepared = preprocess_for_ocr(image_bytes, self.config.extraction.upscale_below_width)?;
        let result = match options.language_hint.as_deref() {
            Some(lang) if !lang.trim().is_empty() => {
                self.ocr_engine.ocr_image_with_lang(&prepared.png, lang.trim())?
            }
            _ => self.ocr_engine.ocr_image(&prepared.png)?,
        };

        let mut warnings = prepared.warnings;
        warnings.extend(analyze_ocr_quality(page_number, &result));
        tracing::debug!(page = page_number, confidence = result.confidence, "Page OCR complete");

        Ok(PageExtraction {
            page_number,
            text: result.text,
            confidence: result.confidence,
            warnings,
        })
    }

    fn structure(
        &self,
        document_id: Uuid,
        content_hash: String,
        mime_type: String,
        raw: RawText,
        options: &ExtractionOptions,
    ) -> ExtractedDocument {
        let cfg = &self.config;
        let mut pages = raw.pages;
        for page in &mut pages {
            page.text = sanitize_extracted_text(&page.text);
        }
        annotate_table_continuations(&mut pages);

        let raw_text = pages
            .iter()
            .map(|p| p.text.as_str())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");

        let classification =
            classify_document(&raw_text, cfg.extraction.classification_min_matches);
        let tables = extract_tables(&raw_text);
        let fields = extract_fields(classification.document_type, &raw_text);
        let as_of = options.as_of.unwrap_or_else(|| Utc::now().date_naive());
        let authenticity = assess_authenticity(&raw_text, &fields, as_of, &cfg.authenticity);
        let language = resolve_language(options.language_hint.as_deref(), &raw_text);

        let ocr_confidence = f64::from(compute_text_confidence(&pages, raw.method)) * 100.0;
        let field_completeness = fields.completeness();
        let mut overall_confidence = compute_overall_confidence(
            ocr_confidence,
            classification.confidence,
            authenticity.confidence,
            field_completeness,
        );
        if raw.limited.is_some() {
            overall_confidence *= LIMITED_CONFIDENCE_DECAY;
        }

        ExtractedDocument {
            document_id,
            content_hash,
            mime_type,
            method: raw.method,
            pages,
            raw_text,
            tables,
            classification,
            fields,
            language,
            authenticity,
            ocr_confidence,
            field_completeness,
            overall_confidence,
            extraction_limited: raw.limited.is_some(),
            error: None,
        }
    }
}

/// Run extraction on a blocking thread under the OCR wall-clock limit.
/// A timeout or panic yields a failed document marked `extraction_limited`.
pub async fn extract_with_timeout(
    extractor: Arc<DocumentExtractor>,
    bytes: Arc<Vec<u8>>,
    options: ExtractionOptions,
) -> ExtractedDocument {
    let limit = Duration::from_millis(extractor.config.timeouts.ocr_ms);
    let worker = {
        let extractor = extractor.clone();
        let bytes = bytes.clone();
        move || extractor.extract_from_document(&bytes, &options)
    };

    let reason = match tokio::time::timeout(limit, tokio::task::spawn_blocking(worker)).await {
        Ok(Ok(document)) => return document,
        Ok(Err(join_error)) => format!("Extraction aborted: {join_error}"),
        Err(_) => ExtractionError::Timeout(limit.as_millis() as u64).to_string(),
    };

    tracing::warn!(reason = %reason, "Document extraction degraded");
    let content_hash = compute_content_hash(&bytes);
    ExtractedDocument::failed(
        document_id_for(&content_hash),
        content_hash,
        detect_format_bytes(&bytes).mime_type,
        reason,
        true,
    )
}
