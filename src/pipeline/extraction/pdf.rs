use super::types::PdfExtractor;
use super::ExtractionError;

/// Text-layer reader backed by pdf-extract. Scanned PDFs come back with
/// empty or near-empty pages; the extractor decides whether to OCR them.
pub struct PdfTextExtractor;

impl PdfExtractor for PdfTextExtractor {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<String>, ExtractionError> {
        let pages = pdf_extract::extract_text_from_mem_by_pages(pdf_bytes)
            .map_err(|e| ExtractionError::PdfParsing(e.to_string()))?;
        tracing::debug!(pages = pages.len(), "PDF text layer read");
        Ok(pages)
    }
}

/// Fixed page texts, for tests and for callers that already hold the text layer.
pub struct StaticPdfExtractor {
    pub pages: Vec<String>,
}

impl StaticPdfExtractor {
    pub fn new(pages: &[&str]) -> Self {
        Self {
            pages: pages.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl PdfExtractor for StaticPdfExtractor {
    fn extract_pages(&self, _pdf_bytes: &[u8]) -> Result<Vec<String>, ExtractionError> {
        Ok(self.pages.clone())
    }
}
