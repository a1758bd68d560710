use super::types::{OcrEngine, OcrPageResult};
use super::ExtractionError;

/// Bundled Tesseract OCR engine.
/// Only available when compiled with the `ocr` feature flag.
#[cfg(feature = "ocr")]
pub struct BundledTesseract {
    tessdata_dir: std::path::PathBuf,
    default_lang: String,
}

#[cfg(feature = "ocr")]
impl BundledTesseract {
    /// Initialize with a tessdata directory.
    /// Uses "eng+fra+spa" when all traineddata files are installed, else
    /// whichever subset is present alongside English.
    pub fn new(tessdata_dir: &std::path::Path) -> Result<Self, ExtractionError> {
        if !tessdata_dir.join("eng.traineddata").exists() {
            return Err(ExtractionError::TessdataNotFound(tessdata_dir.to_path_buf()));
        }

        let mut langs = vec!["eng"];
        for extra in ["fra", "spa"] {
            if tessdata_dir.join(format!("{extra}.traineddata")).exists() {
                langs.push(extra);
            }
        }
        let default_lang = langs.join("+");
        tracing::info!(lang = %default_lang, "Tesseract languages available");

        Ok(Self {
            tessdata_dir: tessdata_dir.to_path_buf(),
            default_lang,
        })
    }

    /// Locate tessdata via `TESSDATA_PREFIX`, then common system paths.
    pub fn from_environment() -> Result<Self, ExtractionError> {
        let candidates = std::env::var_os("TESSDATA_PREFIX")
            .map(std::path::PathBuf::from)
            .into_iter()
            .chain(
                [
                    "/usr/share/tesseract-ocr/5/tessdata",
                    "/usr/share/tesseract-ocr/4.00/tessdata",
                    "/usr/share/tessdata",
                    "/usr/local/share/tessdata",
                    "/opt/homebrew/share/tessdata",
                ]
                .iter()
                .map(std::path::PathBuf::from),
            );

        let mut last_err = ExtractionError::OcrUnavailable;
        for dir in candidates {
            match Self::new(&dir) {
                Ok(engine) => return Ok(engine),
                Err(e) => last_err = e,
            }
        }
        Err(last_err)
    }
}

#[cfg(feature = "ocr")]
impl BundledTesseract {
    /// Every `+`-joined language must have its traineddata installed.
    fn check_languages(&self, lang: &str) -> Result<(), ExtractionError> {
        match lang
            .split('+')
            .find(|code| !self.tessdata_dir.join(format!("{code}.traineddata")).exists())
        {
            Some(missing) => Err(ExtractionError::OcrConfig(format!(
                "No traineddata for language '{missing}'"
            ))),
            None => Ok(()),
        }
    }

    fn processing<E: std::fmt::Debug>(e: E) -> ExtractionError {
        ExtractionError::OcrProcessing(format!("{e:?}"))
    }

    fn run(&self, image_bytes: &[u8], lang: &str) -> Result<OcrPageResult, ExtractionError> {
        let datapath = self
            .tessdata_dir
            .to_str()
            .ok_or_else(|| ExtractionError::OcrInit("tessdata path is not UTF-8".into()))?;

        let mut engine = tesseract::Tesseract::new(Some(datapath), Some(lang))
            .map_err(|e| ExtractionError::OcrInit(format!("{e:?}")))?
            .set_image_from_mem(image_bytes)
            .map_err(Self::processing)?;

        let text = engine.get_text().map_err(Self::processing)?;
        let confidence = engine.mean_text_conf().clamp(0, 100) as f32 / 100.0;
        let word_confidences = engine
            .get_tsv_text(0)
            .map(|tsv| parse_tsv_word_confidences(&tsv))
            .unwrap_or_else(|_| uniform_word_confidences(&text, confidence));

        Ok(OcrPageResult {
            text,
            confidence,
            word_confidences,
        })
    }
}

#[cfg(feature = "ocr")]
impl OcrEngine for BundledTesseract {
    fn ocr_image(&self, image_bytes: &[u8]) -> Result<OcrPageResult, ExtractionError> {
        self.run(image_bytes, &self.default_lang)
    }

    fn ocr_image_with_lang(
        &self,
        image_bytes: &[u8],
        lang: &str,
    ) -> Result<OcrPageResult, ExtractionError> {
        self.check_languages(lang)?;
        self.run(image_bytes, lang)
    }
}

/// Page confidence assigned to every word, when no per-word data exists.
pub fn uniform_word_confidences(text: &str, confidence: f32) -> Vec<(String, f32)> {
    text.split_whitespace()
        .map(|w| (w.to_string(), confidence))
        .collect()
}

/// Engine used when no OCR backend is compiled in or installed.
/// Every call fails, which the extractor reports as "extraction limited".
pub struct UnavailableOcrEngine;

impl OcrEngine for UnavailableOcrEngine {
    fn ocr_image(&self, _image_bytes: &[u8]) -> Result<OcrPageResult, ExtractionError> {
        Err(ExtractionError::OcrUnavailable)
    }

    fn ocr_image_with_lang(
        &self,
        _image_bytes: &[u8],
        _lang: &str,
    ) -> Result<OcrPageResult, ExtractionError> {
        Err(ExtractionError::OcrUnavailable)
    }
}

/// Mock OCR engine for unit testing without Tesseract.
pub struct MockOcrEngine {
    pub text: String,
    pub confidence: f32,
}

impl MockOcrEngine {
    pub fn new(text: &str, confidence: f32) -> Self {
        Self {
            text: text.to_string(),
            confidence,
        }
    }
}

impl OcrEngine for MockOcrEngine {
    fn ocr_image(&self, image_bytes: &[u8]) -> Result<OcrPageResult, ExtractionError> {
        self.ocr_image_with_lang(image_bytes, "eng")
    }

    fn ocr_image_with_lang(
        &self,
        _image_bytes: &[u8],
        _lang: &str,
    ) -> Result<OcrPageResult, ExtractionError> {
        Ok(OcrPageResult {
            text: self.text.clone(),
            confidence: self.confidence,
            word_confidences: uniform_word_confidences(&self.text, self.confidence),
        })
    }
}

/// Word-level (level 5) rows of Tesseract TSV output as `(word, 0.0-1.0)`.
/// Columns: level page block par line word left top width height conf text.
/// Tesseract reports -1 for words it cannot score; those read as 0.
pub fn parse_tsv_word_confidences(tsv: &str) -> Vec<(String, f32)> {
    tsv.lines()
        .filter_map(|line| {
            let cols: Vec<&str> = line.split('\t').collect();
            let [level, .., conf, word] = cols.as_slice() else {
                return None;
            };
            if cols.len() < 12 || level.parse::<u8>().ok()? != 5 {
                return None;
            }
            let conf = conf.trim().parse::<f32>().ok()?;
            let word = word.trim();
            (!word.is_empty()).then(|| (word.to_string(), conf.clamp(0.0, 100.0) / 100.0))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_ocr_returns_configured_text() {
        let engine = MockOcrEngine::new("Policy Number: POL-123456", 0.92);
        let result = engine.ocr_image(b"fake_image_bytes").unwrap();
        assert_eq!(result.text, "Policy Number: POL-123456");
        assert!((result.confidence - 0.92).abs() < f32::EPSILON);
    }

    #[test]
    fn mock_ocr_word_confidences() {
        let engine = MockOcrEngine::new("Total loss vehicle", 0.85);
        let result = engine.ocr_image(b"fake").unwrap();
        assert_eq!(result.word_confidences.len(), 3);
        assert_eq!(result.word_confidences[0].0, "Total");
        assert!((result.word_confidences[0].1 - 0.85).abs() < f32::EPSILON);
    }

    #[test]
    fn unavailable_engine_always_errors() {
        assert!(matches!(
            UnavailableOcrEngine.ocr_image(b"x"),
            Err(ExtractionError::OcrUnavailable)
        ));
        assert!(UnavailableOcrEngine.ocr_image_with_lang(b"x", "fra").is_err());
    }

    #[cfg(feature = "ocr")]
    #[test]
    fn bundled_tesseract_rejects_missing_tessdata() {
        let dir = tempfile::tempdir().unwrap();
        let result = BundledTesseract::new(dir.path());
        assert!(matches!(result, Err(ExtractionError::TessdataNotFound(_))));
    }

    #[test]
    fn tsv_parser_extracts_word_confidences() {
        let tsv = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext\n\
                   1\t1\t0\t0\t0\t0\t0\t0\t600\t800\t-1\t\n\
                   5\t1\t1\t1\t1\t1\t10\t20\t80\t30\t95\tPolicy\n\
                   5\t1\t1\t1\t1\t2\t100\t20\t60\t30\t88\tPOL-123456\n\
                   5\t1\t1\t1\t2\t1\t10\t60\t120\t30\t-1\t???\n";
        let words = parse_tsv_word_confidences(tsv);
        assert_eq!(words.len(), 3);
        assert_eq!(words[0], ("Policy".to_string(), 0.95));
        assert_eq!(words[1].0, "POL-123456");
        assert_eq!(words[2].1, 0.0);
    }

    #[test]
    fn uniform_confidences_cover_every_word() {
        let words = uniform_word_confidences("Collision  damage\nrear", 0.7);
        assert_eq!(words.len(), 3);
        assert!(words.iter().all(|(_, c)| *c == 0.7));
    }

    #[test]
    fn tsv_parser_skips_malformed_lines() {
        let tsv = "5\t1\t1\n5\t1\t1\t1\t1\t1\t0\t0\t0\t0\tabc\tword\n";
        assert!(parse_tsv_word_confidences(tsv).is_empty());
    }
}
