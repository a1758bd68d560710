use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{CoverageKind, DocumentType};
use super::extracted::Extracted;

/// How text was extracted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    PdfDirect,
    Ocr,
    PlainTextRead,
    /// Nothing could be read (unsupported or corrupt input).
    None,
}

/// Warnings about extraction quality
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractionWarning {
    LowConfidencePage { page: usize, confidence: f32 },
    BlurryImage,
    PoorContrast,
    HandwritingDetected,
    TableContinuation,
    PartialExtraction { reason: String },
    /// Scanned input could not be rasterised or OCR'd.
    ExtractionLimited { reason: String },
}

/// Per-page extraction result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageExtraction {
    pub page_number: usize,
    pub text: String,
    /// 0.0 - 1.0
    pub confidence: f32,
    pub warnings: Vec<ExtractionWarning>,
}

/// Consecutive delimiter-separated lines grouped as one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableBlock {
    /// Zero-based line index of the first row in the raw text.
    pub start_line: usize,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub document_type: DocumentType,
    /// Winning keyword count / total keyword count, 0.0 - 1.0.
    pub confidence: f64,
    pub keyword_matches: BTreeMap<DocumentType, usize>,
}

impl Default for Classification {
    fn default() -> Self {
        Self {
            document_type: DocumentType::Unknown,
            confidence: 0.0,
            keyword_matches: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyFields {
    pub policy_number: Extracted<String>,
    pub policy_holder: Extracted<String>,
    pub insurer: Extracted<String>,
    pub effective_date: Extracted<NaiveDate>,
    pub expiration_date: Extracted<NaiveDate>,
    pub coverage_limits: BTreeMap<CoverageKind, f64>,
    pub deductible: Extracted<f64>,
    pub premium: Extracted<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepairEstimateFields {
    pub estimate_number: Extracted<String>,
    pub shop_name: Extracted<String>,
    pub vehicle: Extracted<String>,
    pub vin: Extracted<String>,
    pub estimate_date: Extracted<NaiveDate>,
    pub labor_total: Extracted<f64>,
    pub parts_total: Extracted<f64>,
    pub total_amount: Extracted<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MedicalBillFields {
    pub patient_name: Extracted<String>,
    pub provider_name: Extracted<String>,
    pub account_number: Extracted<String>,
    pub service_date: Extracted<NaiveDate>,
    pub procedures: Vec<String>,
    pub total_charges: Extracted<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoliceReportFields {
    pub report_number: Extracted<String>,
    pub incident_date: Extracted<NaiveDate>,
    pub officer_name: Extracted<String>,
    pub location: Extracted<String>,
    pub incident_type: Extracted<String>,
}

/// Fallback extraction for unclassified documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenericFields {
    pub dates: Vec<NaiveDate>,
    pub amounts: Vec<f64>,
    pub names: Vec<String>,
    pub addresses: Vec<String>,
    pub phone_numbers: Vec<String>,
    pub emails: Vec<String>,
    pub reference_numbers: Vec<String>,
}

/// Type-specific structured fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "document_type", content = "fields", rename_all = "snake_case")]
pub enum StructuredFields {
    Policy(PolicyFields),
    RepairEstimate(RepairEstimateFields),
    MedicalBill(MedicalBillFields),
    PoliceReport(PoliceReportFields),
    Generic(GenericFields),
}

impl Default for StructuredFields {
    fn default() -> Self {
        Self::Generic(GenericFields::default())
    }
}

impl StructuredFields {
    /// (required fields present, required fields expected) for this type.
    pub fn required_presence(&self) -> (usize, usize) {
        let flags: Vec<bool> = match self {
            Self::Policy(f) => vec![
                f.policy_number.is_found(),
                f.policy_holder.is_found(),
                f.effective_date.is_found(),
                f.expiration_date.is_found(),
                !f.coverage_limits.is_empty(),
            ],
            Self::RepairEstimate(f) => vec![
                f.shop_name.is_found(),
                f.vehicle.is_found() || f.vin.is_found(),
                f.estimate_date.is_found(),
                f.total_amount.is_found(),
            ],
            Self::MedicalBill(f) => vec![
                f.patient_name.is_found(),
                f.provider_name.is_found(),
                f.service_date.is_found(),
                !f.procedures.is_empty() || f.total_charges.is_found(),
            ],
            Self::PoliceReport(f) => vec![
                f.report_number.is_found(),
                f.incident_date.is_found(),
                f.officer_name.is_found(),
                f.location.is_found(),
            ],
            Self::Generic(f) => vec![
                !f.dates.is_empty(),
                !f.amounts.is_empty(),
                !f.names.is_empty(),
                !f.reference_numbers.is_empty(),
            ],
        };
        (flags.iter().filter(|f| **f).count(), flags.len())
    }

    /// Fraction of required fields that were found, 0.0 - 1.0.
    pub fn completeness(&self) -> f64 {
        let (present, expected) = self.required_presence();
        if expected == 0 {
            return 0.0;
        }
        present as f64 / expected as f64
    }

    pub fn as_policy(&self) -> Option<&PolicyFields> {
        match self {
            Self::Policy(f) => Some(f),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticityAssessment {
    pub is_authentic: bool,
    /// 0 - 100
    pub confidence: f64,
    pub flags: Vec<String>,
}

impl Default for AuthenticityAssessment {
    fn default() -> Self {
        Self {
            is_authentic: true,
            confidence: 100.0,
            flags: vec![],
        }
    }
}

/// OCR + structuring output for one document. Produced once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    /// UUID v5 of the content hash: identical bytes, identical id.
    pub document_id: Uuid,
    pub content_hash: String,
    pub mime_type: String,
    pub method: ExtractionMethod,
    pub pages: Vec<PageExtraction>,
    pub raw_text: String,
    pub tables: Vec<TableBlock>,
    pub classification: Classification,
    pub fields: StructuredFields,
    pub language: String,
    pub authenticity: AuthenticityAssessment,
    /// Text engine confidence, 0 - 100.
    pub ocr_confidence: f64,
    /// Fraction of the type's required fields present, 0.0 - 1.0.
    pub field_completeness: f64,
    /// 0 - 100
    pub overall_confidence: f64,
    /// Scanned input whose text could only be partially recovered.
    pub extraction_limited: bool,
    pub error: Option<String>,
}

impl ExtractedDocument {
    /// Minimal result for a document whose text could not be read at all.
    /// `extraction_limited` marks engine-side failures (OCR missing, timeout)
    /// as opposed to unreadable input.
    pub fn failed(
        document_id: Uuid,
        content_hash: String,
        mime_type: String,
        reason: String,
        extraction_limited: bool,
    ) -> Self {
        Self {
            document_id,
            content_hash,
            mime_type,
            method: ExtractionMethod::None,
            pages: vec![],
            raw_text: String::new(),
            tables: vec![],
            classification: Classification::default(),
            fields: StructuredFields::default(),
            language: "und".into(),
            authenticity: AuthenticityAssessment::default(),
            ocr_confidence: 0.0,
            field_completeness: 0.0,
            overall_confidence: 0.0,
            extraction_limited,
            error: Some(reason),
        }
    }

    pub fn policy_fields(&self) -> Option<&PolicyFields> {
        self.fields.as_policy()
    }

    /// Input could not be read, and not merely because an engine was missing.
    pub fn is_unreadable(&self) -> bool {
        self.error.is_some() && !self.extraction_limited
    }
}
