//! One claim submission end to end.
//!
//! The document branch (extract → validate) and the image branch run
//! concurrently and are joined before fusion. Neither branch can fail the
//! submission: at worst a signal is missing or degraded.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::models::document::ExtractedDocument;
use crate::models::fraud::{Decision, FraudAnalysis};
use crate::models::image::AggregateImageResult;
use crate::models::validation::DocumentValidationResult;
use crate::models::ClaimSubmission;
use crate::pipeline::extraction::{extract_with_timeout, DocumentExtractor, ExtractionOptions};
use crate::pipeline::forensics::{HashRegistry, ImageAnalyzer};
use crate::pipeline::scoring::{analyze_claim, make_decision};
use crate::pipeline::validation::validate_document_data;
use crate::pipeline_config::PipelineConfig;

/// Everything produced for one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimAssessment {
    pub claim_id: String,
    pub document: Option<ExtractedDocument>,
    pub validation: Option<DocumentValidationResult>,
    pub images: Option<AggregateImageResult>,
    pub analysis: FraudAnalysis,
    pub decision: Decision,
}

pub struct ClaimProcessor {
    config: Arc<PipelineConfig>,
    extractor: Arc<DocumentExtractor>,
    analyzer: ImageAnalyzer,
}

impl ClaimProcessor {
    pub fn new(
        config: Arc<PipelineConfig>,
        extractor: DocumentExtractor,
        registry: Arc<dyn HashRegistry>,
    ) -> Self {
        Self {
            analyzer: ImageAnalyzer::new(config.clone(), registry),
            extractor: Arc::new(extractor),
            config,
        }
    }

    /// Default document engines (see [`DocumentExtractor::with_defaults`]).
    pub fn with_defaults(config: Arc<PipelineConfig>, registry: Arc<dyn HashRegistry>) -> Self {
        let extractor = DocumentExtractor::with_defaults(config.clone());
        Self::new(config, extractor, registry)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Score one submission. An absent document or an empty photo list
    /// leaves that signal out of the fusion rather than counting against it.
    pub async fn process(
        &self,
        submission: &ClaimSubmission,
        document: Option<&[u8]>,
        images: &[Vec<u8>],
    ) -> ClaimAssessment {
        let started = Instant::now();
        tracing::info!(
            claim_id = %submission.claim_id,
            claim_type = %submission.claim_type,
            has_document = document.is_some(),
            images = images.len(),
            "Processing claim"
        );

        let (document_branch, images) = tokio::join!(
            self.document_branch(submission, document),
            self.image_branch(submission, images),
        );
        let (document, validation) = match document_branch {
            Some((doc, validation)) => (Some(doc), Some(validation)),
            None => (None, None),
        };

        let analysis = analyze_claim(submission, validation.as_ref(), images.as_ref(), &self.config);
        let decision = make_decision(&analysis, submission.amount(), &self.config.decision);

        tracing::info!(
            claim_id = %submission.claim_id,
            fraud_score = analysis.fraud_score,
            status = %decision.status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Claim processed"
        );

        ClaimAssessment {
            claim_id: submission.claim_id.clone(),
            document,
            validation,
            images,
            analysis,
            decision,
        }
    }

    async fn document_branch(
        &self,
        submission: &ClaimSubmission,
        document: Option<&[u8]>,
    ) -> Option<(ExtractedDocument, DocumentValidationResult)> {
        let bytes = document?;
        let options = ExtractionOptions {
            max_pages: self.config.extraction.default_max_pages,
            language_hint: None,
            // Date checks are relative to filing, not to when we happen to run
            as_of: Some(submission.submitted_on),
        };
        let extracted =
            extract_with_timeout(self.extractor.clone(), Arc::new(bytes.to_vec()), options).await;
        let validation = validate_document_data(&extracted, submission, &self.config.validation);
        Some((extracted, validation))
    }

    /// `None` for an empty photo list, so fusion falls back to the
    /// text-only or text-and-document weights.
    async fn image_branch(
        &self,
        submission: &ClaimSubmission,
        images: &[Vec<u8>],
    ) -> Option<AggregateImageResult> {
        if images.is_empty() {
            return None;
        }
        let ctx = submission.image_context();
        Some(self.analyzer.analyze_multiple_images(images, &ctx).await)
    }
}
