//! Per-image forensic analysis.
//!
//! Five independent sub-checks run concurrently on blocking threads, each
//! under its own wall-clock limit. A failed or timed-out check is recorded
//! in `failed_checks` and contributes nothing; it never aborts its siblings.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{NaiveDate, NaiveDateTime};
use image::RgbImage;

use crate::models::image::{
    AggregateImageResult, ImageAnalysisResult, ImageCheck, ImageMetadata, LabelConfidence,
    QualityMetrics, TamperFlags,
};
use crate::models::{ClaimContext, Extracted};
use crate::pipeline::intake::raster::{validate_image_bytes, working_copy};
use crate::pipeline::intake::{
    compute_content_hash, compute_perceptual_hash, decode_image, detect_format_bytes,
    PerceptualHash,
};
use crate::pipeline::Findings;
use crate::pipeline_config::{ImageThresholds, PipelineConfig};

use super::aggregate::aggregate_results;
use super::content::{classify_content, score_content};
use super::metadata::{extract_metadata, score_metadata};
use super::quality::{assess_quality, score_quality, SourceInfo};
use super::registry::HashRegistry;
use super::tamper::{detect_tampering, score_tamper};
use super::ForensicsError;

pub const CORRUPT_IMAGE_INDICATOR: &str = "Image analysis failed - possible corrupt or invalid file";

/// Confidence earned by each sub-check that produced data.
const CONFIDENCE_PER_CHECK: f64 = 20.0;

// ═══════════════════════════════════════════════════════════
// Check results
// ═══════════════════════════════════════════════════════════

/// Raw outcome of each sub-check, before scoring.
#[derive(Debug)]
pub struct CheckResults {
    pub metadata: Result<ImageMetadata, ForensicsError>,
    pub quality: Result<QualityMetrics, ForensicsError>,
    pub tamper: Result<TamperFlags, ForensicsError>,
    pub hashes: Result<(PerceptualHash, String), ForensicsError>,
    pub content: Result<Vec<LabelConfidence>, ForensicsError>,
}

/// Decoded image shared read-only with every sub-check.
struct PreparedImage {
    working: Arc<RgbImage>,
    /// Full-resolution pixels, kept only for lossy sources.
    full: Option<Arc<RgbImage>>,
    source: SourceInfo,
}

// ═══════════════════════════════════════════════════════════
// Analyzer
// ═══════════════════════════════════════════════════════════

pub struct ImageAnalyzer {
    config: Arc<PipelineConfig>,
    registry: Arc<dyn HashRegistry>,
}

impl ImageAnalyzer {
    pub fn new(config: Arc<PipelineConfig>, registry: Arc<dyn HashRegistry>) -> Self {
        Self { config, registry }
    }

    pub fn registry(&self) -> &Arc<dyn HashRegistry> {
        &self.registry
    }

    /// Analyse one image. Never fails: undecodable input yields the
    /// fixed-penalty corrupt-file result.
    pub async fn analyze_image(&self, bytes: &[u8], ctx: &ClaimContext) -> ImageAnalysisResult {
        let started = Instant::now();
        let cfg = &self.config.image;
        tracing::info!(bytes = bytes.len(), policy = ?ctx.policy_id, "Analyzing image");

        let payload = Arc::new(bytes.to_vec());
        let prepared = match self.prepare(payload.clone()).await {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "Image could not be decoded");
                return ImageAnalysisResult::failed(
                    e.to_string(),
                    CORRUPT_IMAGE_INDICATOR.to_string(),
                    cfg.corrupt_file_penalty,
                );
            }
        };

        let checks = self.run_checks(payload, prepared).await;

        let cross_claim = match &checks.hashes {
            Ok((hash, _)) => self.cross_claim_findings(hash, ctx),
            Err(_) => Findings::new(),
        };

        let result = assemble_result(checks, ctx, cross_claim, cfg);

        // Register only after the image is scored.
        if let (Some(policy_id), Some(hash)) = (&ctx.policy_id, result.perceptual_hash.found()) {
            self.registry.append(policy_id, hash.clone());
        }

        tracing::info!(
            score = result.score,
            confidence = result.confidence,
            indicators = result.fraud_indicators.len(),
            failed_checks = result.failed_checks.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Image analysis complete"
        );
        result
    }

    /// Analyse every image in submission order, then aggregate.
    ///
    /// An empty list is scored as missing evidence: the aggregate carries
    /// [`NO_IMAGES_INDICATOR`](super::aggregate::NO_IMAGES_INDICATOR) and
    /// `aggregate.no_images_penalty`. `ClaimProcessor` never passes an empty
    /// list; it leaves the photo signal out of fusion instead.
    pub async fn analyze_multiple_images(
        &self,
        images: &[Vec<u8>],
        ctx: &ClaimContext,
    ) -> AggregateImageResult {
        let mut results = Vec::with_capacity(images.len());
        for (index, bytes) in images.iter().enumerate() {
            tracing::debug!(index, "Analyzing submission image");
            results.push(self.analyze_image(bytes, ctx).await);
        }
        aggregate_results(results, &self.config.aggregate)
    }

    fn limit(&self) -> Duration {
        Duration::from_millis(self.config.timeouts.image_check_ms)
    }

    async fn prepare(&self, payload: Arc<Vec<u8>>) -> Result<PreparedImage, ForensicsError> {
        let max_bytes = self.config.image.max_image_bytes;
        let max_dim = self.config.image.analysis_max_dimension;

        run_check(ImageCheck::Metadata, self.limit(), move || {
            validate_image_bytes(&payload, max_bytes)?;
            let lossy = detect_format_bytes(&payload).is_lossy_image();
            let full = decode_image(&payload)?.to_rgb8();
            let (width, height) = full.dimensions();
            if width == 0 || height == 0 {
                return Err(ForensicsError::ImageTooSmall { width, height });
            }

            let working = Arc::new(working_copy(&full, max_dim));
            let source = SourceInfo {
                width,
                height,
                byte_len: payload.len(),
                lossy,
            };
            Ok(PreparedImage {
                working,
                full: lossy.then(|| Arc::new(full)),
                source,
            })
        })
        .await
    }

    async fn run_checks(&self, payload: Arc<Vec<u8>>, prepared: PreparedImage) -> CheckResults {
        let limit = self.limit();
        let PreparedImage {
            working,
            full,
            source,
        } = prepared;

        let metadata = run_check(ImageCheck::Metadata, limit, {
            let payload = payload.clone();
            move || Ok(extract_metadata(&payload, source.width, source.height))
        });

        let quality = run_check(ImageCheck::Quality, limit, {
            let (working, full, config) = (working.clone(), full.clone(), self.config.clone());
            move || assess_quality(&working, full.as_deref(), source, &config.image)
        });

        let tamper = run_check(ImageCheck::Tamper, limit, {
            let (working, full, config) = (working.clone(), full.clone(), self.config.clone());
            move || detect_tampering(&working, full.as_deref(), source, &config.image)
        });

        let hashes = run_check(ImageCheck::Hashing, limit, {
            let (working, payload) = (working.clone(), payload.clone());
            move || {
                let dynamic = image::DynamicImage::ImageRgb8(working.as_ref().clone());
                Ok((compute_perceptual_hash(&dynamic), compute_content_hash(&payload)))
            }
        });

        let content = run_check(ImageCheck::Content, limit, {
            let working = working.clone();
            move || classify_content(&working)
        });

        // Joined in a fixed order so the assembled result does not depend
        // on which check finishes first.
        let (metadata, quality, tamper, hashes, content) =
            tokio::join!(metadata, quality, tamper, hashes, content);

        CheckResults {
            metadata,
            quality,
            tamper,
            hashes,
            content,
        }
    }

    fn cross_claim_findings(&self, hash: &PerceptualHash, ctx: &ClaimContext) -> Findings {
        let cfg = &self.config.image;
        let matches = self
            .registry
            .lookup(hash, ctx.policy_id.as_deref(), cfg.cross_claim_distance);

        let mut findings = Findings::new();
        for m in matches {
            findings.flag(
                format!(
                    "Image matches a photo submitted under another claim ({}, {} bits differ)",
                    m.claim_id, m.distance
                ),
                cfg.cross_claim_penalty,
            );
        }
        findings
    }
}

/// Run one blocking check under a wall-clock limit.
pub async fn run_check<T, F>(check: ImageCheck, limit: Duration, f: F) -> Result<T, ForensicsError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ForensicsError> + Send + 'static,
{
    match tokio::time::timeout(limit, tokio::task::spawn_blocking(f)).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(ForensicsError::CheckAborted {
            check,
            reason: join_error.to_string(),
        }),
        Err(_) => Err(ForensicsError::Timeout {
            check,
            ms: limit.as_millis() as u64,
        }),
    }
}

// ═══════════════════════════════════════════════════════════
// Scoring
// ═══════════════════════════════════════════════════════════

/// Compare capture time against the incident date.
pub fn score_capture_date(
    captured_at: &NaiveDateTime,
    incident_date: NaiveDate,
    cfg: &ImageThresholds,
) -> Findings {
    let mut findings = Findings::new();
    let days_before = (incident_date - captured_at.date()).num_days();

    if days_before > cfg.predates_severe_days {
        findings.flag(
            format!("Photo predates incident by a suspicious margin ({days_before} days)"),
            cfg.predates_severe_penalty,
        );
    } else if days_before > cfg.predates_moderate_days {
        findings.flag(
            format!("Photo taken {days_before} days before the incident"),
            cfg.predates_moderate_penalty,
        );
    } else if -days_before > cfg.postdates_days {
        findings.flag(
            format!("Photo taken {} days after the incident", -days_before),
            cfg.postdates_penalty,
        );
    }

    findings
}

fn record_failure(failed: &mut Vec<ImageCheck>, check: ImageCheck, error: &ForensicsError) {
    tracing::warn!(check = check.as_str(), error = %error, "Image sub-check produced no signal");
    failed.push(check);
}

/// Fold sub-check outcomes into the per-image result.
///
/// Indicator order: metadata, capture date, quality, tamper, cross-claim
/// duplicates, content consistency.
pub fn assemble_result(
    checks: CheckResults,
    ctx: &ClaimContext,
    cross_claim: Findings,
    cfg: &ImageThresholds,
) -> ImageAnalysisResult {
    let mut findings = Findings::new();
    let mut failed = Vec::new();

    let metadata = match checks.metadata {
        Ok(meta) => {
            findings.merge(score_metadata(&meta, cfg));
            if let (Some(captured), Some(incident)) = (meta.captured_at.found(), ctx.incident_date) {
                findings.merge(score_capture_date(captured, incident, cfg));
            }
            Extracted::Found(meta)
        }
        Err(e) => {
            record_failure(&mut failed, ImageCheck::Metadata, &e);
            Extracted::Error(e.to_string())
        }
    };

    let quality = match checks.quality {
        Ok(q) => {
            findings.merge(score_quality(&q, cfg));
            Extracted::Found(q)
        }
        Err(e) => {
            record_failure(&mut failed, ImageCheck::Quality, &e);
            Extracted::Error(e.to_string())
        }
    };

    let tamper = match checks.tamper {
        Ok(t) => {
            findings.merge(score_tamper(&t, cfg));
            Extracted::Found(t)
        }
        Err(e) => {
            record_failure(&mut failed, ImageCheck::Tamper, &e);
            Extracted::Error(e.to_string())
        }
    };

    let (perceptual_hash, content_hash) = match checks.hashes {
        Ok((phash, chash)) => {
            findings.merge(cross_claim);
            (Extracted::Found(phash), Extracted::Found(chash))
        }
        Err(e) => {
            record_failure(&mut failed, ImageCheck::Hashing, &e);
            (Extracted::Error(e.to_string()), Extracted::Error(e.to_string()))
        }
    };

    let content_labels = match checks.content {
        Ok(labels) => {
            findings.merge(score_content(&labels, ctx.claim_type, cfg));
            labels
        }
        Err(e) => {
            record_failure(&mut failed, ImageCheck::Content, &e);
            Vec::new()
        }
    };

    let succeeded = ImageCheck::ALL.len() - failed.len();
    ImageAnalysisResult {
        metadata,
        quality,
        tamper,
        perceptual_hash,
        content_hash,
        content_labels,
        score: findings.score(),
        fraud_indicators: findings.indicators,
        confidence: (succeeded as f64 * CONFIDENCE_PER_CHECK).min(100.0),
        failed_checks: failed,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::image::ResolutionClass;
    use crate::models::{ClaimType, ContentLabel};
    use crate::pipeline::forensics::aggregate::NO_IMAGES_INDICATOR;
    use crate::pipeline::forensics::registry::InMemoryHashRegistry;
    use crate::pipeline::intake::raster::{encode_jpeg, encode_png};
    use image::Rgb;

    fn analyzer() -> (ImageAnalyzer, Arc<InMemoryHashRegistry>) {
        let registry = Arc::new(InMemoryHashRegistry::new());
        let analyzer = ImageAnalyzer::new(Arc::new(PipelineConfig::default()), registry.clone());
        (analyzer, registry)
    }

    fn scene(width: u32, height: u32, seed: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            let v = ((x * 37 + y * 91 + seed * 13) % 256) as u8;
            Rgb([v, (x * 255 / width) as u8, (y * 255 / height) as u8])
        })
    }

    fn png(img: &RgbImage) -> Vec<u8> {
        encode_png(img).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn clean_checks() -> CheckResults {
        CheckResults {
            metadata: Ok(ImageMetadata {
                exif_present: true,
                captured_at: Extracted::Found(date(2026, 3, 4).and_hms_opt(9, 0, 0).unwrap()),
                camera_make: Extracted::Found("Canon".into()),
                camera_model: Extracted::Found("EOS 90D".into()),
                width: 4000,
                height: 3000,
                ..Default::default()
            }),
            quality: Ok(QualityMetrics {
                pixel_count: 12_000_000,
                sharpness: 900.0,
                contrast: 220.0,
                resolution_class: ResolutionClass::High,
                recompression_ratio: Some(1.1),
            }),
            tamper: Ok(TamperFlags {
                lighting_variance: 40.0,
                lighting_inconsistent: false,
                ela_drift: 0.4,
                ela_suspicious: false,
                compression_anomaly: false,
                stock_aspect_ratio: None,
            }),
            hashes: Ok((PerceptualHash::from_bytes(vec![0; 32]), "abc".into())),
            content: Ok(vec![LabelConfidence {
                label: ContentLabel::Vehicle,
                confidence: 0.7,
            }]),
        }
    }

    fn auto_ctx() -> ClaimContext {
        ClaimContext {
            claim_type: Some(ClaimType::Auto),
            incident_date: Some(date(2026, 3, 4)),
            policy_id: Some("POL-123456".into()),
        }
    }

    #[test]
    fn clean_checks_score_zero_full_confidence() {
        let result = assemble_result(clean_checks(), &auto_ctx(), Findings::new(), &ImageThresholds::default());
        assert_eq!(result.score, 0.0);
        assert_eq!(result.confidence, 100.0);
        assert!(result.fraud_indicators.is_empty());
        assert!(result.failed_checks.is_empty());
        assert!(result.error.is_none());
    }

    #[test]
    fn failed_check_adds_no_score_and_lowers_confidence() {
        let mut checks = clean_checks();
        checks.tamper = Err(ForensicsError::Timeout {
            check: ImageCheck::Tamper,
            ms: 15_000,
        });
        checks.content = Err(ForensicsError::ImageTooSmall { width: 1, height: 1 });
        let result = assemble_result(checks, &auto_ctx(), Findings::new(), &ImageThresholds::default());
        assert_eq!(result.score, 0.0);
        assert_eq!(result.confidence, 60.0);
        assert_eq!(result.failed_checks, vec![ImageCheck::Tamper, ImageCheck::Content]);
        assert!(result.fraud_indicators.is_empty());
        assert!(matches!(result.tamper, Extracted::Error(_)));
        assert!(result.content_labels.is_empty());
    }

    #[test]
    fn stock_photo_without_exif_is_not_metadata_stripped() {
        let mut checks = clean_checks();
        checks.metadata = Ok(ImageMetadata {
            exif_present: false,
            width: 4000,
            height: 6000,
            ..Default::default()
        });
        checks.quality = Ok(QualityMetrics {
            pixel_count: 24_000_000,
            sharpness: 900.0,
            contrast: 220.0,
            resolution_class: ResolutionClass::High,
            recompression_ratio: None,
        });
        checks.tamper = Ok(TamperFlags {
            lighting_variance: 12.0,
            lighting_inconsistent: false,
            ela_drift: 0.3,
            ela_suspicious: false,
            compression_anomaly: false,
            stock_aspect_ratio: super::super::tamper::stock_aspect_ratio(
                4000,
                6000,
                &ImageThresholds::default(),
            )
            .map(String::from),
        });

        let result = assemble_result(checks, &auto_ctx(), Findings::new(), &ImageThresholds::default());
        assert!(result.fraud_indicators.iter().any(|i| i.contains("stock-photo")));
        assert!(result.fraud_indicators.iter().any(|i| i == "No image metadata found"));
        assert!(!result.fraud_indicators.iter().any(|i| i.contains("stripped")));
        assert_eq!(result.score, 10.0 + 5.0);
    }

    #[test]
    fn cross_claim_findings_merge_with_hash() {
        let mut cross = Findings::new();
        cross.flag("dup", 40.0);
        let result = assemble_result(clean_checks(), &auto_ctx(), cross, &ImageThresholds::default());
        assert_eq!(result.score, 40.0);
        assert_eq!(result.fraud_indicators, vec!["dup"]);
    }

    #[test]
    fn capture_date_rules() {
        let cfg = ImageThresholds::default();
        let incident = date(2026, 3, 4);
        let at = |d: NaiveDate| d.and_hms_opt(12, 0, 0).unwrap();

        let severe = score_capture_date(&at(date(2026, 1, 1)), incident, &cfg);
        assert_eq!(severe.penalty, 30.0);

        let moderate = score_capture_date(&at(date(2026, 2, 20)), incident, &cfg);
        assert_eq!(moderate.penalty, 15.0);

        let same_day = score_capture_date(&at(incident), incident, &cfg);
        assert!(same_day.is_empty());

        let day_before = score_capture_date(&at(date(2026, 3, 3)), incident, &cfg);
        assert!(day_before.is_empty());

        let late = score_capture_date(&at(date(2026, 6, 30)), incident, &cfg);
        assert_eq!(late.penalty, 5.0);
    }

    #[test]
    fn score_is_clamped_to_100() {
        let mut cross = Findings::new();
        for i in 0..4 {
            cross.flag(format!("dup {i}"), 40.0);
        }
        let result = assemble_result(clean_checks(), &auto_ctx(), cross, &ImageThresholds::default());
        assert_eq!(result.score, 100.0);
    }

    #[tokio::test]
    async fn corrupt_bytes_yield_failed_result() {
        let (analyzer, registry) = analyzer();
        let result = analyzer.analyze_image(&[0x42; 200], &auto_ctx()).await;
        assert_eq!(result.score, 50.0);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.fraud_indicators, vec![CORRUPT_IMAGE_INDICATOR]);
        assert!(result.error.is_some());
        assert_eq!(result.failed_checks.len(), 5);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn empty_payload_yields_failed_result() {
        let (analyzer, _) = analyzer();
        let result = analyzer.analyze_image(&[], &ClaimContext::default()).await;
        assert!(result.error.is_some());
        assert_eq!(result.score, 50.0);
    }

    #[tokio::test]
    async fn valid_png_runs_every_check() {
        let (analyzer, registry) = analyzer();
        let bytes = png(&scene(96, 64, 1));
        let result = analyzer.analyze_image(&bytes, &auto_ctx()).await;

        assert!(result.error.is_none());
        assert!(result.failed_checks.is_empty());
        assert_eq!(result.confidence, 100.0);
        assert!(result.perceptual_hash.is_found());
        assert!(result.content_hash.is_found());
        // PNG has no EXIF, and 96x64 is tiny
        assert!(result.fraud_indicators.iter().any(|i| i == "No image metadata found"));
        assert!(result.fraud_indicators.iter().any(|i| i.contains("Very low resolution")));
        assert!((0.0..=100.0).contains(&result.score));
        assert_eq!(registry.hashes_for("POL-123456").len(), 1);
    }

    #[tokio::test]
    async fn jpeg_source_gets_recompression_ratio() {
        let (analyzer, _) = analyzer();
        let bytes = encode_jpeg(&scene(64, 64, 2), 90).unwrap();
        let result = analyzer.analyze_image(&bytes, &ClaimContext::default()).await;
        let quality = result.quality.found().unwrap();
        assert!(quality.recompression_ratio.is_some());
    }

    #[tokio::test]
    async fn same_photo_under_other_policy_is_cross_claim_duplicate() {
        let (analyzer, registry) = analyzer();
        let bytes = png(&scene(80, 80, 3));

        let first = analyzer.analyze_image(&bytes, &auto_ctx()).await;
        assert!(!first.fraud_indicators.iter().any(|i| i.contains("another claim")));

        let other = ClaimContext {
            policy_id: Some("POL-777777".into()),
            ..auto_ctx()
        };
        let second = analyzer.analyze_image(&bytes, &other).await;
        let dup: Vec<_> = second
            .fraud_indicators
            .iter()
            .filter(|i| i.contains("another claim"))
            .collect();
        assert_eq!(dup.len(), 1);
        assert!(dup[0].contains("POL-123456"));
        assert!(second.score >= first.score + 40.0 || second.score == 100.0);
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn resubmitting_under_same_policy_is_not_cross_claim() {
        let (analyzer, _) = analyzer();
        let bytes = png(&scene(80, 80, 4));
        analyzer.analyze_image(&bytes, &auto_ctx()).await;
        let again = analyzer.analyze_image(&bytes, &auto_ctx()).await;
        assert!(!again.fraud_indicators.iter().any(|i| i.contains("another claim")));
    }

    #[tokio::test]
    async fn no_policy_id_checks_all_claims_without_registering() {
        let registry = Arc::new(InMemoryHashRegistry::new());
        let analyzer = ImageAnalyzer::new(Arc::new(PipelineConfig::default()), registry.clone());
        let bytes = png(&scene(80, 80, 5));
        analyzer.analyze_image(&bytes, &auto_ctx()).await;

        let anonymous = analyzer.analyze_image(&bytes, &ClaimContext::default()).await;
        assert!(anonymous.fraud_indicators.iter().any(|i| i.contains("another claim")));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn analysis_is_deterministic_for_fixed_registry() {
        let (analyzer, _) = analyzer();
        let bytes = png(&scene(70, 50, 6));
        let a = analyzer.analyze_image(&bytes, &ClaimContext::default()).await;
        let b = analyzer.analyze_image(&bytes, &ClaimContext::default()).await;
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn run_check_times_out() {
        let result: Result<(), ForensicsError> =
            run_check(ImageCheck::Content, Duration::from_millis(10), || {
                std::thread::sleep(Duration::from_millis(300));
                Ok(())
            })
            .await;
        assert!(matches!(
            result,
            Err(ForensicsError::Timeout {
                check: ImageCheck::Content,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn run_check_reports_panics_as_aborted() {
        let result: Result<(), ForensicsError> =
            run_check(ImageCheck::Quality, Duration::from_secs(5), || panic!("boom")).await;
        assert!(matches!(result, Err(ForensicsError::CheckAborted { .. })));
    }

    #[tokio::test]
    async fn empty_image_list_scores_missing_evidence() {
        let (analyzer, registry) = analyzer();
        let ctx = ClaimContext {
            policy_id: Some("POL-9".into()),
            ..ClaimContext::default()
        };
        let result = analyzer.analyze_multiple_images(&[], &ctx).await;
        assert!(result.images.is_empty());
        assert_eq!(result.fraud_indicators, vec![NO_IMAGES_INDICATOR.to_string()]);
        assert_eq!(result.score, 30.0);
        assert_eq!(result.confidence, 0.0);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn multiple_images_aggregate_in_order() {
        let (analyzer, _) = analyzer();
        let a = png(&scene(64, 64, 7));
        let corrupt = vec![0x00; 100];
        let result = analyzer
            .analyze_multiple_images(&[a, corrupt], &ClaimContext::default())
            .await;
        assert_eq!(result.images.len(), 2);
        assert!(result.images[0].error.is_none());
        assert!(result.images[1].error.is_some());
        assert!(result.fraud_indicators.iter().any(|i| i == CORRUPT_IMAGE_INDICATOR));
    }
}
